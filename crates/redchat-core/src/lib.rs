//! Chat orchestration and port trait definitions for redchat.
//!
//! This crate defines the "ports" (`ChatRepository`, `LlmProvider`) that the
//! infrastructure layer implements, plus the logic that sits between them:
//! prompt assembly, title generation, voice-text processing and the
//! [`chat::service::ChatService`]. It depends only on `redchat-types`.

pub mod chat;
pub mod llm;
pub mod voice;
