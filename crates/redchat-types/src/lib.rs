//! Shared domain types for redchat.
//!
//! Chat turns and session documents, LLM request/response shapes,
//! configuration, and the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
