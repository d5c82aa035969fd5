//! Infrastructure layer for redchat.
//!
//! Contains implementations of the traits defined in `redchat-core`: the
//! SQLite session document store and the OpenAI-compatible completion
//! provider. Also loads `config.toml` and the provider API key.

pub mod config;
pub mod llm;
pub mod sqlite;
