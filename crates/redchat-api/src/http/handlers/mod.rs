//! HTTP handler modules.

pub mod chat;
pub mod session;
pub mod voice;
