//! Request extractors shared by the handlers.

pub mod json;
pub mod query;
pub mod user;
