//! Observability for redchat: subscriber setup and OpenTelemetry GenAI
//! attribute names for completion spans.

pub mod genai_attrs;
pub mod tracing_setup;
