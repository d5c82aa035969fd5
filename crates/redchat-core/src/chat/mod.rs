//! Chat sessions: persistence port, prompt assembly, titles, orchestration.

pub mod box_repository;
pub mod memory;
pub mod prompt;
pub mod repository;
pub mod service;
pub mod title;
