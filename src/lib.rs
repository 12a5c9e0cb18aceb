//! gemini-mcp library: re-exports the modules so integration tests in
//! `tests/` can drive the server and executor directly.

pub mod cli;
pub mod config;
pub mod gemini;
pub mod mcp;
pub mod output;
pub mod project;
