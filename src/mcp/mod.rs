//! Model Context Protocol surface: wire types, tools, and the stdio loop.

pub mod server;
pub mod tools;
pub mod types;

pub use server::{run_stdio, serve, McpServer};
