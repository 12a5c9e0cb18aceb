//! Gemini CLI integration: process invocation, session listing, and the
//! command executor built on top of them.

pub mod executor;
pub mod process;
pub mod response;
pub mod sessions;

pub use executor::{
    ExecutionError, Executor, ExecutorSettings, InvocationRequest, InvocationResult, SessionTarget,
};
pub use process::{GeminiCommand, LaunchMode, ProcessRunner, TokioProcessRunner};
pub use sessions::{SessionDirectory, SessionRecord};
