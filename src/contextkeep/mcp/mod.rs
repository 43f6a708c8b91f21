//! Tool-call front-end: JSON-RPC 2.0 over stdio.
//!
//! The transport is line-oriented and shares the process's stdout, so nothing
//! in this module (or anything it calls) may print diagnostics there; stray
//! text corrupts the channel. All logging goes through `log`, which the
//! binary wires to stderr.

pub mod protocol;
pub mod server;
pub mod transport;

pub use server::McpServer;
