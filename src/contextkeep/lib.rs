//! # ContextKeep Architecture
//!
//! ContextKeep persists small named text records ("memories") on local disk
//! and serves them to two independent front-ends. The store is the core; the
//! front-ends are thin adapters over it.
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │  Tool-call front-end     │   │  HTTP front-end          │
//! │  (mcp/: JSON-RPC over    │   │  (http/: axum routes,    │
//! │   stdio, 4 memory tools) │   │   {success,data|error})  │
//! └────────────┬─────────────┘   └────────────┬─────────────┘
//!              │                              │
//!              ▼                              ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │  Record Store (store.rs)                                │
//! │  - one JSON file per memory, named by SHA-256 of key    │
//! │  - store / retrieve / list / search / delete / stats    │
//! │  - corrupt slots read as absent, never as errors        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key principles
//!
//! - The store is stateless between calls; the directory is the whole
//!   durable state. There is no index file and no cache.
//! - One store instance is constructed at startup ([`init`]) and handed to
//!   whichever front-end runs; neither front-end owns the storage layout.
//! - The stdio transport shares stdout with tool responses, so diagnostics
//!   go through `log` to stderr, never to stdout.
//! - Edit-history lines appended to content are a front-end convention. The
//!   store treats content as opaque text.
//!
//! ## Module overview
//!
//! - [`store`]: the Record Store, all persistence and querying
//! - [`model`]: `Memory` and its listed form with snippet
//! - [`mcp`]: tool-call front-end (protocol, transport, server)
//! - [`http`]: HTTP front-end (router, handlers, envelope)
//! - [`init`]: data-directory resolution, store construction
//! - [`args`]: command-line interface for the binary
//! - [`error`]: error types

pub mod args;
pub mod error;
pub mod http;
pub mod init;
pub mod mcp;
pub mod model;
pub mod store;
