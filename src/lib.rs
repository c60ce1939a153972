//! Library surface for the GDB MCP gateway: the MI parser, the session
//! state machine and I/O pipeline, the session registry, the sync bridge,
//! and the MCP tool surface built on top of them.

pub mod bridge;
pub mod cli;
pub mod enums;
pub mod error;
pub mod mi;
pub mod registry;
pub mod server;
pub mod session;
