//! Tools domain module.
//!
//! Tools are executable functions that MCP clients call by name with a JSON
//! object of arguments. Every call goes through the same pipeline regardless
//! of transport.
//!
//! ## Architecture
//!
//! - `schema.rs` - Declarative parameter schemas and argument validation
//! - `registry.rs` - Tool descriptors and the name-indexed registry
//! - `dispatcher.rs` - Lookup, validation and fault-contained invocation
//! - `handlers.rs` - The capability-group contract and the response envelope
//! - `catalog.rs` - Registers every capability group at startup
//! - `definitions/` - The capability groups themselves
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Add a descriptor to an existing group's `tools()` (or create a new
//!    group implementing [`CapabilityGroup`] under `definitions/`)
//! 2. Handle the tool name in that group's `handle()`
//! 3. For a new group, register it in `catalog.rs`
//!
//! Transports never need to change: they list tools from the registry and
//! call through the [`Dispatcher`].

pub mod catalog;
pub mod definitions;
mod dispatcher;
mod error;
mod handlers;
mod registry;
mod schema;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::build_registry;
pub use dispatcher::Dispatcher;
pub use error::ToolError;
pub use handlers::*;
pub use registry::{ToolDescriptor, ToolRegistry};
pub use schema::{ParameterKind, ParameterSchema, ParameterSpec, ValidatedArgs, ValidationError};
