//! Domains module containing business logic organized by bounded contexts.
//!
//! The server has a single domain, `tools`: everything a client can invoke.

pub mod tools;
