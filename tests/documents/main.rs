//! Integration tests for document assembly and the storage drivers.

mod memory;
mod registry;
mod scenarios;
mod support;
