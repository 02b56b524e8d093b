//! Port adapters for the document store.

mod memory;

pub use memory::{MemoryClassRepository, MemoryUserRepository};
