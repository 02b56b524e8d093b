//! Course-registration backend.
//!
//! The domain core keeps a `Class` document and the `User` documents that
//! reference it coherent in a store without multi-document transactions;
//! everything else adapts that core to HTTP and persistence.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
