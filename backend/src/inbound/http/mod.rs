//! Inbound HTTP adapters: handlers, session plumbing, and error mapping.

pub mod classes;
pub mod error;
pub mod health;
pub mod session;
pub mod state;
pub mod test_utils;
pub mod users;

pub use error::ApiResult;
