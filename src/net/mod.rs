//! Backend access: the contract, its HTTP implementation and the wire types

pub mod backend;
pub mod client;
pub mod protocol;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{ApiError, Backend};
pub use client::HttpBackend;
