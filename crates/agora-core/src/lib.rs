//! Post, comment and reaction lifecycle: who may change what, how votes are
//! counted, and how a post is torn down with everything that references it.

pub mod cascade;
pub mod error;
pub mod identity;
pub mod policy;
pub mod reactions;
pub mod service;
pub mod store;
pub mod validate;

#[cfg(test)]
mod testing;

pub use error::{PostError, PostResult, StoreError, StoreResult};
pub use service::PostService;
