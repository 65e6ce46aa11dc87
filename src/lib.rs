#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
//!

mod common;
mod error;
pub mod query;

pub use crate::common::{AddressBook, Id, Node, PeerStore, Response, ID_SIZE};
pub use crate::error::{Error, QueryError, Result};
pub use crate::query::{Config, Query, QueryBuilder, QueryFn, QueryOutcome};
