//! Miscellaneous common structs used throughout the library.

mod address_book;
mod id;
mod node;
mod response;

pub use address_book::*;
pub use id::*;
pub use node::*;
pub use response::*;
