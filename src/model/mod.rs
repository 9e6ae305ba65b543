//! Data models for tokensync.
//!
//! - `Token` and its value types (transformation stage)
//! - `Entry`, `Collection`, `StoreValue` (variable store side)
//! - `Record` (document source side)

pub mod entry;
pub mod record;
pub mod token;

pub use entry::{Collection, Entry, Rgba, StoreValue};
pub use record::Record;
pub use token::{Scalar, Token, TokenType, TokenValue};
