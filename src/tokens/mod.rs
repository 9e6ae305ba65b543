//! Token transformation.
//!
//! Turns upstream records into canonical tokens:
//!
//! - [`color`] - color parsing and hex formatting
//! - [`infer`] - type inference from raw values
//! - [`path`] - separator-agnostic path normalization
//! - [`extract`] - field extraction from loosely-typed records
//! - [`resolve`] - cross-reference resolution with per-run caches
//! - [`transform`] - the record → token pipeline
//!
//! # Example
//!
//! ```ignore
//! let mapping = FieldMapping::default();
//! let records = source.query_records(&RecordQuery::new(database_id)).await?;
//! let tokens = TokenTransformer::new(&mapping).transform(&records, &source).await;
//! ```

pub mod color;
pub mod extract;
pub mod infer;
pub mod mapping;
pub mod path;
pub mod resolve;
pub mod transform;

pub use mapping::{parse_override, FieldMapping};
pub use resolve::ResolveContext;
pub use transform::TokenTransformer;
