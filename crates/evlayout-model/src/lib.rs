//! Data model for fixed-layout event compilation.
//!
//! - **record**: untyped nested records supplied by ingestion adapters
//! - **schema**: resolved field types, schemas, and capacity tracking
//! - **options**: reader configuration
//! - **error**: the shared [`LayoutError`] type

pub mod error;
pub mod options;
pub mod record;
pub mod schema;

pub use error::{LayoutError, Result};
pub use options::{DEFAULT_COMMON_ROOT, DEFAULT_NAN_SENTINEL, ReaderOptions};
pub use record::{RawRecord, RawValue};
pub use schema::{Capacity, CapacityMap, DEFAULT_TEXT_CAPACITY, Field, FieldType, Schema};
