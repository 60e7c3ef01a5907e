//! formdesk-domain
//!
//! Pure domain models (Field, Template, Record, FieldValue).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod common;
pub mod field;
pub mod record;
pub mod template;
pub mod value;

pub use common::*;
pub use field::*;
pub use record::*;
pub use template::*;
pub use value::*;
