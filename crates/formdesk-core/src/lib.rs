//! formdesk-core
//!
//! Schema engine for template-driven records: validation, rendering,
//! template building, record editing and record search.
//! Depends on formdesk-domain. No CLI, no terminal I/O, no direct storage interactions.

pub mod api;
pub mod builder;
pub mod engine;
pub mod error;
pub mod notice;
pub mod renderer;
pub mod search;
pub mod storage;
pub mod validator;
pub mod workspace;

pub use api::*;
pub use builder::*;
pub use engine::*;
pub use error::{CoreError, FieldErrors, RemoteError};
pub use notice::*;
pub use renderer::*;
pub use search::*;
pub use storage::*;
pub use validator::*;
pub use workspace::*;
