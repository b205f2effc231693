//! Positionable result sets.
//!
//! - [`result_set`] - The lookahead state machine behind every cursor
//! - [`projection`] - What a result set yields for each physical entry

pub mod projection;
pub mod result_set;

pub use projection::{DatabaseEntries, DatabaseKeys, DatabaseValues, KeyValues, Projection};
pub use result_set::{CursorState, GotoResult, ResultSet, Slot};
