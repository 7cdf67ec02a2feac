//! Phase-space distribution and acceptance plots for TraceWin particle files.
//!
//! ```text
//!  loader ─▶ Table ─▶ histogram ─▶ render::figure ─▶ Figure ─┬─▶ persist (CSV + PNG)
//!                                                            └─▶ GUI
//! ```

pub mod color;
pub mod data;
pub mod error;
pub mod histogram;
pub mod layout;
pub mod persist;
pub mod pipeline;
pub mod render;

pub use error::{DstError, Result};
