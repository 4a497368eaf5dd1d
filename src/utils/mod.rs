//! Utility functions shared by the builder, encoder and decoder.
//!
//! ## Modules
//!
//! - [`base85`] - Base85 text encoding for the script variant of the data
//! - [`encoding`] - Fixed-width little-endian integers and a bounds-checked reader
//! - [`progress`] - Progress bar that becomes a no-op without the `progress` feature
//! - [`text`] - Alphabet validation, normalization and scope suffixes
//!
//! ```no_run
//! use searchdex::utils::{normalize_text, scope_suffixes};
//!
//! let text = normalize_text("Math::Vector::min", true);
//! // Returns: ["vector::min", "min"]
//! let suffixes = scope_suffixes(&text, "::");
//! ```

pub mod base85;
pub mod encoding;
pub mod progress;
pub mod text;

pub use encoding::*;
pub use text::*;
