//! Utility functions shared by the search core.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory management (XDG-compliant)
//! - [`encoding`] - Strict multi-encoding file decoding
//! - [`progress`] - Progress spinner (no-op without the `progress` feature)
//! - [`tokenizer`] - Alphanumeric token extraction and counting
//!
//! ## Key Functions
//!
//! ```no_run
//! use scour::utils::{count_tokens, tokenize_query};
//!
//! let counts = count_tokens("cat dog cat");
//! assert_eq!(counts.get("cat"), 2);
//!
//! let query = tokenize_query("Cat DOG");
//! // Returns: ["cat", "dog"]
//! ```

pub mod app_data;
pub mod encoding;
pub mod progress;
pub mod tokenizer;

pub use app_data::*;
pub use encoding::*;
pub use tokenizer::*;
