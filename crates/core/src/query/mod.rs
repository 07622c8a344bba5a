//! Search request types and query rendering.
//!
//! Everything in here is pure: the same request always renders the same
//! tokens and the same path.

mod builder;
mod types;

pub use builder::{build_path, build_tokens, query_text, sort_suffix, RECENT_PATH, SEARCH_PATH};
pub use types::*;
