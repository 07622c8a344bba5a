//! Page fetching abstraction.
//!
//! The engine only ever sees extracted rows through the `PageFetcher` trait;
//! `HttpPageFetcher` is the implementation that talks to the live site.

mod http;
mod parser;
mod types;

pub use http::HttpPageFetcher;
pub(crate) use http::site_root;
pub use parser::parse_results_page;
pub use types::*;
