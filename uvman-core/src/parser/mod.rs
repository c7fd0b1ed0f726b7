//! Text-to-structure conversion for `uv` output.
//!
//! Both parsers are total: malformed input degrades to "no match" or a
//! skipped line, never an error.

pub mod listing;
pub mod version;

pub use listing::{
    parse_executable, parse_header, parse_tool_listing, ExtractorRule, HeaderField, HEADER_RULES,
};
pub use version::{compare_versions, parse_version, sort_installations};
