//! Page state tracking for a single crawl
//!
//! Every frontier entry that is actually fetched ends in exactly one
//! `PageState`; the crawler tallies them into its report.

mod page_state;

pub use page_state::PageState;
