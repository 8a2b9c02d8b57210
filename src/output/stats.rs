//! Run summaries for the command line
//!
//! Formatting is kept separate from printing so the summaries can be tested.

use crate::cleaner::CleaningResult;
use crate::crawler::CrawlReport;
use crate::state::PageState;
use std::fmt::Write;

/// Renders a crawl report as a human-readable summary
pub fn format_crawl_report(report: &CrawlReport) -> String {
    let mut out = String::new();
    let fetched = report.pages_fetched();

    let _ = writeln!(out, "=== Crawl Summary ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Pages fetched: {}", fetched);
    let _ = writeln!(out, "  Documents written: {}", report.written.len());
    let _ = writeln!(out, "  Off-site links discarded: {}", report.out_of_scope);
    let _ = writeln!(out, "  Entries beyond max depth: {}", report.depth_limited);
    if report.cancelled {
        let _ = writeln!(out, "  Stopped early: cancelled");
    }
    let _ = writeln!(out);

    let state_counts: Vec<_> = PageState::all_states()
        .into_iter()
        .map(|state| (state, report.count(state)))
        .filter(|(_, count)| *count > 0)
        .collect();
    if !state_counts.is_empty() {
        let _ = writeln!(out, "Pages by State:");
        for (state, count) in &state_counts {
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                state,
                count,
                percentage(*count, fetched as u64)
            );
        }
        let _ = writeln!(out);
    }

    let errors: u64 = state_counts
        .iter()
        .filter(|(state, _)| state.is_error())
        .map(|(_, count)| count)
        .sum();
    let succeeded: u64 = state_counts
        .iter()
        .filter(|(state, _)| state.is_success())
        .map(|(_, count)| count)
        .sum();

    let _ = writeln!(out, "Errors: {}", errors);
    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        percentage(succeeded, fetched as u64),
        succeeded,
        fetched
    );

    out
}

/// Renders cleaning outcomes, one line per file, then a tally
pub fn format_cleaning_results(results: &[CleaningResult]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Cleaning Summary ===\n");
    for result in results {
        let mark = if result.success { "ok" } else { "FAILED" };
        let _ = writeln!(
            out,
            "  [{}] {} -> {}",
            mark,
            result.path.display(),
            result.detail
        );
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} succeeded, {} failed",
        succeeded,
        results.len() - succeeded
    );

    out
}

/// Prints a crawl report to stdout
pub fn print_crawl_report(report: &CrawlReport) {
    print!("{}", format_crawl_report(report));
}

/// Prints cleaning outcomes to stdout
pub fn print_cleaning_results(results: &[CleaningResult]) {
    print!("{}", format_cleaning_results(results));
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
