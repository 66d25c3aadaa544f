//! Terminal output formatting.
//!
//! Renders benchmark results and comparison tables as plain text so the
//! same strings can be printed or asserted on.

use std::fmt::Write as _;

use crate::bench::{BenchmarkResult, ComparisonRow};
use crate::handler::Strategy;

/// Width of error box separators.
const ERROR_BOX_WIDTH: usize = 60;

/// Inner width of the result box.
const BOX_WIDTH: usize = 58;

/// Print an error box with a title and optional detail.
///
/// Outputs:
/// ```text
/// ============================================================
/// Benchmark Failed
/// ============================================================
///
/// <detail>
/// ```
pub fn print_error_box(title: &str, detail: Option<&str>) {
    eprintln!("\n{}", "=".repeat(ERROR_BOX_WIDTH));
    eprintln!("{title}");
    eprintln!("{}", "=".repeat(ERROR_BOX_WIDTH));

    if let Some(detail) = detail
        && !detail.is_empty()
    {
        eprintln!("\n{detail}");
    }
}

/// Box header shown before a single-target run.
pub fn render_run_header(url: &str, concurrency: usize, requests: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "╔{}╗", "═".repeat(BOX_WIDTH));
    let _ = writeln!(out, "║ {:<width$} ║", "lockbench", width = BOX_WIDTH - 2);
    let _ = writeln!(out, "╠{}╣", "═".repeat(BOX_WIDTH));
    box_line(&mut out, "URL:", &truncate(url, 44));
    box_line(&mut out, "Concurrency:", &concurrency.to_string());
    box_line(&mut out, "Requests:", &requests.to_string());
    let _ = writeln!(out, "╚{}╝", "═".repeat(BOX_WIDTH));
    out
}

/// Box with the statistics of one run.
pub fn render_result(result: &BenchmarkResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "╔{}╗", "═".repeat(BOX_WIDTH));
    let _ = writeln!(out, "║ {:<width$} ║", "RESULTS", width = BOX_WIDTH - 2);
    let _ = writeln!(out, "╠{}╣", "═".repeat(BOX_WIDTH));
    box_line(&mut out, "Completed:", &format_number(result.completed as u64));
    box_line(&mut out, "Failed:", &format_number(result.failed as u64));
    box_line(&mut out, "Requests/sec:", &format!("{:.2}", result.requests_per_sec));
    let _ = writeln!(out, "╠{}╣", "═".repeat(BOX_WIDTH));
    box_line(&mut out, "Mean (ms):", &format!("{:.2}", result.mean_ms));
    box_line(&mut out, "P50 (ms):", &format!("{:.2}", result.p50_ms));
    box_line(&mut out, "P99 (ms):", &format!("{:.2}", result.p99_ms));
    box_line(&mut out, "Max (ms):", &format!("{:.2}", result.max_ms));
    let _ = writeln!(out, "╚{}╝", "═".repeat(BOX_WIDTH));
    out
}

/// One-line summary for easy parsing.
pub fn render_summary_line(result: &BenchmarkResult) -> String {
    format!(
        "Summary: {:.2} req/s, {:.2}ms avg, {:.2}ms p99",
        result.requests_per_sec, result.mean_ms, result.p99_ms
    )
}

/// Comparison table: mean latency per strategy and the best improvement
/// over the held-lock baseline, one row per concurrency level.
pub fn render_comparison(rows: &[ComparisonRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} | {:>16} | {:>16} | {:>16} | Best improvement",
        "Concurrency", "held-lock ms", "minimal-lock ms", "lock-free ms"
    );
    let _ = writeln!(out, "{}", "-".repeat(88));

    for row in rows {
        let cell = |strategy: Strategy| match row.result(strategy) {
            Some(r) if !r.is_empty() => format!("{:.2}", r.mean_ms),
            _ => "n/a".to_string(),
        };
        let improvement = match row.best_improvement() {
            Some((strategy, gain)) => format!("{gain:+.1}% ({strategy})"),
            None => "n/a".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<12} | {:>16} | {:>16} | {:>16} | {}",
            row.concurrency,
            cell(Strategy::HeldLock),
            cell(Strategy::MinimalLock),
            cell(Strategy::LockFree),
            improvement
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "held-lock:    lock held for the whole request");
    let _ = writeln!(out, "minimal-lock: lock held only around reads and writes");
    let _ = writeln!(out, "lock-free:    atomic counter and concurrent map");
    out
}

fn box_line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "║ {label:<18}{value:<width$} ║", width = BOX_WIDTH - 20);
}

/// Shorten `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Compact rendering of large counts (`1.50K`, `2.00M`).
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
