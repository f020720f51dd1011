//! CLI output formatting

use crate::callbacks::{SpanOutcome, TraceSpan};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Print a section header
pub fn print_header(title: &str) {
    let rule = "=".repeat(60);
    println!("\n{}", style(&rule).dim());
    println!("{}", style(title).bold());
    println!("{}", style(&rule).dim());
}

/// Print a numbered sub-section header
pub fn print_section(number: usize, title: &str) {
    println!("\n{} {}", style(format!("{}.", number)).cyan(), style(title).bold());
    println!("{}", style("-".repeat(40)).dim());
}

/// Print a labeled result line
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{}:", label)).dim(), value);
}

/// Format a span outcome for display
pub fn format_outcome(outcome: &SpanOutcome) -> String {
    match outcome {
        SpanOutcome::Running => format!("{}{}", SPINNER, style("RUNNING").yellow()),
        SpanOutcome::Success => format!("{}{}", CHECK, style("OK").green()),
        SpanOutcome::Error(message) => {
            format!("{}{} {}", CROSS, style("FAILED").red(), style(message).dim())
        }
    }
}

/// Format one span line of a trace tree
pub fn format_span(span: &TraceSpan, depth: usize) -> String {
    let label = span
        .label
        .as_deref()
        .map(|label| format!(" {}", style(format!("[{}]", label)).dim()))
        .unwrap_or_default();
    let duration = span
        .duration()
        .map(|d| format!(" {}", style(format!("{}ms", d.num_milliseconds())).dim()))
        .unwrap_or_default();

    format!(
        "{}{}{} {}{}",
        "  ".repeat(depth),
        style(&span.name).bold(),
        label,
        format_outcome(&span.outcome),
        duration
    )
}

/// Format a whole span tree, roots first, children indented under parents
pub fn format_trace(spans: &[TraceSpan]) -> String {
    let mut lines = Vec::new();
    for root in spans.iter().filter(|span| span.parent_run_id.is_none()) {
        collect_lines(spans, root, 0, &mut lines);
    }
    lines.join("\n")
}

fn collect_lines(spans: &[TraceSpan], span: &TraceSpan, depth: usize, lines: &mut Vec<String>) {
    lines.push(format_span(span, depth));
    for child in spans
        .iter()
        .filter(|child| child.parent_run_id == Some(span.run_id))
    {
        collect_lines(spans, child, depth + 1, lines);
    }
}
