//! Human-readable rendering of a validation report

use std::fmt;

use colored::Colorize;

use crate::store::ValidationReport;

/// Render the four findings, one block per finding
///
/// With `styled`, headings and verdicts are colored; the text is otherwise
/// identical to the `Display` output.
pub fn render_text(report: &ValidationReport, styled: bool) -> String {
    StyledReport { report, styled }.to_string()
}

struct StyledReport<'a> {
    report: &'a ValidationReport,
    styled: bool,
}

impl fmt::Display for StyledReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self.report, self.styled)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self, false)
    }
}

fn write_report(out: &mut impl fmt::Write, report: &ValidationReport, styled: bool) -> fmt::Result {
    let paint = |text: String, style: fn(&str) -> colored::ColoredString| {
        if styled { style(&text).to_string() } else { text }
    };

    writeln!(
        out,
        "Total number of records: {}",
        paint(report.total_records.to_string(), |s| s.bold())
    )?;

    if report.region_totals.is_empty() {
        writeln!(
            out,
            "{}",
            paint("No regional totals (no data)".to_string(), |s| s.dimmed())
        )?;
    }
    for total in &report.region_totals {
        writeln!(
            out,
            "Region: {}, Total Sales Amount: {:.2}",
            paint(total.region.clone(), |s| s.cyan()),
            total.total_sales
        )?;
    }

    match report.average_total_sales {
        Some(avg) => writeln!(out, "Average sales amount per transaction: {:.2}", avg)?,
        None => writeln!(
            out,
            "Average sales amount per transaction: {}",
            paint("no data".to_string(), |s| s.dimmed())
        )?,
    }

    if report.duplicate_order_item_ids.is_empty() {
        writeln!(
            out,
            "{}",
            paint("No duplicate OrderItemId values found.".to_string(), |s| s.green())
        )?;
    } else {
        writeln!(
            out,
            "{}",
            paint("Duplicate OrderItemId values found:".to_string(), |s| s.red().bold())
        )?;
        for dup in &report.duplicate_order_item_ids {
            writeln!(
                out,
                "OrderItemId: {}, Count: {}",
                dup.order_item_id, dup.occurrences
            )?;
        }
    }

    Ok(())
}
