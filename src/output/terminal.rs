// Colored terminal output for alerts and run summaries.

use colored::Colorize;

use crate::notify::format::{format_count, format_rate};
use crate::pipeline::RunSummary;
use crate::trends::{AlertEvent, AlertKind};

/// Display the alert events of a run.
pub fn display_alerts(alerts: &[AlertEvent]) {
    if alerts.is_empty() {
        println!("No trending posts detected.");
        return;
    }

    println!(
        "\n{}",
        format!("=== {} trending post alert(s) ===", alerts.len()).bold()
    );

    for alert in alerts {
        let post = &alert.post;
        println!();
        println!("  {}  @{}", colorize_kind(alert.kind), post.author);
        println!("  {}", post.url.dimmed());
        print!("  Engagement: {}", format_count(alert.current_total));
        if let Some(rate) = alert.growth_rate() {
            print!("  Growth: {}/hour", format_rate(rate));
        }
        if let Some(keyword) = &post.matched_keyword {
            print!("  Matched: \"{keyword}\"");
        }
        println!();
        println!("  {}", super::truncate_chars(&post.text, 200).dimmed());
    }
    println!();
}

/// Display the end-of-run summary, including anything that went wrong.
pub fn display_summary(summary: &RunSummary) {
    let title = if summary.dry_run {
        "=== Run summary (dry run) ==="
    } else {
        "=== Run summary ==="
    };
    println!("{}", title.bold());
    println!("  Posts fetched:     {}", summary.fetched);
    println!("  Posts processed:   {}", summary.processed);
    println!("  Alerts:            {}", summary.alerts.len());
    if summary.suppressed > 0 {
        println!(
            "  Already alerted:   {}",
            summary.suppressed.to_string().dimmed()
        );
    }
    if !summary.dry_run {
        println!("  Emails sent:       {}", summary.sent.to_string().green());
    }

    if !summary.failed.is_empty() {
        println!(
            "  Emails failed:     {}",
            summary.failed.len().to_string().red()
        );
        for failure in &summary.failed {
            println!(
                "    {} {} ({}): {}",
                "x".red(),
                failure.post_id,
                failure.kind,
                failure.error
            );
        }
    }

    if !summary.failed_queries.is_empty() {
        println!(
            "  {} {} source queries failed:",
            "Warning:".yellow(),
            summary.failed_queries.len()
        );
        for failure in &summary.failed_queries {
            println!("    {}: {}", failure.query, failure.error);
        }
    }

    if !summary.skipped.is_empty() {
        println!(
            "  {} {} malformed records skipped:",
            "Warning:".yellow(),
            summary.skipped.len()
        );
        for record in &summary.skipped {
            println!("    {record}");
        }
    }
}

fn colorize_kind(kind: AlertKind) -> colored::ColoredString {
    match kind {
        AlertKind::RapidGrowth => kind.label().yellow().bold(),
        AlertKind::AbsoluteThreshold => kind.label().green().bold(),
    }
}
