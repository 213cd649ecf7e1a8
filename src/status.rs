// State status display — what the history and ledger files currently hold.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::state::{AlertedLedger, EngagementHistory};

/// Display state file status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    let settings = &config.settings;

    println!("{}", "=== trendwatch status ===".bold());
    println!(
        "Monitoring: {} keywords, {} accounts",
        settings.keywords.len(),
        settings.followed_accounts.len()
    );
    println!(
        "Thresholds: {}/hour rapid growth, {} total engagement",
        settings.rapid_growth_threshold, settings.absolute_threshold
    );
    println!(
        "Scheduled every {} minutes (set in your scheduler)",
        settings.check_interval_minutes
    );

    let source = match &config.source {
        Some(crate::config::SourceBackend::Official { .. }) => "official X API v2".normal(),
        Some(crate::config::SourceBackend::RapidApi { api_host, .. }) => {
            format!("RapidAPI ({api_host})").normal()
        }
        None => "not configured".red(),
    };
    println!("Post source: {source}");

    let mail = match &config.mail {
        Some(crate::config::MailBackend::SendGrid { .. }) => "SendGrid".normal(),
        Some(crate::config::MailBackend::Smtp { host, port, .. }) => {
            format!("SMTP ({host}:{port})").normal()
        }
        None => "not configured".red(),
    };
    println!("Email transport: {mail}");
    println!();

    if file_present(&config.history_path) {
        let history = EngagementHistory::load(&config.history_path)?;
        let last = history
            .last_observed()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "History: {} ({} posts tracked, last observation {})",
            config.history_path.display(),
            history.len(),
            last
        );
    } else {
        println!("History: none yet ({})", config.history_path.display());
        println!("  Run `trendwatch run` to start tracking");
    }

    if file_present(&config.ledger_path) {
        let ledger = AlertedLedger::load(&config.ledger_path)?;
        println!(
            "Ledger: {} ({} posts alerted)",
            config.ledger_path.display(),
            ledger.len()
        );

        let mut recent: Vec<_> = ledger.iter().collect();
        recent.sort_by(|a, b| b.1.cmp(a.1));
        for (post_id, at) in recent.iter().take(5) {
            println!(
                "  {} alerted {}",
                post_id,
                at.format("%Y-%m-%d %H:%M UTC").to_string().dimmed()
            );
        }
    } else {
        println!("Ledger: none yet ({})", config.ledger_path.display());
    }

    Ok(())
}

fn file_present(path: &Path) -> bool {
    path.is_file()
}
