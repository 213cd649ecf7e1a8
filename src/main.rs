use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use trendwatch::config::{Config, MailBackend, SourceBackend, DEFAULT_CONFIG_PATH};
use trendwatch::notify::sendgrid::SendGridTransport;
use trendwatch::notify::smtp::{SmtpSettings, SmtpTransport};
use trendwatch::notify::{EmailNotifier, MailTransport};
use trendwatch::pipeline::{RunMode, StatePaths};
use trendwatch::source::official::OfficialApi;
use trendwatch::source::rapidapi::RapidApi;
use trendwatch::source::traits::PostSource;

/// Trendwatch: trending post alerts for X.
///
/// Polls keyword searches and followed accounts, detects posts whose
/// engagement is climbing fast or has crossed a threshold, and emails you.
/// Meant to be run by cron, CI, or any other scheduler.
#[derive(Parser)]
#[command(name = "trendwatch", version, about)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, env = "CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one polling cycle: fetch, detect, notify, save state
    Run {
        /// Send alerts to this address instead of NOTIFY_EMAIL
        #[arg(long)]
        email: Option<String>,

        /// Also write this run's alerts to a JSON report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Detect and print alerts without sending email or saving state
        #[arg(long)]
        dry_run: bool,
    },

    /// Show configuration and state file status
    Status,

    /// Re-send the alerts in a JSON report written by `run --output`
    Notify {
        /// Path to the alert report
        #[arg(long)]
        alerts: PathBuf,

        /// Send alerts to this address instead of NOTIFY_EMAIL
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trendwatch=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            email,
            output,
            dry_run,
        } => {
            let mut config = Config::load(&cli.config)?;
            config.settings.validate()?;
            if email.is_some() {
                config.notify_email = email;
            }

            // Resolve every credential before the first network call.
            let source = create_source(&config)?;
            let notifier = if dry_run {
                None
            } else {
                Some(create_notifier(&config)?)
            };

            let mode = match &notifier {
                Some(n) => RunMode::Live(n),
                None => RunMode::DryRun,
            };

            let settings = &config.settings;
            println!(
                "Checking {} keywords and {} accounts via {}...",
                settings.keywords.len(),
                settings.followed_accounts.len(),
                source.name()
            );

            let now = Utc::now();
            let paths = StatePaths {
                history: config.history_path.clone(),
                ledger: config.ledger_path.clone(),
            };
            let summary =
                trendwatch::pipeline::run(source.as_ref(), mode, settings, &paths, now).await?;

            trendwatch::output::terminal::display_alerts(&summary.alerts);
            trendwatch::output::terminal::display_summary(&summary);

            if let Some(path) = output {
                trendwatch::output::report::write_report(&path, &summary.alerts, now)?;
                println!(
                    "\n{}",
                    format!("Alert report saved to: {}", path.display()).bold()
                );
            }
        }

        Commands::Status => {
            let config = Config::load(&cli.config)?;
            trendwatch::status::show(&config)?;
        }

        Commands::Notify { alerts, email } => {
            let mut config = Config::load(&cli.config)?;
            if email.is_some() {
                config.notify_email = email;
            }
            let notifier = create_notifier(&config)?;

            resend_report(&alerts, &notifier, &config).await?;
        }
    }

    Ok(())
}

/// Build the post source selected by the configured credentials.
fn create_source(config: &Config) -> Result<Box<dyn PostSource>> {
    let timeout = config.settings.request_timeout();
    match config.require_source()? {
        SourceBackend::Official { bearer_token } => {
            info!("Using official X API v2");
            Ok(Box::new(OfficialApi::new(bearer_token, timeout)?))
        }
        SourceBackend::RapidApi { api_key, api_host } => {
            info!(host = %api_host, "Using RapidAPI proxy");
            Ok(Box::new(RapidApi::new(api_key, api_host, timeout)?))
        }
    }
}

/// Build the email notifier selected by the configured credentials.
fn create_notifier(config: &Config) -> Result<EmailNotifier> {
    let recipient = config.require_recipient()?;
    let timeout = config.settings.request_timeout();

    let transport: Box<dyn MailTransport> = match config.require_mail()? {
        MailBackend::SendGrid { api_key, from } => {
            info!("Using SendGrid email transport");
            Box::new(SendGridTransport::new(api_key.clone(), from.clone(), timeout)?)
        }
        MailBackend::Smtp {
            host,
            port,
            username,
            password,
            from,
        } => {
            info!(host = %host, port = port, "Using SMTP email transport");
            Box::new(SmtpTransport::new(&SmtpSettings {
                host: host.clone(),
                port: *port,
                username: username.clone(),
                password: password.clone(),
                from: from.clone(),
                timeout,
            })?)
        }
    };

    Ok(EmailNotifier::new(transport, recipient))
}

/// Re-send a saved alert report and ledger the posts that went through.
async fn resend_report(path: &Path, notifier: &EmailNotifier, config: &Config) -> Result<()> {
    let report = trendwatch::output::report::read_report(path)?;
    if report.alerts.is_empty() {
        println!("No alerts to send.");
        return Ok(());
    }

    println!(
        "Sending {} alert(s) from {} via {}...",
        report.alerts.len(),
        path.display(),
        notifier.transport_name()
    );

    let mut ledger = trendwatch::state::AlertedLedger::load(&config.ledger_path)?;
    let delivery =
        trendwatch::pipeline::deliver(notifier, &report.alerts, &mut ledger, Utc::now()).await;
    ledger.save(&config.ledger_path)?;

    println!("  Sent:   {}", delivery.sent.to_string().green());
    if !delivery.failures.is_empty() {
        println!("  Failed: {}", delivery.failures.len().to_string().red());
        for failure in &delivery.failures {
            println!("    {} ({}): {}", failure.post_id, failure.kind, failure.error);
        }
    }

    Ok(())
}
