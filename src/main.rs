use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use milestone_summary::cli::Cli;
use milestone_summary::config::Config;
use milestone_summary::error::{Result, error_command};
use milestone_summary::event::resolve_targets;
use milestone_summary::report::ReportRenderer;
use milestone_summary::sync::{PlanningSync, SyncOutcome};
use milestone_summary::tracker::github::GitHubTracker;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli)?;
    info!(?config, "config loaded");

    let targets = resolve_targets(&config)?;
    if targets.is_empty() {
        return Ok(());
    }

    let renderer = ReportRenderer::new(config.template.as_deref())?;
    let sync = PlanningSync::new(GitHubTracker::new(&config), renderer, &config);
    for outcome in sync.run(&targets)? {
        if let SyncOutcome::Previewed(body) = outcome {
            println!("{body}");
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    info!("milestone-summary starting");

    if let Err(e) = run(&cli) {
        // Workflow command: marks the action step as failed with this message.
        println!("{}", error_command(&e.to_string()));
        std::process::exit(1);
    }
}
