use clap::Parser;

/// milestone-summary: keep a milestone planning issue up to date
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "milestone-summary", version, about)]
pub struct Cli {
    /// Event that triggered the run (milestone, issues). Defaults to $GITHUB_EVENT_NAME
    #[arg(long)]
    pub event: Option<String>,

    /// Path to the JSON event payload. Defaults to $GITHUB_EVENT_PATH
    #[arg(long)]
    pub event_path: Option<String>,

    /// Milestone number to summarize; skips event resolution (repeatable)
    #[arg(long = "milestone", value_name = "NUMBER")]
    pub milestones: Vec<u64>,

    /// Repository as owner/name. Defaults to $GITHUB_REPOSITORY
    #[arg(long)]
    pub repo: Option<String>,

    /// Path to config file (default: .github/milestone-summary.toml if present)
    #[arg(long)]
    pub config: Option<String>,

    /// Label identifying the planning issue
    #[arg(long)]
    pub planning_label: Option<String>,

    /// Categories as a JSON array or comma-separated list
    #[arg(long)]
    pub categories: Option<String>,

    /// Label matching policy (exact, substring)
    #[arg(long)]
    pub match_policy: Option<String>,

    /// Custom report template file
    #[arg(long)]
    pub template: Option<String>,

    /// Print the report instead of creating or updating the planning issue
    #[arg(long)]
    pub dry_run: bool,
}
