use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::categorize::{MatchPolicy, UNCATEGORIZED};
use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::report::ReportOptions;
use crate::stats::DEFAULT_PROGRESS_WIDTH;

/// GitHub's default labels.
pub const DEFAULT_CATEGORIES: &[&str] = &["bug", "documentation", "enhancement"];
pub const DEFAULT_PLANNING_LABEL: &str = "planning";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_CONFIG_PATH: &str = ".github/milestone-summary.toml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub planning_label: Option<String>,
    pub categories: Option<Vec<String>>,
    pub match_policy: Option<String>,
    pub template: Option<String>,
    pub progress_width: Option<usize>,
}

/// Action inputs and runner context as exposed through the environment.
/// Empty values count as unset.
#[derive(Clone, Default, PartialEq)]
pub struct ActionInputs {
    pub token: Option<String>,
    pub planning_label: Option<String>,
    pub categories: Option<String>,
    pub match_policy: Option<String>,
    pub template: Option<String>,
    pub repository: Option<String>,
    pub api_url: Option<String>,
    pub event_name: Option<String>,
    pub event_path: Option<String>,
}

impl ActionInputs {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            token: get("INPUT_TOKEN").or_else(|| get("GITHUB_TOKEN")),
            planning_label: get("INPUT_PLANNING_LABEL"),
            categories: get("INPUT_CATEGORIES"),
            match_policy: get("INPUT_MATCH_POLICY"),
            template: get("INPUT_TEMPLATE"),
            repository: get("GITHUB_REPOSITORY"),
            api_url: get("GITHUB_API_URL"),
            event_name: get("GITHUB_EVENT_NAME"),
            event_path: get("GITHUB_EVENT_PATH"),
        }
    }
}

impl fmt::Debug for ActionInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInputs")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("planning_label", &self.planning_label)
            .field("categories", &self.categories)
            .field("match_policy", &self.match_policy)
            .field("template", &self.template)
            .field("repository", &self.repository)
            .field("api_url", &self.api_url)
            .field("event_name", &self.event_name)
            .field("event_path", &self.event_path)
            .finish()
    }
}

#[derive(Clone, PartialEq)]
pub struct Config {
    pub repository: String,
    pub token: Option<String>,
    pub api_url: String,
    pub planning_label: String,
    pub categories: Vec<String>,
    pub match_policy: MatchPolicy,
    pub template: Option<PathBuf>,
    pub progress_width: usize,
    pub event_name: Option<String>,
    pub event_path: Option<PathBuf>,
    pub milestones: Vec<u64>,
    pub dry_run: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("repository", &self.repository)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url)
            .field("planning_label", &self.planning_label)
            .field("categories", &self.categories)
            .field("match_policy", &self.match_policy)
            .field("template", &self.template)
            .field("progress_width", &self.progress_width)
            .field("event_name", &self.event_name)
            .field("event_path", &self.event_path)
            .field("milestones", &self.milestones)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with(cli, ActionInputs::from_env())
    }

    /// Load the config file (explicit `--config` must exist; the default
    /// path is optional) and merge it with `inputs` and the CLI.
    pub fn load_with(cli: &Cli, inputs: ActionInputs) -> Result<Self> {
        let file_config = match cli.config.as_deref() {
            Some(path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(path)?)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    parse_config(&std::fs::read_to_string(path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        merge(file_config, inputs, cli)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            categories: self.categories.clone(),
            match_policy: self.match_policy,
            progress_width: self.progress_width,
        }
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(ref policy) = config.match_policy {
        parse_match_policy(policy)?;
    }
    if let Some(width) = config.progress_width
        && width == 0
    {
        return Err(Error::ConfigValidation(
            "progress_width must be > 0".to_string(),
        ));
    }
    if let Some(ref label) = config.planning_label
        && label.trim().is_empty()
    {
        return Err(Error::ConfigValidation(
            "planning_label must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn parse_match_policy(value: &str) -> Result<MatchPolicy> {
    MatchPolicy::parse(value).ok_or_else(|| {
        Error::ConfigValidation(format!(
            "unknown match_policy: {value} (expected: exact, substring)"
        ))
    })
}

/// Parse a categories input: a JSON string array, or a comma-separated list.
pub fn parse_categories(input: &str) -> Result<Vec<String>> {
    let trimmed = input.trim();
    let raw: Vec<String> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| {
            Error::ConfigValidation(format!("categories must be a JSON array of strings: {e}"))
        })?
    } else {
        trimmed.split(',').map(str::to_string).collect()
    };
    Ok(normalize_categories(raw))
}

/// Trim names, drop blanks and the reserved uncategorized name, and drop
/// case-insensitive duplicates (first wins).
pub fn normalize_categories(raw: Vec<String>) -> Vec<String> {
    let mut categories: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let name = name.trim();
        if name.is_empty() {
            warn!("ignoring blank category");
            continue;
        }
        if name.eq_ignore_ascii_case(UNCATEGORIZED) {
            warn!(category = name, "ignoring reserved category name");
            continue;
        }
        if categories.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            warn!(category = name, "ignoring duplicate category");
            continue;
        }
        categories.push(name.to_string());
    }
    categories
}

fn validate_repository(repository: &str) -> Result<()> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(Error::ConfigValidation(format!(
            "repository must be owner/name, got: {repository}"
        ))),
    }
}

/// Merge with precedence CLI > action inputs > config file > defaults.
pub fn merge(file: ConfigFile, inputs: ActionInputs, cli: &Cli) -> Result<Config> {
    let repository = cli
        .repo
        .clone()
        .or(inputs.repository)
        .ok_or_else(|| {
            Error::ConfigValidation(
                "repository not set (pass --repo or set GITHUB_REPOSITORY)".to_string(),
            )
        })?;
    validate_repository(&repository)?;

    if inputs.token.is_none() && !cli.dry_run {
        return Err(Error::ConfigValidation(
            "token is required (set INPUT_TOKEN or GITHUB_TOKEN)".to_string(),
        ));
    }

    let categories = match cli.categories.as_deref().or(inputs.categories.as_deref()) {
        Some(input) => parse_categories(input)?,
        None => normalize_categories(
            file.categories
                .unwrap_or_else(|| DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()),
        ),
    };

    let match_policy = match cli
        .match_policy
        .as_deref()
        .or(inputs.match_policy.as_deref())
        .or(file.match_policy.as_deref())
    {
        Some(policy) => parse_match_policy(policy)?,
        None => MatchPolicy::default(),
    };

    let planning_label = cli
        .planning_label
        .clone()
        .or(inputs.planning_label)
        .or(file.planning_label)
        .unwrap_or_else(|| DEFAULT_PLANNING_LABEL.to_string());
    if planning_label.trim().is_empty() {
        return Err(Error::ConfigValidation(
            "planning_label must not be empty".to_string(),
        ));
    }

    Ok(Config {
        repository,
        token: inputs.token,
        api_url: inputs
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        planning_label,
        categories,
        match_policy,
        template: cli
            .template
            .clone()
            .or(inputs.template)
            .or(file.template)
            .map(PathBuf::from),
        progress_width: file.progress_width.unwrap_or(DEFAULT_PROGRESS_WIDTH),
        event_name: cli.event.clone().or(inputs.event_name),
        event_path: cli
            .event_path
            .clone()
            .or(inputs.event_path)
            .map(PathBuf::from),
        milestones: cli.milestones.clone(),
        dry_run: cli.dry_run,
    })
}
