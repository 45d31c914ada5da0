pub mod template;

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::categorize::{MatchPolicy, UNCATEGORIZED, categorize};
use crate::config::DEFAULT_CATEGORIES;
use crate::stats::{DEFAULT_PROGRESS_WIDTH, IssueStats, compute_stats, progress_bar};
use crate::tracker::{Issue, Milestone};

pub use template::ReportRenderer;

const NO_DUE_DATE: &str = "No due date";
const NO_DESCRIPTION: &str = "No description provided.";
const ATTRIBUTION: &str = "🤖 Auto-generated by [Auto Milestone Summary Action](https://github.com/marketplace/actions/auto-milestone-summary-action)";
const DO_NOT_EDIT: &str =
    "⚠️ Please do not modify this issue manually, it will be automatically updated.";

/// Knobs for report generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub categories: Vec<String>,
    pub match_policy: MatchPolicy,
    pub progress_width: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            match_policy: MatchPolicy::default(),
            progress_width: DEFAULT_PROGRESS_WIDTH,
        }
    }
}

/// Everything a report template can reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningView {
    pub title: String,
    pub milestone_number: u64,
    pub stats: IssueStats,
    pub progress_bar: String,
    pub due_date: String,
    pub description: String,
    pub sections: Vec<SectionView>,
    pub contributors: Vec<String>,
    pub has_contributors: bool,
    pub updated_at: String,
}

/// A non-empty category (or the uncategorized bucket).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub name: String,
    pub count: usize,
    pub uncategorized: bool,
    pub issues: Vec<IssueLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueLine {
    pub number: u64,
    pub title: String,
    pub closed: bool,
    pub checkbox: String,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    /// The full markdown task line as the built-in report prints it.
    pub line: String,
}

/// Render the planning issue body with the built-in template.
pub fn render_planning_content(
    milestone: &Milestone,
    issues: &[Issue],
    options: &ReportOptions,
    now: DateTime<Utc>,
) -> String {
    render_markdown(&build_view(milestone, issues, options, now))
}

/// Compute statistics, categorize, and collect contributors into a view.
pub fn build_view(
    milestone: &Milestone,
    issues: &[Issue],
    options: &ReportOptions,
    now: DateTime<Utc>,
) -> PlanningView {
    let stats = compute_stats(issues);
    info!(
        total = stats.total,
        completed = stats.completed,
        in_progress = stats.in_progress,
        percent = stats.percent,
        "issue statistics"
    );

    let categorized = categorize(issues, &options.categories, options.match_policy);
    let mut sections = Vec::new();
    for bucket in categorized.buckets() {
        debug!(category = %bucket.name, count = bucket.issues.len(), "categorized issues");
        if bucket.issues.is_empty() {
            continue;
        }
        sections.push(SectionView {
            name: bucket.name.clone(),
            count: bucket.issues.len(),
            uncategorized: false,
            issues: bucket.issues.iter().map(|i| issue_line(i)).collect(),
        });
    }

    let leftovers = categorized.uncategorized();
    debug!(count = leftovers.len(), "uncategorized issues");
    if !leftovers.is_empty() {
        sections.push(SectionView {
            name: UNCATEGORIZED.to_string(),
            count: leftovers.len(),
            uncategorized: true,
            issues: leftovers.iter().map(|i| issue_line(i)).collect(),
        });
    }

    let contributors = contributors(issues);

    PlanningView {
        title: milestone.title.clone(),
        milestone_number: milestone.number,
        progress_bar: progress_bar(&stats, options.progress_width),
        stats,
        due_date: format_due_date(milestone.due_on.as_deref()),
        description: milestone
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(NO_DESCRIPTION)
            .to_string(),
        sections,
        has_contributors: !contributors.is_empty(),
        contributors,
        updated_at: format_timestamp(now),
    }
}

/// Write the built-in markdown layout for a view.
pub fn render_markdown(view: &PlanningView) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {} Planning\n\n", view.title));

    out.push_str("## Overview\n");
    out.push_str(&format!("- Progress: {}\n", view.progress_bar));
    out.push_str(&format!("- Total Issues: {}\n", view.stats.total));
    out.push_str(&format!("  - ✅ Completed: {}\n", view.stats.completed));
    out.push_str(&format!("  - 🚧 In Progress: {}\n", view.stats.in_progress));
    out.push_str(&format!("- Due Date: {}\n\n", view.due_date));

    out.push_str("## Description\n");
    out.push_str(&view.description);
    out.push_str("\n\n## Tasks by Category\n");

    for section in &view.sections {
        out.push_str(&format!("\n### {} ({})\n", section.name, section.count));
        for issue in &section.issues {
            out.push_str(&issue.line);
            out.push('\n');
        }
    }

    if view.has_contributors {
        out.push_str("\n## Contributors\n");
        out.push_str("Thanks to all our contributors for their efforts on completed issues:\n\n");
        for login in &view.contributors {
            out.push_str(&format!("- @{login}\n"));
        }
    }

    out.push_str("\n---\n");
    out.push_str(&format!("> {ATTRIBUTION}\n"));
    out.push_str(&format!("> Last Updated: {}\n", view.updated_at));
    out.push_str(&format!("> {DO_NOT_EDIT}\n"));
    out
}

fn issue_line(issue: &Issue) -> IssueLine {
    let closed = issue.state.is_closed();
    let checkbox = if closed { "[x]" } else { "[ ]" };

    let mut line = format!("- {checkbox} #{}", issue.number);
    if let Some(login) = &issue.assignee {
        line.push_str(&format!(" (@{login})"));
    }
    if !issue.labels.is_empty() {
        let labels: Vec<String> = issue.labels.iter().map(|l| format!("`{l}`")).collect();
        line.push(' ');
        line.push_str(&labels.join(" "));
    }

    IssueLine {
        number: issue.number,
        title: issue.title.clone(),
        closed,
        checkbox: checkbox.to_string(),
        assignee: issue.assignee.clone(),
        labels: issue.labels.clone(),
        line,
    }
}

/// Distinct assignees of closed issues, in first-seen order.
pub fn contributors(issues: &[Issue]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut logins = Vec::new();
    for issue in issues.iter().filter(|i| i.state.is_closed()) {
        if let Some(login) = &issue.assignee
            && seen.insert(login.as_str())
        {
            logins.push(login.clone());
        }
    }
    logins
}

/// Long-form due date (`December 31, 2025`).
///
/// Accepts RFC 3339 timestamps (taken in UTC) and bare `YYYY-MM-DD` dates.
/// Values that parse as neither are returned unchanged.
pub fn format_due_date(due_on: Option<&str>) -> String {
    let Some(raw) = due_on.map(str::trim).filter(|d| !d.is_empty()) else {
        return NO_DUE_DATE.to_string();
    };

    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%B %-d, %Y at %I:%M %p UTC").to_string()
}
