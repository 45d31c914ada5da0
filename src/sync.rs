use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::report::{ReportOptions, ReportRenderer};
use crate::tracker::{IssueTracker, MilestoneState, planning_issue_title};

/// What happened to a milestone's planning issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created(u64),
    Updated(u64),
    SkippedClosed,
    /// Dry run: the rendered body, nothing written.
    Previewed(String),
}

/// Keeps one planning issue per milestone in sync with the milestone's issues.
pub struct PlanningSync<T> {
    tracker: T,
    renderer: ReportRenderer,
    options: ReportOptions,
    planning_label: String,
    dry_run: bool,
}

impl<T: IssueTracker> PlanningSync<T> {
    pub fn new(tracker: T, renderer: ReportRenderer, config: &Config) -> Self {
        Self {
            tracker,
            renderer,
            options: config.report_options(),
            planning_label: config.planning_label.clone(),
            dry_run: config.dry_run,
        }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Sync every target milestone in order, stopping at the first error.
    pub fn run(&self, milestones: &[u64]) -> Result<Vec<SyncOutcome>> {
        milestones
            .iter()
            .map(|&number| self.sync_milestone(number, Utc::now()))
            .collect()
    }

    pub fn sync_milestone(&self, number: u64, now: DateTime<Utc>) -> Result<SyncOutcome> {
        let milestone = self.tracker.get_milestone(number)?;
        info!(
            title = %milestone.title,
            number = milestone.number,
            state = ?milestone.state,
            due_on = milestone.due_on.as_deref().unwrap_or("Not set"),
            "milestone info"
        );

        if milestone.state == MilestoneState::Closed {
            info!("Milestone #{number} is closed, skipping...");
            return Ok(SyncOutcome::SkippedClosed);
        }

        let issues = self.tracker.fetch_all_issues_for_milestone(number)?;

        info!(
            categories = ?self.options.categories,
            match_policy = ?self.options.match_policy,
            "generating planning content"
        );
        let content = self.renderer.render(&milestone, &issues, &self.options, now)?;
        info!("planning content generated");

        if self.dry_run {
            info!(milestone = number, "dry run, not writing planning issue");
            return Ok(SyncOutcome::Previewed(content));
        }

        match self
            .tracker
            .find_planning_issue(&self.planning_label, &milestone.title)?
        {
            Some(existing) => {
                self.tracker.update_issue_body(existing, &content)?;
                info!("Updated planning issue #{existing}");
                Ok(SyncOutcome::Updated(existing))
            }
            None => {
                let title = planning_issue_title(&milestone.title);
                let created = self.tracker.create_issue(
                    &title,
                    &content,
                    std::slice::from_ref(&self.planning_label),
                )?;
                info!("Created new planning issue #{created}");
                Ok(SyncOutcome::Created(created))
            }
        }
    }
}
