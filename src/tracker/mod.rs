pub mod github;

use crate::error::Result;

/// Issue state as far as the report is concerned.
///
/// Only the tracker's literal `closed` counts as done; anything else is
/// treated as still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn from_api(state: &str) -> Self {
        if state == "closed" {
            IssueState::Closed
        } else {
            IssueState::Open
        }
    }

    pub fn is_closed(self) -> bool {
        self == IssueState::Closed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub title: String,
    pub number: u64,
    pub state: IssueState,
    pub labels: Vec<String>,
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneState {
    Open,
    Closed,
}

impl MilestoneState {
    pub fn from_api(state: &str) -> Self {
        if state == "closed" {
            MilestoneState::Closed
        } else {
            MilestoneState::Open
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub title: String,
    pub description: Option<String>,
    pub due_on: Option<String>,
    pub number: u64,
    pub state: MilestoneState,
}

/// Title given to a milestone's planning issue.
pub fn planning_issue_title(milestone_title: &str) -> String {
    format!("Planning: {milestone_title}")
}

pub trait IssueTracker {
    /// Fetch milestone metadata by number.
    fn get_milestone(&self, number: u64) -> Result<Milestone>;

    /// Fetch every issue attached to the milestone, open and closed, with
    /// pull requests removed. Pages are merged before returning.
    fn fetch_all_issues_for_milestone(&self, number: u64) -> Result<Vec<Issue>>;

    /// Find the open planning issue for a milestone: it carries `label` and
    /// its title is [`planning_issue_title`], or failing that, contains
    /// `milestone_title`.
    fn find_planning_issue(&self, label: &str, milestone_title: &str) -> Result<Option<u64>>;

    /// Create an issue and return its number.
    fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<u64>;

    /// Replace the body of an existing issue.
    fn update_issue_body(&self, number: u64, body: &str) -> Result<()>;
}
