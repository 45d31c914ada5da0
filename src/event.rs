use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

/// The workflow events this tool reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Milestone,
    Issues,
    Other(String),
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "milestone" => EventKind::Milestone,
            "issues" => EventKind::Issues,
            other => EventKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
struct NumberRef {
    number: u64,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
struct IssueRef {
    number: Option<u64>,
    milestone: Option<NumberRef>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
struct MilestoneChange {
    from: Option<NumberRef>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
struct Changes {
    milestone: Option<MilestoneChange>,
}

/// The subset of a GitHub webhook payload needed to find milestones.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct EventPayload {
    milestone: Option<NumberRef>,
    issue: Option<IssueRef>,
    changes: Option<Changes>,
}

impl EventPayload {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Event(format!("failed to parse event payload: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Event(format!(
                "failed to read event payload {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&json)
    }
}

/// Milestones whose planning issue should be refreshed for this event.
///
/// An `issues` event touches both the issue's current milestone and, when the
/// milestone was changed, the one it was moved away from.
pub fn milestone_targets(kind: &EventKind, payload: &EventPayload) -> Vec<u64> {
    match kind {
        EventKind::Milestone => match payload.milestone {
            Some(m) => vec![m.number],
            None => {
                info!("no milestone number found in event payload");
                Vec::new()
            }
        },
        EventKind::Issues => {
            let issue = payload.issue.clone().unwrap_or_default();
            info!(
                issue = ?issue.number,
                milestone = ?issue.milestone.map(|m| m.number),
                "issue event"
            );

            let current = issue.milestone.map(|m| m.number);
            let previous = payload
                .changes
                .as_ref()
                .and_then(|c| c.milestone.as_ref())
                .and_then(|m| m.from)
                .map(|m| m.number);

            let mut targets = Vec::new();
            if let Some(n) = current {
                info!(milestone = n, "issue has milestone, updating milestone planning");
                targets.push(n);
            }
            if let Some(n) = previous
                && Some(n) != current
            {
                info!(milestone = n, "issue had old milestone, updating old milestone planning");
                targets.push(n);
            }
            if targets.is_empty() {
                info!("issue has no milestone, skipping");
            }
            targets
        }
        EventKind::Other(name) => {
            info!("Event {name} is not supported");
            Vec::new()
        }
    }
}

/// Work out which milestones to sync: explicit `--milestone` numbers win,
/// otherwise the event name and payload decide. Unsupported events need no
/// payload and yield nothing.
pub fn resolve_targets(config: &Config) -> Result<Vec<u64>> {
    if !config.milestones.is_empty() {
        return Ok(config.milestones.clone());
    }

    let name = config.event_name.as_deref().ok_or_else(|| {
        Error::Event(
            "no event to handle (pass --event or --milestone, or set GITHUB_EVENT_NAME)"
                .to_string(),
        )
    })?;
    let kind = EventKind::from_name(name);
    if let EventKind::Other(_) = kind {
        return Ok(milestone_targets(&kind, &EventPayload::default()));
    }

    let path = config.event_path.as_deref().ok_or_else(|| {
        Error::Event(
            "event payload path not set (pass --event-path or set GITHUB_EVENT_PATH)"
                .to_string(),
        )
    })?;
    let payload = EventPayload::load(path)?;
    Ok(milestone_targets(&kind, &payload))
}
