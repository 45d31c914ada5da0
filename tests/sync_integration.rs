use std::cell::RefCell;

use chrono::{DateTime, TimeZone, Utc};
use clap::Parser;

use milestone_summary::cli::Cli;
use milestone_summary::config::{ActionInputs, Config, ConfigFile, merge};
use milestone_summary::error::{Error, Result};
use milestone_summary::report::ReportRenderer;
use milestone_summary::sync::{PlanningSync, SyncOutcome};
use milestone_summary::tracker::{Issue, IssueState, IssueTracker, Milestone, MilestoneState};

#[derive(Debug, Clone, PartialEq)]
enum Write {
    Created {
        title: String,
        body: String,
        labels: Vec<String>,
    },
    Updated {
        number: u64,
        body: String,
    },
}

struct FakeTracker {
    milestone: Milestone,
    issues: Vec<Issue>,
    existing_planning: Option<u64>,
    lookups: RefCell<Vec<(String, String)>>,
    writes: RefCell<Vec<Write>>,
}

impl FakeTracker {
    fn new(state: MilestoneState, existing_planning: Option<u64>) -> Self {
        Self {
            milestone: Milestone {
                title: "v1.0".to_string(),
                description: Some("Ship it".to_string()),
                due_on: Some("2026-11-30T08:00:00Z".to_string()),
                number: 3,
                state,
            },
            issues: vec![
                Issue {
                    title: "Crash".to_string(),
                    number: 1,
                    state: IssueState::Closed,
                    labels: vec!["bug".to_string()],
                    assignee: Some("alice".to_string()),
                },
                Issue {
                    title: "Guide".to_string(),
                    number: 2,
                    state: IssueState::Open,
                    labels: vec!["documentation".to_string()],
                    assignee: None,
                },
            ],
            existing_planning,
            lookups: RefCell::new(Vec::new()),
            writes: RefCell::new(Vec::new()),
        }
    }
}

impl IssueTracker for FakeTracker {
    fn get_milestone(&self, number: u64) -> Result<Milestone> {
        if number == self.milestone.number {
            Ok(self.milestone.clone())
        } else {
            Err(Error::Tracker(format!("milestone {number} not found")))
        }
    }

    fn fetch_all_issues_for_milestone(&self, _number: u64) -> Result<Vec<Issue>> {
        Ok(self.issues.clone())
    }

    fn find_planning_issue(&self, label: &str, milestone_title: &str) -> Result<Option<u64>> {
        self.lookups
            .borrow_mut()
            .push((label.to_string(), milestone_title.to_string()));
        Ok(self.existing_planning)
    }

    fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<u64> {
        self.writes.borrow_mut().push(Write::Created {
            title: title.to_string(),
            body: body.to_string(),
            labels: labels.to_vec(),
        });
        Ok(99)
    }

    fn update_issue_body(&self, number: u64, body: &str) -> Result<()> {
        self.writes.borrow_mut().push(Write::Updated {
            number,
            body: body.to_string(),
        });
        Ok(())
    }
}

fn config(extra: &[&str]) -> Config {
    let mut argv = vec!["milestone-summary", "--repo", "octo/widgets"];
    argv.extend_from_slice(extra);
    let inputs = ActionInputs {
        token: Some("token".to_string()),
        ..Default::default()
    };
    merge(ConfigFile::default(), inputs, &Cli::parse_from(argv)).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 14, 5, 0).unwrap()
}

#[test]
fn test_creates_planning_issue_when_missing() {
    let sync = PlanningSync::new(
        FakeTracker::new(MilestoneState::Open, None),
        ReportRenderer::builtin(),
        &config(&[]),
    );
    let outcome = sync.sync_milestone(3, now()).unwrap();
    assert_eq!(outcome, SyncOutcome::Created(99));

    let tracker = sync.tracker();
    assert_eq!(
        tracker.lookups.borrow().as_slice(),
        &[("planning".to_string(), "v1.0".to_string())]
    );
    let writes = tracker.writes.borrow();
    match writes.as_slice() {
        [Write::Created { title, body, labels }] => {
            assert_eq!(title, "Planning: v1.0");
            assert_eq!(labels, &vec!["planning".to_string()]);
            assert!(body.starts_with("# v1.0 Planning\n"));
            assert!(body.contains("- Due Date: November 30, 2026"));
            assert!(body.contains("### bug (1)"));
            assert!(body.contains("- @alice"));
            assert!(body.contains("Last Updated: October 19, 2026 at 02:05 PM UTC"));
        }
        other => panic!("expected a single create, got {other:?}"),
    }
}

#[test]
fn test_updates_existing_planning_issue() {
    let sync = PlanningSync::new(
        FakeTracker::new(MilestoneState::Open, Some(41)),
        ReportRenderer::builtin(),
        &config(&["--planning-label", "roadmap"]),
    );
    let outcome = sync.sync_milestone(3, now()).unwrap();
    assert_eq!(outcome, SyncOutcome::Updated(41));

    let tracker = sync.tracker();
    assert_eq!(tracker.lookups.borrow()[0].0, "roadmap");
    let writes = tracker.writes.borrow();
    assert_eq!(writes.len(), 1);
    assert!(matches!(&writes[0], Write::Updated { number: 41, body } if body.contains("## Overview")));
}

#[test]
fn test_closed_milestone_is_skipped() {
    let sync = PlanningSync::new(
        FakeTracker::new(MilestoneState::Closed, Some(41)),
        ReportRenderer::builtin(),
        &config(&[]),
    );
    let outcome = sync.sync_milestone(3, now()).unwrap();
    assert_eq!(outcome, SyncOutcome::SkippedClosed);
    assert!(sync.tracker().lookups.borrow().is_empty());
    assert!(sync.tracker().writes.borrow().is_empty());
}

#[test]
fn test_dry_run_never_writes() {
    let sync = PlanningSync::new(
        FakeTracker::new(MilestoneState::Open, Some(41)),
        ReportRenderer::builtin(),
        &config(&["--dry-run"]),
    );
    match sync.sync_milestone(3, now()).unwrap() {
        SyncOutcome::Previewed(body) => assert!(body.contains("# v1.0 Planning")),
        other => panic!("expected preview, got {other:?}"),
    }
    assert!(sync.tracker().lookups.borrow().is_empty());
    assert!(sync.tracker().writes.borrow().is_empty());
}

#[test]
fn test_configured_categories_drive_sections() {
    let sync = PlanningSync::new(
        FakeTracker::new(MilestoneState::Open, None),
        ReportRenderer::builtin(),
        &config(&["--dry-run", "--categories", r#"["documentation"]"#]),
    );
    let SyncOutcome::Previewed(body) = sync.sync_milestone(3, now()).unwrap() else {
        panic!("expected preview");
    };
    assert!(body.contains("### documentation (1)"));
    assert!(body.contains("### Uncategorized (1)"));
    assert!(!body.contains("### bug"));
}

#[test]
fn test_custom_template_used_for_body() {
    let renderer =
        ReportRenderer::from_template_source("{{ title }}: {{ stats.percent }}%").unwrap();
    let sync = PlanningSync::new(
        FakeTracker::new(MilestoneState::Open, Some(41)),
        renderer,
        &config(&[]),
    );
    sync.sync_milestone(3, now()).unwrap();
    assert_eq!(
        sync.tracker().writes.borrow()[0],
        Write::Updated {
            number: 41,
            body: "v1.0: 50%".to_string()
        }
    );
}

#[test]
fn test_tracker_error_propagates() {
    let sync = PlanningSync::new(
        FakeTracker::new(MilestoneState::Open, None),
        ReportRenderer::builtin(),
        &config(&[]),
    );
    let err = sync.run(&[3, 8]).unwrap_err();
    assert!(err.to_string().contains("milestone 8 not found"));
    // The first milestone was still synced before the failure.
    assert_eq!(sync.tracker().writes.borrow().len(), 1);
}
