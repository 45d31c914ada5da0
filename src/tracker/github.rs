use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

use super::{
    Issue, IssueState, IssueTracker, Milestone, MilestoneState, planning_issue_title,
};

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;
const PER_PAGE: usize = 100;
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("milestone-summary/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Client abstraction (for testability)
// ---------------------------------------------------------------------------

pub trait GitHubApi {
    /// `GET {api}/{path}?{query}` returning the decoded JSON body.
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<serde_json::Value>;

    /// Send a JSON body with `method` (POST, PATCH) to `{api}/{path}`.
    fn send(&self, method: &str, path: &str, body: &serde_json::Value)
    -> Result<serde_json::Value>;
}

/// GitHub REST client over `ureq` with retry and exponential backoff.
struct DefaultGitHubApi {
    api_url: String,
    token: Option<String>,
}

impl DefaultGitHubApi {
    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}/{}", self.api_url.trim_end_matches('/'), path);
        let request = ureq::request(method, &url)
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", USER_AGENT)
            .set("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }
}

impl GitHubApi for DefaultGitHubApi {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<serde_json::Value> {
        call_with_retry(&format!("GET {path}"), || {
            let mut request = self.request("GET", path);
            for (key, value) in query {
                request = request.query(key, value);
            }
            request.call()
        })
    }

    fn send(
        &self,
        method: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        call_with_retry(&format!("{method} {path}"), || {
            self.request(method, path).send_json(body)
        })
    }
}

fn call_with_retry<F>(what: &str, f: F) -> Result<serde_json::Value>
where
    F: Fn() -> std::result::Result<ureq::Response, ureq::Error>,
{
    let mut backoff_ms = INITIAL_BACKOFF_MS;
    for attempt in 1..=MAX_RETRIES {
        match f() {
            Ok(response) => {
                return response.into_json().map_err(|e| {
                    Error::Tracker(format!("failed to parse GitHub response for {what}: {e}"))
                });
            }
            Err(ref e) if attempt < MAX_RETRIES && is_retryable(e) => {
                warn!(
                    attempt,
                    error = %e,
                    backoff_ms,
                    "retrying GitHub API after transient error"
                );
                thread::sleep(Duration::from_millis(backoff_ms));
                backoff_ms *= 2;
            }
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(Error::Tracker(format!(
                    "{what} failed with status {code}: {body}"
                )));
            }
            Err(e) => {
                return Err(Error::Tracker(format!("{what} failed: {e}")));
            }
        }
    }
    unreachable!()
}

/// Only retry rate-limits (429), server errors (5xx), and transport/network errors.
fn is_retryable(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Status(code, _) => *code == 429 || *code >= 500,
        ureq::Error::Transport(_) => true,
    }
}

// ---------------------------------------------------------------------------
// REST response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GhMilestone {
    number: u64,
    title: String,
    description: Option<String>,
    due_on: Option<String>,
    state: String,
}

/// Labels come back as objects, but the API also accepts and may echo bare names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GhLabel {
    Name(String),
    Object { name: Option<String> },
}

impl GhLabel {
    fn into_name(self) -> Option<String> {
        let name = match self {
            GhLabel::Name(name) => Some(name),
            GhLabel::Object { name } => name,
        };
        name.filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    state: String,
    #[serde(default)]
    labels: Vec<GhLabel>,
    assignee: Option<GhUser>,
    pull_request: Option<serde_json::Value>,
    html_url: Option<String>,
}

impl GhIssue {
    /// The issues endpoint also returns pull requests.
    fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
            || self
                .html_url
                .as_deref()
                .is_some_and(|url| url.contains("/pull/"))
    }

    fn into_issue(self) -> Issue {
        Issue {
            title: self.title,
            number: self.number,
            state: IssueState::from_api(&self.state),
            labels: self
                .labels
                .into_iter()
                .filter_map(GhLabel::into_name)
                .collect(),
            assignee: self.assignee.map(|u| u.login),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhCreated {
    number: u64,
}

fn decode<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::Tracker(format!("failed to parse {what}: {e}")))
}

// ---------------------------------------------------------------------------
// GitHubTracker
// ---------------------------------------------------------------------------

pub struct GitHubTracker {
    repository: String,
    api: Box<dyn GitHubApi>,
}

impl GitHubTracker {
    pub fn new(config: &Config) -> Self {
        Self {
            repository: config.repository.clone(),
            api: Box::new(DefaultGitHubApi {
                api_url: config.api_url.clone(),
                token: config.token.clone(),
            }),
        }
    }

    #[cfg(test)]
    fn with_api(repository: &str, api: Box<dyn GitHubApi>) -> Self {
        Self {
            repository: repository.to_string(),
            api,
        }
    }

    fn issues_path(&self) -> String {
        format!("repos/{}/issues", self.repository)
    }

    /// Follow `page=1,2,...` until a page comes back short.
    fn fetch_paged(&self, query: &[(&str, String)]) -> Result<Vec<GhIssue>> {
        let path = self.issues_path();
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let mut paged: Vec<(&str, String)> = query.to_vec();
            paged.push(("per_page", PER_PAGE.to_string()));
            paged.push(("page", page.to_string()));

            let batch: Vec<GhIssue> = decode(self.api.get(&path, &paged)?, "issue list")?;
            let len = batch.len();
            debug!(page, count = len, "fetched issue page");
            items.extend(batch);
            if len < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

impl IssueTracker for GitHubTracker {
    fn get_milestone(&self, number: u64) -> Result<Milestone> {
        let path = format!("repos/{}/milestones/{number}", self.repository);
        let gh: GhMilestone = decode(self.api.get(&path, &[])?, "milestone")?;
        Ok(Milestone {
            title: gh.title,
            description: gh.description,
            due_on: gh.due_on,
            number: gh.number,
            state: MilestoneState::from_api(&gh.state),
        })
    }

    fn fetch_all_issues_for_milestone(&self, number: u64) -> Result<Vec<Issue>> {
        let all = self.fetch_paged(&[
            ("milestone", number.to_string()),
            ("state", "all".to_string()),
        ])?;
        let total_items = all.len();

        let issues: Vec<Issue> = all
            .into_iter()
            .filter(|item| {
                let is_pr = item.is_pull_request();
                debug!(number = item.number, is_pr, title = %item.title, "processing item");
                !is_pr
            })
            .map(GhIssue::into_issue)
            .collect();

        let closed = issues.iter().filter(|i| i.state.is_closed()).count();
        info!(
            total_items,
            issues = issues.len(),
            pull_requests = total_items - issues.len(),
            open = issues.len() - closed,
            closed,
            "fetched milestone issues"
        );
        Ok(issues)
    }

    fn find_planning_issue(&self, label: &str, milestone_title: &str) -> Result<Option<u64>> {
        let candidates = self.fetch_paged(&[
            ("labels", label.to_string()),
            ("state", "open".to_string()),
        ])?;
        let issues: Vec<&GhIssue> = candidates
            .iter()
            .filter(|item| !item.is_pull_request())
            .collect();
        let exact = planning_issue_title(milestone_title);
        let found = issues
            .iter()
            .find(|item| item.title == exact)
            .or_else(|| {
                issues
                    .iter()
                    .find(|item| item.title.contains(milestone_title))
            })
            .map(|item| item.number);
        debug!(label, milestone_title, ?found, "looked up planning issue");
        Ok(found)
    }

    fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<u64> {
        let payload = serde_json::json!({
            "title": title,
            "body": body,
            "labels": labels,
        });
        let created: GhCreated = decode(
            self.api.send("POST", &self.issues_path(), &payload)?,
            "created issue",
        )?;
        Ok(created.number)
    }

    fn update_issue_body(&self, number: u64, body: &str) -> Result<()> {
        let path = format!("{}/{number}", self.issues_path());
        self.api
            .send("PATCH", &path, &serde_json::json!({ "body": body }))?;
        Ok(())
    }
}
