use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Error, Result};
use crate::tracker::{Issue, Milestone};

use super::{ReportOptions, build_view, render_markdown};

const TEMPLATE_NAME: &str = "planning";

/// Renders planning reports either with the built-in layout or with a
/// user-supplied `upon` template.
///
/// Custom templates see the fields of [`super::PlanningView`], e.g.
/// `{{ title }}`, `{{ stats.total }}`, `{% for section in sections %}`.
pub struct ReportRenderer {
    engine: Option<upon::Engine<'static>>,
}

impl ReportRenderer {
    pub fn builtin() -> Self {
        Self { engine: None }
    }

    /// Use the template file at `path` if given, otherwise the built-in layout.
    pub fn new(template_path: Option<&Path>) -> Result<Self> {
        match template_path {
            Some(path) => Self::from_template_file(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn from_template_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Template(format!("failed to read template {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), "using custom report template");
        Self::from_template_source(source)
    }

    pub fn from_template_source(source: impl Into<String>) -> Result<Self> {
        let mut engine = upon::Engine::new();
        engine
            .add_template(TEMPLATE_NAME, source.into())
            .map_err(|e| Error::Template(format!("failed to compile template: {e}")))?;
        Ok(Self {
            engine: Some(engine),
        })
    }

    pub fn is_builtin(&self) -> bool {
        self.engine.is_none()
    }

    /// Render the report body. The built-in layout never fails; custom
    /// templates fail on references to unknown fields.
    pub fn render(
        &self,
        milestone: &Milestone,
        issues: &[Issue],
        options: &ReportOptions,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let view = build_view(milestone, issues, options, now);
        match &self.engine {
            None => Ok(render_markdown(&view)),
            Some(engine) => engine
                .template(TEMPLATE_NAME)
                .render(&view)
                .to_string()
                .map_err(|e| Error::Template(format!("failed to render template: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{IssueState, MilestoneState};
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn milestone() -> Milestone {
        Milestone {
            title: "Sprint 4".to_string(),
            description: None,
            due_on: None,
            number: 4,
            state: MilestoneState::Open,
        }
    }

    fn issues() -> Vec<Issue> {
        vec![
            Issue {
                title: "Crash on start".to_string(),
                number: 11,
                state: IssueState::Closed,
                labels: vec!["bug".to_string()],
                assignee: Some("dana".to_string()),
            },
            Issue {
                title: "Write guide".to_string(),
                number: 12,
                state: IssueState::Open,
                labels: vec!["documentation".to_string()],
                assignee: None,
            },
        ]
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_builtin_matches_render_planning_content() {
        let renderer = ReportRenderer::builtin();
        assert!(renderer.is_builtin());
        let options = ReportOptions::default();
        let rendered = renderer
            .render(&milestone(), &issues(), &options, now())
            .unwrap();
        let direct = super::super::render_planning_content(&milestone(), &issues(), &options, now());
        assert_eq!(rendered, direct);
    }

    #[test]
    fn test_custom_template_sees_view_fields() {
        let renderer = ReportRenderer::from_template_source(
            "{{ title }}: {{ stats.completed }}/{{ stats.total }}\n\
             {% for section in sections %}[{{ section.name }}]\
             {% for issue in section.issues %} #{{ issue.number }} {{ issue.title }}{% endfor %}\n\
             {% endfor %}",
        )
        .unwrap();
        assert!(!renderer.is_builtin());
        let out = renderer
            .render(&milestone(), &issues(), &ReportOptions::default(), now())
            .unwrap();
        assert_eq!(
            out,
            "Sprint 4: 1/2\n[bug] #11 Crash on start\n[documentation] #12 Write guide\n"
        );
    }

    #[test]
    fn test_template_syntax_error() {
        let err = ReportRenderer::from_template_source("{% if title %}unterminated").err();
        assert!(matches!(err, Some(Error::Template(_))));
    }

    #[test]
    fn test_template_unknown_field_errors_on_render() {
        let renderer = ReportRenderer::from_template_source("{{ no_such_field }}").unwrap();
        let err = renderer
            .render(&milestone(), &issues(), &ReportOptions::default(), now())
            .unwrap_err();
        assert!(err.to_string().contains("failed to render template"));
    }

    #[test]
    fn test_template_file_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.md");
        fs::write(&path, "Milestone #{{ milestone_number }}").unwrap();
        let renderer = ReportRenderer::new(Some(&path)).unwrap();
        let out = renderer
            .render(&milestone(), &[], &ReportOptions::default(), now())
            .unwrap();
        assert_eq!(out, "Milestone #4");
    }

    #[test]
    fn test_missing_template_file() {
        let dir = TempDir::new().unwrap();
        let err = ReportRenderer::new(Some(&dir.path().join("missing.md"))).err();
        match err {
            Some(Error::Template(msg)) => assert!(msg.contains("failed to read template")),
            other => panic!("expected template error, got {other:?}"),
        }
    }
}
