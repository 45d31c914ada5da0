use crate::tracker::Issue;

/// Name of the fallback bucket for issues matching no category. Reserved:
/// it cannot be configured as a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// How a category name is compared against an issue's label names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Case-insensitive equality.
    #[default]
    Exact,
    /// Case-insensitive containment: category `bug` matches label `bugfix`.
    Substring,
}

impl MatchPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "exact" => Some(MatchPolicy::Exact),
            "substring" => Some(MatchPolicy::Substring),
            _ => None,
        }
    }

    pub fn matches(self, category: &str, label: &str) -> bool {
        let category = category.to_lowercase();
        let label = label.to_lowercase();
        match self {
            MatchPolicy::Exact => label == category,
            MatchPolicy::Substring => label.contains(&category),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<'a> {
    pub name: String,
    pub issues: Vec<&'a Issue>,
}

/// Issues grouped by category, in configured category order, plus the
/// uncategorized leftovers.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedIssues<'a> {
    buckets: Vec<Bucket<'a>>,
    uncategorized: Vec<&'a Issue>,
}

impl<'a> CategorizedIssues<'a> {
    /// Category buckets in configured order, including empty ones.
    pub fn buckets(&self) -> &[Bucket<'a>] {
        &self.buckets
    }

    /// Look up a category bucket by name (case-insensitive).
    pub fn get(&self, category: &str) -> Option<&[&'a Issue]> {
        self.buckets
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(category))
            .map(|b| b.issues.as_slice())
    }

    pub fn uncategorized(&self) -> &[&'a Issue] {
        &self.uncategorized
    }

    /// Number of issues across all buckets, uncategorized included.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.issues.len()).sum::<usize>() + self.uncategorized.len()
    }
}

/// Assign each issue to the first category (in `categories` order) matching
/// one of its labels, or to the uncategorized bucket. Blank category names
/// are ignored.
pub fn categorize<'a>(
    issues: &'a [Issue],
    categories: &[String],
    policy: MatchPolicy,
) -> CategorizedIssues<'a> {
    let mut buckets: Vec<Bucket<'a>> = categories
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| Bucket {
            name: name.clone(),
            issues: Vec::new(),
        })
        .collect();
    let mut uncategorized = Vec::new();

    for issue in issues {
        let slot = buckets.iter().position(|bucket| {
            issue
                .labels
                .iter()
                .any(|label| policy.matches(&bucket.name, label))
        });
        match slot {
            Some(idx) => buckets[idx].issues.push(issue),
            None => uncategorized.push(issue),
        }
    }

    CategorizedIssues {
        buckets,
        uncategorized,
    }
}
