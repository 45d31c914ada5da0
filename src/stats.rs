use serde::Serialize;

use crate::tracker::Issue;

/// Default number of cells in the progress bar.
pub const DEFAULT_PROGRESS_WIDTH: usize = 20;

const FILLED: char = '█';
const EMPTY: char = '░';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IssueStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    /// Completion percentage, rounded half up. Zero for an empty milestone.
    pub percent: usize,
}

pub fn compute_stats(issues: &[Issue]) -> IssueStats {
    let total = issues.len();
    let completed = issues.iter().filter(|i| i.state.is_closed()).count();
    IssueStats {
        total,
        completed,
        in_progress: total - completed,
        percent: round_ratio(completed * 100, total),
    }
}

/// Render `█████░░░░░ 50%` style bar with `width` cells.
pub fn progress_bar(stats: &IssueStats, width: usize) -> String {
    let filled = if stats.total == 0 {
        0
    } else {
        round_ratio(stats.percent * width, 100).min(width)
    };
    let mut bar = String::with_capacity(width * 3 + 6);
    bar.extend(std::iter::repeat_n(FILLED, filled));
    bar.extend(std::iter::repeat_n(EMPTY, width - filled));
    bar.push_str(&format!(" {}%", stats.percent));
    bar
}

/// `round(numerator / denominator)` with halves rounded up; 0 when the
/// denominator is 0.
fn round_ratio(numerator: usize, denominator: usize) -> usize {
    if denominator == 0 {
        return 0;
    }
    (numerator * 2 + denominator) / (denominator * 2)
}
