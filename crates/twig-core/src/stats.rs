//! Progress statistics

use crate::TodoRecord;
use serde::Serialize;

/// Completion counts. Top-level fields ignore subtasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Rounded to the nearest integer, 0 for an empty list
    pub completion_percentage: u32,
    pub total_including_subtasks: usize,
    pub completed_including_subtasks: usize,
}

impl Statistics {
    pub fn compute(todos: &[TodoRecord]) -> Self {
        let top_level: Vec<&TodoRecord> = todos.iter().filter(|t| !t.is_subtask()).collect();
        let total = top_level.len();
        let completed = top_level.iter().filter(|t| t.completed).count();

        Self {
            total,
            completed,
            pending: total - completed,
            completion_percentage: percentage(completed, total),
            total_including_subtasks: todos.len(),
            completed_including_subtasks: todos.iter().filter(|t| t.completed).count(),
        }
    }
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    // Integer half-up rounding of part * 100 / whole
    ((part * 200 + whole) / (whole * 2)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: &str, completed: bool, parent: Option<&str>) -> TodoRecord {
        let mut t = TodoRecord::new(id.into(), id, None);
        t.set_completed(completed);
        t.parent_id = parent.map(str::to_string);
        t
    }

    #[test]
    fn test_empty_is_zero_percent() {
        let stats = Statistics::compute(&[]);
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.completion_percentage, 0);
    }

    #[test]
    fn test_subtasks_excluded_from_top_level() {
        let todos = vec![
            todo("a", true, None),
            todo("b", false, None),
            todo("a1", true, Some("a")),
            todo("a2", true, Some("a")),
        ];
        let stats = Statistics::compute(&todos);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completion_percentage, 50);
        assert_eq!(stats.total_including_subtasks, 4);
        assert_eq!(stats.completed_including_subtasks, 3);
    }

    #[test]
    fn test_percentage_rounds_to_nearest() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5 rounds up
        assert_eq!(percentage(3, 3), 100);
    }
}
