use chrono::{DateTime, Utc};

use super::model::Task;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ListedTask {
    pub task: Task,
    /// Negative once the due date has passed.
    pub hours_left: Option<f64>,
}

/// Everything the list page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskListing {
    pub tasks: Vec<ListedTask>,
    pub search_input: String,
    pub incompleted_count: usize,
    pub completed_count: usize,
}

impl TaskListing {
    /// `tasks` must already be restricted to one owner. Counts cover all of
    /// them; only the returned rows are narrowed by `search`.
    pub fn build(tasks: Vec<Task>, search: Option<&str>, now: DateTime<Utc>) -> Self {
        let completed_count = tasks.iter().filter(|t| t.is_completed).count();
        let incompleted_count = tasks.len() - completed_count;

        let needle = search.map(str::to_lowercase);
        let tasks = tasks
            .into_iter()
            .filter(|task| match &needle {
                Some(needle) => task.title.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .map(|task| ListedTask {
                hours_left: task.due_date.map(|due| hours_between(now, due)),
                task,
            })
            .collect();

        Self {
            tasks,
            search_input: search.unwrap_or_default().to_string(),
            incompleted_count,
            completed_count,
        }
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_HOUR
}
