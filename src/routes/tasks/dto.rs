use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::model::{Task, TaskFields};
use crate::forms::{FormErrors, REQUIRED};

pub const TITLE_MAX_CHARS: usize = 100;
const DUE_DATE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const NAIVE_FORMATS: [&str; 4] = [
    DUE_DATE_INPUT_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Raw task form as posted by the browser. Every field is kept as text
/// so an invalid submission can be redisplayed exactly as typed.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    pub is_completed: Option<String>,
}

impl TaskForm {
    /// Prefills the update form from a stored task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task
                .due_date
                .map(|due| due.format(DUE_DATE_INPUT_FORMAT).to_string())
                .unwrap_or_default(),
            is_completed: task.is_completed.then(|| "on".to_string()),
        }
    }

    pub fn completed_checked(&self) -> bool {
        match self.is_completed.as_deref() {
            None => false,
            Some(value) => !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "" | "false" | "off" | "0"
            ),
        }
    }

    /// Create form: the completion flag is not offered and always starts
    /// out false.
    pub fn validate_create(&self, now: DateTime<Utc>) -> Result<TaskFields, FormErrors> {
        let mut fields = self.validate(now)?;
        fields.is_completed = false;
        Ok(fields)
    }

    /// Update form: every editable field is replaced by the submission.
    pub fn validate_update(&self, now: DateTime<Utc>) -> Result<TaskFields, FormErrors> {
        self.validate(now)
    }

    fn validate(&self, now: DateTime<Utc>) -> Result<TaskFields, FormErrors> {
        let mut errors = FormErrors::new();

        let title = self.title.trim();
        let title_chars = title.chars().count();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else if title_chars > TITLE_MAX_CHARS {
            errors.add(
                "title",
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    TITLE_MAX_CHARS, title_chars
                ),
            );
        }

        let due_date = match parse_due_date(&self.due_date) {
            Ok(Some(due)) if due < now => {
                errors.add("due_date", "Due date cannot be in the past.");
                None
            }
            Ok(due) => due,
            Err(()) => {
                errors.add("due_date", "Enter a valid date/time.");
                None
            }
        };

        let description = Some(self.description.as_str())
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string);

        errors.finish(TaskFields {
            title: title.to_string(),
            description,
            is_completed: self.completed_checked(),
            due_date,
        })
    }
}

/// Empty input means "no due date". Naive values from a
/// `datetime-local` input are taken as UTC.
fn parse_due_date(raw: &str) -> Result<Option<DateTime<Utc>>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(due) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(due.with_timezone(&Utc)));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or(())
}

/// Query string of the list page. Both keys may repeat.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "search-area", default)]
    pub search_area: Vec<String>,
    #[serde(default)]
    pub clear: Vec<String>,
}

impl ListQuery {
    /// `clear` wins over any search term; the last term counts and an empty
    /// one is no filter.
    pub fn search_term(&self) -> Option<&str> {
        if !self.clear.is_empty() {
            return None;
        }
        self.search_area
            .last()
            .map(String::as_str)
            .filter(|term| !term.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn form(title: &str, due_date: &str) -> TaskForm {
        TaskForm {
            title: title.to_string(),
            due_date: due_date.to_string(),
            ..TaskForm::default()
        }
    }

    fn input(at: DateTime<Utc>) -> String {
        at.format(DUE_DATE_INPUT_FORMAT).to_string()
    }

    #[test]
    fn valid_form_with_future_due_date() {
        let due = now() + Duration::days(1);
        let mut submitted = form("New Task", &input(due));
        submitted.description = "This is a test description.".to_string();

        let fields = submitted.validate_create(now()).unwrap();

        assert_eq!(fields.title, "New Task");
        assert_eq!(fields.description.as_deref(), Some("This is a test description."));
        assert_eq!(fields.due_date, Some(due));
        assert!(!fields.is_completed);
    }

    #[test]
    fn missing_due_date_is_valid() {
        let fields = form("Read a book", "").validate_create(now()).unwrap();
        assert_eq!(fields.due_date, None);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_title_is_required(#[case] title: &str) {
        let errors = form(title, "").validate_create(now()).unwrap_err();
        assert_eq!(errors.get("title"), [REQUIRED]);
    }

    #[test]
    fn title_length_is_counted_in_characters() {
        let exactly_max = "é".repeat(TITLE_MAX_CHARS);
        assert!(form(&exactly_max, "").validate_create(now()).is_ok());

        let too_long = "a".repeat(TITLE_MAX_CHARS + 1);
        let errors = form(&too_long, "").validate_create(now()).unwrap_err();
        assert!(errors.get("title")[0].contains("at most 100 characters (it has 101)"));
    }

    #[test]
    fn past_due_date_is_rejected() {
        let due = now() - Duration::days(1);
        let errors = form("Past Task", &input(due)).validate_create(now()).unwrap_err();

        assert!(errors.has("due_date"));
        assert!(!errors.has("title"));
    }

    #[test]
    fn due_date_equal_to_now_is_accepted() {
        let fields = form("Now", &input(now())).validate_create(now()).unwrap();
        assert_eq!(fields.due_date, Some(now()));
    }

    #[rstest]
    #[case("2026-03-11T09:30", 2026, 3, 11, 9, 30, 0)]
    #[case("2026-03-11T09:30:15", 2026, 3, 11, 9, 30, 15)]
    #[case("2026-03-11 09:30", 2026, 3, 11, 9, 30, 0)]
    #[case("2026-03-11T11:30:00+02:00", 2026, 3, 11, 9, 30, 0)]
    fn due_date_formats(
        #[case] raw: &str,
        #[case] y: i32,
        #[case] mo: u32,
        #[case] d: u32,
        #[case] h: u32,
        #[case] mi: u32,
        #[case] s: u32,
    ) {
        let expected = Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap();
        assert_eq!(parse_due_date(raw), Ok(Some(expected)));
    }

    #[test]
    fn garbage_due_date_is_reported() {
        let errors = form("Task", "next tuesday").validate_create(now()).unwrap_err();
        assert_eq!(errors.get("due_date"), ["Enter a valid date/time."]);
    }

    #[test]
    fn blank_description_becomes_none() {
        let mut submitted = form("Task with Blank Description", "");
        submitted.description = "  ".to_string();

        let fields = submitted.validate_create(now()).unwrap();
        assert_eq!(fields.description, None);
    }

    #[test]
    fn create_ignores_completion_flag() {
        let mut submitted = form("Sneaky", "");
        submitted.is_completed = Some("on".to_string());

        assert!(!submitted.validate_create(now()).unwrap().is_completed);
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some("on"), true)]
    #[case(Some("true"), true)]
    #[case(Some("false"), false)]
    #[case(Some(""), false)]
    fn update_reads_checkbox(#[case] value: Option<&str>, #[case] expected: bool) {
        let mut submitted = form("Existing Task", "");
        submitted.is_completed = value.map(str::to_string);

        assert_eq!(submitted.validate_update(now()).unwrap().is_completed, expected);
    }

    #[test]
    fn update_rejects_past_due_date() {
        let mut submitted = form("Task with Past Due Date", &input(now() - Duration::days(1)));
        submitted.is_completed = Some("on".to_string());

        let errors = submitted.validate_update(now()).unwrap_err();
        assert!(errors.has("due_date"));
    }

    #[test]
    fn prefill_round_trips_through_validation() {
        let task = Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Existing Task".to_string(),
            description: Some("Some description".to_string()),
            is_completed: true,
            created_at: now(),
            due_date: Some(now() + Duration::days(2)),
        };

        let fields = TaskForm::from_task(&task).validate_update(now()).unwrap();

        assert_eq!(fields.title, task.title);
        assert_eq!(fields.description, task.description);
        assert_eq!(fields.due_date, task.due_date);
        assert!(fields.is_completed);
    }

    #[rstest]
    #[case(None, None, None)]
    #[case(Some(""), None, None)]
    #[case(Some("milk"), None, Some("milk"))]
    #[case(Some("milk"), Some("true"), None)]
    #[case(None, Some(""), None)]
    fn search_term_policy(
        #[case] search: Option<&str>,
        #[case] clear: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let query = ListQuery {
            search_area: search.map(str::to_string).into_iter().collect(),
            clear: clear.map(str::to_string).into_iter().collect(),
        };
        assert_eq!(query.search_term(), expected);
    }

    #[test]
    fn repeated_search_term_keeps_the_last() {
        let query = ListQuery {
            search_area: vec!["milk".to_string(), "pay".to_string()],
            clear: Vec::new(),
        };
        assert_eq!(query.search_term(), Some("pay"));
    }
}
