//! Server-rendered HTML for every screen. Each page tags its `<body>` with
//! `data-page` so responses can be told apart without parsing markup.

use std::fmt::Write;

use axum::response::Html;
use uuid::Uuid;

use crate::forms::FormErrors;
use crate::routes::middleware_auth::SessionUser;
use crate::routes::tasks::dto::{TaskForm, TITLE_MAX_CHARS};
use crate::routes::tasks::listing::{ListedTask, TaskListing};
use crate::routes::tasks::model::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFormKind {
    Create,
    Update(Uuid),
}

impl TaskFormKind {
    fn name(self) -> &'static str {
        match self {
            TaskFormKind::Create => "create",
            TaskFormKind::Update(_) => "update",
        }
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(page: &str, title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · To Do</title>
</head>
<body data-page="{page}">
{body}
</body>
</html>
"#,
        title = escape(title),
        page = page,
        body = body,
    ))
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    let messages = errors.get(field);
    if messages.is_empty() {
        return String::new();
    }

    let mut out = String::from(r#"<ul class="errorlist">"#);
    for message in messages {
        let _ = write!(out, "<li>{}</li>", escape(message));
    }
    out.push_str("</ul>");
    out
}

pub fn login(username: &str, next: Option<&str>, error: Option<&str>) -> Html<String> {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    let next = next
        .map(|n| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(n)))
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Login</h1>
{error}
<form method="post" action="/">
  <label>Username <input type="text" name="username" value="{username}" autofocus required></label>
  <label>Password <input type="password" name="password" required></label>
  {next}
  <button type="submit">Login</button>
</form>
<p>Don't have an account? <a href="/register/">Register</a></p>"#,
        error = error,
        username = escape(username),
        next = next,
    );

    layout("login", "Login", &body)
}

pub fn register(username: &str, errors: &FormErrors) -> Html<String> {
    let body = format!(
        r#"<h1>Register</h1>
<form method="post" action="/register/">
  <label>Username <input type="text" name="username" value="{username}" maxlength="150" autofocus required></label>
  {username_errors}
  <label>Password <input type="password" name="password1" required></label>
  {password1_errors}
  <label>Password confirmation <input type="password" name="password2" required></label>
  {password2_errors}
  <button type="submit">Register</button>
</form>
<p>Already have an account? <a href="/">Login</a></p>"#,
        username = escape(username),
        username_errors = field_errors(errors, "username"),
        password1_errors = field_errors(errors, "password1"),
        password2_errors = field_errors(errors, "password2"),
    );

    layout("register", "Register", &body)
}

fn hours_left_label(hours_left: Option<f64>) -> String {
    match hours_left {
        None => String::new(),
        Some(hours) if hours < 0.0 => format!(
            r#"<span class="due overdue">overdue by {:.1} h</span>"#,
            -hours
        ),
        Some(hours) => format!(r#"<span class="due">{:.1} h left</span>"#, hours),
    }
}

fn task_row(listed: &ListedTask) -> String {
    let task = &listed.task;
    let title = if task.is_completed {
        format!("<s>{}</s>", escape(&task.title))
    } else {
        escape(&task.title)
    };
    let toggle_label = if task.is_completed { "Undo" } else { "Done" };

    format!(
        r#"  <li class="task{completed}" data-task-id="{id}">
    <form method="post" action="/my-tasks/task-toggle-status/{id}/"><button type="submit">{toggle_label}</button></form>
    <span class="title">{title}</span>
    <time datetime="{created_iso}">{created}</time>
    {hours}
    <a href="/my-tasks/task-update/{id}/">Edit</a>
    <a href="/my-tasks/task-delete/{id}/">Delete</a>
  </li>
"#,
        completed = if task.is_completed { " completed" } else { "" },
        id = task.id,
        toggle_label = toggle_label,
        title = title,
        created_iso = task.created_at.to_rfc3339(),
        created = task.created_at.format("%b %d, %Y %H:%M"),
        hours = hours_left_label(listed.hours_left),
    )
}

pub fn task_list(user: &SessionUser, listing: &TaskListing) -> Html<String> {
    let mut rows = String::new();
    for listed in &listing.tasks {
        rows.push_str(&task_row(listed));
    }
    if rows.is_empty() {
        rows.push_str("  <li class=\"empty\">No tasks found.</li>\n");
    }

    let plural = if listing.incompleted_count == 1 { "" } else { "s" };

    let body = format!(
        r#"<header>
  <h1>Hello, {username}</h1>
  <p class="summary" data-incompleted-count="{incompleted}" data-completed-count="{completed}">You have <b>{incompleted}</b> incomplete task{plural} and <b>{completed}</b> completed.</p>
  <form method="post" action="/logout/"><button type="submit">Logout</button></form>
</header>
<form method="get" action="/my-tasks/" class="search">
  <input type="text" name="search-area" value="{search}" placeholder="Search your tasks">
  <button type="submit">Search</button>
  <button type="submit" name="clear" value="true">Clear</button>
</form>
<a href="/my-tasks/task-create/">Add task</a>
<ul class="tasks">
{rows}</ul>"#,
        username = escape(&user.username),
        incompleted = listing.incompleted_count,
        completed = listing.completed_count,
        plural = plural,
        search = escape(&listing.search_input),
        rows = rows,
    );

    layout("task_list", "My tasks", &body)
}

pub fn task_form(kind: TaskFormKind, form: &TaskForm, errors: &FormErrors) -> Html<String> {
    let (heading, action, completed_field) = match kind {
        TaskFormKind::Create => ("Create task", "/my-tasks/task-create/".to_string(), String::new()),
        TaskFormKind::Update(id) => (
            "Update task",
            format!("/my-tasks/task-update/{}/", id),
            format!(
                r#"<label><input type="checkbox" name="is_completed"{}> Completed</label>"#,
                if form.completed_checked() { " checked" } else { "" }
            ),
        ),
    };

    let body = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}" data-form-type="{form_type}">
  <label>Title <input type="text" name="title" value="{title}" maxlength="{title_max}" required></label>
  {title_errors}
  <label>Description <textarea name="description" rows="5">{description}</textarea></label>
  {description_errors}
  <label>Due date <input type="datetime-local" name="due_date" value="{due_date}"></label>
  {due_date_errors}
  {completed_field}
  <button type="submit">Save</button>
</form>
<a href="/my-tasks/">Back</a>"#,
        heading = heading,
        action = action,
        form_type = kind.name(),
        title = escape(&form.title),
        title_max = TITLE_MAX_CHARS,
        title_errors = field_errors(errors, "title"),
        description = escape(&form.description),
        description_errors = field_errors(errors, "description"),
        due_date = escape(&form.due_date),
        due_date_errors = field_errors(errors, "due_date"),
        completed_field = completed_field,
    );

    layout("task_form", heading, &body)
}

pub fn task_confirm_delete(task: &Task) -> Html<String> {
    let body = format!(
        r#"<h1>Delete task</h1>
<p>Are you sure you want to delete "{title}"?</p>
<form method="post" action="/my-tasks/task-delete/{id}/">
  <button type="submit">Delete</button>
</form>
<a href="/my-tasks/">Cancel</a>"#,
        title = escape(&task.title),
        id = task.id,
    );

    layout("task_confirm_delete", "Delete task", &body)
}

pub fn not_found() -> Html<String> {
    layout(
        "not_found",
        "Not found",
        r#"<h1>Not found</h1>
<p>The page you requested does not exist.</p>
<a href="/my-tasks/">Back to your tasks</a>"#,
    )
}

pub fn server_error() -> Html<String> {
    layout(
        "server_error",
        "Server error",
        "<h1>Something went wrong</h1>\n<p>Please try again later.</p>",
    )
}
