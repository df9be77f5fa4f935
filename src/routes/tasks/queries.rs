use chrono::Utc;
use sqlx::{Result, SqlitePool};
use uuid::Uuid;

use super::model::{Task, TaskFields};

// Every statement filters on user_id as well as id, so a task belonging to
// someone else is indistinguishable from one that does not exist.

pub async fn create_task(pool: &SqlitePool, user_id: Uuid, fields: &TaskFields) -> Result<Task> {
    let rec = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (id, user_id, title, description, is_completed, created_at, due_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, user_id, title, description, is_completed, created_at, due_date
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.is_completed)
    .bind(Utc::now())
    .bind(fields.due_date)
    .fetch_one(pool)
    .await?;

    Ok(rec)
}

/// Newest first.
pub async fn list_tasks(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Task>> {
    let rec = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, user_id, title, description, is_completed, created_at, due_date
        FROM tasks
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rec)
}

pub async fn find_task(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<Option<Task>> {
    let rec = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, user_id, title, description, is_completed, created_at, due_date
        FROM tasks
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(rec)
}

pub async fn update_task(
    pool: &SqlitePool,
    user_id: Uuid,
    id: Uuid,
    fields: &TaskFields,
) -> Result<Option<Task>> {
    let rec = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET
            title = ?,
            description = ?,
            is_completed = ?,
            due_date = ?
        WHERE id = ? AND user_id = ?
        RETURNING id, user_id, title, description, is_completed, created_at, due_date
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.is_completed)
    .bind(fields.due_date)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(rec)
}

/// Flips the completion flag in one statement, so concurrent toggles never
/// read a stale value.
pub async fn toggle_task(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<Option<Task>> {
    let rec = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET is_completed = NOT is_completed
        WHERE id = ? AND user_id = ?
        RETURNING id, user_id, title, description, is_completed, created_at, due_date
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(rec)
}

/// Returns whether a row was removed.
pub async fn delete_task(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM tasks
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
