//! Task CRUD and per-column position bookkeeping.
//!
//! Within each status column the active positions form a contiguous
//! zero-based sequence. Every operation that can disturb that sequence
//! (create, move, reorder, delete) runs inside one rusqlite transaction
//! so a mid-operation failure never leaves duplicate or missing slots.

use super::{Database, now_ms};
use crate::error::ApiError;
use crate::types::{NewTask, Priority, Task, TaskStatus, TaskWithAssignee};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use std::collections::{HashMap, HashSet};

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let priority: String = row.get("priority")?;
    let status: String = row.get("status")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority: Priority::parse(&priority).unwrap_or_default(),
        estimated_time: row.get("estimated_time")?,
        status: TaskStatus::parse(&status).unwrap_or_default(),
        position: row.get("position")?,
        assignee_id: row.get("assignee_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Number of tasks currently in a status column.
fn column_len(conn: &Connection, status: TaskStatus) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Task ids of a column in display order.
fn column_ids(conn: &Connection, status: TaskStatus) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT id FROM tasks WHERE status = ?1 ORDER BY position")?;
    let ids = stmt
        .query_map(params![status.as_str()], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

impl Database {
    /// Create one or more tasks, appending each to the end of its target
    /// column in input order.
    pub fn create_tasks(&self, inputs: &[NewTask]) -> Result<Vec<Task>> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut created = Vec::with_capacity(inputs.len());

            for input in inputs {
                // Recomputed per insert so a batch into one column gets
                // consecutive slots.
                let position = column_len(&tx, input.status)?;

                tx.execute(
                    "INSERT INTO tasks (
                        title, description, priority, estimated_time,
                        status, position, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        &input.title,
                        &input.description,
                        input.priority.as_str(),
                        input.estimated_time,
                        input.status.as_str(),
                        position,
                        now,
                        now,
                    ],
                )?;

                created.push(Task {
                    id: tx.last_insert_rowid(),
                    title: input.title.clone(),
                    description: input.description.clone(),
                    priority: input.priority,
                    estimated_time: input.estimated_time,
                    status: input.status,
                    position,
                    assignee_id: None,
                    created_at: now,
                    updated_at: now,
                });
            }

            tx.commit()?;
            Ok(created)
        })
    }

    /// All tasks joined with their assignee's display fields, ordered by
    /// column, position, then recency as a tiebreak.
    pub fn list_tasks(&self) -> Result<Vec<TaskWithAssignee>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    t.*,
                    u.name AS assignee_name,
                    u.email AS assignee_email,
                    u.avatar_url AS assignee_avatar
                 FROM tasks t
                 LEFT JOIN users u ON t.assignee_id = u.id
                 ORDER BY t.status, t.position, t.created_at DESC",
            )?;

            let tasks = stmt
                .query_map([], |row| {
                    Ok(TaskWithAssignee {
                        task: parse_task_row(row)?,
                        assignee_name: row.get("assignee_name")?,
                        assignee_email: row.get("assignee_email")?,
                        assignee_avatar: row.get("assignee_avatar")?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Move a task within its column or to another column.
    ///
    /// Same column: the old slot is removed and the task re-inserted at
    /// `target_position` (default: column end), shifting the interval in
    /// between by one. Moving to the current slot is a no-op.
    ///
    /// Cross column: the source gap is closed (positions past the vacated
    /// slot decrement) and destination positions at or past the insertion
    /// point shift up. `target_position` defaults to the destination end
    /// and is clamped to the legal range either way.
    ///
    /// Returns `None` if the task does not exist; a concurrent delete must
    /// surface as not-found, never as an implicit re-create.
    pub fn move_task(
        &self,
        task_id: i64,
        target_status: TaskStatus,
        target_position: Option<i64>,
    ) -> Result<Option<Task>> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(current) = get_task_internal(&tx, task_id)? else {
                return Ok(None);
            };

            if target_status == current.status {
                let len = column_len(&tx, target_status)?;
                let target = target_position.unwrap_or(len - 1).clamp(0, len - 1);

                if target == current.position {
                    // Same slot: nothing to do.
                    tx.commit()?;
                    return Ok(Some(current));
                }

                if target > current.position {
                    tx.execute(
                        "UPDATE tasks SET position = position - 1
                         WHERE status = ?1 AND position > ?2 AND position <= ?3",
                        params![target_status.as_str(), current.position, target],
                    )?;
                } else {
                    tx.execute(
                        "UPDATE tasks SET position = position + 1
                         WHERE status = ?1 AND position >= ?2 AND position < ?3",
                        params![target_status.as_str(), target, current.position],
                    )?;
                }

                tx.execute(
                    "UPDATE tasks SET position = ?1, updated_at = ?2 WHERE id = ?3",
                    params![target, now, task_id],
                )?;
            } else {
                let dest_len = column_len(&tx, target_status)?;
                let target = target_position.unwrap_or(dest_len).clamp(0, dest_len);

                // Close the gap in the source column.
                tx.execute(
                    "UPDATE tasks SET position = position - 1
                     WHERE status = ?1 AND position > ?2",
                    params![current.status.as_str(), current.position],
                )?;

                // Make room in the destination column.
                tx.execute(
                    "UPDATE tasks SET position = position + 1
                     WHERE status = ?1 AND position >= ?2",
                    params![target_status.as_str(), target],
                )?;

                tx.execute(
                    "UPDATE tasks SET status = ?1, position = ?2, updated_at = ?3
                     WHERE id = ?4",
                    params![target_status.as_str(), target, now, task_id],
                )?;
            }

            let updated = get_task_internal(&tx, task_id)?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Bulk-assign positions within one column after a client-side drag.
    ///
    /// The mentioned tasks are ranked by their requested position; column
    /// tasks that are not mentioned keep their relative order after them.
    /// A mentioned id that is not in the column, or mentioned twice, fails
    /// the whole batch.
    pub fn reorder_column(&self, status: TaskStatus, positions: &[(i64, i64)]) -> Result<()> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing = column_ids(&tx, status)?;

            let mut seen = HashSet::with_capacity(positions.len());
            for (id, _) in positions {
                if !existing.contains(id) {
                    return Err(ApiError::invalid_value(
                        "positions",
                        format!("Task {} is not in column {}", id, status.as_str()),
                    )
                    .into());
                }
                // A repeated id would consume two ranks and leave a hole.
                if !seen.insert(*id) {
                    return Err(ApiError::invalid_value(
                        "positions",
                        format!("Task {} appears more than once", id),
                    )
                    .into());
                }
            }

            let mut ordered: Vec<(i64, i64)> = positions.to_vec();
            ordered.sort_by_key(|&(_, pos)| pos);

            let mut rank: i64 = 0;
            for (id, _) in &ordered {
                tx.execute(
                    "UPDATE tasks SET position = ?1, updated_at = ?2 WHERE id = ?3",
                    params![rank, now, id],
                )?;
                rank += 1;
            }

            for id in &existing {
                if !positions.iter().any(|(pid, _)| pid == id) {
                    tx.execute(
                        "UPDATE tasks SET position = ?1 WHERE id = ?2",
                        params![rank, id],
                    )?;
                    rank += 1;
                }
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Delete a single task, closing the gap it leaves in its column.
    pub fn delete_task(&self, task_id: i64) -> Result<Option<Task>> {
        let mut deleted = self.delete_tasks(&[task_id])?;
        Ok(deleted.pop())
    }

    /// Delete several tasks at once. Returns the deleted rows; ids that do
    /// not exist are skipped and duplicate ids count once.
    ///
    /// Gap-closing runs per affected column in ascending order of vacated
    /// positions, with each threshold adjusted by the slots already removed
    /// below it, so a multi-delete within one column never double-shifts.
    pub fn delete_tasks(&self, task_ids: &[i64]) -> Result<Vec<Task>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            // Dedupe up front: a repeated id must not close its gap twice.
            let mut victims = Vec::new();
            let mut seen = HashSet::with_capacity(task_ids.len());
            for &id in task_ids {
                if !seen.insert(id) {
                    continue;
                }
                if let Some(task) = get_task_internal(&tx, id)? {
                    victims.push(task);
                }
            }

            for task in &victims {
                tx.execute("DELETE FROM tasks WHERE id = ?1", params![task.id])?;
            }

            let mut vacated: HashMap<TaskStatus, Vec<i64>> = HashMap::new();
            for task in &victims {
                vacated.entry(task.status).or_default().push(task.position);
            }

            for (status, mut positions) in vacated {
                positions.sort_unstable();
                for (already_removed, pos) in positions.iter().enumerate() {
                    tx.execute(
                        "UPDATE tasks SET position = position - 1
                         WHERE status = ?1 AND position > ?2",
                        params![status.as_str(), pos - already_removed as i64],
                    )?;
                }
            }

            tx.commit()?;
            Ok(victims)
        })
    }

    /// Set or clear a task's assignee. Position is untouched.
    ///
    /// A non-null assignee must exist in the users table; the original
    /// left this undefined, here an unknown id is rejected outright.
    pub fn assign_task(&self, task_id: i64, assignee_id: Option<i64>) -> Result<Option<Task>> {
        let now = now_ms();

        self.with_conn(|conn| {
            if let Some(user_id) = assignee_id {
                if super::users::get_user_internal(conn, user_id)?.is_none() {
                    return Err(ApiError::user_not_found(user_id).into());
                }
            }

            let changed = conn.execute(
                "UPDATE tasks SET assignee_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![assignee_id, now, task_id],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            get_task_internal(conn, task_id)
        })
    }

    pub fn update_priority(&self, task_id: i64, priority: Priority) -> Result<Option<Task>> {
        let now = now_ms();

        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET priority = ?1, updated_at = ?2 WHERE id = ?3",
                params![priority.as_str(), now, task_id],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            get_task_internal(conn, task_id)
        })
    }

    pub fn update_content(
        &self,
        task_id: i64,
        title: &str,
        description: Option<&str>,
    ) -> Result<Option<Task>> {
        let now = now_ms();

        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET title = ?1, description = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![title, description, now, task_id],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            get_task_internal(conn, task_id)
        })
    }
}
