//! User queries. Users are provisioned elsewhere; this subsystem only
//! reads them, plus a demo seed for local development.

use super::Database;
use crate::types::User;
use anyhow::Result;
use rusqlite::{Connection, Row, params};

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        avatar_url: row.get("avatar_url")?,
    })
}

pub(crate) fn get_user_internal(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;

    match stmt.query_row(params![user_id], parse_user_row) {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users ORDER BY name")?;
            let users = stmt
                .query_map([], parse_user_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_internal(conn, user_id))
    }

    /// Resolve a free-text name to a user: case-insensitive exact match
    /// first, then substring. Ambiguous substring matches take the first
    /// hit in name order.
    pub fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let users = self.list_users()?;

        if let Some(user) = users.iter().find(|u| u.name.to_lowercase() == needle) {
            return Ok(Some(user.clone()));
        }

        Ok(users
            .iter()
            .find(|u| u.name.to_lowercase().contains(&needle))
            .cloned())
    }

    /// Insert a user. Used by the demo seed and by tests.
    pub fn insert_user(&self, name: &str, email: &str, avatar_url: Option<&str>) -> Result<User> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, avatar_url) VALUES (?1, ?2, ?3)",
                params![name, email, avatar_url],
            )?;

            Ok(User {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                email: email.to_string(),
                avatar_url: avatar_url.map(String::from),
            })
        })
    }

    /// Seed a small demo team if the users table is empty.
    pub fn seed_demo_users(&self) -> Result<usize> {
        let existing: i64 = self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        })?;
        if existing > 0 {
            return Ok(0);
        }

        let demo = [
            ("Jane Doe", "jane@example.com"),
            ("John Smith", "john@example.com"),
            ("Ada Park", "ada@example.com"),
        ];
        for (name, email) in demo {
            self.insert_user(name, email, None)?;
        }
        Ok(demo.len())
    }
}
