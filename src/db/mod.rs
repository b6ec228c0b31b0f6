mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "aidee")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("aidee.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn create_project(&self, user_id: &str, input: CreateProjectInput) -> Result<Project> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        let title = if input.requirements.idea.trim().is_empty() {
            None
        } else {
            Some(summarize_title(&input.requirements.idea))
        };
        let requirements_json = serde_json::to_string(&input.requirements)?;

        conn.execute(
            "INSERT INTO projects (id, user_id, title, requirements, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                user_id,
                &title,
                &requirements_json,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Project {
            id,
            user_id: user_id.to_string(),
            title,
            requirements: input.requirements,
            created_at: now,
        })
    }

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, requirements, created_at
             FROM projects WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Project {
                id: parse_uuid(row.get::<_, String>(0)?),
                user_id: row.get(1)?,
                title: row.get(2)?,
                requirements: parse_requirements(row.get::<_, String>(3)?),
                created_at: parse_datetime(row.get::<_, String>(4)?),
            }))
        } else {
            Ok(None)
        }
    }

    pub fn get_projects_by_user(&self, user_id: &str) -> Result<Vec<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, requirements, created_at
             FROM projects WHERE user_id = ? ORDER BY created_at DESC",
        )?;

        let projects = stmt
            .query_map([user_id], |row| {
                Ok(Project {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    requirements: parse_requirements(row.get::<_, String>(3)?),
                    created_at: parse_datetime(row.get::<_, String>(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    /// Fetch only the fields the prompt assembler needs.
    pub fn get_project_context(&self, id: Uuid) -> Result<Option<ProjectContext>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT title, requirements FROM projects WHERE id = ?")?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(ProjectContext {
                title: row.get(0)?,
                requirements: parse_requirements(row.get::<_, String>(1)?),
            }))
        } else {
            Ok(None)
        }
    }

    // ============================================================
    // Message operations
    // ============================================================

    /// Append one message to a project's transcript. Single insert, no
    /// surrounding transaction; messages are never updated or deleted.
    pub fn append_message(&self, project_id: Uuid, role: Role, content: &str) -> Result<Message> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO messages (id, project_id, role, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                project_id.to_string(),
                role.as_str(),
                content,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Message {
            id,
            project_id,
            role,
            content: content.to_string(),
            created_at: now,
        })
    }

    /// The full transcript for a project, oldest first. Insertion order
    /// breaks timestamp ties so replay is deterministic.
    pub fn get_messages(&self, project_id: Uuid) -> Result<Vec<Message>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, role, content, created_at
             FROM messages WHERE project_id = ? ORDER BY created_at, rowid",
        )?;

        let messages = stmt
            .query_map([project_id.to_string()], |row| {
                Ok(Message {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    project_id: parse_uuid(row.get::<_, String>(1)?),
                    role: Role::from_str(&row.get::<_, String>(2)?).unwrap_or(Role::User),
                    content: row.get(3)?,
                    created_at: parse_datetime(row.get::<_, String>(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_requirements(s: String) -> Requirements {
    serde_json::from_str(&s).unwrap_or_default()
}
