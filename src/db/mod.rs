mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::document::Document;
use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

const REPORT_COLUMNS: &str =
    "id, topic, kind, content, purpose, style, pages, extras, created_at";

const OUTLINE_COLUMNS: &str = "id, title, report_id, document, created_at, updated_at";

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "drafter")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("drafter.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Report operations
    // ============================================================

    /// All reports, newest first.
    pub fn get_all_reports(&self) -> Result<Vec<Report>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reports ORDER BY created_at DESC, rowid DESC",
            REPORT_COLUMNS
        ))?;

        let reports = stmt
            .query_map([], report_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(reports)
    }

    pub fn get_report(&self, id: Uuid) -> Result<Option<Report>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let report = conn
            .query_row(
                &format!("SELECT {} FROM reports WHERE id = ?", REPORT_COLUMNS),
                [id.to_string()],
                report_from_row,
            )
            .optional()?;
        Ok(report)
    }

    pub fn create_report(&self, input: CreateReportInput) -> Result<Report> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO reports (id, topic, kind, content, purpose, style, pages, extras, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.topic,
                &input.kind,
                &input.content,
                &input.purpose,
                &input.style,
                input.pages,
                &input.extras,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Report {
            id,
            topic: input.topic,
            kind: input.kind,
            content: input.content,
            purpose: input.purpose,
            style: input.style,
            pages: input.pages,
            extras: input.extras,
            created_at: now,
        })
    }

    /// Delete a report together with its search vectors.
    pub fn delete_report(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM embeddings WHERE source = 'report' AND owner_id = ?",
            [id.to_string()],
        )?;
        let rows = tx.execute("DELETE FROM reports WHERE id = ?", [id.to_string()])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // ============================================================
    // Reference document operations
    // ============================================================

    pub fn get_all_references(&self) -> Result<Vec<ReferenceDocument>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, content, created_at FROM reference_documents ORDER BY created_at DESC, rowid DESC",
        )?;

        let documents = stmt
            .query_map([], reference_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    pub fn get_reference(&self, id: Uuid) -> Result<Option<ReferenceDocument>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let document = conn
            .query_row(
                "SELECT id, name, content, created_at FROM reference_documents WHERE id = ?",
                [id.to_string()],
                reference_from_row,
            )
            .optional()?;
        Ok(document)
    }

    pub fn create_reference(&self, input: CreateReferenceInput) -> Result<ReferenceDocument> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO reference_documents (id, name, content, created_at) VALUES (?, ?, ?, ?)",
            (id.to_string(), &input.name, &input.content, now.to_rfc3339()),
        )?;

        Ok(ReferenceDocument {
            id,
            name: input.name,
            content: input.content,
            created_at: now,
        })
    }

    pub fn delete_reference(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM embeddings WHERE source = 'reference' AND owner_id = ?",
            [id.to_string()],
        )?;
        let rows = tx.execute(
            "DELETE FROM reference_documents WHERE id = ?",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // ============================================================
    // Embedding operations
    // ============================================================

    /// Replace every indexed chunk of one owner with `records`.
    pub fn replace_embeddings(
        &self,
        source: SourceKind,
        owner_id: Uuid,
        records: &[EmbeddingRecord],
        model: &str,
    ) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM embeddings WHERE source = ? AND owner_id = ?",
            (source.as_str(), owner_id.to_string()),
        )?;
        for record in records {
            tx.execute(
                "INSERT INTO embeddings (source, owner_id, chunk_index, content, vector, model, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                (
                    record.source.as_str(),
                    record.owner_id.to_string(),
                    record.chunk_index as i64,
                    &record.content,
                    serde_json::to_string(&record.vector)?,
                    model,
                    &now,
                ),
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn has_embeddings(&self, source: SourceKind, owner_id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE source = ? AND owner_id = ?",
            (source.as_str(), owner_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Indexed chunks, optionally restricted to one source kind.
    pub fn get_embeddings(&self, source: Option<SourceKind>) -> Result<Vec<EmbeddingRecord>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT source, owner_id, chunk_index, content, vector FROM embeddings
             WHERE ?1 IS NULL OR source = ?1
             ORDER BY owner_id, chunk_index",
        )?;

        let rows = stmt
            .query_map([source.map(|s| s.as_str())], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (source, owner_id, chunk_index, content, vector) in rows {
            let Some(source) = SourceKind::from_str(&source) else {
                continue;
            };
            records.push(EmbeddingRecord {
                source,
                owner_id: parse_uuid(owner_id),
                chunk_index: chunk_index as usize,
                content,
                vector: serde_json::from_str(&vector)?,
            });
        }
        Ok(records)
    }

    pub fn delete_embeddings(&self, source: SourceKind, owner_id: Uuid) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "DELETE FROM embeddings WHERE source = ? AND owner_id = ?",
            (source.as_str(), owner_id.to_string()),
        )?;
        Ok(rows)
    }

    // ============================================================
    // Outline operations
    // ============================================================

    pub fn get_all_outlines(&self) -> Result<Vec<Outline>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM outlines ORDER BY updated_at DESC",
            OUTLINE_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], outline_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(OutlineRow::into_outline).collect()
    }

    pub fn get_outline(&self, id: Uuid) -> Result<Option<Outline>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        load_outline(&conn, id)
    }

    pub fn create_outline(
        &self,
        title: String,
        report_id: Option<Uuid>,
        document: Document,
    ) -> Result<Outline> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO outlines (id, title, report_id, document, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &title,
                report_id.map(|r| r.to_string()),
                document.serialize().to_string(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Outline {
            id,
            title,
            report_id,
            document,
            created_at: now,
            updated_at: now,
        })
    }

    /// Run `f` against a stored outline and persist the result.
    ///
    /// The connection lock is held across load, mutation and save, so
    /// concurrent commands on the same outline never interleave.
    pub fn with_outline_mut<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Document) -> T,
    ) -> Result<Option<T>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(mut outline) = load_outline(&conn, id)? else {
            return Ok(None);
        };

        let result = f(&mut outline.document);
        conn.execute(
            "UPDATE outlines SET document = ?, updated_at = ? WHERE id = ?",
            (
                outline.document.serialize().to_string(),
                Utc::now().to_rfc3339(),
                id.to_string(),
            ),
        )?;
        Ok(Some(result))
    }

    pub fn delete_outline(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM outlines WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    Ok(Report {
        id: parse_uuid(row.get::<_, String>(0)?),
        topic: row.get(1)?,
        kind: row.get(2)?,
        content: row.get(3)?,
        purpose: row.get(4)?,
        style: row.get(5)?,
        pages: row.get(6)?,
        extras: row.get(7)?,
        created_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn reference_from_row(row: &Row<'_>) -> rusqlite::Result<ReferenceDocument> {
    Ok(ReferenceDocument {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_datetime(row.get::<_, String>(3)?),
    })
}

/// Outline columns before the document JSON is decoded.
struct OutlineRow {
    id: String,
    title: String,
    report_id: Option<String>,
    document: String,
    created_at: String,
    updated_at: String,
}

impl OutlineRow {
    fn into_outline(self) -> Result<Outline> {
        let document = Document::deserialize(serde_json::from_str(&self.document)?)?;
        Ok(Outline {
            id: parse_uuid(self.id),
            title: self.title,
            report_id: self.report_id.map(parse_uuid),
            document,
            created_at: parse_datetime(self.created_at),
            updated_at: parse_datetime(self.updated_at),
        })
    }
}

fn outline_row(row: &Row<'_>) -> rusqlite::Result<OutlineRow> {
    Ok(OutlineRow {
        id: row.get(0)?,
        title: row.get(1)?,
        report_id: row.get(2)?,
        document: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn load_outline(conn: &Connection, id: Uuid) -> Result<Option<Outline>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM outlines WHERE id = ?", OUTLINE_COLUMNS),
            [id.to_string()],
            outline_row,
        )
        .optional()?;
    row.map(OutlineRow::into_outline).transpose()
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
