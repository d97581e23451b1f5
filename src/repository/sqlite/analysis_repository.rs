use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::domain::models::{AnalysisRecord, Document, NewAnalysisRecord};
use crate::error::AppError;
use crate::repository::AnalysisStore;

const SELECT_COLUMNS: &str =
    "SELECT id, url, title, headings, links, screenshot, issues, analysis, error, created_at FROM analyses";

#[derive(Clone)]
pub struct SqliteAnalysisRepository {
    pool: SqlitePool,
}

impl SqliteAnalysisRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, record: &AnalysisRecord) -> Result<()> {
        let doc = &record.document;
        let analysis = record
            .analysis
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize analysis")?;

        sqlx::query(
            "INSERT INTO analyses \
             (id, url, title, headings, links, screenshot, issues, analysis, error, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&doc.url)
        .bind(&doc.title)
        .bind(serde_json::to_string(&doc.headings)?)
        .bind(serde_json::to_string(&doc.links)?)
        .bind(&doc.screenshot)
        .bind(serde_json::to_string(&doc.issues)?)
        .bind(analysis)
        .bind(&doc.error)
        .bind(format_timestamp(&record.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to insert analysis")?;

        Ok(())
    }

    pub async fn fetch_all(&self) -> Result<Vec<AnalysisRecord>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC"))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list analyses")?;

        rows.iter().map(map_row).collect()
    }

    pub async fn fetch_by_id(&self, id: &str) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get analysis")?;

        row.as_ref().map(map_row).transpose()
    }

    /// Number of rows removed.
    pub async fn delete(&self, id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM analyses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete analysis")?;
        Ok(result.rows_affected())
    }

    /// Deletes all ids in one transaction. Rolls back and returns `false`
    /// when any id has no row.
    pub async fn delete_many(&self, ids: &[String]) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        for id in ids {
            let affected = sqlx::query("DELETE FROM analyses WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to delete analysis in batch")?
                .rows_affected();

            if affected == 0 {
                log::debug!("[DB] Batch delete: '{}' not found, rolling back", id);
                tx.rollback().await?;
                return Ok(false);
            }
        }

        tx.commit().await?;
        Ok(true)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // Fixed width keeps lexical order equal to time order
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn map_row(row: &SqliteRow) -> Result<AnalysisRecord> {
    let created_at: String = row.try_get("created_at")?;
    let analysis: Option<String> = row.try_get("analysis")?;

    Ok(AnalysisRecord {
        id: row.try_get("id")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .context("Invalid created_at timestamp")?
            .with_timezone(&Utc),
        document: Document {
            url: row.try_get("url")?,
            title: row.try_get("title")?,
            headings: serde_json::from_str(&row.try_get::<String, _>("headings")?)
                .context("Invalid headings JSON")?,
            links: serde_json::from_str(&row.try_get::<String, _>("links")?)
                .context("Invalid links JSON")?,
            screenshot: row.try_get("screenshot")?,
            issues: serde_json::from_str(&row.try_get::<String, _>("issues")?)
                .context("Invalid issues JSON")?,
            error: row.try_get("error")?,
        },
        analysis: analysis
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("Invalid analysis JSON")?,
    })
}

#[async_trait]
impl AnalysisStore for SqliteAnalysisRepository {
    async fn save(&self, record: NewAnalysisRecord) -> Option<AnalysisRecord> {
        let record = AnalysisRecord::from_new(record);
        match self.insert(&record).await {
            Ok(()) => {
                log::debug!("[DB] Saved analysis {} for {}", record.id, record.document.url);
                Some(record)
            }
            Err(e) => {
                log::error!("[DB] Failed to save analysis for {}: {:#}", record.document.url, e);
                None
            }
        }
    }

    async fn get_all(&self) -> crate::error::Result<Vec<AnalysisRecord>> {
        self.fetch_all()
            .await
            .map_err(|e| AppError::persistence(format!("{e:#}")))
    }

    async fn get_by_id(&self, id: &str) -> crate::error::Result<Option<AnalysisRecord>> {
        self.fetch_by_id(id)
            .await
            .map_err(|e| AppError::persistence(format!("{e:#}")))
    }

    async fn delete_by_id(&self, id: &str) -> bool {
        match self.delete(id).await {
            Ok(n) => n > 0,
            Err(e) => {
                log::error!("[DB] Failed to delete analysis {}: {:#}", id, e);
                false
            }
        }
    }

    async fn delete_by_ids(&self, ids: &[String]) -> bool {
        if ids.is_empty() {
            return false;
        }
        match self.delete_many(ids).await {
            Ok(deleted) => deleted,
            Err(e) => {
                log::error!("[DB] Batch delete of {} analyses failed: {:#}", ids.len(), e);
                false
            }
        }
    }
}
