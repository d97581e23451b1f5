use async_trait::async_trait;

use crate::domain::models::{AnalysisRecord, NewAnalysisRecord};
use crate::error::Result;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryAnalysisStore;
pub use sqlite::SqliteAnalysisRepository;

/// Storage for finished analyses.
///
/// Writes report failure as `None`/`false` and leave retrying to the caller.
/// Reads propagate storage errors so the API can tell "missing" from "broken".
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Assigns id and timestamp and stores the record once. No dedup.
    async fn save(&self, record: NewAnalysisRecord) -> Option<AnalysisRecord>;

    /// All records, newest first.
    async fn get_all(&self) -> Result<Vec<AnalysisRecord>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<AnalysisRecord>>;

    /// `true` when a record was removed.
    async fn delete_by_id(&self, id: &str) -> bool;

    /// Removes every listed record or none of them. `false` when any id is
    /// unknown, the list is empty, or the storage fails.
    async fn delete_by_ids(&self, ids: &[String]) -> bool;
}
