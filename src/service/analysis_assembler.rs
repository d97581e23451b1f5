//! AnalysisAssembler - combines the pipeline outputs into one result and
//! optionally hands it to the store.

use std::sync::Arc;

use crate::domain::models::{Analysis, AnalysisResult, Document, NewAnalysisRecord};
use crate::repository::AnalysisStore;

pub struct AnalysisAssembler {
    store: Arc<dyn AnalysisStore>,
}

impl AnalysisAssembler {
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        Self { store }
    }

    /// Without `persist` the result is ephemeral (no id, no timestamp). A
    /// failed save is logged and also yields an ephemeral result.
    pub async fn assemble(
        &self,
        document: Document,
        analysis: Option<Analysis>,
        persist: bool,
    ) -> AnalysisResult {
        if !persist {
            return AnalysisResult::ephemeral(document, analysis);
        }

        let url = document.url.clone();
        match self
            .store
            .save(NewAnalysisRecord {
                document: document.clone(),
                analysis: analysis.clone(),
            })
            .await
        {
            Some(record) => {
                log::info!("[ASSEMBLE] Stored analysis {} for {}", record.id, url);
                record.into()
            }
            None => {
                log::error!("[ASSEMBLE] Persistence error: result for {} was not stored", url);
                AnalysisResult::ephemeral(document, analysis)
            }
        }
    }
}
