//! Content summary strategies.
//!
//! - **Heuristic**: local word statistics, always available
//! - **Model**: hosted chat-completions model, falling back to the heuristic
//!   result whenever the model call or its reply is unusable
//!
//! Neither strategy returns an error to the caller.

mod heuristic;
mod model;

pub use heuristic::HeuristicSummarizer;
pub use model::ModelSummarizer;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::domain::models::{Analysis, Document};
use crate::error::Result;

const MODEL_TIMEOUT: Duration = Duration::from_secs(20);

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, document: &Document) -> Analysis;

    fn name(&self) -> &'static str;
}

/// Model-backed when a language model key is configured, heuristic otherwise.
pub fn build_summarizer(config: &AppConfig) -> Result<Arc<dyn Summarizer>> {
    let summarizer: Arc<dyn Summarizer> = match &config.llm {
        Some(llm) => Arc::new(ModelSummarizer::new(llm.clone(), MODEL_TIMEOUT)?),
        None => Arc::new(HeuristicSummarizer),
    };
    log::info!("[SUMMARY] Using {} summarizer", summarizer.name());
    Ok(summarizer)
}
