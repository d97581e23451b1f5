pub mod analysis_assembler;
pub mod analyzer;
pub mod fetcher;
pub mod http;
pub mod pipeline;
pub mod prober;
pub mod summarizer;

pub use analysis_assembler::AnalysisAssembler;
pub use analyzer::IssueAnalyzer;
pub use fetcher::{build_fetcher, PageFetcher};
pub use pipeline::{AnalysisPipeline, AnalyzeRequest};
pub use prober::LinkProber;
pub use summarizer::{build_summarizer, Summarizer};
