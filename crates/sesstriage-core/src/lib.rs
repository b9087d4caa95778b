mod error;
mod identity;
mod merger;
pub mod pipeline;
mod session;
pub mod ua;

pub use error::TriageError;
pub use identity::{top_level, CrawlerIdentity};
pub use merger::{Merged, SessionMerger, DEFAULT_WINDOW_SECS};
pub use pipeline::{
    classify_all, classify_concurrently, CategoryCount, Pipeline, PipelineOptions,
    PipelineOutput, RunSummary, SessionSource, SourceBatch,
};
pub use session::{ClassifiedSession, VirtualSession};
pub use ua::{classify, Category, UaFacts};
