//! Load, classify, merge.

use serde::Serialize;
use tracing::{debug, info};

use sesstriage_sessions::{RawSession, SessionStore};

use crate::error::TriageError;
use crate::merger::{SessionMerger, DEFAULT_WINDOW_SECS};
use crate::session::{ClassifiedSession, VirtualSession};
use crate::ua::Category;

/// Records handed to the pipeline by a session source.
#[derive(Debug, Default)]
pub struct SourceBatch {
    pub sessions: Vec<RawSession>,
    /// Records the source could not decode.
    pub skipped: usize,
}

/// Anything that can produce raw session records.
pub trait SessionSource {
    fn load(&self) -> Result<SourceBatch, TriageError>;
}

impl SessionSource for SessionStore {
    fn load(&self) -> Result<SourceBatch, TriageError> {
        let loaded = self
            .load_all()
            .map_err(|e| TriageError::Source(format!("{:#}", e)))?;
        Ok(SourceBatch {
            sessions: loaded.sessions,
            skipped: loaded.skipped.len(),
        })
    }
}

impl SessionSource for Vec<RawSession> {
    fn load(&self) -> Result<SourceBatch, TriageError> {
        Ok(SourceBatch {
            sessions: self.clone(),
            skipped: 0,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub window_secs: i64,
    /// Number of classification workers for [`Pipeline::run_concurrent`].
    pub workers: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            workers: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Number of virtual sessions of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Counters describing one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub records: usize,
    pub skipped: usize,
    pub virtual_sessions: usize,
    pub folded: usize,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Sorted by `last` ascending.
    pub sessions: Vec<VirtualSession>,
    pub summary: RunSummary,
}

pub struct Pipeline {
    merger: SessionMerger,
    workers: usize,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Result<Self, TriageError> {
        if options.window_secs < 0 {
            return Err(TriageError::Config(format!(
                "merge window must not be negative, got {}",
                options.window_secs
            )));
        }
        if options.workers == 0 {
            return Err(TriageError::Config(
                "at least one classification worker is required".to_string(),
            ));
        }
        Ok(Self {
            merger: SessionMerger::new(options.window_secs),
            workers: options.workers,
        })
    }

    /// Run the whole pipeline on the current thread.
    pub fn run(&self, source: &dyn SessionSource) -> Result<PipelineOutput, TriageError> {
        let batch = source.load()?;
        let skipped = batch.skipped;
        let records = prepare(batch.sessions);
        let classified = classify_all(records);
        Ok(self.finish(classified, skipped))
    }

    /// Like [`Pipeline::run`], with classification fanned out over blocking tasks.
    pub async fn run_concurrent(
        &self,
        source: &dyn SessionSource,
    ) -> Result<PipelineOutput, TriageError> {
        let batch = source.load()?;
        let skipped = batch.skipped;
        let records = prepare(batch.sessions);
        let classified = classify_concurrently(records, self.workers).await?;
        Ok(self.finish(classified, skipped))
    }

    fn finish(&self, classified: Vec<ClassifiedSession>, skipped: usize) -> PipelineOutput {
        let records = classified.len();
        let merged = self.merger.merge(classified);

        let by_category = Category::ALL
            .iter()
            .map(|&category| CategoryCount {
                category,
                count: merged
                    .sessions
                    .iter()
                    .filter(|s| s.ua.category == category)
                    .count(),
            })
            .filter(|c| c.count > 0)
            .collect();

        let summary = RunSummary {
            records,
            skipped,
            virtual_sessions: merged.sessions.len(),
            folded: merged.folded,
            by_category,
        };
        info!(
            records = summary.records,
            skipped = summary.skipped,
            virtual_sessions = summary.virtual_sessions,
            window_secs = self.merger.window_secs(),
            "Pipeline finished"
        );

        PipelineOutput {
            sessions: merged.sessions,
            summary,
        }
    }
}

/// Order each history by sequence number and the records by `last`, ties by id.
pub fn prepare(mut sessions: Vec<RawSession>) -> Vec<RawSession> {
    for session in &mut sessions {
        session.order_history();
    }
    sessions.sort_by(|a, b| a.last.cmp(&b.last).then_with(|| a.id.cmp(&b.id)));
    sessions
}

pub fn classify_all(sessions: Vec<RawSession>) -> Vec<ClassifiedSession> {
    sessions.into_iter().map(ClassifiedSession::classify).collect()
}

/// Classify on up to `workers` blocking tasks. The output keeps the input order.
pub async fn classify_concurrently(
    sessions: Vec<RawSession>,
    workers: usize,
) -> Result<Vec<ClassifiedSession>, TriageError> {
    if sessions.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_size = sessions.len().div_ceil(workers.max(1));

    let mut handles = Vec::new();
    let mut rest = sessions;
    while !rest.is_empty() {
        let tail = rest.split_off(chunk_size.min(rest.len()));
        let chunk = std::mem::replace(&mut rest, tail);
        handles.push(tokio::task::spawn_blocking(move || classify_all(chunk)));
    }
    debug!(tasks = handles.len(), chunk_size, "Classifying sessions");

    // Awaiting in spawn order restores the input order.
    let mut classified = Vec::new();
    for handle in handles {
        classified.extend(handle.await?);
    }
    Ok(classified)
}
