use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use colored::{ColoredString, Colorize};

use sesstriage_core::{
    Category, Pipeline, PipelineOptions, RunSummary, SessionSource, SourceBatch, TriageError,
    VirtualSession,
};
use sesstriage_logging::{Reporter, RunEvent};
use sesstriage_sessions::SessionStore;

/// Resolved settings for the `sessions` command.
#[derive(Debug)]
pub struct SessionsSettings {
    pub dir: PathBuf,
    pub prefix: String,
    pub window_secs: i64,
    pub workers: usize,
    pub json: bool,
}

/// A session directory that reports skipped records as it loads them.
struct ReportingSource<'a> {
    store: SessionStore,
    reporter: &'a Reporter,
}

impl SessionSource for ReportingSource<'_> {
    fn load(&self) -> Result<SourceBatch, TriageError> {
        let loaded = self
            .store
            .load_all()
            .map_err(|e| TriageError::Source(format!("{:#}", e)))?;

        for skipped in &loaded.skipped {
            self.reporter.report(&RunEvent::RecordSkipped {
                path: skipped.path.clone(),
                error: skipped.error.clone(),
            });
        }
        self.reporter.report(&RunEvent::RecordsLoaded {
            records: loaded.sessions.len(),
            skipped: loaded.skipped.len(),
        });

        Ok(SourceBatch {
            sessions: loaded.sessions,
            skipped: loaded.skipped.len(),
        })
    }
}

pub async fn handle_sessions_command(settings: SessionsSettings, reporter: &Reporter) -> Result<()> {
    ensure_dir(&settings.dir)?;
    let started = Instant::now();
    reporter.report(&RunEvent::RunStarted {
        sessions_dir: settings.dir.clone(),
        window_secs: settings.window_secs,
    });

    let pipeline = Pipeline::new(PipelineOptions {
        window_secs: settings.window_secs,
        workers: settings.workers,
    })?;
    let source = ReportingSource {
        store: SessionStore::with_dir(settings.dir).with_prefix(settings.prefix),
        reporter,
    };
    let output = pipeline.run_concurrent(&source).await?;

    reporter.report(&RunEvent::RunCompleted {
        records: output.summary.records,
        virtual_sessions: output.summary.virtual_sessions,
        folded: output.summary.folded,
        duration_secs: started.elapsed().as_secs_f64(),
    });

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&output.sessions)?);
    } else if output.sessions.is_empty() {
        println!("{}", "No sessions found.".dimmed());
    } else {
        print_sessions_table(&output.sessions);
        println!();
        print_summary(&output.summary);
    }

    Ok(())
}

/// Print decoded records as they are stored, without classification.
pub fn handle_dump_command(dir: PathBuf, prefix: String, reporter: &Reporter) -> Result<()> {
    ensure_dir(&dir)?;
    let store = SessionStore::with_dir(dir).with_prefix(prefix);
    let loaded = store.load_all()?;

    for skipped in &loaded.skipped {
        reporter.report(&RunEvent::RecordSkipped {
            path: skipped.path.clone(),
            error: skipped.error.clone(),
        });
    }

    println!("{}", serde_json::to_string_pretty(&loaded.sessions)?);
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Session directory not found: {}", dir.display());
    }
    Ok(())
}

fn print_sessions_table(sessions: &[VirtualSession]) {
    println!(
        "{:<20} {:<7} {:<6} {:<9} {:<16} {:<24} {}",
        "LAST".dimmed(),
        "VISITS".dimmed(),
        "REQS".dimmed(),
        "CATEGORY".dimmed(),
        "OS".dimmed(),
        "CLIENT".dimmed(),
        "ID".dimmed(),
    );

    for s in sessions {
        let os = s.ua.os_label().unwrap_or_else(|| "-".to_string());
        let client = s.ua.client_label().unwrap_or_else(|| "-".to_string());
        let id = if s.merged.is_empty() {
            s.id.clone()
        } else {
            format!("{} (+{})", s.id, s.merged.len())
        };

        println!(
            "{:<20} {:<7} {:<6} {:<9} {:<16} {:<24} {}",
            format_timestamp(s.last),
            s.visits,
            s.history.len(),
            colored_category(s.ua.category),
            truncate(&os, 16),
            truncate(&client, 24),
            id
        );
    }
}

fn print_summary(summary: &RunSummary) {
    println!("{}", "=== Triage Summary ===".bright_blue().bold());
    println!("{}  {}", "Records:".dimmed(), summary.records);
    if summary.skipped > 0 {
        println!("{}  {}", "Skipped:".dimmed(), summary.skipped.to_string().yellow());
    }
    println!("{}  {}", "Virtual Sessions:".dimmed(), summary.virtual_sessions);
    println!("{}  {}", "Folded:".dimmed(), summary.folded);

    if !summary.by_category.is_empty() {
        println!();
        println!("{}", "By Category:".dimmed());
        for c in &summary.by_category {
            println!("  {:<9} {}", colored_category(c.category), c.count);
        }
    }
}

fn colored_category(category: Category) -> ColoredString {
    let label = format!("{:<9}", category.as_str());
    match category {
        Category::Browser => label.bright_green(),
        Category::Crawler => label.bright_cyan(),
        Category::Preview => label.bright_magenta(),
        Category::Bot => label.bright_yellow(),
        Category::Other => label.normal(),
        Category::Missing => label.dimmed(),
    }
}

fn format_timestamp(epoch: i64) -> String {
    chrono::DateTime::from_timestamp(epoch, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}
