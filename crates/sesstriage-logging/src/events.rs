use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// Progress events of a triage run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        sessions_dir: PathBuf,
        window_secs: i64,
    },
    RecordSkipped {
        path: PathBuf,
        error: String,
    },
    RecordsLoaded {
        records: usize,
        skipped: usize,
    },
    RunCompleted {
        records: usize,
        virtual_sessions: usize,
        folded: usize,
        duration_secs: f64,
    },
}

impl RunEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Writes run events to stderr
pub struct Reporter {
    format: LogFormat,
    quiet: bool,
}

impl Reporter {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            quiet: false,
        }
    }

    /// A reporter that prints nothing, for machine-readable stdout runs.
    pub fn quiet() -> Self {
        Self {
            format: LogFormat::default(),
            quiet: true,
        }
    }

    pub fn report(&self, event: &RunEvent) {
        if self.quiet {
            return;
        }
        let line = match self.format {
            LogFormat::Json => event.with_timestamp().to_string(),
            LogFormat::Pretty => Self::render_pretty(event),
            LogFormat::Compact => Self::render_compact(event),
        };
        let _ = writeln!(std::io::stderr(), "{}", line);
    }

    fn render_pretty(event: &RunEvent) -> String {
        match event {
            RunEvent::RunStarted {
                sessions_dir,
                window_secs,
            } => format!(
                "{} {} {}",
                "▶".bright_blue(),
                "Triage".bold(),
                format!("{} (window {}s)", sessions_dir.display(), window_secs).dimmed()
            ),
            RunEvent::RecordSkipped { path, error } => format!(
                "  {} Skipped {}: {}",
                "⚠".bright_yellow(),
                path.display(),
                error.dimmed()
            ),
            RunEvent::RecordsLoaded { records, skipped } => {
                let mut line = format!(
                    "  {} Loaded {} {}",
                    "✓".bright_green(),
                    records,
                    if *records == 1 { "record" } else { "records" }
                );
                if *skipped > 0 {
                    line.push_str(&format!(", {}", format!("{} skipped", skipped).yellow()));
                }
                line
            }
            RunEvent::RunCompleted {
                records,
                virtual_sessions,
                folded,
                duration_secs,
            } => format!(
                "  {} {} records -> {} virtual sessions ({} folded) in {:.2}s",
                "✓".bright_green(),
                records,
                virtual_sessions.to_string().bold(),
                folded,
                duration_secs
            ),
        }
    }

    fn render_compact(event: &RunEvent) -> String {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        match event {
            RunEvent::RunStarted {
                sessions_dir,
                window_secs,
            } => format!(
                "[{}] run:start {} window={}",
                timestamp,
                sessions_dir.display(),
                window_secs
            ),
            RunEvent::RecordSkipped { path, error } => {
                format!("[{}] record:skip {} {}", timestamp, path.display(), error)
            }
            RunEvent::RecordsLoaded { records, skipped } => format!(
                "[{}] records:loaded {} skipped={}",
                timestamp, records, skipped
            ),
            RunEvent::RunCompleted {
                records,
                virtual_sessions,
                folded,
                duration_secs,
            } => format!(
                "[{}] run:done {}->{} folded={} {:.2}s",
                timestamp, records, virtual_sessions, folded, duration_secs
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_json_event_has_tag_and_timestamp() {
        let event = RunEvent::RecordsLoaded {
            records: 3,
            skipped: 1,
        };
        let value = event.with_timestamp();
        assert_eq!(value["event"], "records_loaded");
        assert_eq!(value["records"], 3);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_compact_rendering() {
        let line = Reporter::render_compact(&RunEvent::RunCompleted {
            records: 10,
            virtual_sessions: 4,
            folded: 6,
            duration_secs: 0.5,
        });
        assert!(line.ends_with("run:done 10->4 folded=6 0.50s"));
    }
}
