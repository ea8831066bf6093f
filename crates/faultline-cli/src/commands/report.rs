//! Report command - Manage crash and error reports
//!
//! Provides the `faultline report` CLI command with subcommands:
//! - `list`: Show saved reports, optionally of one kind
//! - `view <id>`: Display a specific report
//! - `delete`: Remove reports from local storage

use anyhow::Result;
use clap::Subcommand;
use faultline_telemetry::{LocalReportStore, ReportKind};

use crate::output::get_formatter;
use crate::CliContext;

/// Report management subcommands
#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// List saved crash and error reports
    List {
        /// Only crash reports
        #[arg(long, conflicts_with = "errors")]
        crashes: bool,
        /// Only non-fatal error reports
        #[arg(long)]
        errors: bool,
    },
    /// View a specific report
    View {
        /// Report ID or filename fragment
        id: String,
    },
    /// Delete reports from local storage
    Delete {
        /// Specific report ID to delete
        id: Option<String>,
        /// Delete all reports
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
}

impl ReportCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let store = LocalReportStore::new(ctx.config.crash_reporting.reports_dir.clone());

        match self {
            ReportCommand::List { crashes, errors } => {
                let entries = if *crashes {
                    store.list_kind(ReportKind::Crash)?
                } else if *errors {
                    store.list_kind(ReportKind::Error)?
                } else {
                    store.list()?
                };

                if ctx.format.is_json() {
                    let json: Vec<serde_json::Value> = entries
                        .iter()
                        .map(|e| {
                            serde_json::json!({
                                "id": e.id,
                                "kind": e.kind,
                                "date": e.date,
                                "size_bytes": e.size_bytes,
                                "path": e.path.display().to_string(),
                            })
                        })
                        .collect();
                    formatter.print_json(&serde_json::json!(json));
                    return Ok(());
                }

                if entries.is_empty() {
                    formatter.info(&format!(
                        "No reports found in {}",
                        store.reports_dir().display()
                    ));
                    return Ok(());
                }

                println!("{:<12} {:<8} {:<12} {:>10}", "ID", "Kind", "Date", "Size");
                println!("{}", "-".repeat(46));
                for entry in &entries {
                    println!(
                        "{:<12} {:<8} {:<12} {:>10}",
                        entry.id,
                        entry.kind,
                        entry.date,
                        format_size(entry.size_bytes),
                    );
                }
                println!();
                println!("Total: {} report(s)", entries.len());
            }

            ReportCommand::View { id } => match store.read(id)? {
                Some(value) if ctx.format.is_json() => formatter.print_json(&value),
                Some(value) => match value.as_object() {
                    Some(obj) => {
                        for (key, val) in obj {
                            match val {
                                serde_json::Value::String(s) if s.contains('\n') => {
                                    println!("{}:", key);
                                    for line in s.lines() {
                                        println!("    {}", line);
                                    }
                                }
                                serde_json::Value::String(s) => println!("{}: {}", key, s),
                                other => println!("{}: {}", key, other),
                            }
                        }
                    }
                    None => println!("{}", serde_json::to_string_pretty(&value)?),
                },
                None => formatter.error(&format!("Report '{}' not found", id)),
            },

            ReportCommand::Delete { id, all } => {
                if *all {
                    let count = store.delete_all()?;
                    formatter.success(&format!("Deleted {} report(s)", count));
                } else if let Some(report_id) = id {
                    if store.delete(report_id)? {
                        formatter.success(&format!("Deleted report '{}'", report_id));
                    } else {
                        formatter.error(&format!("Report '{}' not found", report_id));
                    }
                } else {
                    formatter.error("Specify a report ID or use --all");
                }
            }
        }

        Ok(())
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
