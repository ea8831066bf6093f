//! Local report storage
//!
//! Manages crash and error report files in `~/.local/share/faultline/reports/`.
//! Files are named `{kind}-{yyyymmdd}-{id8}.json`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

/// Kind of a stored report, taken from the file name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Crash,
    Error,
    Unknown,
}

impl ReportKind {
    fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "crash" => ReportKind::Crash,
            "error" => ReportKind::Error,
            _ => ReportKind::Unknown,
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportKind::Crash => "crash",
            ReportKind::Error => "error",
            ReportKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Entry in the local report store
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub id: String,
    pub kind: ReportKind,
    pub date: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl ReportEntry {
    fn matches(&self, id: &str) -> bool {
        self.id == id
            || self
                .path
                .file_stem()
                .is_some_and(|stem| stem.to_string_lossy().contains(id))
    }
}

/// Serializes `report` to `{reports_dir}/{kind}-{date}-{id8}.json`.
pub(crate) fn write_report<T: Serialize>(
    reports_dir: &Path,
    kind: &str,
    id: &str,
    report: &T,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(reports_dir)?;

    let date = Utc::now().format("%Y%m%d");
    let short_id: String = id.chars().take(8).collect();
    let path = reports_dir.join(format!("{kind}-{date}-{short_id}.json"));

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;

    Ok(path)
}

/// Manages the local directory of crash/error report files.
pub struct LocalReportStore {
    reports_dir: PathBuf,
}

impl LocalReportStore {
    /// Creates a new store pointing at `reports_dir`.
    pub fn new(reports_dir: PathBuf) -> Self {
        Self { reports_dir }
    }

    /// List all report files in the store, newest date first.
    pub fn list(&self) -> anyhow::Result<Vec<ReportEntry>> {
        if !self.reports_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.reports_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let (kind, date, id) = parse_report_filename(&stem);

            entries.push(ReportEntry {
                id,
                kind,
                date,
                size_bytes: entry.metadata()?.len(),
                path,
            });
        }

        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    /// List only reports of the given kind.
    pub fn list_kind(&self, kind: ReportKind) -> anyhow::Result<Vec<ReportEntry>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect())
    }

    /// Read a report by its ID (filename stem match).
    pub fn read(&self, id: &str) -> anyhow::Result<Option<Value>> {
        match self.list()?.into_iter().find(|e| e.matches(id)) {
            Some(entry) => {
                let content = std::fs::read_to_string(&entry.path)?;
                Ok(Some(serde_json::from_str(&content)?))
            }
            None => Ok(None),
        }
    }

    /// Delete a report by its ID.
    pub fn delete(&self, id: &str) -> anyhow::Result<bool> {
        match self.list()?.into_iter().find(|e| e.matches(id)) {
            Some(entry) => {
                std::fs::remove_file(&entry.path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete all reports.
    pub fn delete_all(&self) -> anyhow::Result<u32> {
        let mut count = 0;
        for entry in self.list()? {
            if std::fs::remove_file(&entry.path).is_ok() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Returns the reports directory path.
    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }
}

/// Parse a report filename like `crash-20260207-a1b2c3d4` into (kind, date, id).
fn parse_report_filename(stem: &str) -> (ReportKind, String, String) {
    let mut parts = stem.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(kind), Some(date), Some(id)) => {
            (ReportKind::from_prefix(kind), date.to_string(), id.to_string())
        }
        (Some(kind), Some(date), None) => {
            (ReportKind::from_prefix(kind), date.to_string(), stem.to_string())
        }
        _ => (ReportKind::Unknown, String::new(), stem.to_string()),
    }
}
