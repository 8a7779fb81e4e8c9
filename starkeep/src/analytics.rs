//! Usage analytics.

use std::{collections::BTreeMap, fs};

use serde::Serialize;
use tracing::{instrument, warn};

use crate::{retention::parse_date_folder, store::LocalStore};

/// Snapshot of storage usage across all clients.
///
/// Only the local backend is inspected; objects that live exclusively in the
/// remote blob store are not counted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    /// Number of stored files.
    pub total_files: u64,
    /// Total bytes stored.
    pub total_size_bytes: u64,
    /// Total megabytes stored.
    pub total_size_mb: f64,
    /// Storage ceiling in bytes.
    pub storage_limit_bytes: u64,
    /// Storage ceiling in megabytes.
    pub storage_limit_mb: f64,
    /// Percentage of the ceiling consumed.
    pub storage_usage_percent: f64,
    /// Upload counts per calendar day, sorted by day. The day is inferred
    /// from the first `YYYY-MM-DD` path segment of each file.
    pub uploads_by_day: BTreeMap<String, u64>,
    /// File counts per client.
    pub uploads_by_client: BTreeMap<String, u64>,
}

/// Walk the local upload tree and aggregate usage totals and per-day and
/// per-client histograms.
#[instrument(skip(local))]
#[must_use]
pub fn report(local: &LocalStore) -> Report {
    let mut total_files = 0u64;
    let mut total_size_bytes = 0u64;
    let mut uploads_by_day = BTreeMap::new();
    let mut uploads_by_client = BTreeMap::new();

    let entries = fs::read_dir(local.root())
        .map_err(|e| warn!("cannot read upload root: {e}"))
        .ok();

    for entry in entries.into_iter().flatten().filter_map(Result::ok) {
        if !entry.path().is_dir() {
            continue;
        }

        let client_id = entry.file_name().to_string_lossy().into_owned();
        let count = uploads_by_client.entry(client_id).or_insert(0u64);

        for file in walkdir::WalkDir::new(entry.path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let Ok(meta) = file.metadata() else {
                // the file may have been deleted mid-walk
                continue;
            };

            total_size_bytes += meta.len();
            total_files += 1;
            *count += 1;

            let day = file
                .path()
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .find(|segment| parse_date_folder(segment).is_some());

            if let Some(day) = day {
                *uploads_by_day.entry(day.to_owned()).or_insert(0u64) += 1;
            }
        }
    }

    let limit = local.limit();

    #[allow(clippy::cast_precision_loss)]
    let report = Report {
        total_files,
        total_size_bytes,
        total_size_mb: total_size_bytes as f64 / (1024.0 * 1024.0),
        storage_limit_bytes: limit,
        storage_limit_mb: limit as f64 / (1024.0 * 1024.0),
        storage_usage_percent: total_size_bytes as f64 / limit as f64 * 100.0,
        uploads_by_day,
        uploads_by_client,
    };

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_file(root: &Path, rel: &str, data: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    #[test]
    fn aggregates_totals_and_histograms() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStore::new(dir.path().join("uploads")).unwrap();
        let root = local.root().to_path_buf();

        write_file(&root, "abc/2024-01-01/report.pdf", b"0123456789");
        write_file(&root, "abc/2024-01-01/notes.txt", b"abcde");
        write_file(&root, "abc/2024-01-02/late.txt", b"x");
        write_file(&root, "xyz/loose.bin", b"xy");

        let report = report(&local);

        assert_eq!(report.total_files, 4);
        assert_eq!(report.total_size_bytes, 18);
        assert_eq!(report.uploads_by_client["abc"], 3);
        assert_eq!(report.uploads_by_client["xyz"], 1);
        assert_eq!(report.uploads_by_day["2024-01-01"], 2);
        assert_eq!(report.uploads_by_day["2024-01-02"], 1);
        // files outside a date folder have no day bucket
        assert_eq!(report.uploads_by_day.len(), 2);
    }

    #[test]
    fn empty_root_reports_zeroes() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStore::new(dir.path().join("uploads")).unwrap();

        let report = report(&local);

        assert_eq!(report.total_files, 0);
        assert_eq!(report.total_size_bytes, 0);
        assert!(report.uploads_by_day.is_empty());
        assert!(report.uploads_by_client.is_empty());
    }
}
