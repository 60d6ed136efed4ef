//! CSV export of the daily series.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::format::fixed;
use crate::state::MetricPoint;

pub const CSV_HEADER: [&str; 4] = ["Date", "Revenue", "Orders", "Conversion"];

/// `analytics_<days>days.csv`
pub fn export_file_name(days: usize) -> String {
    format!("analytics_{}days.csv", days)
}

pub fn csv_row(point: &MetricPoint) -> String {
    format!(
        "{},{},{},{}",
        point.label,
        point.revenue.round() as i64,
        point.orders,
        fixed(point.conv, 4)
    )
}

/// Header plus one row per day, newline separated, no trailing newline.
pub fn to_csv(series: &[MetricPoint]) -> String {
    let mut lines = Vec::with_capacity(series.len() + 1);
    lines.push(CSV_HEADER.join(","));
    lines.extend(series.iter().map(csv_row));
    lines.join("\n")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReceipt {
    pub file_name: String,
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: usize,
    pub sha256: String,
}

pub fn content_sha256(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Write the series into `dir` under the standard file name.
pub fn export_to_dir(dir: &Path, days: usize, series: &[MetricPoint]) -> Result<ExportReceipt> {
    fs::create_dir_all(dir).with_context(|| format!("creating export dir {}", dir.display()))?;
    let file_name = export_file_name(days);
    let path = dir.join(&file_name);
    let csv = to_csv(series);
    fs::write(&path, &csv).with_context(|| format!("writing {}", path.display()))?;
    Ok(ExportReceipt {
        file_name,
        path,
        rows: series.len(),
        bytes: csv.len(),
        sha256: content_sha256(&csv),
    })
}
