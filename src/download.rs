//! Paper download from arXiv (or any mirror with the same URL layout).
//!
//! Each id is fetched from `{base_url}/{id}.pdf` and written to
//! `{raw_dir}/{id}.pdf`. Failures are isolated per id: a 404 or a network
//! error for one paper is recorded and the batch moves on. The successful
//! downloads are listed in `{raw_dir}/metadata.json`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::config::DownloadConfig;
use crate::http;
use crate::progress::{ProgressEvent, ProgressReporter};

/// Manifest file written next to the downloaded PDFs.
pub const MANIFEST_FILE: &str = "metadata.json";

/// One successfully downloaded paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub arxiv_id: String,
    pub pdf_path: String,
    pub url: String,
}

/// Outcome of [`download_papers`].
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub downloaded: Vec<DownloadRecord>,
    /// `(id, reason)` for every id that could not be fetched.
    pub failed: Vec<(String, String)>,
}

/// URL of the PDF for `arxiv_id`.
pub fn pdf_url(base_url: &str, arxiv_id: &str) -> String {
    format!("{}/{}.pdf", base_url.trim_end_matches('/'), arxiv_id)
}

/// Download every id in `arxiv_ids` into `raw_dir`.
///
/// Only setup problems (creating `raw_dir`, building the client, writing
/// the manifest) fail the whole call.
pub async fn download_papers(
    arxiv_ids: &[String],
    raw_dir: &Path,
    config: &DownloadConfig,
    progress: &dyn ProgressReporter,
) -> Result<DownloadReport> {
    std::fs::create_dir_all(raw_dir)
        .with_context(|| format!("Failed to create {}", raw_dir.display()))?;
    let client = http::client(config.timeout_secs)?;

    let mut report = DownloadReport::default();
    let total = arxiv_ids.len();

    for (i, arxiv_id) in arxiv_ids.iter().enumerate() {
        let url = pdf_url(&config.base_url, arxiv_id);
        let pdf_path = raw_dir.join(format!("{}.pdf", arxiv_id));

        match fetch_one(&client, &url, &pdf_path).await {
            Ok(()) => {
                info!(arxiv_id = %arxiv_id, "downloaded");
                report.downloaded.push(DownloadRecord {
                    arxiv_id: arxiv_id.clone(),
                    pdf_path: pdf_path.display().to_string(),
                    url,
                });
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(arxiv_id = %arxiv_id, error = %reason, "download failed");
                progress.report(ProgressEvent::skipped("download", arxiv_id, &reason));
                report.failed.push((arxiv_id.clone(), reason));
            }
        }
        progress.report(ProgressEvent::advanced("download", i + 1, total));
    }

    let manifest_path = raw_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&report.downloaded)?;
    std::fs::write(&manifest_path, json)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    Ok(report)
}

async fn fetch_one(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP {}", status);
    }
    let bytes = response.bytes().await?;
    tokio::fs::write(dest, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    #[test]
    fn test_pdf_url() {
        assert_eq!(
            pdf_url("https://arxiv.org/pdf/", "2402.06782"),
            "https://arxiv.org/pdf/2402.06782.pdf"
        );
    }

    #[tokio::test]
    async fn test_unreachable_mirror_records_failures() {
        let tmp = TempDir::new().unwrap();
        let config = DownloadConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
        };
        let ids = vec!["2402.06782".to_string(), "2310.12345".to_string()];
        let report = download_papers(&ids, tmp.path(), &config, &NoProgress)
            .await
            .unwrap();
        assert!(report.downloaded.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, "2402.06782");

        let manifest = std::fs::read_to_string(tmp.path().join(MANIFEST_FILE)).unwrap();
        let records: Vec<DownloadRecord> = serde_json::from_str(&manifest).unwrap();
        assert!(records.is_empty());
    }
}
