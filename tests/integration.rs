use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use paper_rag_core::models::Metadata;
use paper_rag_core::store::{FlatIndex, VectorIndex};

/// Minimal valid PDF whose only text is `phrase`.
/// Builds body then xref with correct byte offsets so pdf-extract can parse it.
fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[paths]
raw_dir = "{root}/data/raw"
text_dir = "{root}/data/text"
chunks_dir = "{root}/data/chunks"
index_dir = "{root}/data/index"

[chunking]
max_length = 10
overlap = 2

[download]
base_url = "http://127.0.0.1:9"
timeout_secs = 2
"#,
        root = root.display()
    );

    let config_path = config_dir.join("prag.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_prag(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_prag"))
        .arg("--config")
        .arg(config_path)
        .arg("--progress")
        .arg("off")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run prag binary: {}", e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_parse_then_chunk() {
    let (tmp, config_path) = setup_test_env();
    let raw = tmp.path().join("data/raw");
    fs::create_dir_all(&raw).unwrap();
    fs::write(raw.join("1706.03762.pdf"), minimal_pdf("attention is all you need")).unwrap();
    fs::write(raw.join("broken.pdf"), b"not a pdf at all").unwrap();

    let (stdout, stderr, success) = run_prag(&config_path, &["parse"]);
    assert!(success, "parse failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("parsed: 2"));
    assert!(stdout.contains("empty: 1"));

    let text = fs::read_to_string(tmp.path().join("data/text/1706.03762.txt")).unwrap();
    assert!(text.contains("attention"), "extracted: {:?}", text);

    let (stdout, stderr, success) = run_prag(&config_path, &["chunk"]);
    assert!(success, "chunk failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("documents: 2"));

    let chunk_file = fs::read_to_string(tmp.path().join("data/chunks/1706.03762.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&chunk_file).unwrap();
    assert_eq!(json["id"], "1706.03762");
    assert_eq!(json["chunks"].as_array().unwrap().len(), 1);
}

#[test]
fn test_chunk_windows_overlap() {
    let (tmp, config_path) = setup_test_env();
    let text_dir = tmp.path().join("data/text");
    fs::create_dir_all(&text_dir).unwrap();
    let words: Vec<String> = (0..20).map(|i| format!("w{}", i)).collect();
    fs::write(text_dir.join("paper.txt"), words.join("\n")).unwrap();

    let (_, stderr, success) = run_prag(&config_path, &["chunk"]);
    assert!(success, "chunk failed: {}", stderr);

    let raw = fs::read_to_string(tmp.path().join("data/chunks/paper.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let chunks: Vec<&str> = json["chunks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    // stride 8 over 20 words: [0,10), [8,18), [16,20)
    assert_eq!(chunks.len(), 3);
    assert!(chunks[1].starts_with("w8 w9 "));
    assert_eq!(chunks[2], "w16 w17 w18 w19");
}

#[test]
fn test_index_requires_provider() {
    let (tmp, config_path) = setup_test_env();
    let chunks = tmp.path().join("data/chunks");
    fs::create_dir_all(&chunks).unwrap();
    fs::write(chunks.join("a.json"), r#"{"id":"a","chunks":["some text"]}"#).unwrap();

    let (_, stderr, success) = run_prag(&config_path, &["index"]);
    assert!(!success);
    assert!(stderr.contains("disabled"), "stderr: {}", stderr);
    assert!(!tmp.path().join("data/index").exists());
}

#[test]
fn test_stats_reports_persisted_index() {
    let (tmp, config_path) = setup_test_env();
    let index = FlatIndex::new(3).unwrap();
    index
        .add(
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
            vec![
                Metadata::new("1706.03762", 0),
                Metadata::new("1706.03762", 1),
                Metadata::new("2005.11401", 0),
            ],
        )
        .unwrap();
    index.persist(&tmp.path().join("data/index")).unwrap();

    let (stdout, stderr, success) = run_prag(&config_path, &["stats"]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Dimension:   3"));
    assert!(stdout.contains("Vectors:     3"));
    assert!(stdout.contains("Documents:   2"));
    assert!(stdout.contains("2005.11401"));
}

#[test]
fn test_stats_without_index_fails() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_prag(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to load index"), "stderr: {}", stderr);
}

#[test]
fn test_search_requires_provider() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_prag(&config_path, &["search", "attention"]);
    assert!(!success);
    assert!(stderr.contains("requires embeddings"), "stderr: {}", stderr);
}

#[test]
fn test_download_isolates_failures() {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_prag(&config_path, &["download", "1706.03762"]);
    assert!(success, "download failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("downloaded: 0"));
    assert!(stdout.contains("failed: 1"));
    assert!(tmp.path().join("data/raw/metadata.json").exists());
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[chunking]\nmax_length = 5\noverlap = 5\n").unwrap();
    let (_, stderr, success) = run_prag(&bad, &["chunk"]);
    assert!(!success);
    assert!(stderr.contains("overlap"), "stderr: {}", stderr);
}
