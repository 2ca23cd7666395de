//! Integration tests for bkt against a live S3-compatible server
//!
//! The bucket must already exist; bkt never creates buckets.
//!
//! Run with:
//! ```bash
//! # Start RustFS container
//! docker run -d --name rustfs -p 9000:9000 \
//!     -e RUSTFS_ACCESS_KEY=accesskey \
//!     -e RUSTFS_SECRET_KEY=secretkey \
//!     rustfs/rustfs:1.0.0-alpha.81
//!
//! export TEST_S3_ENDPOINT=http://localhost:9000
//! export TEST_S3_ACCESS_KEY=accesskey
//! export TEST_S3_SECRET_KEY=secretkey
//! export TEST_S3_BUCKET=bkt-test
//!
//! # Run tests
//! cargo test --features integration
//! ```

#![cfg(feature = "integration")]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::TempDir;

struct TestConfig {
    endpoint: String,
    access_key: String,
    secret_key: String,
    bucket: String,
}

/// Get S3 test configuration from environment
fn get_test_config() -> Option<TestConfig> {
    Some(TestConfig {
        endpoint: std::env::var("TEST_S3_ENDPOINT").ok()?,
        access_key: std::env::var("TEST_S3_ACCESS_KEY").ok()?,
        secret_key: std::env::var("TEST_S3_SECRET_KEY").ok()?,
        bucket: std::env::var("TEST_S3_BUCKET").ok()?,
    })
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{nanos:x}")
}

/// Run bkt in `work_dir`, feeding `script` on stdin
fn run_bkt(config: &TestConfig, work_dir: &Path, script: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_bkt"))
        .arg(&config.bucket)
        .args(["--endpoint", &config.endpoint, "--no-color", "--no-progress"])
        .arg("--config")
        .arg(work_dir.join("config.toml"))
        .current_dir(work_dir)
        .env("AWS_ACCESS_KEY_ID", &config.access_key)
        .env("AWS_SECRET_ACCESS_KEY", &config.secret_key)
        .env("AWS_REGION", "us-east-1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute bkt");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(script.as_bytes())
        .expect("Failed to write script");

    child.wait_with_output().expect("Failed to wait for bkt")
}

#[test]
fn test_upload_download_delete_round_trip() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping: TEST_S3_* not set");
        return;
    };

    let upload_dir = TempDir::new().unwrap();
    let key = format!("bkt-{}.txt", unique_suffix());
    let source = upload_dir.path().join(&key);
    let content = b"round trip through a live bucket\n";
    std::fs::write(&source, content).unwrap();

    let work_dir = TempDir::new().unwrap();
    let script = format!(
        "upload {}\ndownload {key}\ndelete {key}\nexit\n",
        source.display()
    );
    let output = run_bkt(&config, work_dir.path(), &script);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        output.status.success(),
        "bkt failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains(&format!("as {key}")));
    assert!(stdout.contains(&format!("Successfully downloaded object: {key}")));
    assert!(stdout.contains(&format!("Successfully deleted object: {key}")));
    assert_eq!(std::fs::read(work_dir.path().join(&key)).unwrap(), content);
}

#[test]
fn test_bad_credentials_exit_code() {
    let Some(mut config) = get_test_config() else {
        eprintln!("Skipping: TEST_S3_* not set");
        return;
    };
    config.secret_key = "definitely-wrong".to_string();

    let work_dir = TempDir::new().unwrap();
    let output = run_bkt(&config, work_dir.path(), "exit\n");

    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_missing_bucket_exit_code() {
    let Some(mut config) = get_test_config() else {
        eprintln!("Skipping: TEST_S3_* not set");
        return;
    };
    config.bucket = format!("bkt-missing-{}", unique_suffix());

    let work_dir = TempDir::new().unwrap();
    let output = run_bkt(&config, work_dir.path(), "exit\n");

    assert_eq!(output.status.code(), Some(5));
}
