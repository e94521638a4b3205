// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Asset downloading.
//!
//! The default pose model and the label font are fetched from the Ultralytics
//! assets releases on first use.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{PoseError, Result};

/// Default YOLO pose model name.
pub const DEFAULT_MODEL: &str = "yolo11n-pose.onnx";

/// URL for downloading the default pose model.
const DEFAULT_MODEL_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.3.0/yolo11n-pose.onnx";

/// Release hosting fonts and other small assets.
pub const ASSETS_URL: &str = "https://github.com/ultralytics/assets/releases/download/v0.0.0";

/// Connection timeout in seconds.
const CONNECT_TIMEOUT: u64 = 30;

/// Read timeout in seconds.
const READ_TIMEOUT: u64 = 300;

/// Progress bar width in characters.
const BAR_WIDTH: usize = 12;

/// Minimum seconds between progress redraws.
const MIN_UPDATE_INTERVAL: f64 = 0.1;

/// Format bytes as human-readable string (e.g., "10.4MB").
fn format_bytes(bytes: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if bytes >= MB {
        format!("{:.1}MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1}KB", bytes / KB)
    } else {
        format!("{bytes:.0}B")
    }
}

/// Generate progress bar string.
fn generate_bar(progress: f64, width: usize) -> String {
    let filled = ((progress * width as f64) as usize).min(width);
    format!("{}{}", "━".repeat(filled), "─".repeat(width - filled))
}

/// Print one progress line, overwriting the previous one.
fn print_progress(desc: &str, downloaded: u64, total: u64, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        downloaded as f64 / elapsed
    } else {
        0.0
    };

    if total > 0 {
        let progress = (downloaded as f64 / total as f64).min(1.0);
        eprint!(
            "\r\x1b[K{desc}: {}% {} {}/{} {}/s {elapsed:.1}s",
            (progress * 100.0) as u8,
            generate_bar(progress, BAR_WIDTH),
            format_bytes(downloaded as f64),
            format_bytes(total as f64),
            format_bytes(rate),
        );
    } else {
        eprint!(
            "\r\x1b[K{desc}: {} {}/s {elapsed:.1}s",
            format_bytes(downloaded as f64),
            format_bytes(rate),
        );
    }
    std::io::stderr().flush().ok();
}

/// Download `url` to `dest` with a progress bar.
///
/// The body is streamed to a `.part` file that is renamed into place only
/// after the transfer completes.
///
/// # Errors
///
/// Returns a `DownloadError` on network or file system failure.
pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(CONNECT_TIMEOUT)))
        .timeout_recv_body(Some(Duration::from_secs(READ_TIMEOUT)))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::Timeout(_) => {
            PoseError::DownloadError(format!("Connection timed out while downloading {url}"))
        }
        e => PoseError::DownloadError(format!("Failed to download {url}: {e}")),
    })?;

    let total: u64 = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let temp_path = dest.with_extension("part");
    let _ = fs::remove_file(&temp_path);

    let result = stream_to_file(response.into_body().into_reader(), &temp_path, url, dest, total)
        .and_then(|()| fs::rename(&temp_path, dest).map_err(PoseError::from));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Copy `reader` into `path`, reporting progress.
fn stream_to_file(
    mut reader: impl Read,
    path: &Path,
    url: &str,
    dest: &Path,
    total: u64,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let desc = format!("Downloading {url} to '{}'", dest.display());

    let mut buffer = [0u8; 65536];
    let mut downloaded: u64 = 0;
    let start = Instant::now();
    let mut last_update = start;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| PoseError::DownloadError(format!("Failed to read from network: {e}")))?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;

        if last_update.elapsed().as_secs_f64() >= MIN_UPDATE_INTERVAL {
            last_update = Instant::now();
            print_progress(&desc, downloaded, total, start.elapsed().as_secs_f64());
        }
    }
    writer.flush()?;

    print_progress(&desc, downloaded, total.max(downloaded), start.elapsed().as_secs_f64());
    eprintln!();
    Ok(())
}

/// Resolve the model path, downloading the default pose model when missing.
///
/// # Errors
///
/// Returns a `ModelLoadError` when the file is missing and is not the default
/// pose model, or the download error when fetching it fails.
pub fn resolve_model<P: AsRef<Path>>(model_path: P) -> Result<PathBuf> {
    let path = model_path.as_ref();
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if filename != DEFAULT_MODEL {
        return Err(PoseError::ModelLoadError(format!(
            "Model file not found: {}. Auto-download is only supported for {DEFAULT_MODEL}",
            path.display(),
        )));
    }

    download_file(DEFAULT_MODEL_URL, path)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_returns_error() {
        let result = resolve_model("unknown_model.onnx");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Auto-download is only supported"));
    }

    #[test]
    fn test_existing_model_is_returned() {
        let path = std::env::temp_dir().join(format!(
            "pose-overlay-existing-model-{}.onnx",
            std::process::id()
        ));
        fs::write(&path, b"onnx").unwrap();
        assert_eq!(resolve_model(&path).unwrap(), path);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500.0), "500B");
        assert_eq!(format_bytes(1024.0), "1.0KB");
        assert_eq!(format_bytes(6.0 * 1024.0 * 1024.0), "6.0MB");
    }

    #[test]
    fn test_generate_bar() {
        assert_eq!(generate_bar(0.0, 10), "──────────");
        assert_eq!(generate_bar(1.0, 10), "━━━━━━━━━━");
        assert_eq!(generate_bar(0.5, 10), "━━━━━─────");
    }
}
