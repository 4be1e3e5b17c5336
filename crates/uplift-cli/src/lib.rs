use anyhow::Context;
use std::path::{Component, Path, PathBuf};
use uplift_core::{FileUploadRecord, LocalFile, UploadStatus};

/// Guess a MIME type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Read local files into memory for submission.
pub async fn load_files(paths: &[PathBuf]) -> anyhow::Result<Vec<LocalFile>> {
    let mut files = Vec::with_capacity(paths.len());

    for path in paths {
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
        }

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?;

        files.push(LocalFile::new(name, content_type_for(path), data));
    }

    Ok(files)
}

/// Number of records that ended in `error`.
pub fn failed_count(records: &[FileUploadRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.status() == UploadStatus::Error)
        .count()
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("uplift=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
