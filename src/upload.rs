use anyhow::{Context, Result};
use log::{info, warn};
use rocket::fs::TempFile;
use std::path::PathBuf;
use std::time::Instant;
use tokio::task::spawn_blocking;
use uuid::Uuid;

use crate::utils::safe_extension;

/// Where attachments live and how they are named.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Writes the part under a fresh name and returns that name.
    ///
    /// The bytes land in a `.tmp` file first and are renamed into place, so a
    /// half written upload never carries the final name.
    pub async fn persist(&self, file: &mut TempFile<'_>) -> Result<String> {
        let start_time = Instant::now();
        let extension = attachment_extension(file);
        let stem = format!("{}-{}", chrono::Utc::now().timestamp_millis(), Uuid::new_v4());
        let filename = stored_name(&stem, extension.as_deref());

        let path_tmp = self.root.join(format!("{}.tmp", stem));
        file.move_copy_to(&path_tmp)
            .await
            .with_context(|| format!("Failed to write upload to {}", path_tmp.display()))?;

        let path_final = self.path_of(&filename);
        spawn_blocking(move || -> Result<()> {
            std::fs::rename(&path_tmp, &path_final).with_context(|| {
                format!(
                    "Failed to move {} to {}",
                    path_tmp.display(),
                    path_final.display()
                )
            })?;
            Ok(())
        })
        .await??;

        info!(duration = &*format!("{:?}", start_time.elapsed());
            "Stored upload '{}' ({} bytes)",
            filename,
            file.len()
        );
        Ok(filename)
    }

    /// Removes a stored attachment whose record never made it to the store.
    pub fn discard(&self, filename: &str) {
        let path = self.path_of(filename);
        match std::fs::remove_file(&path) {
            Ok(()) => info!("Removed orphaned upload '{}'", filename),
            Err(err) => warn!("Failed to remove orphaned upload {}: {}", path.display(), err),
        }
    }
}

fn attachment_extension(file: &TempFile<'_>) -> Option<String> {
    file.raw_name()
        .and_then(|name| safe_extension(name.dangerous_unsafe_unsanitized_raw().as_str()))
        .or_else(|| {
            file.content_type()
                .and_then(|ct| ct.extension())
                .and_then(|ext| safe_extension(&format!("file.{}", ext.as_str())))
        })
}

fn stored_name(stem: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}
