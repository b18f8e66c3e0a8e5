//! Upload front end
//!
//! Runs the pipeline on files received in memory, for example from a web form.
//! Everything the run needs arrives in a [`SyncRequest`] and everything it
//! produces leaves in a [`SyncResponse`]; uploads are staged in a private
//! temporary directory that is removed when the call returns.

use crate::pipeline::{sync_with_progress, Job, Progress, RunSummary};
use crate::timing::{list_images, TimingTable};
use crate::{Error, OutputSpec, Result, ValidationMode};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Name of the downloadable result
pub const OUTPUT_FILE_NAME: &str = "out.mp4";
/// MIME type of the downloadable result
pub const OUTPUT_MIME_TYPE: &str = "video/mp4";

/// A file received from the client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-side file name
    pub name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Limits enforced before any work is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Largest accepted audio upload in bytes
    pub max_audio_bytes: u64,
    /// Most slide images per request
    pub max_images: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_audio_bytes: 100 * 1024 * 1024,
            max_images: 50,
        }
    }
}

/// Everything needed for one run
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub audio: UploadedFile,
    pub timing_table: UploadedFile,
    pub images: Vec<UploadedFile>,
    pub spec: OutputSpec,
    pub mode: ValidationMode,
}

/// Result of a successful run, ready for download
#[derive(Debug, Clone)]
pub struct SyncResponse {
    /// Suggested download name
    pub file_name: String,
    /// MIME type of `data`
    pub mime_type: String,
    /// Encoded video
    pub data: Vec<u8>,
    /// Run details
    pub summary: RunSummary,
}

impl UploadLimits {
    /// Reject requests over the limits
    pub fn check(&self, request: &SyncRequest) -> Result<()> {
        let audio_len = request.audio.bytes.len() as u64;
        if audio_len > self.max_audio_bytes {
            return Err(Error::UploadLimit(format!(
                "audio is {} bytes, the limit is {} bytes",
                audio_len, self.max_audio_bytes
            )));
        }
        if request.images.len() > self.max_images {
            return Err(Error::UploadLimit(format!(
                "{} images uploaded, the limit is {}",
                request.images.len(),
                self.max_images
            )));
        }
        Ok(())
    }
}

/// Run one request
pub fn handle(request: &SyncRequest, limits: &UploadLimits) -> Result<SyncResponse> {
    handle_with_progress(request, limits, |_| {})
}

/// Run one request, reporting progress
#[tracing::instrument(skip_all, fields(images = request.images.len()))]
pub fn handle_with_progress<F: FnMut(Progress)>(
    request: &SyncRequest,
    limits: &UploadLimits,
    progress: F,
) -> Result<SyncResponse> {
    limits.check(request)?;
    if request.images.is_empty() {
        return Err(Error::InvalidInput("No slide images uploaded".to_string()));
    }

    let audio_name = upload_name(&request.audio.name)?;
    let mut image_names = HashSet::new();
    for image in &request.images {
        let name = upload_name(&image.name)?;
        if !image_names.insert(name) {
            tracing::debug!(name, "duplicate image upload, keeping the last one");
        }
    }

    // Cheap checks first: a bad table should not cost an upload round to disk
    TimingTable::from_reader(request.timing_table.bytes.as_slice(), request.mode)?
        .require_images(&image_names.iter().map(|s| s.to_string()).collect())?;

    let workdir = tempfile::Builder::new().prefix("slidesync-").tempdir()?;
    let job = stage(request, audio_name, workdir.path())?;

    let summary = sync_with_progress(&job, progress)?;
    let data =
        std::fs::read(&summary.output).map_err(|e| Error::file_access(&summary.output, e))?;

    Ok(SyncResponse {
        file_name: OUTPUT_FILE_NAME.to_string(),
        mime_type: OUTPUT_MIME_TYPE.to_string(),
        data,
        summary,
    })
}

/// Write the uploads into `workdir` and describe the job over them
///
/// Each kind of upload gets its own directory, so no client name can collide
/// with the table, the output or another kind of upload.
fn stage(request: &SyncRequest, audio_name: &str, workdir: &Path) -> Result<Job> {
    let write = |path: PathBuf, bytes: &[u8]| {
        std::fs::write(&path, bytes)
            .map(|_| path.clone())
            .map_err(|e| Error::file_access(&path, e))
    };
    let mkdir = |path: PathBuf| {
        std::fs::create_dir(&path)
            .map(|_| path.clone())
            .map_err(|e| Error::file_access(&path, e))
    };

    let audio_dir = mkdir(workdir.join("audio"))?;
    let images_dir = mkdir(workdir.join("slides"))?;
    let table_dir = mkdir(workdir.join("table"))?;
    let output_dir = mkdir(workdir.join("output"))?;

    let audio = write(audio_dir.join(audio_name), &request.audio.bytes)?;
    for image in &request.images {
        write(images_dir.join(&image.name), &image.bytes)?;
    }
    tracing::debug!(count = list_images(&images_dir)?.len(), "images staged");

    let timing_table = write(table_dir.join("timing.csv"), &request.timing_table.bytes)?;

    Ok(Job {
        audio,
        timing_table,
        images_dir,
        output: output_dir.join(OUTPUT_FILE_NAME),
        spec: request.spec.clone(),
        mode: request.mode,
    })
}

/// Accept only bare file names, so uploads cannot escape the staging directory
fn upload_name(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part.to_str() == Some(name) => Ok(name),
        _ => Err(Error::InvalidInput(format!(
            "Uploaded file name {:?} is not a plain file name",
            name
        ))),
    }
}
