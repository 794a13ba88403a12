//! Request level orchestration: workspace, external tools, results.
//!
//! Everything here blocks. The HTTP layer calls in through `spawn_blocking`.

use crate::{
    encoder::Encoder,
    error::{Result, ServiceError},
    io::upload::persist_upload,
    layout::{MasteringLayout, SeparationLayout},
    locator::{files_with_extension, locate},
    model::{BitDepth, Masterer, Rendition, SeparationRequest, Separator},
    types::{
        HealthReport, MasteredFile, MasteringResult, ModelListing, ModelSummary, OutputFormat,
        SeparateParams, SeparationResult, ServiceStatus, StemFile, UploadedFile,
    },
    workspace::{Job, JobId, Workspace},
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{error, info, warn};

pub struct AudioService {
    workspace: Workspace,
    separator: Arc<dyn Separator>,
    masterer: Arc<dyn Masterer>,
    encoder: Arc<dyn Encoder>,
    recommended_model: String,
}

impl AudioService {
    pub fn new(
        workspace: Workspace,
        separator: Arc<dyn Separator>,
        masterer: Arc<dyn Masterer>,
        encoder: Arc<dyn Encoder>,
        recommended_model: impl Into<String>,
    ) -> Self {
        Self {
            workspace,
            separator,
            masterer,
            encoder,
            recommended_model: recommended_model.into(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn recommended_model(&self) -> &str {
        &self.recommended_model
    }

    pub fn health(&self) -> Result<HealthReport> {
        let registry = self
            .separator
            .check()
            .and_then(|()| self.separator.registry())
            .inspect_err(|e| {
                error!("Health check failed: {e}");
            })?;

        let encoder = if self.encoder.available() {
            "available"
        } else {
            "unavailable"
        };

        Ok(HealthReport {
            status: "healthy".into(),
            services: ServiceStatus {
                separation: "available".into(),
                mastering: "available".into(),
                encoder: encoder.into(),
            },
            models_count: registry.models.len(),
        })
    }

    pub fn models(&self) -> Result<ModelListing> {
        self.separator.check()?;
        let registry = self.separator.registry()?;
        let models: Vec<ModelSummary> = registry
            .models
            .iter()
            .map(|m| ModelSummary {
                id: m.name.clone(),
                name: m.name.clone(),
                description: m.description(),
                sources: m.source_count(),
            })
            .collect();

        Ok(ModelListing {
            count: models.len(),
            models,
            recommended: self.recommended_model.clone(),
        })
    }

    pub fn separate(&self, file: UploadedFile, params: SeparateParams) -> Result<SeparationResult> {
        // Reject bad requests before a job directory exists.
        let registry = self.separator.registry()?;
        let entry = registry
            .find(&params.model)
            .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        let two_stems = match params.two_stems() {
            Some(stem) => Some(entry.canonical_source(stem).ok_or_else(|| {
                ServiceError::BadRequest(format!("Model `{}` has no stem `{stem}`", entry.name))
            })?),
            None => None,
        };
        let model = entry.name.clone();

        let job = self.workspace.create_job()?;
        info!(job_id = %job.id, file = %file.filename, %model, "processing audio separation");

        let outcome =
            self.run_separation(&job, &file, &model, two_stems.as_deref(), params.output_format);
        let stems = self.finish(&job, outcome, "Separation")?;

        info!(job_id = %job.id, count = stems.len(), "separated stems");
        Ok(SeparationResult {
            success: true,
            job_id: job.id.to_string(),
            model,
            stems,
            download_base: download_base(job.id),
        })
    }

    fn run_separation(
        &self,
        job: &Job,
        file: &UploadedFile,
        model: &str,
        two_stems: Option<&str>,
        format: OutputFormat,
    ) -> Result<Vec<StemFile>> {
        let input = persist_upload(&job.upload_dir, file, "")?;
        let layout = SeparationLayout::new(model, &input);

        self.separator.separate(&SeparationRequest {
            model,
            input: &input,
            output_dir: &job.output_dir,
            two_stems,
        })?;

        let stems_dir = layout.stems_dir(&job.output_dir);
        if !stems_dir.is_dir() {
            return Err(ServiceError::MissingOutput(stems_dir));
        }

        files_with_extension(&stems_dir, OutputFormat::Wav.extension())?
            .into_iter()
            .map(|wav| {
                let name = file_stem(&wav);
                let final_path = self.deliver(&wav, &stems_dir.join(&name), format)?;
                describe_stem(name, final_path, format)
            })
            .collect()
    }

    pub fn master(
        &self,
        target: UploadedFile,
        reference: UploadedFile,
        format: OutputFormat,
    ) -> Result<MasteringResult> {
        let job = self.workspace.create_job()?;
        info!(
            job_id = %job.id,
            target = %target.filename,
            reference = %reference.filename,
            "processing audio mastering"
        );

        let outcome = self.run_mastering(&job, &target, &reference, format);
        let mastered = self.finish(&job, outcome, "Mastering")?;

        info!(job_id = %job.id, file = %mastered.filename, "mastered audio");
        Ok(MasteringResult {
            success: true,
            job_id: job.id.to_string(),
            download_url: format!("{}/{}", download_base(job.id), mastered.filename),
            mastered,
        })
    }

    fn run_mastering(
        &self,
        job: &Job,
        target: &UploadedFile,
        reference: &UploadedFile,
        format: OutputFormat,
    ) -> Result<MasteredFile> {
        let target_path = persist_upload(&job.upload_dir, target, "target_")?;
        let reference_path = persist_upload(&job.upload_dir, reference, "reference_")?;

        let layout = MasteringLayout;
        let pcm24 = layout.pcm24(&job.output_dir);
        self.masterer.master(
            &target_path,
            &reference_path,
            &[
                Rendition {
                    path: layout.pcm16(&job.output_dir),
                    bit_depth: BitDepth::Pcm16,
                },
                Rendition {
                    path: pcm24.clone(),
                    bit_depth: BitDepth::Pcm24,
                },
            ],
        )?;

        if !pcm24.is_file() {
            return Err(ServiceError::MissingOutput(pcm24));
        }

        let final_path = self.deliver(&pcm24, &layout.transcoded_stem(&job.output_dir), format)?;
        let size = fs::metadata(&final_path)?.len();
        Ok(MasteredFile {
            filename: file_name(&final_path),
            path: final_path,
            format,
            size,
        })
    }

    /// Native wav passes through; other formats are transcoded to `<stem>.<ext>`.
    fn deliver(&self, wav: &Path, output_stem: &Path, format: OutputFormat) -> Result<PathBuf> {
        if format.is_native() {
            Ok(wav.to_path_buf())
        } else {
            self.encoder.convert(wav, output_stem, format)
        }
    }

    /// Deletes the job's directories if the work failed.
    fn finish<T>(&self, job: &Job, outcome: Result<T>, what: &str) -> Result<T> {
        outcome.inspect_err(|e| {
            error!(job_id = %job.id, "{what} failed: {e}");
            if let Err(cleanup) = self.workspace.cleanup(job.id) {
                warn!(job_id = %job.id, "could not remove partial job: {cleanup}");
            }
        })
    }

    pub fn locate(&self, job_id: JobId, filename: &str) -> Result<PathBuf> {
        let job = self.workspace.job(job_id);
        locate(&job.output_dir, filename)
    }

    pub fn cleanup(&self, job_id: JobId) -> Result<()> {
        self.workspace.cleanup(job_id).inspect_err(|e| {
            error!(job_id = %job_id, "Cleanup failed: {e}");
        })
    }
}

pub fn download_base(job_id: JobId) -> String {
    format!("/api/download/{job_id}")
}

fn describe_stem(name: String, path: PathBuf, format: OutputFormat) -> Result<StemFile> {
    let size = fs::metadata(&path)?.len();
    Ok(StemFile {
        name,
        filename: file_name(&path),
        path,
        format,
        size,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
