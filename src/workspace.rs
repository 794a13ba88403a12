//! Per-request job directories.
//!
//! Every job owns `<upload_root>/<job_id>` and `<output_root>/<job_id>`.
//! Directory existence is the only lifecycle signal; nothing else is stored.

use crate::error::{Result, ServiceError};
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Random v4 token naming a job. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for JobId {
    type Err = ServiceError;

    // Only well-formed ids map to a directory, so `..` or `a/b` can't escape the roots.
    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s).map(Self).map_err(|_| ServiceError::NotFound)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Clone, Debug)]
pub struct Job {
    pub id: JobId,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct Workspace {
    upload_root: PathBuf,
    output_root: PathBuf,
}

impl Workspace {
    pub fn new(upload_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            output_root: output_root.into(),
        }
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Directories of a job, whether or not they exist.
    pub fn job(&self, id: JobId) -> Job {
        let key = id.to_string();
        Job {
            id,
            upload_dir: self.upload_root.join(&key),
            output_dir: self.output_root.join(&key),
        }
    }

    pub fn create_job(&self) -> Result<Job> {
        let job = self.job(JobId::generate());
        fs::create_dir_all(&job.upload_dir)?;
        if let Err(e) = fs::create_dir_all(&job.output_dir) {
            let _ = remove_dir_if_present(&job.upload_dir);
            return Err(e.into());
        }
        debug!(job_id = %job.id, "created job directories");
        Ok(job)
    }

    /// Removes both job directories. Absent directories are fine.
    pub fn cleanup(&self, id: JobId) -> Result<()> {
        let job = self.job(id);
        for dir in [&job.upload_dir, &job.output_dir] {
            remove_dir_if_present(dir).map_err(|source| ServiceError::Cleanup {
                job_id: id.to_string(),
                source,
            })?;
        }
        info!(job_id = %id, "cleaned up job");
        Ok(())
    }
}

fn remove_dir_if_present(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
