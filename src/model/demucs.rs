use crate::{
    error::{Result, ServiceError},
    io::command::run_captured,
    model::{SeparationRequest, Separator},
    registry::Registry,
};
use std::{path::PathBuf, process::Command};
use tracing::{error, info};

const IMPORT_CHECK: &str = "import demucs.pretrained";

/// Runs `python -m demucs.separate` in the configured interpreter.
pub struct DemucsCli {
    python: PathBuf,
    registry_path: Option<PathBuf>,
}

impl DemucsCli {
    pub fn new(python: impl Into<PathBuf>, registry_path: Option<PathBuf>) -> Self {
        Self {
            python: python.into(),
            registry_path,
        }
    }

    pub fn args(req: &SeparationRequest<'_>) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = vec![
            "-m".into(),
            "demucs.separate".into(),
            "--out".into(),
            req.output_dir.into(),
            "-n".into(),
            req.model.into(),
        ];
        if let Some(stem) = req.two_stems {
            args.push("--two-stems".into());
            args.push(stem.into());
        }
        args.push(req.input.into());
        args
    }
}

impl Separator for DemucsCli {
    fn check(&self) -> Result<()> {
        let out = run_captured(Command::new(&self.python).arg("-c").arg(IMPORT_CHECK))
            .map_err(|e| {
                ServiceError::Registry(format!("could not run {}: {e}", self.python.display()))
            })?;

        if !out.success {
            return Err(ServiceError::Registry(out.diagnostics()));
        }
        Ok(())
    }

    fn registry(&self) -> Result<Registry> {
        match &self.registry_path {
            Some(p) => Registry::from_path(p),
            None => Registry::embedded(),
        }
    }

    fn separate(&self, req: &SeparationRequest<'_>) -> Result<()> {
        info!(model = req.model, two_stems = ?req.two_stems, "running demucs");

        let out = run_captured(Command::new(&self.python).args(Self::args(req))).map_err(|e| {
            ServiceError::Separation(format!("could not run {}: {e}", self.python.display()))
        })?;

        if !out.success {
            let detail = out.diagnostics();
            error!(model = req.model, "demucs exited with failure: {detail}");
            return Err(ServiceError::Separation(detail));
        }
        Ok(())
    }
}
