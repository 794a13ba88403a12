//! Transcoding through an external encoder (ffmpeg).

use crate::{
    error::{Result, ServiceError},
    io::command::run_captured,
    types::OutputFormat,
};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{error, info};

pub trait Encoder: Send + Sync {
    /// Converts `input` into `<output_stem>.<ext>` and returns that path.
    fn convert(&self, input: &Path, output_stem: &Path, format: OutputFormat) -> Result<PathBuf>;

    /// Whether the encoder can be launched at all.
    fn available(&self) -> bool;
}

/// Codec arguments for each allowed container.
pub fn codec_args(format: OutputFormat) -> &'static [&'static str] {
    match format {
        OutputFormat::Mp3 => &["-codec:a", "libmp3lame", "-qscale:a", "2"],
        OutputFormat::Flac => &["-codec:a", "flac"],
        OutputFormat::M4a => &["-codec:a", "aac", "-b:a", "256k"],
        OutputFormat::Wav => &["-codec:a", "pcm_s16le"],
    }
}

/// `<output_stem>.<ext>`, keeping any dots already in the stem.
pub fn output_path(output_stem: &Path, format: OutputFormat) -> PathBuf {
    let mut name = OsString::from(output_stem.as_os_str());
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Encoder for Ffmpeg {
    fn convert(&self, input: &Path, output_stem: &Path, format: OutputFormat) -> Result<PathBuf> {
        let output = output_path(output_stem, format);

        let mut cmd = Command::new(&self.program);
        cmd.arg("-i")
            .arg(input)
            .arg("-y")
            .args(codec_args(format))
            .arg(&output);

        let out = run_captured(&mut cmd).map_err(|e| {
            ServiceError::Conversion(format!("could not run {}: {e}", self.program.display()))
        })?;

        if !out.success {
            let detail = out.diagnostics();
            error!(%format, input = %input.display(), "ffmpeg conversion failed: {detail}");
            return Err(ServiceError::Conversion(detail));
        }

        info!(%format, output = %output.display(), "converted audio");
        Ok(output)
    }

    fn available(&self) -> bool {
        run_captured(Command::new(&self.program).arg("-version"))
            .map(|o| o.success)
            .unwrap_or(false)
    }
}
