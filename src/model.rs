//! Seams to the external separation and mastering tools.

pub mod demucs;
pub mod matchering;

use crate::{error::Result, registry::Registry};
use std::path::{Path, PathBuf};

pub use demucs::DemucsCli;
pub use matchering::MatcheringCli;

#[derive(Clone, Debug)]
pub struct SeparationRequest<'a> {
    pub model: &'a str,
    pub input: &'a Path,
    pub output_dir: &'a Path,
    /// Named stem vs. everything else, instead of the full source set.
    pub two_stems: Option<&'a str>,
}

/// A stem separation model library.
///
/// Implementations write `<output_dir>/<model>/<input_stem>/<stem>.wav`.
pub trait Separator: Send + Sync {
    /// Confirms the library and its pretrained model registry can be loaded.
    fn check(&self) -> Result<()>;

    fn registry(&self) -> Result<Registry>;

    fn separate(&self, req: &SeparationRequest<'_>) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitDepth {
    Pcm16,
    Pcm24,
}

#[derive(Clone, Debug)]
pub struct Rendition {
    pub path: PathBuf,
    pub bit_depth: BitDepth,
}

/// Reference matching mastering tool.
pub trait Masterer: Send + Sync {
    fn master(&self, target: &Path, reference: &Path, results: &[Rendition]) -> Result<()>;
}
