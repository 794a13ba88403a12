//! Where external tools put their results inside a job's output directory.

use crate::types::OutputFormat;
use std::path::{Path, PathBuf};

/// Demucs nests results: `<output_dir>/<model>/<input_stem>/<stem>.wav`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeparationLayout {
    pub model: String,
    pub input_stem: String,
}

impl SeparationLayout {
    pub fn new(model: &str, input: &Path) -> Self {
        let input_stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("input")
            .to_string();
        Self {
            model: model.to_string(),
            input_stem,
        }
    }

    pub fn stems_dir(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.model).join(&self.input_stem)
    }

    pub fn stem_file(&self, output_dir: &Path, stem: &str, format: OutputFormat) -> PathBuf {
        self.stems_dir(output_dir)
            .join(format!("{stem}.{}", format.extension()))
    }
}

/// Mastering writes flat, fixed names directly into the output directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MasteringLayout;

impl MasteringLayout {
    pub const PCM16: &'static str = "mastered_16bit.wav";
    pub const PCM24: &'static str = "mastered_24bit.wav";
    pub const TRANSCODED_STEM: &'static str = "mastered";

    pub fn pcm16(self, output_dir: &Path) -> PathBuf {
        output_dir.join(Self::PCM16)
    }

    pub fn pcm24(self, output_dir: &Path) -> PathBuf {
        output_dir.join(Self::PCM24)
    }

    /// Extension-less path handed to the encoder.
    pub fn transcoded_stem(self, output_dir: &Path) -> PathBuf {
        output_dir.join(Self::TRANSCODED_STEM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separation_layout_nests_by_model_and_input_stem() {
        let layout = SeparationLayout::new("htdemucs", Path::new("/up/My Song.mp3"));
        assert_eq!(layout.input_stem, "My Song");
        assert_eq!(
            layout.stem_file(Path::new("/out/job"), "vocals", OutputFormat::Wav),
            PathBuf::from("/out/job/htdemucs/My Song/vocals.wav")
        );
    }

    #[test]
    fn mastering_layout_is_flat() {
        let out = Path::new("/out/job");
        assert_eq!(MasteringLayout.pcm16(out), out.join("mastered_16bit.wav"));
        assert_eq!(MasteringLayout.pcm24(out), out.join("mastered_24bit.wav"));
        assert_eq!(MasteringLayout.transcoded_stem(out), out.join("mastered"));
    }
}
