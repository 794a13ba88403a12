use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// Containers the encoder is allowed to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp3,
    Flac,
    M4a,
    #[default]
    Wav,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Mp3, Self::Flac, Self::M4a, Self::Wav];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::M4a => "m4a",
            Self::Wav => "wav",
        }
    }

    /// Models and the mastering tool write wav; anything else needs a transcode.
    pub fn is_native(self) -> bool {
        self == Self::Wav
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.parse().ok()
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Flac => "audio/flac",
            Self::M4a => "audio/mp4",
            Self::Wav => "audio/wav",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == lower)
            .ok_or_else(|| ServiceError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A file received from a client, not yet written to a job directory.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct SeparateParams {
    pub model: String,
    pub stems: Vec<String>,
    pub output_format: OutputFormat,
}

impl SeparateParams {
    /// Two-stems mode only applies when exactly one stem was named.
    pub fn two_stems(&self) -> Option<&str> {
        match self.stems.as_slice() {
            [single] => Some(single.as_str()),
            _ => None,
        }
    }
}

/// Splits a comma separated `stems` field, dropping blanks.
pub fn parse_stem_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StemFile {
    pub name: String,
    pub filename: String,
    pub path: PathBuf,
    pub format: OutputFormat,
    pub size: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MasteredFile {
    pub filename: String,
    pub path: PathBuf,
    pub format: OutputFormat,
    pub size: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeparationResult {
    pub success: bool,
    pub job_id: String,
    pub model: String,
    pub stems: Vec<StemFile>,
    pub download_base: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MasteringResult {
    pub success: bool,
    pub job_id: String,
    pub mastered: MasteredFile,
    pub download_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sources: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelListing {
    pub models: Vec<ModelSummary>,
    pub count: usize,
    pub recommended: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub separation: String,
    pub mastering: String,
    pub encoder: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub services: ServiceStatus,
    pub models_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("MP3".parse::<OutputFormat>().unwrap(), OutputFormat::Mp3);
        assert_eq!(" flac ".parse::<OutputFormat>().unwrap(), OutputFormat::Flac);
        assert!(matches!(
            "ogg".parse::<OutputFormat>(),
            Err(ServiceError::UnsupportedFormat(f)) if f == "ogg"
        ));
    }

    #[test]
    fn stem_list_drops_blanks() {
        assert_eq!(parse_stem_list(Some(" vocals, ,drums ")), vec!["vocals", "drums"]);
        assert!(parse_stem_list(Some("")).is_empty());
        assert!(parse_stem_list(None).is_empty());
    }

    #[test]
    fn two_stems_only_for_a_single_name() {
        let mut p = SeparateParams {
            model: "htdemucs".into(),
            stems: vec!["vocals".into()],
            output_format: OutputFormat::Wav,
        };
        assert_eq!(p.two_stems(), Some("vocals"));
        p.stems.push("drums".into());
        assert_eq!(p.two_stems(), None);
        p.stems.clear();
        assert_eq!(p.two_stems(), None);
    }
}
