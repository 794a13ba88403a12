#![allow(dead_code)]

use std::{
    f32::consts::PI,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use stem_splitter_server::{
    encoder::output_path, AudioService, BitDepth, Encoder, Masterer, OutputFormat, Registry,
    Rendition, Result, SeparationLayout, SeparationRequest, Separator, ServiceError, UploadedFile,
    Workspace,
};
use tempfile::TempDir;

pub fn write_sine_wav(path: &Path, seconds: f32, channels: u16, bits: u16) {
    let sr = 44_100u32;
    let spec = hound::WavSpec {
        channels,
        sample_rate: sr,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(path, spec).unwrap();
    let amp = ((1i32 << (bits - 1)) - 1) as f32 * 0.2;
    let frames = (sr as f32 * seconds) as usize;
    for i in 0..frames {
        let s = ((2.0 * PI * 440.0 * i as f32 / sr as f32).sin() * amp) as i32;
        for _ in 0..channels {
            w.write_sample(s).unwrap();
        }
    }
    w.finalize().unwrap();
}

pub fn wav_upload(name: &str, seconds: f32, channels: u16) -> UploadedFile {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("fixture.wav");
    write_sine_wav(&p, seconds, channels, 16);
    UploadedFile {
        filename: name.to_string(),
        bytes: fs::read(p).unwrap(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeparatorMode {
    Ok,
    Fail,
    NoOutput,
}

/// Writes short wavs in the Demucs layout instead of running a model.
pub struct StubSeparator {
    pub mode: SeparatorMode,
    pub registry_error: bool,
    pub library_missing: bool,
    pub calls: Mutex<Vec<(String, Option<String>)>>,
}

impl StubSeparator {
    pub fn new(mode: SeparatorMode) -> Self {
        Self {
            mode,
            registry_error: false,
            library_missing: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn broken_registry() -> Self {
        Self {
            registry_error: true,
            ..Self::new(SeparatorMode::Ok)
        }
    }

    pub fn missing_library() -> Self {
        Self {
            library_missing: true,
            ..Self::new(SeparatorMode::Ok)
        }
    }
}

impl Separator for StubSeparator {
    fn check(&self) -> Result<()> {
        if self.library_missing {
            return Err(ServiceError::Registry(
                "ModuleNotFoundError: No module named 'demucs'".into(),
            ));
        }
        Ok(())
    }

    fn registry(&self) -> Result<Registry> {
        if self.registry_error {
            return Err(ServiceError::Registry("model registry unavailable".into()));
        }
        Registry::embedded()
    }

    fn separate(&self, req: &SeparationRequest<'_>) -> Result<()> {
        self.calls.lock().unwrap().push((
            req.model.to_string(),
            req.two_stems.map(str::to_string),
        ));

        match self.mode {
            SeparatorMode::Fail => {
                return Err(ServiceError::Separation("CUDA out of memory".into()))
            }
            SeparatorMode::NoOutput => return Ok(()),
            SeparatorMode::Ok => {}
        }

        let layout = SeparationLayout::new(req.model, req.input);
        fs::create_dir_all(layout.stems_dir(req.output_dir))?;

        let stems: Vec<String> = match req.two_stems {
            Some(s) => vec![s.to_string(), format!("no_{s}")],
            None => self.registry()?.find(req.model)?.sources.clone(),
        };
        for stem in stems {
            let p = layout.stem_file(req.output_dir, &stem, OutputFormat::Wav);
            write_sine_wav(&p, 0.05, 2, 16);
        }
        Ok(())
    }
}

/// Writes both renditions at their bit depth.
pub struct StubMasterer {
    pub fail: bool,
}

impl Masterer for StubMasterer {
    fn master(&self, target: &Path, reference: &Path, results: &[Rendition]) -> Result<()> {
        assert!(target.is_file() && reference.is_file());
        if self.fail {
            return Err(ServiceError::Mastering("reference too short".into()));
        }
        for r in results {
            let bits = match r.bit_depth {
                BitDepth::Pcm16 => 16,
                BitDepth::Pcm24 => 24,
            };
            write_sine_wav(&r.path, 0.05, 2, bits);
        }
        Ok(())
    }
}

/// Copies the input bytes behind a format tag.
#[derive(Default)]
pub struct CopyEncoder {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl Encoder for CopyEncoder {
    fn convert(&self, input: &Path, output_stem: &Path, format: OutputFormat) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ServiceError::Conversion("Unknown encoder 'libmp3lame'".into()));
        }
        let out = output_path(output_stem, format);
        let mut bytes = format!("{format}:").into_bytes();
        bytes.extend(fs::read(input)?);
        fs::write(&out, bytes)?;
        Ok(out)
    }

    fn available(&self) -> bool {
        true
    }
}

pub struct Harness {
    pub tmp: TempDir,
    pub service: Arc<AudioService>,
    pub separator: Arc<StubSeparator>,
    pub encoder: Arc<CopyEncoder>,
}

impl Harness {
    pub fn new(separator: StubSeparator) -> Self {
        Self::build(separator, StubMasterer { fail: false }, CopyEncoder::default())
    }

    pub fn build(separator: StubSeparator, masterer: StubMasterer, encoder: CopyEncoder) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(tmp.path().join("uploads"), tmp.path().join("outputs"));
        fs::create_dir_all(workspace.upload_root()).unwrap();
        fs::create_dir_all(workspace.output_root()).unwrap();

        let separator = Arc::new(separator);
        let encoder = Arc::new(encoder);
        let service = Arc::new(AudioService::new(
            workspace,
            separator.clone(),
            Arc::new(masterer),
            encoder.clone(),
            "htdemucs",
        ));
        Self {
            tmp,
            service,
            separator,
            encoder,
        }
    }

    pub fn upload_root(&self) -> PathBuf {
        self.tmp.path().join("uploads")
    }

    pub fn output_root(&self) -> PathBuf {
        self.tmp.path().join("outputs")
    }

    /// Number of job directories under both roots.
    pub fn job_dir_count(&self) -> usize {
        [self.upload_root(), self.output_root()]
            .iter()
            .map(|root| fs::read_dir(root).unwrap().count())
            .sum()
    }
}
