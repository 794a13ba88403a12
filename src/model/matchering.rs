use crate::{
    error::{Result, ServiceError},
    io::command::run_captured,
    model::{BitDepth, Masterer, Rendition},
};
use std::{path::Path, path::PathBuf, process::Command};
use tracing::{error, info};

// argv: target reference then (kind, path) pairs
const MATCHERING_SCRIPT: &str = r#"
import sys
import matchering as mg
kinds = {"pcm16": mg.pcm16, "pcm24": mg.pcm24}
pairs = sys.argv[3:]
results = [kinds[pairs[i]](pairs[i + 1]) for i in range(0, len(pairs), 2)]
mg.process(target=sys.argv[1], reference=sys.argv[2], results=results)
"#;

/// Runs Matchering through the configured Python interpreter.
pub struct MatcheringCli {
    python: PathBuf,
}

impl MatcheringCli {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

fn kind(depth: BitDepth) -> &'static str {
    match depth {
        BitDepth::Pcm16 => "pcm16",
        BitDepth::Pcm24 => "pcm24",
    }
}

impl Masterer for MatcheringCli {
    fn master(&self, target: &Path, reference: &Path, results: &[Rendition]) -> Result<()> {
        if results.is_empty() {
            return Err(ServiceError::Mastering("no renditions requested".into()));
        }

        let mut cmd = Command::new(&self.python);
        cmd.arg("-c").arg(MATCHERING_SCRIPT).arg(target).arg(reference);
        for r in results {
            cmd.arg(kind(r.bit_depth)).arg(&r.path);
        }

        info!(target = %target.display(), reference = %reference.display(), "running matchering");

        let out = run_captured(&mut cmd).map_err(|e| {
            ServiceError::Mastering(format!("could not run {}: {e}", self.python.display()))
        })?;

        if !out.success {
            let detail = out.diagnostics();
            error!("matchering exited with failure: {detail}");
            return Err(ServiceError::Mastering(detail));
        }
        Ok(())
    }
}
