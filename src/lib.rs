//! # stem-splitter-server
//!
//! HTTP service that separates audio into stems with Demucs, masters tracks
//! against a reference with Matchering, and transcodes results with ffmpeg.
//! All heavy lifting happens in those external tools; this crate manages job
//! directories, invokes the tools, finds their outputs and serves them.

pub mod config;
pub mod encoder;
pub mod error;
pub mod io;
pub mod layout;
pub mod locator;
pub mod model;
pub mod registry;
pub mod server;
pub mod service;
pub mod types;
pub mod workspace;

pub use crate::{
    config::ServiceConfig,
    encoder::{Encoder, Ffmpeg},
    error::{Result, ServiceError},
    layout::{MasteringLayout, SeparationLayout},
    model::{
        BitDepth, DemucsCli, Masterer, MatcheringCli, Rendition, SeparationRequest, Separator,
    },
    registry::{ModelEntry, Registry},
    server::{router, run_server},
    service::AudioService,
    types::{
        MasteredFile, MasteringResult, OutputFormat, SeparateParams, SeparationResult, StemFile,
        UploadedFile,
    },
    workspace::{Job, JobId, Workspace},
};
