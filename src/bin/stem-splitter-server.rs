use clap::{Parser, Subcommand};
use std::{path::PathBuf, process, sync::Arc};
use stem_splitter_server::{
    run_server, AudioService, DemucsCli, Ffmpeg, MatcheringCli, Registry, Separator,
    ServiceConfig, Workspace,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "stem-splitter-server")]
#[command(about = "HTTP service for audio stem separation and mastering", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file (overrides STEM_SPLITTER_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        #[arg(short, long)]
        listen: Option<String>,

        #[arg(long)]
        upload_dir: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// List available models
    List,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config).and_then(|cfg| match cli.command {
        Commands::Serve {
            listen,
            upload_dir,
            output_dir,
        } => handle_serve(cfg, listen, upload_dir, output_dir),
        Commands::List => handle_list(&cfg),
    });

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            tracing::error!("{e:#}");
            process::exit(1);
        }
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ServiceConfig> {
    let mut cfg = match path {
        Some(p) => ServiceConfig::load_from_path(&p)?,
        None => return Ok(ServiceConfig::load()?),
    };
    cfg.apply_env(|key| std::env::var(key).ok());
    Ok(cfg)
}

fn handle_serve(
    mut cfg: ServiceConfig,
    listen: Option<String>,
    upload_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(l) = listen {
        cfg.listen_addr = l;
    }
    if let Some(d) = upload_dir {
        cfg.upload_dir = d;
    }
    if let Some(d) = output_dir {
        cfg.output_dir = d;
    }
    cfg.ensure_directories()?;

    tracing::info!(
        listen_addr = %cfg.listen_addr,
        uploads = %cfg.upload_dir.display(),
        outputs = %cfg.output_dir.display(),
        "stem-splitter-server boot"
    );

    let service = Arc::new(AudioService::new(
        Workspace::new(&cfg.upload_dir, &cfg.output_dir),
        Arc::new(DemucsCli::new(&cfg.python, cfg.registry_path.clone())),
        Arc::new(MatcheringCli::new(&cfg.python)),
        Arc::new(Ffmpeg::new(&cfg.ffmpeg)),
        cfg.default_model.clone(),
    ));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(&cfg.listen_addr, service, cfg.max_upload_bytes))
}

fn handle_list(cfg: &ServiceConfig) -> anyhow::Result<()> {
    let registry: Registry = DemucsCli::new(&cfg.python, cfg.registry_path.clone()).registry()?;

    println!("Available Models");
    println!("{}", "-".repeat(40));
    for model in &registry.models {
        let marker = if model.name == cfg.default_model { " (default)" } else { "" };
        println!(
            "  {:<14} {} sources: {}{}",
            model.name,
            model.source_count(),
            model.sources.join(", "),
            marker
        );
    }
    Ok(())
}
