//! Inkpane - render a markdown document to preview markup.
//!
//! A stand-in for the surrounding editor: it drives the rendering core the
//! same way the preview pane does, through `process` and the readiness
//! summary.
//!
//! # Usage
//!
//! ```bash
//! inkpane README.md
//! inkpane --watch -o preview.html README.md
//! inkpane --engines README.md
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use inkpane::config::PreviewConfig;
use inkpane::render::{PassOutcome, Renderer};
use inkpane::watch::DocumentWatcher;

/// Render a markdown document to preview markup
#[derive(Parser, Debug)]
#[command(name = "inkpane", version, about, long_about = None)]
struct Cli {
    /// Markdown file to render
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Write markup to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Watch the file and re-render on change
    #[arg(short, long)]
    watch: bool,

    /// Skip all remote engine sources
    #[arg(long)]
    offline: bool,

    /// Print the engine readiness summary and exit
    #[arg(long)]
    engines: bool,

    /// Remote UML rendering endpoint
    #[arg(long, value_name = "URL")]
    uml_endpoint: Option<String>,

    /// Directory holding direct-load engine bundles
    #[arg(long, value_name = "DIR")]
    asset_dir: Option<PathBuf>,

    /// Privileged typesetting helper program
    #[arg(long, value_name = "PATH")]
    typeset_helper: Option<PathBuf>,
}

impl Cli {
    fn to_config(&self) -> PreviewConfig {
        let mut config = PreviewConfig {
            offline: self.offline,
            uml_endpoint: self.uml_endpoint.clone(),
            typeset_program: self.typeset_helper.clone(),
            ..PreviewConfig::default()
        };
        if let Some(asset_dir) = &self.asset_dir {
            config.asset_dir.clone_from(asset_dir);
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let renderer = Renderer::new(cli.to_config());
    let summary = renderer.ensure_libraries_ready().await;

    if cli.engines {
        for name in &summary.succeeded {
            println!("{name:12} ready");
        }
        for name in &summary.failed {
            println!("{name:12} unavailable");
        }
        return Ok(());
    }

    render_once(&renderer, &cli).await?;

    if cli.watch {
        let mut watcher = DocumentWatcher::new(&cli.file, Duration::from_millis(200))
            .context("Failed to watch file")?;
        eprintln!("watching {} (ctrl-c to stop)", watcher.target_path().display());
        loop {
            if watcher.take_change_ready() {
                render_once(&renderer, &cli).await?;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    Ok(())
}

async fn render_once(renderer: &Renderer, cli: &Cli) -> Result<()> {
    let text = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;

    match renderer.process(&text).await {
        PassOutcome::Completed(markup) => match &cli.output {
            Some(path) => std::fs::write(path, markup)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => println!("{markup}"),
        },
        PassOutcome::Superseded => {
            // A newer pass owns the output; nothing to write for this one.
        }
    }
    Ok(())
}
