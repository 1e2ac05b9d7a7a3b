mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Args, Commands};
use img_squeeze_client::constants::{ERROR_PREFIX, INFO_PREFIX, PROGRESS_SPINNER_TEMPLATE, SUCCESS_PREFIX};
use img_squeeze_client::display::{format_kib, render_state};
use img_squeeze_client::{
    logger, probe_dimensions, size_kib, ClientConfig, CompressionSession, SelectOutcome,
    SourceFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);

    let config = ClientConfig::new(args.backend, args.timeout, args.retries);

    match args.command {
        Commands::Compress {
            input,
            scale,
            quality,
            output,
        } => compress(&config, &input, scale, quality, output, args.quiet).await,
        Commands::Info { input } => show_image_info(&input).await,
    }
}

async fn compress(
    config: &ClientConfig,
    input: &Path,
    scale: Option<i32>,
    quality: Option<i32>,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let session = CompressionSession::connect(config).context("Failed to set up compression client")?;
    session.configure(
        scale.unwrap_or(config.defaults.scale_percent),
        quality.unwrap_or(config.defaults.quality),
    );

    let source = SourceFile::open(input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(ProgressStyle::default_spinner().template(PROGRESS_SPINNER_TEMPLATE)?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Compressing image via {}...", config.backend_url));

    let outcome = session.select_file(Some(source)).await;
    pb.finish_and_clear();

    let outcome = outcome.with_context(|| format!("Cannot use {:?} as an image", input))?;
    println!("{}", render_state(&session.state()));

    match outcome {
        SelectOutcome::Ready => {
            if let (Some(path), Some(compressed)) = (output, session.state().compressed().cloned()) {
                let bytes = session
                    .service()
                    .inner()
                    .download(&compressed.download_url)
                    .await
                    .context("Failed to download compressed image")?;
                tokio::fs::write(&path, &bytes)
                    .await
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("{} Saved compressed image to {:?}", SUCCESS_PREFIX, path);
            }
            Ok(())
        }
        SelectOutcome::Failed(e) => {
            eprintln!("{} Upload failed!", ERROR_PREFIX);
            Err(e.into())
        }
        SelectOutcome::Superseded => bail!("Selection was superseded"),
    }
}

async fn show_image_info(input: &Path) -> Result<()> {
    println!("{} Getting info for: {:?}", INFO_PREFIX, input);

    let source = SourceFile::open(input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;
    let (width, height) = probe_dimensions(source.clone()).await?;

    println!("  Name: {}", source.name());
    println!(
        "  Size: {} ({} bytes)",
        format_kib(size_kib(source.len())),
        source.len()
    );
    println!("  Dimensions: {} x {}", width, height);

    Ok(())
}
