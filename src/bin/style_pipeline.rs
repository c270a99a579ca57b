//! CLI for the style pipeline: summarize reference styles, ask for approval,
//! then apply the style to each target photo.

use clap::{ArgAction, Parser};
use nanoremix::pipeline::{PhotoOutcome, DEFAULT_STYLE_OUTPUT_DIR};
use nanoremix::prompt::DEFAULT_BASE_PROMPT;
use nanoremix::{ConsoleGate, GeminiClient, GeminiModel, PipelineOutcome, StylePipeline, StyleRequest};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "style_pipeline")]
#[command(
    about = "Summarize reference postcard styles, ask for approval, and apply the style to each target photo"
)]
#[command(version)]
struct Cli {
    /// Reference style image (repeat, at least two)
    #[arg(long = "style-image", value_name = "PATH", required = true)]
    style_images: Vec<PathBuf>,

    /// Target photo to restyle (repeat)
    #[arg(long = "photo", value_name = "PATH", required = true)]
    photos: Vec<PathBuf>,

    /// Base prompt combined with the derived style description
    #[arg(long, default_value = DEFAULT_BASE_PROMPT)]
    base_prompt: String,

    /// Directory where styled images are written, one folder per photo
    #[arg(long, default_value = DEFAULT_STYLE_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Also send the style images with every photo
    #[arg(long)]
    with_style_refs: bool,

    /// Model variant (nano-banana, nano-banana-pro)
    #[arg(short, long, default_value = "nano-banana")]
    model: GeminiModel,

    /// Print the batch summary as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    nanoremix::logging::init(cli.verbose)?;

    let client = GeminiClient::builder().model(cli.model).build()?;
    let request = StyleRequest::new(cli.style_images, cli.photos, cli.base_prompt)
        .with_output_dir(cli.output_dir)
        .with_style_references(cli.with_style_refs);
    request.validate()?;

    let mut gate = ConsoleGate::stdio();
    let outcome = StylePipeline::new(&client).run(&request, &mut gate).await?;

    let report = match outcome {
        PipelineOutcome::Rejected { .. } => {
            println!("Aborting without generating images.");
            return Ok(ExitCode::SUCCESS);
        }
        PipelineOutcome::Completed { report, .. } => report,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
    } else {
        for photo in &report.photos {
            match &photo.outcome {
                PhotoOutcome::Written { files, messages } => {
                    println!("\n{}:", photo.photo.display());
                    for message in messages {
                        println!("  model: {}", message);
                    }
                    for file in files {
                        println!("  saved {}", file.display());
                    }
                }
                PhotoOutcome::Failed { error } => {
                    println!("\n{}:\n  FAILED: {}", photo.photo.display(), error);
                }
            }
        }
        println!(
            "\n{} of {} photos styled.",
            report.succeeded().count(),
            report.photos.len()
        );
        if report.aborted {
            println!(
                "Batch stopped early; {} photo(s) not attempted.",
                request.photos.len() - report.photos.len()
            );
        }
    }

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} photo(s) failed.", report.failed().count());
        Ok(ExitCode::FAILURE)
    }
}
