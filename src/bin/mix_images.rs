//! CLI for remixing 1-5 images with Gemini.

use clap::{ArgAction, Parser};
use nanoremix::image::validate_remix_count;
use nanoremix::output::DEFAULT_OUTPUT_DIR;
use nanoremix::{remix_files, GeminiClient, GeminiModel, OutputWriter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mix_images")]
#[command(about = "Remix or combine 1-5 images with Gemini (Nano Banana)")]
#[command(version)]
struct Cli {
    /// Input image (repeat for up to 5 images)
    #[arg(short = 'i', long = "image", value_name = "PATH", required = true)]
    images: Vec<PathBuf>,

    /// Prompt for the model (defaults depend on the number of images)
    #[arg(long)]
    prompt: Option<String>,

    /// Directory to write results to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Model variant (nano-banana, nano-banana-pro)
    #[arg(short, long, default_value = "nano-banana")]
    model: GeminiModel,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    nanoremix::logging::init(cli.verbose)?;

    // Credentials and counts are checked before touching any file
    let client = GeminiClient::builder().model(cli.model).build()?;
    validate_remix_count(cli.images.len())?;

    let writer = OutputWriter::new(&cli.output_dir);
    let outcome = remix_files(&client, &cli.images, cli.prompt.as_deref(), &writer).await?;

    if cli.json {
        let result = serde_json::json!({
            "success": true,
            "prompt": outcome.prompt,
            "files": outcome.files,
            "messages": outcome.messages,
            "model": outcome.metadata.model,
            "duration_ms": outcome.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !outcome.messages.is_empty() {
        println!("Model messages:");
        for message in &outcome.messages {
            println!("  {}", message);
        }
    }
    for file in &outcome.files {
        println!("Saved {}", file.display());
    }
    if let Some(duration) = outcome.metadata.duration_ms {
        println!("Duration: {}ms", duration);
    }

    Ok(())
}
