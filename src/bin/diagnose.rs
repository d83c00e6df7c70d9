use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use plantai::{client::DEFAULT_SERVER, render_report, DiagnosisClient, ImageUpload};
use tracing_subscriber::EnvFilter;

/// Upload a plant photo and print the diagnosis.
#[derive(Debug, Parser)]
#[command(name = "diagnose", version, about)]
struct Cli {
    /// JPEG or PNG photo of the plant.
    image: PathBuf,

    /// Base URL of the prediction service.
    #[arg(long, env = "PLANTAI_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Override the content type declared for the upload.
    #[arg(long)]
    content_type: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, plantai::ClientError> {
    let upload = match cli.content_type {
        Some(content_type) => ImageUpload::from_path_as(&cli.image, content_type).await?,
        None => ImageUpload::from_path(&cli.image).await?,
    };

    let client = DiagnosisClient::new(cli.server);
    eprintln!("Contacting AI Model...");
    let prediction = client.diagnose(upload).await?;

    Ok(render_report(&prediction))
}
