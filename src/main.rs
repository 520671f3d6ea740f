use anyhow::Result;
use clap::Parser;
use moodmatch::app::App;
use moodmatch::media::MediaAttachment;
use moodmatch::models::Config;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "moodmatch")]
#[command(about = "Find movies that match your mood")]
struct CliArgs {
    /// How you feel right now.
    #[arg(short, long)]
    text: Option<String>,

    /// Image or short video that captures the mood.
    #[arg(short, long, value_name = "PATH")]
    media: Option<PathBuf>,

    /// Start an interactive session (the default when no input is given).
    #[arg(short, long)]
    interactive: bool,
}

impl CliArgs {
    fn wants_interactive(&self) -> bool {
        self.interactive || (self.text.is_none() && self.media.is_none())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodmatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting moodmatch");
    let mut app = App::new(&config);

    if args.wants_interactive() {
        if let Some(text) = args.text {
            app.capture_mut().edit_text(text);
        }
        if let Some(path) = args.media {
            let attachment = MediaAttachment::from_path(&path).await?;
            app.capture_mut().attach(attachment);
        }
        let stdin = BufReader::new(tokio::io::stdin());
        app.run_interactive(stdin, tokio::io::stdout()).await?;
        return Ok(());
    }

    match app.run_once(args.text, args.media).await {
        Ok(report) => {
            println!("{}", report);
            if report.is_error() {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            error!("Failed to submit mood: {}", e);
            std::process::exit(1);
        }
    }
}
