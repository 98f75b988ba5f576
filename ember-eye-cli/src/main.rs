mod cli_state;
mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::CaptureOptions;

#[derive(Parser)]
#[command(name = "ember-eye")]
#[command(version)]
#[command(about = "Capture, record and submit camera footage for fire detection")]
struct Args {
    /// TOML file with session configuration
    #[arg(long, global = true, env = "EMBER_EYE_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the detection service
    #[arg(long, global = true, env = "EMBER_EYE_SERVICE_URL")]
    service_url: Option<String>,

    /// Directory holding the replay cameras
    #[arg(long, global = true, env = "EMBER_EYE_ROOT", default_value = "cameras")]
    root: PathBuf,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List cameras; the default one is marked with `*`
    Devices,

    /// Capture one frame and submit it for detection
    Photo(CaptureOptions),

    /// Record a clip and submit it for detection
    Record {
        /// Recording length in seconds
        #[arg(long, default_value_t = 5)]
        seconds: u64,

        #[command(flatten)]
        options: CaptureOptions,
    },

    /// Submit an existing image or video file
    Detect {
        file: PathBuf,

        /// Download the annotated result image to this path
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(log_level(args.verbose))
        .parse_default_env()
        .format_target(false)
        .init();

    let config = settings::load(args.config.as_deref(), args.service_url.as_deref())?;
    log::debug!("detection endpoint: {}", config.detect_url());

    if let Command::Detect { file, save } = &args.command {
        return commands::detect(&config, file, save.as_deref(), args.json).await;
    }

    let session = cli_state::open_session(&args.root, config).await?;
    let outcome = match &args.command {
        Command::Devices => commands::list_devices(&session, args.json),
        Command::Photo(options) => commands::photo(&session, options, args.json).await,
        Command::Record { seconds, options } => commands::record(&session, *seconds, options, args.json).await,
        Command::Detect { .. } => Ok(()),
    };
    session.shutdown();
    outcome
}
