use std::error::Error;
use std::fs;
use std::path::PathBuf;
use clap::{Parser, Subcommand};
use log::{error, info};

use plexclient::config::PlexConfig;
use plexclient::logging::LoggingConfig;

/// Command line client for a Plex Media Server
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Server base URL, e.g. http://192.168.1.10:32400
    #[clap(short, long)]
    url: Option<String>,

    /// Authentication token
    #[clap(short, long)]
    token: Option<String>,

    /// JSON configuration file with a "plex" service section
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[clap(long)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the library sections
    Sections,

    /// Show the track playing on a player
    NowPlaying {
        /// Player product or title, e.g. "Plexamp"
        client: String,

        /// Only match sessions of this user id
        #[clap(long)]
        user: Option<String>,
    },

    /// Download album art
    AlbumArt {
        /// Absolute URL or server path (e.g. the thumb of now-playing)
        url: String,

        /// File to write the image to
        #[clap(short, long)]
        output: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<PlexConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => PlexConfig::from_file(path)?,
        None => {
            let url = cli.url.as_deref().ok_or("--url is required without --config")?;
            let token = cli.token.as_deref().ok_or("--token is required without --config")?;
            PlexConfig::new(url, token)
        }
    };

    // Command line values override the configuration file
    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.token = token.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }

    Ok(config)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let client = load_config(&cli)?.into_client();

    match cli.command {
        Commands::Sections => {
            let sections = client.list_library_sections()?;
            println!("{}", serde_json::to_string_pretty(&sections)?);
        }

        Commands::NowPlaying { client: player, user } => {
            let track = client.get_current_track(&player, user.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&track)?);
        }

        Commands::AlbumArt { url, output } => {
            let art = client.get_album_art(&url)?;
            fs::write(&output, &art)?;
            info!("Wrote {} bytes to {}", art.len(), output.display());
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: if cli.debug { "debug" } else { "warn" }.to_string(),
        target: "stderr".to_string(),
        ..LoggingConfig::default()
    };
    if let Err(e) = logging.initialize_logger() {
        eprintln!("{}", e);
    }

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
