use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "voxrelay")]
#[command(about = "Text-to-speech relay: HTTP webhook and stdin/stdout agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: VOXRELAY_CONFIG_PATH or ~/.voxrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the HTTP webhook (POST /webhook/audio, GET /health).
    Webhook {
        /// Config file path (default: VOXRELAY_CONFIG_PATH or ~/.voxrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8001)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 0.0.0.0)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Run the agent: one line on stdin in, one JSON reply line on stdout out, until EOF.
    Agent {
        /// Config file path (default: VOXRELAY_CONFIG_PATH or ~/.voxrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// List voices available to the configured API key.
    Voices {
        /// Config file path (default: VOXRELAY_CONFIG_PATH or ~/.voxrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("voxrelay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Webhook { config, port, bind }) => {
            if let Err(e) = run_webhook(config, port, bind).await {
                log::error!("webhook failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Agent { config }) => {
            if let Err(e) = run_agent(config).await {
                log::error!("agent failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Voices { config }) => {
            if let Err(e) = run_voices(config).await {
                log::error!("listing voices failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_webhook(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, _) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.webhook.port = p;
    }
    if let Some(b) = bind {
        config.webhook.bind = b;
    }
    lib::webhook::run_webhook(config).await
}

async fn run_agent(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let client = lib::tts::ElevenLabsClient::new(config.tts_settings()?)?;
    let relay = lib::relay::Relay::echo(Arc::new(client));
    let mut agent = lib::agent::Agent::new(relay, config.agent.on_synthesis_failure);
    agent.run_stdio().await?;
    Ok(())
}

async fn run_voices(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let client = lib::tts::ElevenLabsClient::new(config.tts_settings_without_voice()?)?;
    let voices = client.list_voices().await?;
    if voices.is_empty() {
        println!("no voices available");
    }
    for voice in voices {
        println!(
            "{}\t{}",
            voice.voice_id,
            voice.name.as_deref().unwrap_or("(unnamed)")
        );
    }
    Ok(())
}
