use clap::{Parser, Subcommand};
use relay::channels::{Attachment, ChannelHandler, ChannelStore, OutboundMsg, TelegramHandler};
use relay::transport::HttpTransport;

#[derive(Parser)]
#[command(name = "tgrelay")]
#[command(about = "Telegram channel relay", long_about = None)]
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
        /// Config file path (default: TGRELAY_CONFIG_PATH or ~/.tgrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the gateway: webhook ingestion at /c/<type>/<uuid>/receive and outbound /send.
    Gateway {
        /// Config file path (default: TGRELAY_CONFIG_PATH or ~/.tgrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 15152)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send one message through a configured channel and print the delivery status as JSON.
    Send {
        /// Config file path (default: TGRELAY_CONFIG_PATH or ~/.tgrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Channel uuid from the config's channel list.
        #[arg(long, value_name = "UUID")]
        channel: String,

        /// Destination chat or user id.
        #[arg(long, value_name = "ID")]
        to: String,

        #[arg(long, default_value = "")]
        text: String,

        /// Attachment as `<media type>:<url>`, e.g. `image/jpeg:https://example.com/a.jpg`. Repeatable.
        #[arg(long = "attachment", value_name = "TYPE:URL")]
        attachments: Vec<String>,

        /// Quick reply label. Repeatable; shown as a one-row keyboard.
        #[arg(long = "quick-reply", value_name = "LABEL")]
        quick_replies: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("tgrelay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            channel,
            to,
            text,
            attachments,
            quick_replies,
        }) => {
            let msg = attachments
                .iter()
                .map(|raw| Attachment::parse(raw))
                .fold(OutboundMsg::new(channel, to, text), OutboundMsg::with_attachment)
                .with_quick_replies(quick_replies);
            if let Err(e) = run_send(config, msg).await {
                log::error!("send failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(relay::config::default_config_path);
    let dir = relay::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = relay::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    relay::gateway::run_gateway(config).await
}

async fn run_send(config_path: Option<std::path::PathBuf>, msg: OutboundMsg) -> anyhow::Result<()> {
    let (config, _) = relay::config::load_config(config_path)?;
    let store = ChannelStore::new(config.channels.iter().cloned());
    let channel = store.get(&msg.channel_uuid, Some(relay::channels::telegram::CHANNEL_TYPE))?;

    let handler = TelegramHandler::new(
        relay::config::resolve_telegram_api_base(&config),
        HttpTransport::new(config.telegram.request_timeout()),
    );
    let status = handler.send_msg(channel, &msg).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    if !status.is_wired() {
        anyhow::bail!(
            "message {} not delivered: {} of {} part(s) failed",
            msg.uuid,
            status.failures(),
            status.parts()
        );
    }
    Ok(())
}
