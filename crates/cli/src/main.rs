mod config_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    receptionist_common::{InboundMessage, SenderKey},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "receptionist", about = "Receptionist: WhatsApp booking assistant", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Custom config directory searched before the defaults.
    #[arg(long, global = true, env = "RECEPTIONIST_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server (default when no subcommand is provided).
    Gateway,
    /// Run one message through the conversation pipeline and print the reply.
    Ask {
        /// Sender phone number, with or without the `whatsapp:` prefix.
        #[arg(long)]
        from: String,
        #[arg(short, long)]
        message: String,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "receptionist starting");

    let config_dir = cli.config_dir.as_deref();
    match cli.command {
        None | Some(Commands::Gateway) => {
            let config = receptionist_config::discover_and_load(config_dir);
            receptionist_gateway::start_gateway(&config, cli.bind.as_deref(), cli.port).await
        },
        Some(Commands::Ask { from, message }) => {
            let config = receptionist_config::discover_and_load(config_dir);
            let orchestrator = receptionist_gateway::build_orchestrator(&config)?;
            let msg = InboundMessage::new(SenderKey::from_channel_address(&from), message);
            if msg.is_empty() {
                anyhow::bail!("message is empty");
            }
            let reply = orchestrator.get_reply(&msg).await;
            println!("{reply}");
            Ok(())
        },
        Some(Commands::Config { action }) => config_commands::handle_config(action, config_dir),
    }
}
