use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use chatlink::{
    config::CoreSettings, core::ChatCore, logger::init_tracing, responder::DictionaryResponder,
    texts::Texts,
};
use clap::{Args, Parser, Subcommand};
use io_plugin::loader::PluginRegistry;
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "chatlink",
    about = "Pluggable conversational relay host",
    version = "0.1.0"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect a plugin and relay the conversation
    Run(RunArgs),

    /// List the registered input/output plugins
    Plugins,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Name the bot announces to the plugin
    #[arg(long, env = "CHATLINK_BOT_NAME", default_value = "chatlink")]
    bot_name: String,

    /// Path of the input/output plugin to load
    #[arg(long, env = "CHATLINK_PLUGIN", default_value = "console")]
    plugin: PathBuf,

    /// Seconds the plugin may take to become ready
    #[arg(long, default_value_t = 10)]
    init_timeout: u64,

    /// Milliseconds between readiness and message polls
    #[arg(long, default_value_t = 100)]
    poll_interval: u64,

    /// Optional JSON catalog overriding the user-facing texts
    #[arg(long)]
    texts: Option<PathBuf>,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory for rolling log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run(RunArgs {
        bot_name: "chatlink".to_string(),
        plugin: PathBuf::from("console"),
        init_timeout: 10,
        poll_interval: 100,
        texts: None,
        log_level: "info".to_string(),
        log_dir: None,
    })) {
        Commands::Run(args) => run(args).await,
        Commands::Plugins => {
            let mut names = PluginRegistry::with_builtins().names();
            names.sort();
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let _guard = init_tracing(&args.log_level, args.log_dir.clone())?;

    let texts = match &args.texts {
        Some(path) => Texts::load(path)
            .with_context(|| format!("loading texts from {}", path.display()))?,
        None => Texts::default(),
    };
    let settings = CoreSettings::new(
        Duration::from_secs(args.init_timeout),
        Duration::from_millis(args.poll_interval),
    );

    let core = ChatCore::new(
        PluginRegistry::with_builtins(),
        Arc::new(DictionaryResponder::new()),
        settings,
        texts,
    );

    // host front end: print system messages, watch the link state
    core.notifier().on_system_message(|msg| println!("{msg}"));
    let (state_tx, mut state_rx) = tokio::sync::mpsc::unbounded_channel();
    core.notifier().on_state_change(move |up| {
        let _ = state_tx.send(up);
    });

    info!("chatlink starting up");
    core.connect(&args.bot_name, &args.plugin)?;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!();
                info!("ctrl-c received, shutting down");
                break;
            }
            changed = state_rx.recv() => match changed {
                Some(true) => info!("plugin ready, conversation running"),
                Some(false) | None => break,
            },
        }
    }

    core.shutdown().await;
    Ok(())
}
