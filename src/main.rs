//! InputLog - mouse and keyboard event logger.
//!
//! `inputlog mouse` records pointer movement, scrolling and clicks until a
//! mouse button is released. `inputlog keyboard` records key presses and
//! releases until Escape is released. Ctrl+C stops either one.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inputlog::config::{Config, Overrides, SinkKind};
use inputlog::listener::{Listener, ListenerSummary, Session, SinkErrorPolicy};
use inputlog::monitor::InputDevice;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for inputlog
#[derive(Parser, Debug)]
#[command(name = "inputlog")]
#[command(version, about = "Mouse and keyboard event logger", long_about = None)]
struct Cli {
    /// Configuration file path (default: <config dir>/inputlog/config.toml)
    #[arg(short, long, env = "INPUTLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record mouse movement, scroll and click events
    Mouse(ListenArgs),
    /// Record keyboard press and release events
    Keyboard(ListenArgs),
}

#[derive(Args, Debug)]
struct ListenArgs {
    /// Sink to write records to
    #[arg(long, value_enum, env = "INPUTLOG_SINK")]
    sink: Option<SinkKind>,

    /// Target file for the file sink
    #[arg(long, env = "INPUTLOG_FILE")]
    file: Option<PathBuf>,

    /// Database for the sqlite sink
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Collection for document sinks
    #[arg(long, env = "INPUTLOG_COLLECTION")]
    collection: Option<String>,

    /// Service-account key file for the firestore sink
    #[arg(long, env = "INPUTLOG_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// What a failed write does (continue|stop)
    #[arg(long)]
    on_error: Option<SinkErrorPolicy>,

    /// Run the listener on a background thread and wait for it
    #[arg(long)]
    background: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (device, args) = match cli.command {
        Command::Mouse(args) => (InputDevice::Mouse, args),
        Command::Keyboard(args) => (InputDevice::Keyboard, args),
    };

    let log_level = match cli.verbose {
        0 => None,
        1 => Some("debug".to_string()),
        _ => Some("trace".to_string()),
    };

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(Overrides {
            sink: args.sink,
            file_path: args.file,
            sqlite_path: args.sqlite,
            collection: args.collection,
            credentials: args.credentials,
            on_error: args.on_error,
            log_level,
            log_format: cli.log_format,
        });
    config.validate().context("Invalid configuration")?;

    init_logging(&config);
    tracing::debug!(?config, "Configuration loaded");

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║              InputLog - Input Event Logger                 ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    println!(
        "🔧 Preparing {} hook and {} sink...",
        device,
        config.sink.kind_for(device)
    );
    let Session { mut source, sink } =
        Session::open(&config.sink, device).context("Failed to start")?;
    println!("   ✓ Writing to {}", sink.describe());

    let stop = source.stop_signal();
    ctrlc::set_handler(move || {
        println!("\n🛑 Shutdown signal received...");
        stop.stop();
    })
    .context("Failed to install Ctrl+C handler")?;

    let listener = Listener::new(device, sink, config.sink.on_error);

    println!();
    println!("════════════════════════════════════════════════════════════════");
    match device {
        InputDevice::Mouse => println!("🎯 Listening to the mouse. Release a button to stop."),
        InputDevice::Keyboard => println!("🎯 Listening to the keyboard. Release Esc to stop."),
    }
    println!("   • Press Ctrl+C to quit at any time");
    println!("════════════════════════════════════════════════════════════════");
    println!();

    let summary = if args.background {
        listener
            .spawn(source)
            .context("Failed to start listener thread")?
            .join()
    } else {
        listener.run(source.as_mut())
    }
    .context("Listener failed")?;

    print_summary(device, &summary);
    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("inputlog={},warn", config.logging.level))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.logging.format.as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        "compact" => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}

fn print_summary(device: InputDevice, summary: &ListenerSummary) {
    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("📊 {} listener summary", device);
    println!("════════════════════════════════════════════════════════════════");
    println!("   Events:          {}", summary.events);
    println!("   Records written: {}", summary.records_written);
    println!("   Records lost:    {}", summary.records_lost);
    println!("════════════════════════════════════════════════════════════════");
    println!("\n👋 InputLog has exited. Goodbye!");
}
