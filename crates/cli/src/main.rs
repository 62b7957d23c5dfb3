mod hotkey;

use ai_rewrite_core::notify::{DesktopNotifier, Notifier};
use ai_rewrite_core::settings::{CREDENTIAL_KEY, KNOWN_KEYS};
use ai_rewrite_core::{AiRewrite, Mode, PipelineState, RunOutcome, SettingsStore, TriggerHandler, init};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hotkey::{DEFAULT_HOTKEY, Hotkey, HotkeyEvent};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run in the background and rewrite the selection on the hotkey (default)
    Listen {
        /// Prompt mode to start in (a, b or c)
        #[arg(short, long, default_value = "a")]
        mode: Mode,

        /// Trigger hotkey; the same modifiers plus 1/2/3 switch modes
        #[arg(long, default_value = DEFAULT_HOTKEY)]
        hotkey: Hotkey,
    },

    /// Rewrite the current selection once, after giving you time to focus it
    Once {
        /// Prompt mode to use (a, b or c)
        #[arg(short, long, default_value = "a")]
        mode: Mode,

        /// Milliseconds to wait before copying the selection
        #[arg(long, default_value_t = 2000)]
        delay_ms: u64,
    },

    /// Show or edit the stored prompts and API key
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the settings file location
    Path,
    /// Print all settings (the API key is redacted)
    Show,
    /// Print one setting
    Get { key: String },
    /// Store a setting (promptA, promptB, promptC or credential)
    Set { key: String, value: String },
    /// Remove a setting
    Unset { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    init_tracing();
    let args = Args::parse();

    let command = match args.command {
        Some(command) => command,
        None => Command::Listen {
            mode: Mode::A,
            hotkey: DEFAULT_HOTKEY.parse().map_err(anyhow::Error::msg)?,
        },
    };

    match command {
        Command::Listen { mode, hotkey } => listen(mode, hotkey).await,
        Command::Once { mode, delay_ms } => once(mode, Duration::from_millis(delay_ms)).await,
        Command::Config { action } => edit_config(action),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn listen(mode: Mode, hotkey: Hotkey) -> Result<()> {
    let app = AiRewrite::new().context("Failed to initialize")?;
    let pipeline = app.pipeline();
    pipeline.select_mode(mode);
    let notifier = DesktopNotifier::new("AI Rewrite");

    let mut events = hotkey::spawn_listener(hotkey, {
        let pipeline = pipeline.clone();
        move || pipeline.state() != PipelineState::Idle
    });
    tracing::info!(
        %hotkey,
        %mode,
        settings = %app.settings().path().display(),
        model = %app.config().model_name,
        "Listening; use the same modifiers with 1/2/3 to switch modes"
    );

    while let Some(event) = events.recv().await {
        match event {
            HotkeyEvent::Trigger => {
                let pipeline = pipeline.clone();
                tokio::spawn(async move { pipeline.on_trigger().await });
            }
            HotkeyEvent::SelectMode(mode) => {
                pipeline.select_mode(mode);
                notifier.display(&format!("Mode {mode} selected"), None);
            }
            HotkeyEvent::Stopped(reason) => bail!("Hotkey listener stopped: {reason}"),
        }
    }

    Ok(())
}

async fn once(mode: Mode, delay: Duration) -> Result<()> {
    let app = AiRewrite::new().context("Failed to initialize")?;
    let pipeline = app.pipeline();
    pipeline.select_mode(mode);

    eprintln!("Focus the text to rewrite; copying in {} ms...", delay.as_millis());
    tokio::time::sleep(delay).await;

    match pipeline.run().await {
        RunOutcome::Replaced => {
            println!("Selection replaced");
            Ok(())
        }
        RunOutcome::Failed(err) => bail!("{}: {}", err.title(), err),
        RunOutcome::Rejected => bail!("Another run is already in progress"),
    }
}

fn edit_config(action: ConfigAction) -> Result<()> {
    let store = SettingsStore::open_default().context("Failed to locate settings")?;

    match action {
        ConfigAction::Path => println!("{}", store.path().display()),
        ConfigAction::Show => {
            let values = store.load().context("Failed to read settings")?;
            for key in KNOWN_KEYS {
                let shown = match values.get(key) {
                    Some(value) if key == CREDENTIAL_KEY => redact(value),
                    Some(value) => value.clone(),
                    None => "(unset)".to_string(),
                };
                println!("{key} = {shown}");
            }
        }
        ConfigAction::Get { key } => match store.get(&key).context("Failed to read settings")? {
            Some(value) => println!("{value}"),
            None => bail!("'{key}' is not set"),
        },
        ConfigAction::Set { key, value } => {
            store.set(&key, &value).context("Failed to save settings")?;
            println!("Saved {key}");
        }
        ConfigAction::Unset { key } => {
            if store.unset(&key).context("Failed to save settings")? {
                println!("Removed {key}");
            } else {
                println!("{key} was not set");
            }
        }
    }

    Ok(())
}

/// Keeps only enough of a secret to recognise it.
fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
