use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use tracing::info;
use weather_core::{
    CommandRequest, CompassPolicy, Config, Router, Secret, build_client, pipeline_from_config,
};

use crate::telegram::TelegramTransport;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-bot", version, about = "Weather chat bot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store API keys and the bot token in the config file.
    Configure,

    /// Answer a single message locally, e.g. `weather-bot ask "/weather Riccione"`.
    Ask {
        /// Message text, starting with a command.
        text: String,

        /// Chat identifier to attribute the message to.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        chat_id: i64,
    },

    /// Start polling Telegram for commands.
    Run,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Ask { text, chat_id } => {
                let (router, _) = router_from_env()?;

                let request = match CommandRequest::parse(&text, chat_id) {
                    Ok(request) => request,
                    Err(err) => bail!("{err}.\nHint: try `weather-bot ask /help`."),
                };

                println!("{}", router.handle(&request).await);
                Ok(())
            }
            Command::Run => {
                let (router, transport) = router_from_env()?;

                info!("starting weather bot");
                transport.run(&router).await
            }
        }
    }
}

/// Validate credentials once and build the router and transport on one HTTP client.
fn router_from_env() -> anyhow::Result<(Router, TelegramTransport)> {
    let config = load_config()?;
    let credentials = config.credentials()?;
    let http = build_client(config.http_timeout())?;

    let router = Router::new(pipeline_from_config(&config, &credentials, http.clone()));
    let transport =
        TelegramTransport::new(&credentials, http, config.endpoints.telegram_url.as_deref());

    Ok((router, transport))
}

/// Config file values, overridden by environment variables.
fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    Ok(config)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    for secret in Secret::all() {
        let hint = if config.credential(*secret).is_some() {
            "leave empty to keep the current value"
        } else {
            "required"
        };

        let value = Password::new(&format!("{secret} ({hint}):"))
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .with_context(|| format!("Failed to read {secret}"))?;

        let value = value.trim();
        if !value.is_empty() {
            config.set_credential(*secret, value.to_string());
        }
    }

    let policies = vec!["sixteen", "legacy"];
    let cursor = match config.wind_compass {
        CompassPolicy::Sixteen => 0,
        CompassPolicy::Legacy => 1,
    };
    let choice = Select::new("Wind direction labels:", policies)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Failed to read wind direction policy")?;

    config.wind_compass = match choice {
        "legacy" => CompassPolicy::Legacy,
        _ => CompassPolicy::Sixteen,
    };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}
