use anyhow::Context;
use clap::{Parser, Subcommand};

use skycast_core::{CacheStore, Config, FileStore, Lang, ProviderId, WeatherService};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Daily-cached weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openmeteo" or "weatherapi".
        provider: String,
    },

    /// Show current weather and the daily forecast.
    Show {
        /// City name; when omitted the device position is used.
        city: Option<String>,

        /// Provider short name; defaults to the configured provider.
        #[arg(long)]
        provider: Option<String>,

        /// Output language ("en" or "sk").
        #[arg(long)]
        lang: Option<String>,
    },

    /// Remove cached weather data.
    ClearCache {
        /// Only clear one provider's slot instead of all of them.
        #[arg(long)]
        provider: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show {
                city,
                provider,
                lang,
            } => show(city, provider, lang).await,
            Command::ClearCache { provider } => clear_cache(provider),
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    if id == ProviderId::OpenMeteo {
        println!("Provider '{id}' is keyless; nothing to configure.");
        return Ok(());
    }

    let api_key = inquire::Password::new("API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let mut config = Config::load()?;
    config.upsert_provider_api_key(id, api_key);
    config.save()?;

    println!("Saved API key for provider '{id}'.");
    Ok(())
}

async fn show(
    city: Option<String>,
    provider: Option<String>,
    lang: Option<String>,
) -> anyhow::Result<()> {
    let config = Config::load()?;

    let id = match provider {
        Some(name) => ProviderId::try_from(name.as_str())?,
        None => config.default_provider_id()?,
    };
    let lang = lang
        .as_deref()
        .map(Lang::from_code)
        .unwrap_or_else(|| config.language());

    let store = FileStore::new(Config::cache_dir()?);
    let service = WeatherService::new(store, &config);

    let report = service.get_weather(id, city.as_deref(), lang).await?;
    render::print_report(&report);

    Ok(())
}

fn clear_cache(provider: Option<String>) -> anyhow::Result<()> {
    let cache = CacheStore::new(FileStore::new(Config::cache_dir()?));

    match provider {
        Some(name) => {
            let id = ProviderId::try_from(name.as_str())?;
            cache.invalidate(id);
            println!("Cleared cache for provider '{id}'.");
        }
        None => {
            for id in ProviderId::all() {
                cache.invalidate(*id);
            }
            println!("Cleared all provider caches.");
        }
    }

    Ok(())
}
