use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use std::sync::Arc;
use weather_dash_core::{
    Config, Coordinate, Dashboard, FallbackLocation, FixedPosition, ForecastSession,
    GatewayKind, GeocodingGateway, NoDevice, Place, PositionSource, Unit, gateways_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "Weather dashboard in the terminal")]
pub struct Cli {
    /// Increase log output (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set gateway, units and fallback location.
    Configure,

    /// Fetch the forecast once and print it.
    Show {
        /// Place to look up; the first search result is used.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        place: Option<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Temperature unit: c or f.
        #[arg(long)]
        unit: Option<String>,
    },

    /// List places matching a search.
    Search {
        /// Free-text query, e.g. "Paris".
        query: String,
    },

    /// Keep the dashboard running and print each forecast update.
    Watch {
        /// Temperature unit: c or f.
        #[arg(long)]
        unit: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                place,
                lat,
                lon,
                unit,
            } => show(place, lat.zip(lon), unit).await,
            Command::Search { query } => search(&query).await,
            Command::Watch { unit } => watch(unit).await,
        }
    }
}

fn load_config(unit: Option<&str>) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    if let Some(unit) = unit {
        config.unit = Unit::try_from(unit)?;
    }
    config.validate()?;
    Ok(config)
}

fn position_source(config: &Config) -> Arc<dyn PositionSource> {
    match config.device_position() {
        Some(coordinate) => Arc::new(FixedPosition(coordinate)),
        None => Arc::new(NoDevice),
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let gateway = Select::new("Gateway:", GatewayKind::all().to_vec())
        .with_help_message("relay: your own backend, direct: public providers")
        .prompt()?;
    config.gateway = gateway;

    if gateway == GatewayKind::Relay {
        config.backend_url = Text::new("Relay URL:")
            .with_default(&config.backend_url)
            .prompt()?;
    }

    config.unit = Select::new("Temperature unit:", Unit::all().to_vec()).prompt()?;

    let name = Text::new("Fallback place name:")
        .with_default(&config.fallback.name)
        .prompt()?;
    let latitude = CustomType::<f64>::new("Fallback latitude:")
        .with_default(config.fallback.latitude)
        .prompt()?;
    let longitude = CustomType::<f64>::new("Fallback longitude:")
        .with_default(config.fallback.longitude)
        .prompt()?;
    config.fallback = FallbackLocation {
        name,
        latitude,
        longitude,
    };

    config.follow_gps = Confirm::new("Follow device position?")
        .with_default(config.follow_gps)
        .prompt()?;

    config.validate()?;
    config.save()?;

    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn show(
    place: Option<String>,
    coordinates: Option<(f64, f64)>,
    unit: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(unit.as_deref())?;
    let gateways = gateways_from_config(&config)?;

    let (name, coordinate) = if let Some((lat, lon)) = coordinates {
        let coordinate = Coordinate::new(lat, lon)?;
        (coordinate.label(), coordinate)
    } else if let Some(query) = place {
        let found = gateways
            .geocoding
            .search(&query)
            .await
            .with_context(|| format!("Failed to search for '{query}'"))?;
        let first = found
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No place found for '{query}'"))?;
        (first.display_name().to_string(), first.coordinate())
    } else {
        let dashboard = Dashboard::new(&config, gateways.clone(), position_source(&config))?;
        let _ = dashboard.tracker().initial_fix().await;
        let state = dashboard.tracker().snapshot();
        (state.place_name, state.coordinate)
    };

    let session = ForecastSession::new(gateways.forecast, config.session_config());
    session.fetch_for(coordinate).await?;

    let state = session.snapshot();
    let view = state
        .view()
        .ok_or_else(|| anyhow!("No forecast data received"))?;
    print!("{}", render::full(&name, coordinate, &view));
    Ok(())
}

async fn search(query: &str) -> anyhow::Result<()> {
    let config = load_config(None)?;
    let gateways = gateways_from_config(&config)?;

    // Search is best-effort: a failing service just means no results.
    let places: Vec<Place> = gateways.geocoding.search(query).await.unwrap_or_else(|e| {
        tracing::warn!("Place search failed: {}", e);
        Vec::new()
    });
    print!("{}", render::places(&places));
    Ok(())
}

async fn watch(unit: Option<String>) -> anyhow::Result<()> {
    let config = load_config(unit.as_deref())?;
    let gateways = gateways_from_config(&config)?;

    let dashboard = Dashboard::start(&config, gateways, position_source(&config)).await?;
    let mut updates = dashboard.session().subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                let tracking = dashboard.tracker().snapshot();
                print!("{}", render::status(&tracking, &state));
            }
        }
    }

    dashboard.shutdown().await;
    Ok(())
}
