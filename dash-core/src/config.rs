use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    gateway::GatewayKind,
    model::{Coordinate, Place},
    session::SessionConfig,
    tracker::{DEFAULT_DISPLACEMENT_THRESHOLD, TrackerConfig},
    units::Unit,
};

/// Where the dashboard starts when no device fix is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for FallbackLocation {
    fn default() -> Self {
        Self {
            name: "New Delhi".to_string(),
            latitude: 28.6139,
            longitude: 77.2090,
        }
    }
}

impl FallbackLocation {
    pub fn to_place(&self) -> Result<Place> {
        let coordinate = Coordinate::new(self.latitude, self.longitude)
            .with_context(|| format!("Invalid fallback location '{}'", self.name))?;
        Ok(Place::new(self.name.clone(), coordinate))
    }
}

/// Fixed position reported by the `fixed` device source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub latitude: f64,
    pub longitude: f64,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// gateway = "relay"
/// backend_url = "http://localhost:8000"
/// unit = "fahrenheit"
///
/// [fallback]
/// name = "Oslo"
/// latitude = 59.91
/// longitude = 10.75
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayKind,
    /// Base URL of the relay service.
    pub backend_url: String,
    /// Base URL of the forecast provider, used by the `direct` gateway.
    pub forecast_url: String,
    /// Base URL of the geocoding provider, used by the `direct` gateway.
    pub geocoding_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,

    pub unit: Unit,
    /// IANA timezone sent with forecast queries. Unset means the local zone.
    pub timezone: Option<String>,

    pub refresh_interval_secs: u64,
    pub debounce_ms: u64,
    pub displacement_threshold_deg: f64,
    pub follow_gps: bool,

    pub fallback: FallbackLocation,
    pub device: Option<DeviceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayKind::Relay,
            backend_url: "http://localhost:8000".to_string(),
            forecast_url: "https://api.open-meteo.com".to_string(),
            geocoding_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "WeatherApp/1.0".to_string(),
            request_timeout_secs: 10,
            unit: Unit::Celsius,
            timezone: None,
            refresh_interval_secs: 300,
            debounce_ms: 350,
            displacement_threshold_deg: DEFAULT_DISPLACEMENT_THRESHOLD,
            follow_gps: true,
            fallback: FallbackLocation::default(),
            device: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dash", "weather-dash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check values the components cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.fallback.to_place()?;

        if let Some(device) = self.device {
            Coordinate::new(device.latitude, device.longitude)
                .context("Invalid device position")?;
        }
        if self.refresh_interval_secs == 0 {
            return Err(anyhow!("refresh_interval_secs must be greater than zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be greater than zero"));
        }
        if !self.displacement_threshold_deg.is_finite() || self.displacement_threshold_deg < 0.0 {
            return Err(anyhow!(
                "displacement_threshold_deg must be a non-negative number"
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Configured zone, else `$TZ`, else the operating system's zone, else `auto`.
    pub fn resolved_timezone(&self) -> String {
        resolve_timezone(
            self.timezone.as_deref(),
            std::env::var("TZ").ok().as_deref(),
            iana_time_zone::get_timezone().ok().as_deref(),
        )
    }

    pub fn tracker_config(&self) -> Result<TrackerConfig> {
        let mut tracker = TrackerConfig::new(self.fallback.to_place()?);
        tracker.displacement_threshold = self.displacement_threshold_deg;
        tracker.following = self.follow_gps;
        Ok(tracker)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            refresh_interval: Duration::from_secs(self.refresh_interval_secs.max(1)),
            timezone: self.resolved_timezone(),
            unit: self.unit,
        }
    }

    pub fn device_position(&self) -> Option<Coordinate> {
        self.device
            .and_then(|d| Coordinate::new(d.latitude, d.longitude).ok())
    }
}

fn resolve_timezone(configured: Option<&str>, env_tz: Option<&str>, system: Option<&str>) -> String {
    [configured, env_tz, system]
        .into_iter()
        .flatten()
        .map(|tz| tz.trim().trim_start_matches(':'))
        .find(|tz| !tz.is_empty())
        .unwrap_or("auto")
        .to_string()
}
