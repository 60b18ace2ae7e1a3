//! Configuration loading from TOML files
//!
//! The binaries pick the path (`--config`, then `CONFIG_FILE`, then
//! `config/dev.toml`) and hand it to [`Config::load_from_path`].

use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SiteConfig {
    /// Unique site identifier used as the metrics label
    #[serde(default = "default_site_id")]
    pub id: String,
}

fn default_site_id() -> String {
    "speedtrap".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeedConfig {
    /// Posted speed limit (mph)
    #[serde(default = "default_limit_mph")]
    pub limit_mph: f64,
    /// Overspeed tolerance ratio (0.10 = 10% over the limit)
    #[serde(default = "default_tolerance_ratio")]
    pub tolerance_ratio: f64,
    /// Distance (m) at or below which overspeed is displayed but never escalated
    #[serde(default = "default_monitor_floor_m")]
    pub monitor_floor_m: f64,
}

fn default_limit_mph() -> f64 {
    40.0
}

fn default_tolerance_ratio() -> f64 {
    0.10
}

fn default_monitor_floor_m() -> f64 {
    -90.0
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            limit_mph: default_limit_mph(),
            tolerance_ratio: default_tolerance_ratio(),
            monitor_floor_m: default_monitor_floor_m(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZonesConfig {
    /// Readings at or below this distance (m) are discarded
    #[serde(default = "default_min_valid_m")]
    pub min_valid_m: f64,
    /// Boundary (m) past which a target counts as leaving
    #[serde(default = "default_leaving_threshold_m")]
    pub leaving_threshold_m: f64,
    /// Readings beyond this distance (m) are discarded
    #[serde(default = "default_max_valid_m")]
    pub max_valid_m: f64,
}

fn default_min_valid_m() -> f64 {
    -150.0
}

fn default_leaving_threshold_m() -> f64 {
    20.0
}

fn default_max_valid_m() -> f64 {
    90.0
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            min_valid_m: default_min_valid_m(),
            leaving_threshold_m: default_leaving_threshold_m(),
            max_valid_m: default_max_valid_m(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Half-width (m) of the capture window around the sensor
    #[serde(default = "default_window_half_width_m")]
    pub window_half_width_m: f64,
}

fn default_window_half_width_m() -> f64 {
    20.0
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { window_half_width_m: default_window_half_width_m() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnprConfig {
    /// Plate pool served by the mock identifier
    #[serde(default = "default_plates")]
    pub plates: Vec<String>,
}

fn default_plates() -> Vec<String> {
    vec!["ABC-1234".to_string(), "NXY-4821".to_string(), "JDK-9087".to_string()]
}

impl Default for AnprConfig {
    fn default() -> Self {
        Self { plates: default_plates() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UplinkConfig {
    /// Maximum records kept in the in-memory holding buffer
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

fn default_buffer_capacity() -> usize {
    1000
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self { buffer_capacity: default_buffer_capacity() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { bind_address: default_http_bind_address(), port: default_http_port() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

fn default_metrics_interval_secs() -> u64 {
    10
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub speed: SpeedConfig,
    #[serde(default)]
    pub zones: ZonesConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub anpr: AnprConfig,
    #[serde(default)]
    pub uplink: UplinkConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    speed_limit_mph: f64,
    tolerance_ratio: f64,
    monitor_floor_m: f64,
    min_valid_m: f64,
    leaving_threshold_m: f64,
    max_valid_m: f64,
    capture_half_width_m: f64,
    anpr_plates: Vec<String>,
    uplink_buffer_capacity: usize,
    http_bind_address: String,
    http_port: u16,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            speed_limit_mph: default_limit_mph(),
            tolerance_ratio: default_tolerance_ratio(),
            monitor_floor_m: default_monitor_floor_m(),
            min_valid_m: default_min_valid_m(),
            leaving_threshold_m: default_leaving_threshold_m(),
            max_valid_m: default_max_valid_m(),
            capture_half_width_m: default_window_half_width_m(),
            anpr_plates: default_plates(),
            uplink_buffer_capacity: default_buffer_capacity(),
            http_bind_address: default_http_bind_address(),
            http_port: default_http_port(),
            metrics_interval_secs: default_metrics_interval_secs(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str, source: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig =
            toml::from_str(content).with_context(|| format!("Failed to parse config {}", source))?;

        let config = Self {
            site_id: toml_config.site.id,
            speed_limit_mph: toml_config.speed.limit_mph,
            tolerance_ratio: toml_config.speed.tolerance_ratio,
            monitor_floor_m: toml_config.speed.monitor_floor_m,
            min_valid_m: toml_config.zones.min_valid_m,
            leaving_threshold_m: toml_config.zones.leaving_threshold_m,
            max_valid_m: toml_config.zones.max_valid_m,
            capture_half_width_m: toml_config.capture.window_half_width_m,
            anpr_plates: toml_config.anpr.plates,
            uplink_buffer_capacity: toml_config.uplink.buffer_capacity,
            http_bind_address: toml_config.http.bind_address,
            http_port: toml_config.http.port,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: source.to_string(),
        };
        config.validate().with_context(|| format!("Invalid config {}", source))?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Load from an explicit path, falling back to defaults on any error
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Check that thresholds are usable and zone limits are ordered
    pub fn validate(&self) -> anyhow::Result<()> {
        let finite = [
            ("speed.limit_mph", self.speed_limit_mph),
            ("speed.tolerance_ratio", self.tolerance_ratio),
            ("speed.monitor_floor_m", self.monitor_floor_m),
            ("zones.min_valid_m", self.min_valid_m),
            ("zones.leaving_threshold_m", self.leaving_threshold_m),
            ("zones.max_valid_m", self.max_valid_m),
            ("capture.window_half_width_m", self.capture_half_width_m),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                bail!("{} must be finite, got {}", name, value);
            }
        }

        if self.speed_limit_mph <= 0.0 {
            bail!("speed.limit_mph must be positive, got {}", self.speed_limit_mph);
        }
        if self.tolerance_ratio < 0.0 {
            bail!("speed.tolerance_ratio must not be negative, got {}", self.tolerance_ratio);
        }
        if self.capture_half_width_m <= 0.0 {
            bail!(
                "capture.window_half_width_m must be positive, got {}",
                self.capture_half_width_m
            );
        }
        if !(self.min_valid_m < self.leaving_threshold_m
            && self.leaving_threshold_m <= self.max_valid_m)
        {
            bail!(
                "zone limits must satisfy min_valid_m < leaving_threshold_m <= max_valid_m \
                 ({} / {} / {})",
                self.min_valid_m,
                self.leaving_threshold_m,
                self.max_valid_m
            );
        }
        // The leaving sample is the only one past the window edge, so one
        // Stop per pass needs both boundaries at the same distance
        if self.capture_half_width_m != self.leaving_threshold_m {
            bail!(
                "capture.window_half_width_m ({}) must equal zones.leaving_threshold_m ({})",
                self.capture_half_width_m,
                self.leaving_threshold_m
            );
        }
        if self.anpr_plates.is_empty() {
            bail!("anpr.plates must not be empty");
        }
        Ok(())
    }

    // Getters for all config fields
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn speed_limit_mph(&self) -> f64 {
        self.speed_limit_mph
    }

    pub fn tolerance_ratio(&self) -> f64 {
        self.tolerance_ratio
    }

    pub fn monitor_floor_m(&self) -> f64 {
        self.monitor_floor_m
    }

    pub fn min_valid_m(&self) -> f64 {
        self.min_valid_m
    }

    pub fn leaving_threshold_m(&self) -> f64 {
        self.leaving_threshold_m
    }

    pub fn max_valid_m(&self) -> f64 {
        self.max_valid_m
    }

    pub fn capture_half_width_m(&self) -> f64 {
        self.capture_half_width_m
    }

    pub fn anpr_plates(&self) -> &[String] {
        &self.anpr_plates
    }

    pub fn uplink_buffer_capacity(&self) -> usize {
        self.uplink_buffer_capacity
    }

    pub fn http_bind_address(&self) -> &str {
        &self.http_bind_address
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method to override the speed threshold
    pub fn with_speed_limit(mut self, limit_mph: f64, tolerance_ratio: f64) -> Self {
        self.speed_limit_mph = limit_mph;
        self.tolerance_ratio = tolerance_ratio;
        self
    }

    /// Builder method to override the uplink buffer capacity
    pub fn with_uplink_buffer_capacity(mut self, capacity: usize) -> Self {
        self.uplink_buffer_capacity = capacity;
        self
    }
}
