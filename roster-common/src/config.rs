//! Configuration loading and database path resolution
//!
//! Configuration comes from an optional TOML file. Every key has a built-in
//! default, so a missing file (or a missing section) never prevents startup.
//! A file that exists but fails to parse or validate is an error.
//!
//! ```toml
//! database_path = "/var/lib/roster/roster.db"
//! leadership_positions = ["captain", "vice_captain"]
//! shuffle_candidates = false
//!
//! [season]
//! start = "2025-06-27"
//! end = "2025-08-31"
//!
//! [staffing.weekday]
//! min = 8
//! max = 13
//!
//! [staffing.holiday]
//! min = 23
//! max = 30
//!
//! [payment]
//! tier_a_ratio = 0.8
//!
//! [logging]
//! level = "info"
//! ```

use crate::calendar::Regime;
use crate::{Error, Result};
use chrono::NaiveDate;
use rand::Rng;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding the database location
pub const DATABASE_ENV_VAR: &str = "ROSTER_DATABASE";

/// Top-level roster configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Path to the SQLite database file
    ///
    /// The CLI flag and `ROSTER_DATABASE` take precedence; OS default when unset
    pub database_path: Option<PathBuf>,

    pub season: SeasonWindow,

    pub staffing: StaffingRequirements,

    pub payment: PaymentConfig,

    /// Position labels whose holders are guaranteed a slot each day
    ///
    /// Empty disables the leadership guarantee.
    pub leadership_positions: Vec<String>,

    /// Shuffle each day's candidate pool before selection
    ///
    /// Off by default so that tie-breaks follow roster order.
    pub shuffle_candidates: bool,

    pub logging: LoggingConfig,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            season: SeasonWindow::default(),
            staffing: StaffingRequirements::default(),
            payment: PaymentConfig::default(),
            leadership_positions: Vec::new(),
            shuffle_candidates: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// Inclusive season date bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SeasonWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for SeasonWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2025, 6, 27).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap_or_default(),
        }
    }
}

impl SeasonWindow {
    /// Every date of the season, in chronological order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }

    /// Number of dates in the season (0 if the window is inverted)
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Inclusive headcount range for one regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StaffRange {
    pub min: u32,
    pub max: u32,
}

impl StaffRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Draw a required headcount uniformly from `[min, max]`
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Per-regime headcount ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StaffingRequirements {
    pub weekday: StaffRange,
    pub holiday: StaffRange,
}

impl Default for StaffingRequirements {
    fn default() -> Self {
        Self {
            weekday: StaffRange::new(8, 13),
            holiday: StaffRange::new(23, 30),
        }
    }
}

impl StaffingRequirements {
    pub fn for_regime(&self, regime: Regime) -> StaffRange {
        match regime {
            Regime::Weekday => self.weekday,
            Regime::Holiday => self.holiday,
        }
    }
}

/// Payment-tier split settings
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Target fraction of each member's days paid at tier A
    pub tier_a_ratio: f64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self { tier_a_ratio: 0.8 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RosterConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: RosterConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// A missing file is not an error: built-in defaults are used and a
    /// warning is logged.
    pub fn load(path: &Path) -> Result<Self> {
        match Self::load_if_present(path)? {
            Some(config) => Ok(config),
            None => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a TOML file, `None` if it does not exist
    ///
    /// Logs nothing, for callers that set up logging from the result.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let toml_str = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&toml_str).map(Some)
    }

    /// Reject settings the scheduler cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.season.start > self.season.end {
            return Err(Error::Config(format!(
                "Season start {} is after season end {}",
                self.season.start, self.season.end
            )));
        }
        for (label, range) in [
            ("weekday", self.staffing.weekday),
            ("holiday", self.staffing.holiday),
        ] {
            if range.min > range.max {
                return Err(Error::Config(format!(
                    "{} staffing min {} exceeds max {}",
                    label, range.min, range.max
                )));
            }
        }
        let ratio = self.payment.tier_a_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(Error::Config(format!(
                "tier_a_ratio must be within 0..=1, got {}",
                ratio
            )));
        }
        Ok(())
    }

    /// Resolve the database path
    ///
    /// Priority order:
    /// 1. Command-line argument
    /// 2. `ROSTER_DATABASE` environment variable
    /// 3. `database_path` from the TOML file
    /// 4. OS-dependent default
    pub fn resolve_database_path(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        default_database_path()
    }
}

/// Default configuration file location (`<config dir>/roster/config.toml`)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("roster").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("./roster_config.toml"))
}

/// OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("roster").join("roster.db"))
        .unwrap_or_else(|| PathBuf::from("./roster_data/roster.db"))
}
