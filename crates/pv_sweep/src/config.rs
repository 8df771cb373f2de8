//! Study files: the sweep definition plus everything the reference oracle
//! needs, read from TOML or JSON.
//!
//! ```toml
//! load_profile = "load.csv"
//! output = "ghana_model.json"
//!
//! [sweep]
//! max_concurrency = 16
//! failure_policy = "tolerant"
//!
//! [[sweep.dimensions]]
//! name = "modules_per_string"
//! start = 2
//! end = 7
//!
//! [system]
//! battery_capacity_kwh = 40.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sweep_core::{
    normalize_request, DimensionSpec, FailurePolicy, SweepConfig, SweepError, SweepRequest,
};

use crate::load_profile::LoadProfileError;
use crate::pv_model::{PvBatterySystem, SolarResource, MODULES_PER_STRING, STRINGS};

pub const DEFAULT_OUTPUT: &str = "ghana_model.json";

#[derive(Debug, thiserror::Error)]
pub enum StudyConfigError {
    #[error("failed to read study file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported study file format for {} (expected .toml or .json)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("no load profile configured (set `load_profile` or pass --load-profile)")]
    MissingLoadProfile,

    #[error(transparent)]
    Invalid(#[from] SweepError),

    #[error(transparent)]
    LoadProfile(#[from] LoadProfileError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyConfig {
    #[serde(default = "default_sweep")]
    pub sweep: SweepRequest,
    #[serde(default)]
    pub system: PvBatterySystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_profile: Option<PathBuf>,
    /// Hourly per-kW yield table; a synthetic clear-sky year when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_resource: Option<PathBuf>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            sweep: default_sweep(),
            system: PvBatterySystem::default(),
            load_profile: None,
            solar_resource: None,
            output: default_output(),
        }
    }
}

/// The residential design study: 2-7 modules per string, 4-14 strings.
pub fn default_sweep() -> SweepRequest {
    SweepRequest::new(vec![
        DimensionSpec::new(MODULES_PER_STRING, 2..=7),
        DimensionSpec::new(STRINGS, 4..=14),
    ])
    .with_max_concurrency(16)
    .with_failure_policy(FailurePolicy::Tolerant)
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

impl StudyConfig {
    /// Reads a study file. Relative paths inside it resolve against the
    /// file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StudyConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| StudyConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let study: Self = match extension.as_deref() {
            Some("toml") => toml::from_str(&contents).map_err(|source| StudyConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
            Some("json") => {
                serde_json::from_str(&contents).map_err(|source| StudyConfigError::Json {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            _ => {
                return Err(StudyConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(study.resolve_paths(base_dir))
    }

    fn resolve_paths(mut self, base_dir: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                base_dir.join(path)
            } else {
                path
            }
        };
        self.load_profile = self.load_profile.map(resolve);
        self.solar_resource = self.solar_resource.map(resolve);
        self.output = resolve(self.output);
        self
    }

    /// Validates the sweep and system sections together.
    pub fn normalize(&self) -> Result<SweepConfig, StudyConfigError> {
        self.system.validate()?;
        Ok(normalize_request(self.sweep.clone())?)
    }

    pub fn load_profile_path(&self) -> Result<&Path, StudyConfigError> {
        self.load_profile
            .as_deref()
            .ok_or(StudyConfigError::MissingLoadProfile)
    }

    pub fn solar(&self) -> Result<SolarResource, StudyConfigError> {
        match &self.solar_resource {
            Some(path) => Ok(SolarResource::from_path(path)?),
            None => Ok(SolarResource::synthetic_clear_sky(
                self.system.latitude_deg,
                self.system.performance_ratio,
            )),
        }
    }
}
