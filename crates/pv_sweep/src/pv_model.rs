//! Reference oracle: residential PV array plus AC-coupled battery.
//!
//! The array is built from identical modules wired into strings across four
//! subarrays. A design is feasible only when its string voltage sits strictly
//! inside the inverter MPPT window. Each hour, PV serves the load first,
//! surplus charges the battery, and deficits draw it down.

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sweep_core::{
    LoadProfile, OracleError, ParameterPoint, PerformanceRecord, SimulationOracle, SweepError,
};

use crate::load_profile::{self, LoadProfileError};

pub const MODULES_PER_STRING: &str = "modules_per_string";
pub const STRINGS: &str = "strings";
pub const INVERTERS: &str = "inverters";

/// Delivered energy may fall short of demand by this much and still count.
pub const UPTIME_TOLERANCE_KWH: f64 = 1e-9;

const HOURS_PER_YEAR: usize = 8_760;

/// Fixed electrical and battery characteristics shared by every design.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PvBatterySystem {
    pub module_voc_v: f64,
    pub module_vmp_v: f64,
    pub module_imp_a: f64,
    pub mppt_low_v: f64,
    pub mppt_high_v: f64,
    pub subarrays: u32,
    pub inverters: u32,
    pub inverter_ac_kw: f64,
    pub battery_capacity_kwh: f64,
    pub max_charge_kw: f64,
    pub max_discharge_kw: f64,
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
    pub min_soc: f64,
    pub initial_soc: f64,
    pub analysis_years: u32,
    pub latitude_deg: f64,
    pub performance_ratio: f64,
}

impl Default for PvBatterySystem {
    fn default() -> Self {
        Self {
            module_voc_v: 64.4,
            module_vmp_v: 54.7,
            module_imp_a: 5.58,
            mppt_low_v: 100.0,
            mppt_high_v: 400.0,
            subarrays: 4,
            inverters: 4,
            inverter_ac_kw: 3.8,
            battery_capacity_kwh: 40.0,
            max_charge_kw: 12.0,
            max_discharge_kw: 11.0,
            charge_efficiency: 0.96,
            discharge_efficiency: 0.96,
            min_soc: 0.1,
            initial_soc: 0.5,
            analysis_years: 25,
            latitude_deg: 5.6,
            performance_ratio: 0.8,
        }
    }
}

impl PvBatterySystem {
    pub fn validate(&self) -> Result<(), SweepError> {
        let positive = [
            ("module_voc_v", self.module_voc_v),
            ("module_vmp_v", self.module_vmp_v),
            ("module_imp_a", self.module_imp_a),
            ("mppt_high_v", self.mppt_high_v),
            ("inverter_ac_kw", self.inverter_ac_kw),
            ("battery_capacity_kwh", self.battery_capacity_kwh),
            ("charge_efficiency", self.charge_efficiency),
            ("discharge_efficiency", self.discharge_efficiency),
            ("performance_ratio", self.performance_ratio),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SweepError::configuration(format!(
                    "system.{name} must be a positive number"
                )));
            }
        }
        if !(self.mppt_low_v >= 0.0 && self.mppt_low_v < self.mppt_high_v) {
            return Err(SweepError::configuration(
                "system.mppt_low_v must be non-negative and below mppt_high_v",
            ));
        }
        for (name, value) in [
            ("min_soc", self.min_soc),
            ("initial_soc", self.initial_soc),
            ("charge_efficiency", self.charge_efficiency),
            ("discharge_efficiency", self.discharge_efficiency),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SweepError::configuration(format!(
                    "system.{name} must lie in [0, 1]"
                )));
            }
        }
        if self.max_charge_kw < 0.0 || self.max_discharge_kw < 0.0 {
            return Err(SweepError::configuration(
                "system battery power limits cannot be negative",
            ));
        }
        if self.subarrays == 0 || self.analysis_years == 0 {
            return Err(SweepError::configuration(
                "system.subarrays and system.analysis_years must be positive",
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude_deg) {
            return Err(SweepError::configuration(
                "system.latitude_deg must lie in [-90, 90]",
            ));
        }
        Ok(())
    }

    /// Open bounds on modules per string set by the MPPT voltage window.
    pub fn string_limits(&self) -> (f64, f64) {
        (
            self.mppt_low_v / self.module_voc_v,
            self.mppt_high_v / self.module_voc_v,
        )
    }

    pub fn array_capacity_kw(&self, modules_per_string: i64, strings: i64) -> f64 {
        self.module_vmp_v * self.module_imp_a / 1_000.0
            * f64::from(self.subarrays)
            * modules_per_string as f64
            * strings as f64
    }
}

/// Hourly AC-equivalent yield per kW of installed DC capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarResource {
    per_kw: Vec<f64>,
}

impl SolarResource {
    pub fn new(per_kw: Vec<f64>) -> Result<Self, SweepError> {
        if per_kw.is_empty() {
            return Err(SweepError::configuration("solar resource cannot be empty"));
        }
        if per_kw.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(SweepError::configuration(
                "solar resource values must be finite and non-negative",
            ));
        }
        Ok(Self { per_kw })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadProfileError> {
        let values = load_profile::read_hourly_column_from_path(path)?;
        Ok(Self::new(values)?)
    }

    /// Clear-sky year from solar geometry and the Meinel air-mass model.
    pub fn synthetic_clear_sky(latitude_deg: f64, performance_ratio: f64) -> Self {
        let latitude = latitude_deg.to_radians();
        let per_kw = (0..HOURS_PER_YEAR)
            .map(|hour_of_year| {
                let day = (hour_of_year / 24 + 1) as f64;
                let hour = (hour_of_year % 24) as f64;
                let declination = (23.44 * (2.0 * PI * (284.0 + day) / 365.0).sin()).to_radians();
                let hour_angle = (15.0 * (hour + 0.5 - 12.0)).to_radians();
                let cos_zenith = latitude.sin() * declination.sin()
                    + latitude.cos() * declination.cos() * hour_angle.cos();
                if cos_zenith <= 0.0 {
                    return 0.0;
                }
                let air_mass = 1.0 / cos_zenith;
                let beam_kw_m2 = 1.353 * 0.7_f64.powf(air_mass.powf(0.678));
                beam_kw_m2 * cos_zenith * performance_ratio
            })
            .collect();
        Self { per_kw }
    }

    pub fn values(&self) -> &[f64] {
        &self.per_kw
    }

    pub fn len(&self) -> usize {
        self.per_kw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_kw.is_empty()
    }

    /// Yield for an hour index; the series repeats when shorter than the load.
    pub fn at(&self, hour: usize) -> f64 {
        self.per_kw[hour % self.per_kw.len()]
    }
}

#[derive(Debug, Clone)]
pub struct PvBatteryOracle {
    system: PvBatterySystem,
    solar: SolarResource,
}

impl PvBatteryOracle {
    pub fn new(system: PvBatterySystem, solar: SolarResource) -> Self {
        Self { system, solar }
    }

    pub fn system(&self) -> &PvBatterySystem {
        &self.system
    }

    pub fn solar(&self) -> &SolarResource {
        &self.solar
    }

    fn check_feasible(&self, modules: i64, strings: i64, inverters: i64) -> Result<(), OracleError> {
        let (low, high) = self.system.string_limits();
        let modules_f = modules as f64;
        if !(low < modules_f && modules_f < high) {
            return Err(OracleError::infeasible(format!(
                "{modules} modules per string is outside the MPPT window ({low:.2}, {high:.2})"
            )));
        }
        if strings <= 0 {
            return Err(OracleError::infeasible(format!(
                "{strings} strings cannot form an array"
            )));
        }
        if inverters <= 0 {
            return Err(OracleError::infeasible(format!(
                "{inverters} inverters cannot export power"
            )));
        }
        Ok(())
    }

    /// Hours in which delivered energy met demand over the analysis period.
    fn dispatch(&self, load: &LoadProfile, capacity_kw: f64, ac_limit_kw: f64) -> u64 {
        let system = &self.system;
        let floor_kwh = system.battery_capacity_kwh * system.min_soc;
        let mut stored_kwh = system.battery_capacity_kwh * system.initial_soc.max(system.min_soc);
        let mut uptime_hours = 0u64;

        for _year in 0..system.analysis_years {
            for (hour, demand) in load.values().iter().enumerate() {
                let pv_kwh = (capacity_kw * self.solar.at(hour)).min(ac_limit_kw);
                let pv_to_load = pv_kwh.min(*demand);
                let surplus = pv_kwh - pv_to_load;
                let deficit = demand - pv_to_load;

                let headroom_kwh = (system.battery_capacity_kwh - stored_kwh).max(0.0);
                let charged = surplus
                    .min(system.max_charge_kw)
                    .min(headroom_kwh / system.charge_efficiency);
                stored_kwh += charged * system.charge_efficiency;

                let available_kwh = (stored_kwh - floor_kwh).max(0.0);
                let batt_to_load = deficit
                    .min(system.max_discharge_kw)
                    .min(available_kwh * system.discharge_efficiency);
                stored_kwh -= batt_to_load / system.discharge_efficiency;

                if pv_to_load + batt_to_load + UPTIME_TOLERANCE_KWH >= *demand {
                    uptime_hours += 1;
                }
            }
        }

        uptime_hours
    }
}

fn required_dimension(point: &ParameterPoint, name: &str) -> Result<i64, OracleError> {
    point
        .get(name)
        .ok_or_else(|| OracleError::fault(format!("design point {point} has no '{name}' dimension")))
}

impl SimulationOracle for PvBatteryOracle {
    fn evaluate(
        &self,
        point: &ParameterPoint,
        load: &LoadProfile,
    ) -> Result<PerformanceRecord, OracleError> {
        let modules = required_dimension(point, MODULES_PER_STRING)?;
        let strings = required_dimension(point, STRINGS)?;
        let inverters = point
            .get(INVERTERS)
            .unwrap_or_else(|| i64::from(self.system.inverters));
        self.check_feasible(modules, strings, inverters)?;

        let capacity_kw = self.system.array_capacity_kw(modules, strings);
        let ac_limit_kw = inverters as f64 * self.system.inverter_ac_kw;
        let uptime_hours = self.dispatch(load, capacity_kw, ac_limit_kw);
        let analyzed_hours = load.len() as u64 * u64::from(self.system.analysis_years);

        Ok(
            PerformanceRecord::new(uptime_hours as f64 / analyzed_hours as f64, uptime_hours)
                .with_constant(INVERTERS, inverters)
                .with_constant("system_capacity_kw", capacity_kw)
                .with_constant("battery_capacity_kwh", self.system.battery_capacity_kwh)
                .with_constant("analysis_years", self.system.analysis_years),
        )
    }
}
