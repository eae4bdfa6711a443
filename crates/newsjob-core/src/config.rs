//! Job configuration model.
//!
//! Every field has a default so a partial `config.toml` only overrides what it
//! names. Loading from disk lives in the infrastructure crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NewsJobError, Result};
use crate::geometry::{Place, SpawnSlot, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Accrual ticks the training help text stays active for.
    pub training_ticks: u32,
    /// Upper bound on "leave vehicle" dispatches when evicting passengers.
    pub max_eviction_attempts: u32,
    pub economy: EconomyConfig,
    pub places: PlacesConfig,
    pub vehicle: VehicleConfig,
    pub timing: TimingConfig,
    pub lens: LensConfig,
    pub rental_slots: Vec<SpawnSlot>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            training_ticks: 60,
            max_eviction_attempts: 32,
            economy: EconomyConfig::default(),
            places: PlacesConfig::default(),
            vehicle: VehicleConfig::default(),
            timing: TimingConfig::default(),
            lens: LensConfig::default(),
            rental_slots: vec![
                SpawnSlot::new(-529.419, -899.066, 23.863, 60.0),
                SpawnSlot::new(-530.410, -903.225, 23.862, 60.0),
                SpawnSlot::new(-536.770, -905.451, 23.864, 60.0),
                SpawnSlot::new(-538.860, -909.273, 23.862, 60.0),
                SpawnSlot::new(-541.078, -912.640, 23.862, 60.0),
                SpawnSlot::new(-543.370, -915.576, 23.862, 60.0),
            ],
        }
    }
}

impl JobConfig {
    /// Rejects values the session cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.economy.max_recording_minutes == 0 {
            return Err(NewsJobError::config("max_recording_minutes must be positive"));
        }
        if self.economy.deposit_amount == 0 {
            return Err(NewsJobError::config("deposit_amount must be positive"));
        }
        if self.economy.payout_stddev < 0.0 {
            return Err(NewsJobError::config("payout_stddev must not be negative"));
        }
        if self.rental_slots.is_empty() {
            return Err(NewsJobError::config("at least one rental slot is required"));
        }
        if self.lens.min_fov > self.lens.max_fov
            || !(self.lens.min_fov..=self.lens.max_fov).contains(&self.lens.default_fov)
        {
            return Err(NewsJobError::config(
                "lens fov bounds must satisfy min <= default <= max",
            ));
        }
        if self.lens.min_pitch > self.lens.max_pitch {
            return Err(NewsJobError::config("lens pitch bounds are inverted"));
        }
        let periods = [
            ("frame_interval_ms", self.timing.frame_interval_ms),
            ("accrual_interval_ms", self.timing.accrual_interval_ms),
            ("integrity_interval_ms", self.timing.integrity_interval_ms),
            ("accrual_step_ms", self.timing.accrual_step_ms),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, ms)| *ms == 0) {
            return Err(NewsJobError::config(format!("{name} must be positive")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub deposit_amount: u32,
    pub max_recording_minutes: u32,
    pub hourly_rate: u32,
    pub payout_stddev: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            deposit_amount: 500,
            max_recording_minutes: 60,
            hourly_rate: 250,
            payout_stddev: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    pub headquarters: Place,
    pub rental_pickup: Place,
    pub rental_return: Place,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            headquarters: Place::new(Vec3::new(-589.898, -910.753, 22.974), 4.0),
            rental_pickup: Place::new(Vec3::new(-562.711, -888.325, 24.266), 4.0),
            rental_return: Place::new(Vec3::new(-532.494, -890.133, 23.870), 7.07),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub model: String,
    pub livery: u8,
    pub plate_prefix: char,
    pub fuel: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            model: "rumpo".to_string(),
            livery: 2,
            plate_prefix: 'W',
            fuel: 100.0,
        }
    }
}

/// Cadences and transition delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub frame_interval_ms: u64,
    pub accrual_interval_ms: u64,
    pub integrity_interval_ms: u64,
    pub accrual_step_ms: u64,
    pub shoulder_settle_ms: u64,
    pub broadcast_transition_ms: u64,
    pub storage_access_ms: u64,
    pub storage_full_cooldown_ms: u64,
    pub upload_jitter_ms: u64,
    pub upload_extra_seconds: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            accrual_interval_ms: 250,
            integrity_interval_ms: 512,
            accrual_step_ms: 1000,
            shoulder_settle_ms: 300,
            broadcast_transition_ms: 500,
            storage_access_ms: 450,
            storage_full_cooldown_ms: 30_000,
            upload_jitter_ms: 500,
            upload_extra_seconds: 10,
        }
    }
}

impl TimingConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn accrual_interval(&self) -> Duration {
        Duration::from_millis(self.accrual_interval_ms)
    }

    pub fn integrity_interval(&self) -> Duration {
        Duration::from_millis(self.integrity_interval_ms)
    }

    pub fn accrual_step(&self) -> Duration {
        Duration::from_millis(self.accrual_step_ms)
    }

    pub fn shoulder_settle(&self) -> Duration {
        Duration::from_millis(self.shoulder_settle_ms)
    }

    pub fn broadcast_transition(&self) -> Duration {
        Duration::from_millis(self.broadcast_transition_ms)
    }

    pub fn storage_access(&self) -> Duration {
        Duration::from_millis(self.storage_access_ms)
    }

    pub fn storage_full_cooldown(&self) -> Duration {
        Duration::from_millis(self.storage_full_cooldown_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    pub default_fov: f32,
    pub min_fov: f32,
    pub max_fov: f32,
    pub fov_step: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            default_fov: 16.0,
            min_fov: 5.0,
            max_fov: 24.0,
            fov_step: 0.1,
            min_pitch: -35.0,
            max_pitch: 45.0,
        }
    }
}
