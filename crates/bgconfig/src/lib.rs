use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Throttle floor used when the config does not override it (~30 FPS).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// Viewport width below which the background is treated as mobile.
pub const DEFAULT_MOBILE_BREAKPOINT: u32 = 768;
pub const DEFAULT_REFRESH_HZ: f32 = 60.0;
/// Accepted range for `pacing.refresh_hz`.
pub const MIN_REFRESH_HZ: f32 = 1.0;
pub const MAX_REFRESH_HZ: f32 = 1000.0;
pub const DEFAULT_ANIMATED_STARS: usize = 40;
pub const DEFAULT_REDUCED_STARS: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackgroundConfig {
    pub version: u32,
    #[serde(default)]
    pub pacing: Pacing,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub stars: StarConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pacing {
    #[serde(
        default = "default_frame_interval",
        deserialize_with = "deserialize_interval"
    )]
    pub frame_interval: Duration,
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_mobile_breakpoint")]
    pub mobile_breakpoint: u32,
    /// Forces the reduced-motion preference for hosts that cannot query it.
    #[serde(default)]
    pub reduced_motion: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StarConfig {
    #[serde(default = "default_animated_stars")]
    pub animated: usize,
    #[serde(default = "default_reduced_stars")]
    pub reduced: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            version: 1,
            pacing: Pacing::default(),
            policy: PolicyConfig::default(),
            stars: StarConfig::default(),
            surface: SurfaceConfig::default(),
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            frame_interval: default_frame_interval(),
            refresh_hz: default_refresh_hz(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: default_mobile_breakpoint(),
            reduced_motion: false,
        }
    }
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            animated: default_animated_stars(),
            reduced: default_reduced_stars(),
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_frame_interval() -> Duration {
    DEFAULT_FRAME_INTERVAL
}

fn default_refresh_hz() -> f32 {
    DEFAULT_REFRESH_HZ
}

fn default_mobile_breakpoint() -> u32 {
    DEFAULT_MOBILE_BREAKPOINT
}

fn default_animated_stars() -> usize {
    DEFAULT_ANIMATED_STARS
}

fn default_reduced_stars() -> usize {
    DEFAULT_REDUCED_STARS
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

/// Accepts a humantime string (`"33ms"`) or a bare number of milliseconds.
fn deserialize_interval<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of milliseconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_millis(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_millis(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v / 1000.0)
                .map_err(|err| E::custom(format!("invalid duration {v}ms: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl BackgroundConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: BackgroundConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.pacing.frame_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "pacing.frame_interval must be greater than zero".into(),
            ));
        }

        let hz = self.pacing.refresh_hz;
        if !(MIN_REFRESH_HZ..=MAX_REFRESH_HZ).contains(&hz) {
            return Err(ConfigError::Invalid(format!(
                "pacing.refresh_hz must be between {MIN_REFRESH_HZ} and {MAX_REFRESH_HZ}, got {hz}"
            )));
        }

        if self.policy.mobile_breakpoint == 0 {
            return Err(ConfigError::Invalid(
                "policy.mobile_breakpoint must be greater than zero".into(),
            ));
        }

        if self.surface.width == 0 || self.surface.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "surface dimensions must be non-zero, got {}x{}",
                self.surface.width, self.surface.height
            )));
        }

        Ok(())
    }
}
