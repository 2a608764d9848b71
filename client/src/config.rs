//! Client configuration assembled from command-line arguments

use crate::ai::Archetype;
use crate::dispatch::DEFAULT_QUEUE_CAPACITY;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("player id must not be empty")]
    EmptyPlayerId,
    #[error("tick rate must be between 1 and 1000 Hz, got {0}")]
    TickRate(u32),
    #[error("dispatch queue capacity must be at least 1")]
    QueueCapacity,
    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidNumber { name: &'static str, value: f32 },
}

/// Tuning for per-entity smoothing of authoritative samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationConfig {
    /// Seconds spent blending from the current position to a new sample
    pub blend_duration: f32,
    /// Samples closer than this to the current position do not start a blend
    pub position_epsilon: f32,
    /// Turn rate for small heading corrections (degrees per second)
    pub max_angular_speed_deg: f32,
    /// Heading deltas above this use the slower, animation-paced turn rate
    pub large_turn_threshold_deg: f32,
    /// Turn rate for large heading changes (degrees per second)
    pub large_turn_speed_deg: f32,
    /// Heading deltas above this report a turn direction for animation
    pub turn_animation_threshold_deg: f32,
    /// Keep moving along the last reported velocity between samples
    pub dead_reckoning: bool,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            blend_duration: 0.2,
            position_epsilon: 0.01,
            max_angular_speed_deg: 720.0,
            large_turn_threshold_deg: 25.0,
            large_turn_speed_deg: 180.0,
            turn_animation_threshold_deg: 30.0,
            dead_reckoning: true,
        }
    }
}

impl InterpolationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("blend_duration", self.blend_duration),
            ("position_epsilon", self.position_epsilon),
            ("max_angular_speed_deg", self.max_angular_speed_deg),
            ("large_turn_threshold_deg", self.large_turn_threshold_deg),
            ("large_turn_speed_deg", self.large_turn_speed_deg),
            ("turn_animation_threshold_deg", self.turn_animation_threshold_deg),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNumber { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub player_id: String,
    pub player_template: i32,
    pub tick_rate: u32,
    pub queue_capacity: usize,
    pub reconnect: bool,
    pub reconnect_delay: Duration,
    pub archetype: Archetype,
    /// Seed for stage-based shuffles; `None` draws from OS entropy
    pub stage_seed: Option<u64>,
    pub interpolation: InterpolationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: shared::DEFAULT_HOST.to_string(),
            port: shared::DEFAULT_PORT,
            player_id: "player".to_string(),
            player_template: 0,
            tick_rate: 60,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            reconnect: true,
            reconnect_delay: Duration::from_secs(2),
            archetype: Archetype::ServerDriven,
            stage_seed: None,
            interpolation: InterpolationConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_id.trim().is_empty() {
            return Err(ConfigError::EmptyPlayerId);
        }
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(ConfigError::TickRate(self.tick_rate));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }
        self.interpolation.validate()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_rate.max(1)))
    }
}
