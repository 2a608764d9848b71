//! Per-entity smoothing of authoritative position and heading samples
//!
//! Every sample starts a fixed-length blend from wherever the entity is drawn
//! right now, so a sample arriving mid-blend never causes a visible jump.
//! Between samples an entity with a known velocity keeps moving along it.
//! Heading is eased along the shortest arc at one of two rates: a fast rate
//! for small corrections and a slower, animation-paced rate for large turns.

use crate::config::InterpolationConfig;
use glam::Vec3;

/// Heading differences below this are treated as aligned.
const ANGLE_EPSILON_DEG: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendState {
    Idle,
    Blending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    None,
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Interpolator {
    config: InterpolationConfig,
    state: BlendState,
    start: Vec3,
    target: Vec3,
    current: Vec3,
    velocity: Vec3,
    elapsed: f32,
    yaw: f32,
    target_yaw: f32,
    turn: TurnDirection,
}

impl Interpolator {
    pub fn new(position: Vec3, yaw: f32, config: InterpolationConfig) -> Self {
        let yaw = normalize_degrees(yaw);
        Self {
            config,
            state: BlendState::Idle,
            start: position,
            target: position,
            current: position,
            velocity: Vec3::ZERO,
            elapsed: 0.0,
            yaw,
            target_yaw: yaw,
            turn: TurnDirection::None,
        }
    }

    /// Accepts a new authoritative sample.
    ///
    /// With `yaw == None` the entity turns to face its direction of travel.
    pub fn push_sample(&mut self, position: Vec3, yaw: Option<f32>, velocity: Vec3) {
        self.velocity = velocity;
        if let Some(yaw) = yaw {
            self.target_yaw = normalize_degrees(yaw);
        }

        let offset = position - self.current;
        if self.state == BlendState::Idle && offset.length() <= self.config.position_epsilon {
            return;
        }

        if yaw.is_none() {
            self.face_direction(offset);
        }

        self.start = self.current;
        self.target = position;
        self.elapsed = 0.0;
        self.state = BlendState::Blending;
    }

    /// Advances the blend and heading by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        match self.state {
            BlendState::Blending => {
                self.elapsed += dt;
                let blend = self.config.blend_duration;
                if self.elapsed >= blend {
                    self.current = self.target;
                    self.state = BlendState::Idle;
                } else {
                    let t = (self.elapsed / blend).clamp(0.0, 1.0);
                    self.current = self.start.lerp(self.target, t);
                }
            }
            BlendState::Idle => {
                if self.config.dead_reckoning && self.velocity != Vec3::ZERO {
                    self.current += self.velocity * dt;
                    self.target = self.current;
                }
            }
        }
        self.advance_yaw(dt);
    }

    fn advance_yaw(&mut self, dt: f32) {
        let delta = delta_angle(self.yaw, self.target_yaw);
        let magnitude = delta.abs();
        if magnitude <= ANGLE_EPSILON_DEG {
            self.yaw = self.target_yaw;
            self.turn = TurnDirection::None;
            return;
        }

        self.turn = if magnitude > self.config.turn_animation_threshold_deg {
            if delta > 0.0 {
                TurnDirection::Left
            } else {
                TurnDirection::Right
            }
        } else {
            TurnDirection::None
        };

        let speed = if magnitude > self.config.large_turn_threshold_deg {
            self.config.large_turn_speed_deg
        } else {
            self.config.max_angular_speed_deg
        };
        let step = (speed * dt).min(magnitude);
        self.yaw = normalize_degrees(self.yaw + step * delta.signum());
    }

    /// Moves the drawn position locally, keeping any blend in progress
    /// continuous.
    pub fn translate(&mut self, delta: Vec3) {
        self.current += delta;
        match self.state {
            BlendState::Blending => self.start += delta,
            BlendState::Idle => self.target = self.current,
        }
    }

    /// Turns toward `point` on the ground plane.
    pub fn face_towards(&mut self, point: Vec3) {
        self.face_direction(point - self.current);
    }

    fn face_direction(&mut self, direction: Vec3) {
        let flat = Vec3::new(direction.x, 0.0, direction.z);
        if flat.length_squared() > f32::EPSILON {
            self.target_yaw = yaw_towards(flat);
        }
    }

    pub fn set_target_yaw(&mut self, yaw: f32) {
        self.target_yaw = normalize_degrees(yaw);
    }

    /// Jumps straight to a pose, discarding any blend.
    pub fn snap_to(&mut self, position: Vec3, yaw: f32) {
        self.start = position;
        self.target = position;
        self.current = position;
        self.elapsed = 0.0;
        self.state = BlendState::Idle;
        self.yaw = normalize_degrees(yaw);
        self.target_yaw = self.yaw;
        self.turn = TurnDirection::None;
    }

    /// Holds the current pose until the next sample.
    pub fn freeze(&mut self) {
        self.state = BlendState::Idle;
        self.velocity = Vec3::ZERO;
        self.start = self.current;
        self.target = self.current;
        self.elapsed = 0.0;
        self.target_yaw = self.yaw;
        self.turn = TurnDirection::None;
    }

    pub fn position(&self) -> Vec3 {
        self.current
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn target_yaw(&self) -> f32 {
        self.target_yaw
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn state(&self) -> BlendState {
        self.state
    }

    pub fn turn_direction(&self) -> TurnDirection {
        self.turn
    }

    pub fn is_moving(&self) -> bool {
        self.state == BlendState::Blending
            || (self.config.dead_reckoning && self.velocity != Vec3::ZERO)
    }
}

/// Wraps an angle into `[0, 360)` degrees.
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]` degrees.
pub fn delta_angle(from: f32, to: f32) -> f32 {
    let mut delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Heading in degrees for a direction on the ground plane; 0 faces +Z and
/// 90 faces +X.
pub fn yaw_towards(direction: Vec3) -> f32 {
    normalize_degrees(direction.x.atan2(direction.z).to_degrees())
}
