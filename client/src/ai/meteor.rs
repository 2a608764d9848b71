use super::{anim, keys};
use crate::bt::{Context, Node, NodeStatus};
use crate::collaborators::EffectRequest;
use glam::Vec3;
use log::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct MeteorConfig {
    /// Seconds the warning markers show before the first meteor falls
    pub warning_duration: f32,
    /// Seconds between consecutive meteors, and after the last one
    pub interval: f32,
    pub warning_effect: String,
    pub meteor_effect: String,
    /// Seconds a single meteor effect lives
    pub meteor_lifetime: f32,
    pub cast_sound: Option<String>,
}

impl Default for MeteorConfig {
    fn default() -> Self {
        Self {
            warning_duration: 2.0,
            interval: 0.5,
            warning_effect: "meteor_warning".to_string(),
            meteor_effect: "meteor".to_string(),
            meteor_lifetime: 1.0,
            cast_sound: Some("meteor_cast".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Warning { elapsed: f32 },
    Active { next: usize, timer: f32 },
    Cooling { remaining: f32 },
}

/// Warns at every strike position, then drops one meteor per interval.
///
/// Positions are taken from [`keys::METEOR_POSITIONS`] when the action
/// starts. The `IsCastingMeteor` animator flag is held for the whole cast.
pub struct MeteorStrikeAction {
    config: MeteorConfig,
    positions: Vec<Vec3>,
    phase: Phase,
}

impl MeteorStrikeAction {
    pub fn new(config: MeteorConfig) -> Self {
        Self {
            config,
            positions: Vec::new(),
            phase: Phase::Warning { elapsed: 0.0 },
        }
    }

    fn total_cast_time(&self) -> f32 {
        self.config.warning_duration + self.config.interval * self.positions.len() as f32
    }

    fn drop_meteor(&self, ctx: &mut Context<'_>, index: usize) {
        let position = self.positions[index];
        debug!("Meteor {} of {} at ({:.2}, {:.2})", index + 1, self.positions.len(), position.x, position.z);
        ctx.out.effects.request_effect(EffectRequest {
            effect_id: self.config.meteor_effect.clone(),
            position,
            yaw: 0.0,
            duration: self.config.meteor_lifetime,
            damage: None,
        });
    }
}

impl Default for MeteorStrikeAction {
    fn default() -> Self {
        Self::new(MeteorConfig::default())
    }
}

impl Node for MeteorStrikeAction {
    fn name(&self) -> &'static str {
        "MeteorStrikeAction"
    }

    fn enter(&mut self, ctx: &mut Context<'_>) {
        self.positions = ctx
            .blackboard
            .take_points(keys::METEOR_POSITIONS)
            .unwrap_or_default();
        self.phase = Phase::Warning { elapsed: 0.0 };
        if self.positions.is_empty() {
            return;
        }
        let Some((key, origin)) = ctx.me().map(|r| (r.key.clone(), r.position())) else {
            return;
        };

        ctx.out.presentation.play_animation_trigger(&key, anim::METEOR_ATTACK);
        ctx.out.presentation.set_animator_bool(&key, anim::IS_CASTING_METEOR, true);
        if let Some(sound) = &self.config.cast_sound {
            ctx.out.audio.request_sound(sound, origin);
        }

        let warning_lifetime = self.total_cast_time();
        for &position in &self.positions {
            ctx.out.effects.request_effect(EffectRequest {
                effect_id: self.config.warning_effect.clone(),
                position,
                yaw: 0.0,
                duration: warning_lifetime,
                damage: None,
            });
        }
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        if self.positions.is_empty() || ctx.me().is_none() {
            return NodeStatus::Failure;
        }

        let mut dt = ctx.dt;
        loop {
            match self.phase {
                Phase::Warning { elapsed } => {
                    let elapsed = elapsed + dt;
                    if elapsed < self.config.warning_duration {
                        self.phase = Phase::Warning { elapsed };
                        return NodeStatus::Running;
                    }
                    dt = elapsed - self.config.warning_duration;
                    self.phase = Phase::Active { next: 0, timer: 0.0 };
                }
                Phase::Active { mut next, mut timer } => {
                    timer -= dt;
                    while timer <= 0.0 && next < self.positions.len() {
                        self.drop_meteor(ctx, next);
                        next += 1;
                        timer += self.config.interval;
                    }
                    self.phase = if next < self.positions.len() {
                        Phase::Active { next, timer }
                    } else {
                        Phase::Cooling { remaining: timer }
                    };
                    return NodeStatus::Running;
                }
                Phase::Cooling { remaining } => {
                    let remaining = remaining - dt;
                    if remaining > 0.0 {
                        self.phase = Phase::Cooling { remaining };
                        return NodeStatus::Running;
                    }
                    return NodeStatus::Success;
                }
            }
        }
    }

    fn exit(&mut self, ctx: &mut Context<'_>, _status: NodeStatus) {
        if !self.positions.is_empty() {
            if let Some(key) = ctx.my_key() {
                ctx.out.presentation.set_animator_bool(&key, anim::IS_CASTING_METEOR, false);
            }
        }
        self.positions.clear();
    }
}
