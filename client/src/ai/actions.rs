use super::conditions::current_target;
use super::{anim, keys, AttackConfig};
use crate::bt::{Context, Node, NodeStatus};
use crate::collaborators::EffectRequest;
use crate::interpolation::{delta_angle, yaw_towards};
use crate::registry::EntityHandle;
use glam::Vec3;
use log::debug;

/// Turns toward the current target and succeeds once facing it.
pub struct FaceTarget {
    tolerance_deg: f32,
    turning: bool,
}

impl FaceTarget {
    pub fn new(tolerance_deg: f32) -> Self {
        Self {
            tolerance_deg,
            turning: false,
        }
    }
}

impl Default for FaceTarget {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl Node for FaceTarget {
    fn name(&self) -> &'static str {
        "FaceTarget"
    }

    fn enter(&mut self, _ctx: &mut Context<'_>) {
        self.turning = false;
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        let Some(target) = current_target(ctx).and_then(|t| ctx.world.get(t)).map(|r| r.position()) else {
            return NodeStatus::Failure;
        };
        let Some((position, yaw, key)) = ctx.me().map(|r| (r.position(), r.yaw(), r.key.clone())) else {
            return NodeStatus::Failure;
        };

        let offset = target - position;
        if Vec3::new(offset.x, 0.0, offset.z).length_squared() <= f32::EPSILON {
            return NodeStatus::Success;
        }
        let desired = yaw_towards(offset);
        if delta_angle(yaw, desired).abs() <= self.tolerance_deg {
            return NodeStatus::Success;
        }

        ctx.world.face_towards(ctx.entity, target);
        if !self.turning {
            ctx.out.presentation.play_animation_trigger(&key, anim::START_ROTATION);
            self.turning = true;
        }
        NodeStatus::Running
    }
}

/// Plays one attack, firing its effects as normalized time crosses each
/// activation point.
pub struct AttackAction {
    config: AttackConfig,
    target: Option<EntityHandle>,
    damage: Option<f32>,
    elapsed: f32,
    fired: Vec<bool>,
}

impl AttackAction {
    pub fn new(config: AttackConfig) -> Self {
        let fired = vec![false; config.effects.len()];
        Self {
            config,
            target: None,
            damage: None,
            elapsed: 0.0,
            fired,
        }
    }

    /// Attack progress in `[0, 1]`.
    pub fn normalized_time(&self) -> f32 {
        if self.config.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.config.duration).clamp(0.0, 1.0)
        }
    }

    fn fire_due_effects(&mut self, ctx: &mut Context<'_>) {
        let t = self.normalized_time();
        let Some((position, yaw)) = ctx.me().map(|r| (r.position(), r.yaw())) else {
            return;
        };
        let target_position = self
            .target
            .and_then(|handle| ctx.world.get(handle))
            .map(|r| r.position());

        for (timing, fired) in self.config.effects.iter().zip(self.fired.iter_mut()) {
            if *fired || t < timing.activation {
                continue;
            }
            *fired = true;
            let at = match (timing.at_target, target_position) {
                (true, Some(target)) => target,
                _ => position,
            };
            let window = (timing.deactivation - timing.activation).max(0.0);
            ctx.out.effects.request_effect(EffectRequest {
                effect_id: timing.effect_id.clone(),
                position: at,
                yaw,
                duration: window * self.config.duration,
                damage: self.damage,
            });
        }
    }
}

impl Node for AttackAction {
    fn name(&self) -> &'static str {
        "AttackAction"
    }

    fn enter(&mut self, ctx: &mut Context<'_>) {
        self.elapsed = 0.0;
        self.fired.iter_mut().for_each(|f| *f = false);
        self.target = current_target(ctx);
        self.damage = ctx.blackboard.get_float(keys::ATTACK_DAMAGE);
        ctx.blackboard.remove(keys::ATTACK_DAMAGE);

        let Some(target) = self.target.and_then(|t| ctx.world.get(t)).map(|r| r.position()) else {
            return;
        };
        let Some((key, position)) = ctx.me().map(|r| (r.key.clone(), r.position())) else {
            return;
        };

        debug!("{} starts {} attack", key, self.config.name);
        ctx.world.face_towards(ctx.entity, target);
        ctx.out.presentation.set_animator_bool(&key, anim::IS_ATTACKING, true);
        ctx.out.presentation.play_animation_trigger(&key, &self.config.trigger);
        if let Some(sound) = &self.config.sound_id {
            ctx.out.audio.request_sound(sound, position);
        }
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        if self.target.is_none() || ctx.me().is_none() {
            return NodeStatus::Failure;
        }

        self.elapsed += ctx.dt;
        self.fire_due_effects(ctx);

        if self.elapsed >= self.config.duration {
            NodeStatus::Success
        } else {
            NodeStatus::Running
        }
    }

    fn exit(&mut self, ctx: &mut Context<'_>, _status: NodeStatus) {
        if self.target.is_some() {
            if let Some(key) = ctx.my_key() {
                ctx.out.presentation.set_animator_bool(&key, anim::IS_ATTACKING, false);
            }
        }
        self.target = None;
    }
}

/// Walks toward where the target stood when the chase began.
pub struct ChaseTarget {
    speed: f32,
    stopping_distance: f32,
    max_duration: f32,
    elapsed: f32,
    destination: Option<Vec3>,
}

impl ChaseTarget {
    pub fn new(speed: f32, stopping_distance: f32, max_duration: f32) -> Self {
        Self {
            speed,
            stopping_distance,
            max_duration,
            elapsed: 0.0,
            destination: None,
        }
    }
}

impl Node for ChaseTarget {
    fn name(&self) -> &'static str {
        "ChaseTarget"
    }

    fn enter(&mut self, ctx: &mut Context<'_>) {
        self.elapsed = 0.0;
        self.destination = current_target(ctx)
            .and_then(|t| ctx.world.get(t))
            .map(|r| r.position());
        if self.destination.is_some() {
            if let Some(key) = ctx.my_key() {
                ctx.out.presentation.set_animator_bool(&key, anim::CHASE, true);
            }
        }
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        let Some(destination) = self.destination else {
            return NodeStatus::Failure;
        };
        if current_target(ctx).is_none() {
            return NodeStatus::Failure;
        }
        let Some(position) = ctx.me().map(|r| r.position()) else {
            return NodeStatus::Failure;
        };

        let offset = Vec3::new(destination.x - position.x, 0.0, destination.z - position.z);
        let distance = offset.length();
        if distance <= self.stopping_distance {
            return NodeStatus::Success;
        }

        self.elapsed += ctx.dt;
        let step = (self.speed * ctx.dt).min(distance - self.stopping_distance);
        ctx.world.translate(ctx.entity, offset / distance * step);
        ctx.world.face_towards(ctx.entity, destination);

        if self.elapsed >= self.max_duration {
            NodeStatus::Success
        } else {
            NodeStatus::Running
        }
    }

    fn exit(&mut self, ctx: &mut Context<'_>, _status: NodeStatus) {
        if self.destination.take().is_some() {
            if let Some(key) = ctx.my_key() {
                ctx.out.presentation.set_animator_bool(&key, anim::CHASE, false);
            }
        }
    }
}

/// Writes the combat stage implied by current health to [`keys::STAGE`].
///
/// `thresholds` are health values in descending order; the stage is the
/// number of thresholds health has dropped below.
pub struct SetStageFromHealth {
    thresholds: Vec<i32>,
}

impl SetStageFromHealth {
    pub fn new(thresholds: Vec<i32>) -> Self {
        Self { thresholds }
    }

    pub fn stage_for(&self, health: Option<i32>) -> i32 {
        match health {
            Some(hp) => self.thresholds.iter().filter(|&&t| hp < t).count() as i32,
            None => 0,
        }
    }
}

impl Node for SetStageFromHealth {
    fn name(&self) -> &'static str {
        "SetStageFromHealth"
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        let health = ctx.me().and_then(|r| r.health);
        let stage = self.stage_for(health);
        if ctx.blackboard.get_int(keys::STAGE) != Some(stage) {
            debug!("Entering stage {} at health {:?}", stage, health);
        }
        ctx.blackboard.set_int(keys::STAGE, stage);
        NodeStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::EffectTiming;
    use crate::bt::test_support::Harness;
    use crate::bt::Task;
    use crate::registry::{EntityKey, EntityKind};
    use assert_approx_eq::assert_approx_eq;

    fn with_target(at: Vec3) -> (Harness, EntityHandle) {
        let mut harness = Harness::new();
        let target = harness.world.spawn(
            EntityKey::Player("p".to_string()),
            EntityKind::RemotePlayer,
            at,
            0.0,
            0,
        );
        harness.blackboard.set_entity(keys::TARGET, Some(target));
        (harness, target)
    }

    #[test]
    fn test_attack_fires_effects_in_window() {
        let (mut harness, _) = with_target(Vec3::new(0.0, 0.0, 2.0));
        let config = AttackConfig {
            duration: 1.0,
            effects: vec![EffectTiming::new("slash", 0.35, 0.55)],
            ..AttackConfig::melee()
        };
        let mut attack = Task::new(AttackAction::new(config));
        let me = EntityKey::Monster(1);

        assert_eq!(attack.tick(&mut harness.ctx(0.2)), NodeStatus::Running);
        assert!(harness.recorder.effects().is_empty());
        assert_eq!(harness.recorder.triggers_for(&me), vec!["Attack".to_string()]);

        assert_eq!(attack.tick(&mut harness.ctx(0.2)), NodeStatus::Running);
        let effects = harness.recorder.effects();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_id, "slash");
        assert_approx_eq!(effects[0].duration, 0.2, 1e-4);

        for _ in 0..2 {
            assert_eq!(attack.tick(&mut harness.ctx(0.2)), NodeStatus::Running);
        }
        assert_eq!(attack.tick(&mut harness.ctx(0.25)), NodeStatus::Success);
        assert_eq!(harness.recorder.effects().len(), 1);
        assert_eq!(
            harness.recorder.bools_for(&me),
            vec![
                (anim::IS_ATTACKING.to_string(), true),
                (anim::IS_ATTACKING.to_string(), false)
            ]
        );
    }

    #[test]
    fn test_attack_carries_server_damage_once() {
        let (mut harness, _) = with_target(Vec3::new(0.0, 0.0, 2.0));
        harness.blackboard.set_float(keys::ATTACK_DAMAGE, 8.0);
        let mut attack = Task::new(AttackAction::new(AttackConfig::melee()));

        while attack.tick(&mut harness.ctx(0.1)) == NodeStatus::Running {}
        assert!(!harness.blackboard.contains(keys::ATTACK_DAMAGE));
        let effects = harness.recorder.effects();
        assert!(!effects.is_empty());
        assert!(effects.iter().all(|e| e.damage == Some(8.0)));

        harness.recorder.clear();
        while attack.tick(&mut harness.ctx(0.1)) == NodeStatus::Running {}
        let effects = harness.recorder.effects();
        assert!(!effects.is_empty());
        assert!(effects.iter().all(|e| e.damage.is_none()));
    }

    #[test]
    fn test_attack_without_target_fails() {
        let mut harness = Harness::new();
        let mut attack = Task::new(AttackAction::new(AttackConfig::melee()));
        assert_eq!(attack.tick(&mut harness.ctx(0.1)), NodeStatus::Failure);
        assert!(harness.recorder.calls().is_empty());
    }

    #[test]
    fn test_ranged_effect_lands_on_target() {
        let (mut harness, _) = with_target(Vec3::new(0.0, 0.0, 10.0));
        let mut attack = Task::new(AttackAction::new(AttackConfig::ranged()));
        while attack.tick(&mut harness.ctx(0.1)) == NodeStatus::Running {}

        let effects = harness.recorder.effects();
        let impact = effects
            .iter()
            .find(|e| e.effect_id == "projectile_impact")
            .unwrap();
        assert_eq!(impact.position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_chase_moves_toward_target() {
        let (mut harness, _) = with_target(Vec3::new(0.0, 0.0, 10.0));
        let mut chase = Task::new(ChaseTarget::new(4.0, 1.0, 10.0));

        assert_eq!(chase.tick(&mut harness.ctx(0.5)), NodeStatus::Running);
        let z = harness.world.get(harness.entity).unwrap().position().z;
        assert_approx_eq!(z, 2.0, 1e-4);

        let mut status = NodeStatus::Running;
        for _ in 0..10 {
            status = chase.tick(&mut harness.ctx(0.5));
            if status != NodeStatus::Running {
                break;
            }
        }
        assert_eq!(status, NodeStatus::Success);
        let z = harness.world.get(harness.entity).unwrap().position().z;
        assert_approx_eq!(z, 9.0, 1e-3);
        assert_eq!(
            harness.recorder.bools_for(&EntityKey::Monster(1)).last(),
            Some(&(anim::CHASE.to_string(), false))
        );
    }

    #[test]
    fn test_face_target_turns_then_succeeds() {
        let (mut harness, _) = with_target(Vec3::new(5.0, 0.0, 0.0));
        let mut face = Task::new(FaceTarget::new(5.0));

        assert_eq!(face.tick(&mut harness.ctx(0.1)), NodeStatus::Running);
        let mut done = false;
        for _ in 0..20 {
            harness.world.advance(0.1);
            if face.tick(&mut harness.ctx(0.1)) == NodeStatus::Success {
                done = true;
                break;
            }
        }
        assert!(done);
        assert_eq!(
            harness.recorder.triggers_for(&EntityKey::Monster(1)),
            vec![anim::START_ROTATION.to_string()]
        );
    }

    #[test]
    fn test_stage_from_health() {
        let node = SetStageFromHealth::new(vec![70, 30]);
        assert_eq!(node.stage_for(None), 0);
        assert_eq!(node.stage_for(Some(100)), 0);
        assert_eq!(node.stage_for(Some(50)), 1);
        assert_eq!(node.stage_for(Some(10)), 2);

        let mut harness = Harness::new();
        harness.world.set_health(&EntityKey::Monster(1), 25);
        let mut task = Task::new(node);
        assert_eq!(task.tick(&mut harness.ctx(0.1)), NodeStatus::Success);
        assert_eq!(harness.blackboard.get_int(keys::STAGE), Some(2));
    }
}
