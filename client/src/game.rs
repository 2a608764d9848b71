//! Client-side simulation
//!
//! [`GameState`] is advanced once per tick. Each tick it drains the dispatch
//! queue, applies every message in arrival order, advances interpolation,
//! ticks monster behavior trees and finally publishes transforms and
//! animation flags to the presentation layer.

use crate::ai::{anim, archetype, keys, Archetype};
use crate::bt::BehaviorTree;
use crate::collaborators::{Collaborators, EffectRequest};
use crate::config::ClientConfig;
use crate::dispatch::{DispatchQueue, NetworkEvent};
use crate::interpolation::{yaw_towards, TurnDirection};
use crate::registry::{Damage, EntityHandle, EntityKey, EntityKind, EntityRegistry};
use glam::Vec3;
use log::{debug, info, warn};
use shared::{Point3, WireMessage};
use std::collections::{BTreeMap, HashMap};

/// Seconds a hit effect stays on screen.
const HIT_EFFECT_DURATION: f32 = 1.0;

fn vec3(p: Point3) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

/// Derives a per-monster shuffle seed so seeded monsters stay reproducible
/// without all drawing the same attack order.
fn monster_seed(seed: Option<u64>, monster_id: i32) -> Option<u64> {
    seed.map(|s| s ^ (monster_id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AnimFlags {
    moving: bool,
    turn: TurnDirection,
}

pub struct GameState {
    queue: DispatchQueue<NetworkEvent>,
    registry: EntityRegistry,
    brains: BTreeMap<EntityHandle, BehaviorTree>,
    out: Collaborators,
    local_player_id: String,
    archetype: Archetype,
    stage_seed: Option<u64>,
    connected: bool,
    tick: u64,
    clock: f64,
    last_path: Vec<Vec3>,
    flags: HashMap<EntityHandle, AnimFlags>,
}

impl GameState {
    pub fn new(config: &ClientConfig, queue: DispatchQueue<NetworkEvent>, out: Collaborators) -> Self {
        Self {
            queue,
            registry: EntityRegistry::new(config.interpolation),
            brains: BTreeMap::new(),
            out,
            local_player_id: config.player_id.clone(),
            archetype: config.archetype,
            stage_seed: config.stage_seed,
            connected: true,
            tick: 0,
            clock: 0.0,
            last_path: Vec::new(),
            flags: HashMap::new(),
        }
    }

    /// Runs one simulation step of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        for event in self.queue.drain_all() {
            self.apply_event(event);
        }

        self.registry.advance(dt);
        if self.connected {
            self.tick_brains(dt);
        }
        self.publish();

        self.tick += 1;
        self.clock += f64::from(dt);
    }

    pub fn apply_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Message(message) => self.apply_message(message),
            NetworkEvent::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                if self.connected {
                    self.connected = false;
                    self.abort_brains();
                }
                self.registry.freeze_all();
            }
        }
    }

    pub fn apply_message(&mut self, message: WireMessage) {
        match message {
            WireMessage::Login(m) => {
                debug!("Login acknowledged for {}", m.player_id);
            }
            WireMessage::Logout(m) => {
                info!("{} logged out", m.player_id);
                self.remove_entity(&EntityKey::Player(m.player_id));
            }
            WireMessage::SpawnMyPlayer(m) => {
                let key = EntityKey::Player(self.local_player_id.clone());
                self.remove_entity(&key);
                self.registry.spawn_local_player(
                    &self.local_player_id,
                    Vec3::new(m.x, m.y, m.z),
                    m.rotation_y,
                    m.player_template,
                );
            }
            WireMessage::SpawnOtherPlayer(m) => {
                if m.player_id == self.local_player_id {
                    debug!("Ignoring remote spawn of the local player");
                    return;
                }
                let key = EntityKey::Player(m.player_id);
                self.remove_entity(&key);
                self.registry.spawn(
                    key,
                    EntityKind::RemotePlayer,
                    Vec3::new(m.x, m.y, m.z),
                    m.rotation_y,
                    m.player_template,
                );
            }
            WireMessage::PlayerPosition(m) => {
                if m.player_id == self.local_player_id {
                    return;
                }
                let velocity = Vec3::new(m.fx, m.fy, m.fz) * m.speed;
                let key = EntityKey::Player(m.player_id);
                if !self.registry.update_position(
                    &key,
                    Vec3::new(m.x, m.y, m.z),
                    Some(m.rotation_y),
                    velocity,
                ) {
                    debug!("Position for unknown {}", key);
                }
            }
            WireMessage::SpawnMonster(m) => {
                let key = EntityKey::Monster(m.monster_id);
                self.remove_entity(&key);
                let handle = self.registry.spawn(
                    key,
                    EntityKind::Monster,
                    Vec3::new(m.x, 0.0, m.z),
                    m.rotation_y,
                    0,
                );
                let seed = monster_seed(self.stage_seed, m.monster_id);
                self.brains.insert(handle, self.archetype.build(seed));
            }
            WireMessage::MoveMonster(m) => {
                let key = EntityKey::Monster(m.monster_id);
                if !self
                    .registry
                    .update_position(&key, Vec3::new(m.x, 0.0, m.z), None, Vec3::ZERO)
                {
                    debug!("Move for unknown {}", key);
                }
            }
            WireMessage::MonsterTarget(m) => {
                let key = EntityKey::Monster(m.monster_id);
                let target = EntityKey::Player(m.target_player_id);
                let target = m.has_target.then_some(&target);
                if !self.registry.update_target(&key, target) {
                    debug!("Target for unknown {}", key);
                }
            }
            WireMessage::MonsterAttack(m) => {
                let key = EntityKey::Monster(m.monster_id);
                let target = self
                    .registry
                    .lookup(&EntityKey::Player(m.target_player_id.clone()));
                let Some(target) = target else {
                    warn!("{} attack type {} has no known target {}", key, m.attack_type, m.target_player_id);
                    return;
                };
                match self.brain_for(&key) {
                    Some(brain) => {
                        let bb = brain.blackboard_mut();
                        bb.set_text(keys::COMMAND, archetype::attack_command(m.attack_type));
                        bb.set_entity(keys::TARGET, Some(target));
                        bb.set_float(keys::ATTACK_DAMAGE, m.damage);
                    }
                    None => debug!("Attack for unknown {}", key),
                }
            }
            WireMessage::MeteorStrike(m) => {
                let key = EntityKey::Monster(m.monster_id);
                let positions: Vec<Vec3> = m
                    .positions
                    .iter()
                    .map(|p| Vec3::new(p.x, 0.0, p.z))
                    .collect();
                match self.brain_for(&key) {
                    Some(brain) => {
                        let bb = brain.blackboard_mut();
                        bb.set_text(keys::COMMAND, archetype::METEOR_COMMAND);
                        bb.set_points(keys::METEOR_POSITIONS, positions);
                    }
                    None => debug!("Meteor strike for unknown {}", key),
                }
            }
            WireMessage::MonsterDamage(m) => {
                let key = EntityKey::Monster(m.monster_id);
                let damage = Damage {
                    amount: m.damage,
                    current_hp: Some(m.current_hp),
                    hit_point: vec3(m.hit_point),
                    hit_normal: vec3(m.hit_normal),
                    effect_kind: m.hit_effect_type,
                };
                self.apply_damage(&key, damage);
            }
            WireMessage::PlayerDamage(m) => {
                let key = EntityKey::Player(m.player_id);
                let damage = Damage {
                    amount: m.damage,
                    current_hp: None,
                    hit_point: vec3(m.hit_point),
                    hit_normal: Vec3::Y,
                    effect_kind: m.attack_type,
                };
                if self.apply_damage(&key, damage) {
                    self.out.presentation.set_root_motion(&key, true);
                    self.out.presentation.set_animator_bool(&key, anim::KNOCK_BACK, true);
                    self.out.presentation.play_animation_trigger(&key, anim::DAMAGED);
                }
            }
            WireMessage::PathTest(m) => {
                debug!("Received debug path with {} points", m.paths.len());
                self.last_path = m.paths.into_iter().map(vec3).collect();
            }
            WireMessage::Chat(m) => {
                info!("[{}] {}", m.player_id, m.message);
                self.out.presentation.show_chat(&m.player_id, &m.message);
            }
            WireMessage::ApplyRootMotion(m) => {
                if let Some(key) = self.remote_player(&m.player_id) {
                    self.out.presentation.set_root_motion(&key, m.root_motion);
                }
            }
            WireMessage::AnimatorSetInteger(m) => {
                if let Some(key) = self.remote_player(&m.player_id) {
                    self.out.presentation.set_animator_int(&key, &m.anim_id, m.condition);
                }
            }
            WireMessage::AnimatorSetFloat(m) => {
                if let Some(key) = self.remote_player(&m.player_id) {
                    self.out.presentation.set_animator_float(&key, &m.anim_id, m.condition);
                }
            }
            WireMessage::AnimatorSetBool(m) => {
                if let Some(key) = self.remote_player(&m.player_id) {
                    self.out.presentation.set_animator_bool(&key, &m.anim_id, m.condition);
                }
            }
            WireMessage::AnimatorSetTrigger(m) => {
                if let Some(key) = self.remote_player(&m.player_id) {
                    self.out.presentation.play_animation_trigger(&key, &m.anim_id);
                }
            }
        }
    }

    /// Key of a registered player other than the local one.
    fn remote_player(&self, player_id: &str) -> Option<EntityKey> {
        if player_id == self.local_player_id {
            return None;
        }
        let key = EntityKey::Player(player_id.to_string());
        match self.registry.lookup(&key) {
            Some(_) => Some(key),
            None => {
                debug!("Animator update for unknown {}", key);
                None
            }
        }
    }

    fn brain_for(&mut self, key: &EntityKey) -> Option<&mut BehaviorTree> {
        let handle = self.registry.lookup(key)?;
        self.brains.get_mut(&handle)
    }

    /// Applies damage, shows the hit and removes the entity if it died.
    /// Returns `false` if the entity is unknown or was removed.
    fn apply_damage(&mut self, key: &EntityKey, damage: Damage) -> bool {
        let Some(outcome) = self.registry.apply_damage(key, damage) else {
            debug!("Damage for unknown {}", key);
            return false;
        };

        self.out.effects.request_effect(EffectRequest {
            effect_id: format!("hit_{}", damage.effect_kind),
            position: damage.hit_point,
            yaw: yaw_towards(damage.hit_normal),
            duration: HIT_EFFECT_DURATION,
            damage: None,
        });

        if outcome.died {
            info!("{} died", key);
            self.out.presentation.play_animation_trigger(key, anim::DIE);
            self.remove_entity(key);
            return false;
        }
        true
    }

    /// Despawns an entity along with its tree and presentation.
    fn remove_entity(&mut self, key: &EntityKey) {
        let Some(handle) = self.registry.lookup(key) else {
            return;
        };
        if let Some(mut brain) = self.brains.remove(&handle) {
            brain.abort(handle, &mut self.registry, &mut self.out);
        }
        self.flags.remove(&handle);
        self.registry.despawn(key);
        self.out.presentation.remove_entity(key);
    }

    /// Interrupts every running tree; they restart from the root on the
    /// next tick after reconnecting.
    fn abort_brains(&mut self) {
        for (&handle, brain) in self.brains.iter_mut() {
            brain.abort(handle, &mut self.registry, &mut self.out);
        }
    }

    fn tick_brains(&mut self, dt: f32) {
        let handles: Vec<EntityHandle> = self.brains.keys().copied().collect();
        for handle in handles {
            let Some(record) = self.registry.get(handle) else {
                self.brains.remove(&handle);
                continue;
            };
            if !record.alive {
                continue;
            }
            let server_target = self.registry.target_of(&record.key);

            if let Some(brain) = self.brains.get_mut(&handle) {
                brain
                    .blackboard_mut()
                    .set_entity(keys::SERVER_TARGET, server_target);
                brain.tick(handle, dt, self.clock, &mut self.registry, &mut self.out);
            }
        }
    }

    fn publish(&mut self) {
        for record in self.registry.iter() {
            self.out
                .presentation
                .set_entity_transform(&record.key, record.position(), record.yaw());

            if record.kind != EntityKind::Monster {
                continue;
            }
            let flags = AnimFlags {
                moving: record.motion.is_moving(),
                turn: record.motion.turn_direction(),
            };
            let previous = self.flags.insert(record.handle, flags);
            if previous == Some(flags) {
                continue;
            }
            let presentation = &mut self.out.presentation;
            presentation.set_animator_bool(&record.key, anim::IS_MOVING, flags.moving);
            presentation.set_animator_bool(
                &record.key,
                anim::IS_TURNING_LEFT,
                flags.turn == TurnDirection::Left,
            );
            presentation.set_animator_bool(
                &record.key,
                anim::IS_TURNING_RIGHT,
                flags.turn == TurnDirection::Right,
            );
        }
    }

    /// Places the local player where input put it.
    pub fn set_local_player_pose(&mut self, position: Vec3, yaw: f32) -> bool {
        match self.registry.local_player() {
            Some(handle) => self.registry.snap_to(handle, position, yaw),
            None => false,
        }
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn brain(&self, key: &EntityKey) -> Option<&BehaviorTree> {
        let handle = self.registry.lookup(key)?;
        self.brains.get(&handle)
    }

    pub fn position_of(&self, key: &EntityKey) -> Option<Vec3> {
        self.registry.record(key).map(|record| record.position())
    }

    pub fn local_player_id(&self) -> &str {
        &self.local_player_id
    }

    pub fn last_path(&self) -> &[Vec3] {
        &self.last_path
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> f64 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Recorder;
    use crate::config::InterpolationConfig;
    use crate::dispatch::DispatchSender;
    use assert_approx_eq::assert_approx_eq;
    use shared::*;

    const DT: f32 = 1.0 / 60.0;

    fn setup(archetype: Archetype) -> (GameState, DispatchSender<NetworkEvent>, Recorder) {
        let config = ClientConfig {
            player_id: "me".to_string(),
            archetype,
            stage_seed: Some(7),
            interpolation: InterpolationConfig {
                blend_duration: 0.2,
                dead_reckoning: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let (tx, queue) = DispatchQueue::bounded(64);
        let recorder = Recorder::new();
        let state = GameState::new(&config, queue, recorder.collaborators());
        (state, tx, recorder)
    }

    fn send(tx: &DispatchSender<NetworkEvent>, message: WireMessage) {
        tx.try_enqueue(NetworkEvent::Message(message)).unwrap();
    }

    fn spawn_monster(id: i32, x: f32, z: f32) -> WireMessage {
        WireMessage::SpawnMonster(SpawnMonster {
            monster_id: id,
            x,
            z,
            rotation_y: 0.0,
        })
    }

    fn spawn_other(id: &str, x: f32, z: f32) -> WireMessage {
        WireMessage::SpawnOtherPlayer(SpawnOtherPlayer {
            player_id: id.to_string(),
            x,
            y: 0.0,
            z,
            rotation_y: 0.0,
            player_template: 0,
        })
    }

    #[test]
    fn test_spawn_and_move_monster() {
        let (mut state, tx, recorder) = setup(Archetype::ServerDriven);
        let key = EntityKey::Monster(5);

        send(&tx, spawn_monster(5, 1.0, 2.0));
        state.tick(DT);
        assert_eq!(state.position_of(&key), Some(Vec3::new(1.0, 0.0, 2.0)));
        assert!(state.brain(&key).is_some());

        send(
            &tx,
            WireMessage::MoveMonster(MoveMonster {
                monster_id: 5,
                x: 10.0,
                z: 2.0,
            }),
        );
        state.tick(DT);
        let x = state.position_of(&key).unwrap().x;
        assert!(x > 1.0 && x < 10.0, "moved instantly to {}", x);

        for _ in 0..15 {
            state.tick(DT);
        }
        let position = state.position_of(&key).unwrap();
        assert_approx_eq!(position.x, 10.0, 1e-3);
        assert_approx_eq!(position.z, 2.0, 1e-3);

        let (published, _) = recorder.last_transform(&key).unwrap();
        assert_approx_eq!(published.x, 10.0, 1e-3);
    }

    #[test]
    fn test_target_cleared_on_logout() {
        let (mut state, tx, _) = setup(Archetype::ServerDriven);
        send(&tx, spawn_monster(7, 0.0, 0.0));
        send(&tx, spawn_other("P", 3.0, 0.0));
        send(
            &tx,
            WireMessage::MonsterTarget(MonsterTarget {
                monster_id: 7,
                target_player_id: "P".to_string(),
                has_target: true,
            }),
        );
        state.tick(DT);
        assert!(state.registry().target_of(&EntityKey::Monster(7)).is_some());

        send(&tx, WireMessage::logout("P"));
        state.tick(DT);
        assert_eq!(state.registry().target_of(&EntityKey::Monster(7)), None);
        assert!(state.registry().record(&EntityKey::Player("P".to_string())).is_none());
        assert_eq!(
            state
                .brain(&EntityKey::Monster(7))
                .unwrap()
                .blackboard()
                .get_entity(keys::SERVER_TARGET),
            None
        );
    }

    #[test]
    fn test_attack_command_runs_attack() {
        let (mut state, tx, recorder) = setup(Archetype::ServerDriven);
        let monster = EntityKey::Monster(1);
        send(&tx, spawn_monster(1, 0.0, 0.0));
        send(&tx, spawn_other("P", 0.0, 2.0));
        send(
            &tx,
            WireMessage::MonsterAttack(MonsterAttack {
                monster_id: 1,
                target_player_id: "P".to_string(),
                attack_type: 1,
                damage: 12.0,
            }),
        );
        state.tick(DT);
        assert_eq!(recorder.triggers_for(&monster), vec![anim::ATTACK.to_string()]);

        for _ in 0..90 {
            state.tick(DT);
        }
        assert!(recorder
            .effects()
            .iter()
            .any(|e| e.effect_id == "melee_slash"));
        assert!(recorder
            .bools_for(&monster)
            .contains(&(anim::IS_ATTACKING.to_string(), false)));
    }

    #[test]
    fn test_attack_without_known_target_is_ignored() {
        let (mut state, tx, recorder) = setup(Archetype::ServerDriven);
        send(&tx, spawn_monster(1, 0.0, 0.0));
        send(
            &tx,
            WireMessage::MonsterAttack(MonsterAttack {
                monster_id: 1,
                target_player_id: "ghost".to_string(),
                attack_type: 1,
                damage: 5.0,
            }),
        );
        state.tick(DT);
        assert!(recorder.triggers_for(&EntityKey::Monster(1)).is_empty());
    }

    #[test]
    fn test_meteor_strike_command() {
        let (mut state, tx, recorder) = setup(Archetype::ServerDriven);
        send(&tx, spawn_monster(9, 0.0, 0.0));
        send(
            &tx,
            WireMessage::MeteorStrike(MeteorStrike {
                monster_id: 9,
                positions: vec![GroundPoint { x: 1.0, z: 1.0 }, GroundPoint { x: 2.0, z: 2.0 }],
            }),
        );
        for _ in 0..(4 * 60) {
            state.tick(DT);
        }
        let meteors = recorder
            .effects()
            .iter()
            .filter(|e| e.effect_id == "meteor")
            .count();
        assert_eq!(meteors, 2);
        assert_eq!(
            recorder.bools_for(&EntityKey::Monster(9)).iter().filter(|(n, _)| n == anim::IS_CASTING_METEOR).count(),
            2
        );
    }

    #[test]
    fn test_monster_death_despawns() {
        let (mut state, tx, recorder) = setup(Archetype::ServerDriven);
        let key = EntityKey::Monster(3);
        send(&tx, spawn_monster(3, 0.0, 0.0));
        send(
            &tx,
            WireMessage::monster_damage(3, 40.0, 60, Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 0.0, 1.0), 2),
        );
        state.tick(DT);
        assert_eq!(state.registry().record(&key).unwrap().health, Some(60));
        assert_eq!(recorder.effects()[0].effect_id, "hit_2");

        send(
            &tx,
            WireMessage::monster_damage(3, 60.0, 0, Point3::default(), Point3::default(), 2),
        );
        state.tick(DT);
        assert!(state.registry().record(&key).is_none());
        assert!(state.brain(&key).is_none());
        assert!(recorder.triggers_for(&key).contains(&anim::DIE.to_string()));
        assert_eq!(recorder.removed(), vec![key]);
    }

    #[test]
    fn test_player_damage_knocks_back() {
        let (mut state, tx, recorder) = setup(Archetype::ServerDriven);
        let key = EntityKey::Player("P".to_string());
        send(&tx, spawn_other("P", 0.0, 0.0));
        send(&tx, WireMessage::player_damage("P", 10.0, 1, Point3::new(0.0, 1.0, 0.0)));
        state.tick(DT);

        assert_eq!(recorder.triggers_for(&key), vec![anim::DAMAGED.to_string()]);
        assert!(recorder.bools_for(&key).contains(&(anim::KNOCK_BACK.to_string(), true)));
        assert_eq!(recorder.effects().len(), 1);
    }

    #[test]
    fn test_remote_player_interpolates_and_local_echo_ignored() {
        let (mut state, tx, _) = setup(Archetype::ServerDriven);
        send(
            &tx,
            WireMessage::SpawnMyPlayer(SpawnMyPlayer {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                rotation_y: 0.0,
                player_template: 1,
            }),
        );
        send(&tx, spawn_other("other", 0.0, 0.0));
        send(&tx, WireMessage::player_position("me", 50.0, 0.0, 0.0, (1.0, 0.0, 0.0), 1.0, 90.0));
        send(&tx, WireMessage::player_position("other", 4.0, 0.0, 0.0, (1.0, 0.0, 0.0), 0.0, 90.0));
        state.tick(DT);

        let me = EntityKey::Player("me".to_string());
        assert_eq!(state.position_of(&me), Some(Vec3::ZERO));
        assert_eq!(
            state.registry().record(&me).unwrap().kind,
            EntityKind::LocalPlayer
        );

        for _ in 0..20 {
            state.tick(DT);
        }
        let other = state.position_of(&EntityKey::Player("other".to_string())).unwrap();
        assert_approx_eq!(other.x, 4.0, 1e-3);

        assert!(state.set_local_player_pose(Vec3::new(1.0, 0.0, 1.0), 45.0));
        assert_eq!(state.position_of(&me), Some(Vec3::new(1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_monster_seed_varies_by_id() {
        assert_eq!(monster_seed(None, 3), None);
        assert_eq!(monster_seed(Some(7), 3), monster_seed(Some(7), 3));
        assert_ne!(monster_seed(Some(7), 3), monster_seed(Some(7), 4));
        assert_eq!(monster_seed(Some(7), 0), Some(7));
    }

    #[test]
    fn test_disconnect_freezes_entities() {
        let (mut state, tx, _) = setup(Archetype::ServerDriven);
        let key = EntityKey::Monster(2);
        send(&tx, spawn_monster(2, 0.0, 0.0));
        send(
            &tx,
            WireMessage::MoveMonster(MoveMonster {
                monster_id: 2,
                x: 6.0,
                z: 0.0,
            }),
        );
        state.tick(DT);
        let held = state.position_of(&key).unwrap();

        tx.try_enqueue(NetworkEvent::Disconnected {
            reason: "test".to_string(),
        })
        .unwrap();
        state.tick(DT);
        state.tick(DT);

        assert!(!state.is_connected());
        assert_eq!(state.position_of(&key), Some(held));
    }

    #[test]
    fn test_disconnect_stops_chasing_monsters() {
        let (mut state, tx, recorder) = setup(Archetype::Grunt);
        let key = EntityKey::Monster(3);
        send(&tx, spawn_monster(3, 0.0, 0.0));
        send(&tx, spawn_other("P", 0.0, 10.0));
        state.tick(DT);
        state.tick(DT);
        let held = state.position_of(&key).unwrap();
        assert!(held.z > 0.0, "grunt never started chasing");

        tx.try_enqueue(NetworkEvent::Disconnected {
            reason: "test".to_string(),
        })
        .unwrap();
        for _ in 0..60 {
            state.tick(DT);
        }
        assert_eq!(state.position_of(&key), Some(held));
        let chase = recorder
            .bools_for(&key)
            .into_iter()
            .filter(|(name, _)| name == anim::CHASE)
            .map(|(_, value)| value)
            .last();
        assert_eq!(chase, Some(false));

        state.set_connected(true);
        for _ in 0..5 {
            state.tick(DT);
        }
        assert!(state.position_of(&key).unwrap().z > held.z);
    }

    #[test]
    fn test_chat_and_animator_forwarding() {
        let (mut state, tx, recorder) = setup(Archetype::ServerDriven);
        let key = EntityKey::Player("P".to_string());
        send(&tx, spawn_other("P", 0.0, 0.0));
        send(
            &tx,
            WireMessage::Chat(Chat {
                player_id: "P".to_string(),
                message: "hi".to_string(),
            }),
        );
        send(
            &tx,
            WireMessage::AnimatorSetTrigger(AnimatorSetTrigger {
                player_id: "P".to_string(),
                anim_id: "Jump".to_string(),
            }),
        );
        send(
            &tx,
            WireMessage::AnimatorSetTrigger(AnimatorSetTrigger {
                player_id: "nobody".to_string(),
                anim_id: "Jump".to_string(),
            }),
        );
        state.tick(DT);

        assert!(recorder.calls().contains(&crate::collaborators::Call::Chat {
            player_id: "P".to_string(),
            message: "hi".to_string()
        }));
        assert_eq!(recorder.triggers_for(&key), vec!["Jump".to_string()]);
        assert!(recorder
            .triggers_for(&EntityKey::Player("nobody".to_string()))
            .is_empty());
    }

    #[test]
    fn test_grunt_chases_nearby_player() {
        let (mut state, tx, _) = setup(Archetype::Grunt);
        send(&tx, spawn_monster(4, 0.0, 0.0));
        send(&tx, spawn_other("P", 0.0, 8.0));
        for _ in 0..30 {
            state.tick(DT);
        }
        let z = state.position_of(&EntityKey::Monster(4)).unwrap().z;
        assert!(z > 0.5 && z < 8.0, "grunt at z={}", z);
    }

    #[test]
    fn test_path_debug_is_kept() {
        let (mut state, tx, _) = setup(Archetype::ServerDriven);
        send(
            &tx,
            WireMessage::PathTest(PathTest {
                paths: vec![Point3::new(1.0, 0.0, 1.0), Point3::new(2.0, 0.0, 2.0)],
            }),
        );
        state.tick(DT);
        assert_eq!(state.last_path().len(), 2);
    }
}
