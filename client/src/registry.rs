//! Entity registry: the single owner of every replicated entity
//!
//! Entities are keyed by their server identity and handed out as
//! [`EntityHandle`]s. Handles are never reused, so a handle that outlives its
//! entity simply fails to resolve instead of pointing at someone else.

use crate::config::InterpolationConfig;
use crate::interpolation::Interpolator;
use glam::Vec3;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Player(String),
    Monster(i32),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Player(id) => write!(f, "player {}", id),
            EntityKey::Monster(id) => write!(f, "monster {}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(u64);

impl EntityHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    LocalPlayer,
    RemotePlayer,
    Monster,
}

impl EntityKind {
    pub fn is_player(self) -> bool {
        matches!(self, EntityKind::LocalPlayer | EntityKind::RemotePlayer)
    }
}

#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub key: EntityKey,
    pub handle: EntityHandle,
    pub kind: EntityKind,
    pub template: i32,
    /// Last position reported by the server
    pub authoritative_position: Vec3,
    pub authoritative_yaw: Option<f32>,
    pub motion: Interpolator,
    pub alive: bool,
    pub health: Option<i32>,
    /// Who this entity is currently after, if anyone
    pub target: Option<EntityHandle>,
}

impl EntityRecord {
    pub fn position(&self) -> Vec3 {
        self.motion.position()
    }

    pub fn yaw(&self) -> f32 {
        self.motion.yaw()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damage {
    pub amount: f32,
    /// Server-reported remaining health, when the message carries it
    pub current_hp: Option<i32>,
    pub hit_point: Vec3,
    pub hit_normal: Vec3,
    pub effect_kind: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub handle: EntityHandle,
    pub health: Option<i32>,
    pub died: bool,
}

pub struct EntityRegistry {
    config: InterpolationConfig,
    next_handle: u64,
    by_key: HashMap<EntityKey, EntityHandle>,
    records: BTreeMap<EntityHandle, EntityRecord>,
    local_player: Option<EntityHandle>,
}

impl EntityRegistry {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            next_handle: 1,
            by_key: HashMap::new(),
            records: BTreeMap::new(),
            local_player: None,
        }
    }

    /// Creates an entity, replacing any existing one with the same key.
    pub fn spawn(
        &mut self,
        key: EntityKey,
        kind: EntityKind,
        position: Vec3,
        yaw: f32,
        template: i32,
    ) -> EntityHandle {
        if self.by_key.contains_key(&key) {
            debug!("Respawning {}", key);
            self.despawn(&key);
        }

        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;

        let record = EntityRecord {
            key: key.clone(),
            handle,
            kind,
            template,
            authoritative_position: position,
            authoritative_yaw: Some(yaw),
            motion: Interpolator::new(position, yaw, self.config),
            alive: true,
            health: None,
            target: None,
        };

        if kind == EntityKind::LocalPlayer {
            self.local_player = Some(handle);
        }
        info!("Spawned {} at ({:.2}, {:.2}, {:.2})", key, position.x, position.y, position.z);
        self.by_key.insert(key, handle);
        self.records.insert(handle, record);
        handle
    }

    pub fn spawn_local_player(
        &mut self,
        player_id: &str,
        position: Vec3,
        yaw: f32,
        template: i32,
    ) -> EntityHandle {
        let key = EntityKey::Player(player_id.to_string());
        self.spawn(key, EntityKind::LocalPlayer, position, yaw, template)
    }

    pub fn despawn(&mut self, key: &EntityKey) -> Option<EntityRecord> {
        let handle = self.by_key.remove(key)?;
        if self.local_player == Some(handle) {
            self.local_player = None;
        }
        let record = self.records.remove(&handle);
        if record.is_some() {
            info!("Despawned {}", key);
        }
        record
    }

    pub fn lookup(&self, key: &EntityKey) -> Option<EntityHandle> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&EntityRecord> {
        self.records.get(&handle)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut EntityRecord> {
        self.records.get_mut(&handle)
    }

    pub fn record(&self, key: &EntityKey) -> Option<&EntityRecord> {
        self.lookup(key).and_then(|handle| self.records.get(&handle))
    }

    fn record_mut(&mut self, key: &EntityKey) -> Option<&mut EntityRecord> {
        let handle = self.lookup(key)?;
        self.records.get_mut(&handle)
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.records.contains_key(&handle)
    }

    /// Feeds an authoritative sample into the entity's interpolator.
    /// Returns `false` for unknown keys.
    pub fn update_position(
        &mut self,
        key: &EntityKey,
        position: Vec3,
        yaw: Option<f32>,
        velocity: Vec3,
    ) -> bool {
        match self.record_mut(key) {
            Some(record) => {
                record.authoritative_position = position;
                record.authoritative_yaw = yaw;
                record.motion.push_sample(position, yaw, velocity);
                true
            }
            None => false,
        }
    }

    /// Sets or clears what `key` is targeting. A target that is not
    /// registered yet resolves to no target.
    pub fn update_target(&mut self, key: &EntityKey, target: Option<&EntityKey>) -> bool {
        let resolved = target.and_then(|t| self.lookup(t));
        if let (Some(t), None) = (target, resolved) {
            debug!("{} targets unknown {}", key, t);
        }
        match self.record_mut(key) {
            Some(record) => {
                record.target = resolved;
                true
            }
            None => false,
        }
    }

    /// Resolves the current target of `key`, skipping despawned entities.
    pub fn target_of(&self, key: &EntityKey) -> Option<EntityHandle> {
        self.record(key)
            .and_then(|record| record.target)
            .filter(|handle| self.records.contains_key(handle))
    }

    pub fn set_health(&mut self, key: &EntityKey, health: i32) -> bool {
        match self.record_mut(key) {
            Some(record) => {
                record.health = Some(health);
                true
            }
            None => false,
        }
    }

    /// Applies damage and reports whether the entity died from it. The entity
    /// stays registered; removal is up to the caller.
    pub fn apply_damage(&mut self, key: &EntityKey, damage: Damage) -> Option<DamageOutcome> {
        let record = self.record_mut(key)?;
        let health = match (damage.current_hp, record.health) {
            (Some(hp), _) => Some(hp),
            (None, Some(hp)) => Some(hp - damage.amount.round() as i32),
            (None, None) => None,
        };
        record.health = health;

        let died = record.alive && health.map_or(false, |hp| hp <= 0);
        if died {
            record.alive = false;
            record.motion.freeze();
        }
        Some(DamageOutcome {
            handle: record.handle,
            health,
            died,
        })
    }

    /// Moves an entity locally, e.g. while an AI chases something.
    pub fn translate(&mut self, handle: EntityHandle, delta: Vec3) -> bool {
        match self.records.get_mut(&handle) {
            Some(record) => {
                record.motion.translate(delta);
                true
            }
            None => false,
        }
    }

    pub fn face_towards(&mut self, handle: EntityHandle, point: Vec3) -> bool {
        match self.records.get_mut(&handle) {
            Some(record) => {
                record.motion.face_towards(point);
                true
            }
            None => false,
        }
    }

    pub fn snap_to(&mut self, handle: EntityHandle, position: Vec3, yaw: f32) -> bool {
        match self.records.get_mut(&handle) {
            Some(record) => {
                record.authoritative_position = position;
                record.authoritative_yaw = Some(yaw);
                record.motion.snap_to(position, yaw);
                true
            }
            None => false,
        }
    }

    /// Advances every live entity's interpolation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        for record in self.records.values_mut().filter(|r| r.alive) {
            record.motion.advance(dt);
        }
    }

    /// Stops all motion, used while the connection is down.
    pub fn freeze_all(&mut self) {
        for record in self.records.values_mut() {
            record.motion.freeze();
        }
    }

    /// Closest live player to `from` within `range`.
    pub fn nearest_player(&self, from: Vec3, range: f32) -> Option<(EntityHandle, f32)> {
        self.players()
            .map(|record| (record.handle, record.position().distance(from)))
            .filter(|(_, distance)| *distance <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn players(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records
            .values()
            .filter(|record| record.alive && record.kind.is_player())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.values()
    }

    pub fn local_player(&self) -> Option<EntityHandle> {
        self.local_player
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(InterpolationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn player(id: &str) -> EntityKey {
        EntityKey::Player(id.to_string())
    }

    #[test]
    fn test_spawn_and_lookup() {
        let mut registry = EntityRegistry::default();
        let handle = registry.spawn(EntityKey::Monster(5), EntityKind::Monster, Vec3::new(1.0, 0.0, 2.0), 0.0, 0);

        assert_eq!(registry.lookup(&EntityKey::Monster(5)), Some(handle));
        let record = registry.get(handle).unwrap();
        assert_eq!(record.position(), Vec3::new(1.0, 0.0, 2.0));
        assert!(record.alive);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_despawn_invalidates_handle() {
        let mut registry = EntityRegistry::default();
        let handle = registry.spawn(player("a"), EntityKind::RemotePlayer, Vec3::ZERO, 0.0, 0);

        assert!(registry.despawn(&player("a")).is_some());
        assert!(registry.get(handle).is_none());
        assert!(registry.lookup(&player("a")).is_none());
        assert!(registry.despawn(&player("a")).is_none());
    }

    #[test]
    fn test_handles_never_reused() {
        let mut registry = EntityRegistry::default();
        let first = registry.spawn(EntityKey::Monster(1), EntityKind::Monster, Vec3::ZERO, 0.0, 0);
        registry.despawn(&EntityKey::Monster(1));
        let second = registry.spawn(EntityKey::Monster(1), EntityKind::Monster, Vec3::ZERO, 0.0, 0);

        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
        assert!(registry.get(second).is_some());
    }

    #[test]
    fn test_respawn_replaces_existing() {
        let mut registry = EntityRegistry::default();
        let first = registry.spawn(EntityKey::Monster(3), EntityKind::Monster, Vec3::ZERO, 0.0, 0);
        let second = registry.spawn(EntityKey::Monster(3), EntityKind::Monster, Vec3::X, 0.0, 0);

        assert_eq!(registry.len(), 1);
        assert!(registry.get(first).is_none());
        assert_eq!(registry.get(second).unwrap().position(), Vec3::X);
    }

    #[test]
    fn test_target_cleared_when_target_despawns() {
        let mut registry = EntityRegistry::default();
        registry.spawn(EntityKey::Monster(7), EntityKind::Monster, Vec3::ZERO, 0.0, 0);
        let target = registry.spawn(player("p"), EntityKind::RemotePlayer, Vec3::ZERO, 0.0, 0);

        assert!(registry.update_target(&EntityKey::Monster(7), Some(&player("p"))));
        assert_eq!(registry.target_of(&EntityKey::Monster(7)), Some(target));

        registry.despawn(&player("p"));
        assert_eq!(registry.target_of(&EntityKey::Monster(7)), None);
    }

    #[test]
    fn test_unknown_target_resolves_to_none() {
        let mut registry = EntityRegistry::default();
        registry.spawn(EntityKey::Monster(7), EntityKind::Monster, Vec3::ZERO, 0.0, 0);
        assert!(registry.update_target(&EntityKey::Monster(7), Some(&player("ghost"))));
        assert_eq!(registry.target_of(&EntityKey::Monster(7)), None);
        assert!(!registry.update_target(&EntityKey::Monster(8), None));
    }

    #[test]
    fn test_damage_reports_death() {
        let mut registry = EntityRegistry::default();
        registry.spawn(EntityKey::Monster(2), EntityKind::Monster, Vec3::ZERO, 0.0, 0);
        let hit = Damage {
            amount: 30.0,
            current_hp: Some(70),
            hit_point: Vec3::ZERO,
            hit_normal: Vec3::Y,
            effect_kind: 0,
        };
        let outcome = registry.apply_damage(&EntityKey::Monster(2), hit).unwrap();
        assert_eq!(outcome.health, Some(70));
        assert!(!outcome.died);

        let outcome = registry
            .apply_damage(&EntityKey::Monster(2), Damage { current_hp: None, amount: 70.0, ..hit })
            .unwrap();
        assert_eq!(outcome.health, Some(0));
        assert!(outcome.died);
        assert!(!registry.record(&EntityKey::Monster(2)).unwrap().alive);
    }

    #[test]
    fn test_nearest_player_within_range() {
        let mut registry = EntityRegistry::default();
        registry.spawn(player("far"), EntityKind::RemotePlayer, Vec3::new(9.0, 0.0, 0.0), 0.0, 0);
        let near = registry.spawn_local_player("near", Vec3::new(3.0, 0.0, 4.0), 0.0, 0);
        registry.spawn(EntityKey::Monster(1), EntityKind::Monster, Vec3::ZERO, 0.0, 0);

        let (handle, distance) = registry.nearest_player(Vec3::ZERO, 10.0).unwrap();
        assert_eq!(handle, near);
        assert_approx_eq!(distance, 5.0);
        assert_eq!(registry.local_player(), Some(near));
        assert!(registry.nearest_player(Vec3::ZERO, 4.0).is_none());
    }

    #[test]
    fn test_update_position_drives_interpolation() {
        let mut registry = EntityRegistry::new(InterpolationConfig {
            blend_duration: 0.2,
            dead_reckoning: false,
            ..Default::default()
        });
        let handle = registry.spawn(EntityKey::Monster(5), EntityKind::Monster, Vec3::new(1.0, 0.0, 2.0), 0.0, 0);

        assert!(registry.update_position(&EntityKey::Monster(5), Vec3::new(10.0, 0.0, 2.0), None, Vec3::ZERO));
        registry.advance(1.0 / 60.0);
        let x = registry.get(handle).unwrap().position().x;
        assert!(x > 1.0 && x < 10.0);

        registry.advance(0.25);
        assert_approx_eq!(registry.get(handle).unwrap().position().x, 10.0);
    }
}
