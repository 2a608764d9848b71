//! Outbound interfaces to the layers this core does not own
//!
//! Rendering, animation, visual effects and audio live outside the
//! simulation. The core only issues requests through these traits.
//! [`LogCollaborators`] stands in for them in the headless binary and
//! [`Recorder`] captures every call for assertions in tests.

use crate::registry::EntityKey;
use glam::Vec3;
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait Presentation: Send {
    fn set_entity_transform(&mut self, key: &EntityKey, position: Vec3, yaw: f32);
    fn play_animation_trigger(&mut self, key: &EntityKey, name: &str);
    fn set_animator_bool(&mut self, key: &EntityKey, name: &str, value: bool);
    fn set_animator_int(&mut self, key: &EntityKey, name: &str, value: i32);
    fn set_animator_float(&mut self, key: &EntityKey, name: &str, value: f32);
    fn set_root_motion(&mut self, key: &EntityKey, enabled: bool);
    fn remove_entity(&mut self, key: &EntityKey);
    fn show_chat(&mut self, player_id: &str, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectRequest {
    pub effect_id: String,
    pub position: Vec3,
    pub yaw: f32,
    /// Seconds the effect should live
    pub duration: f32,
    /// Damage dealt while the effect is live, when the server assigned one
    pub damage: Option<f32>,
}

pub trait Effects: Send {
    fn request_effect(&mut self, request: EffectRequest);
}

pub trait Audio: Send {
    fn request_sound(&mut self, sound_id: &str, position: Vec3);
}

pub struct Collaborators {
    pub presentation: Box<dyn Presentation>,
    pub effects: Box<dyn Effects>,
    pub audio: Box<dyn Audio>,
}

impl Collaborators {
    pub fn new(
        presentation: Box<dyn Presentation>,
        effects: Box<dyn Effects>,
        audio: Box<dyn Audio>,
    ) -> Self {
        Self {
            presentation,
            effects,
            audio,
        }
    }

    /// Collaborators that only write to the log.
    pub fn logging() -> Self {
        Self::new(
            Box::new(LogCollaborators),
            Box::new(LogCollaborators),
            Box::new(LogCollaborators),
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogCollaborators;

impl Presentation for LogCollaborators {
    fn set_entity_transform(&mut self, _key: &EntityKey, _position: Vec3, _yaw: f32) {}

    fn play_animation_trigger(&mut self, key: &EntityKey, name: &str) {
        debug!("[anim] {} trigger {}", key, name);
    }

    fn set_animator_bool(&mut self, key: &EntityKey, name: &str, value: bool) {
        debug!("[anim] {} {} = {}", key, name, value);
    }

    fn set_animator_int(&mut self, key: &EntityKey, name: &str, value: i32) {
        debug!("[anim] {} {} = {}", key, name, value);
    }

    fn set_animator_float(&mut self, key: &EntityKey, name: &str, value: f32) {
        debug!("[anim] {} {} = {:.3}", key, name, value);
    }

    fn set_root_motion(&mut self, key: &EntityKey, enabled: bool) {
        debug!("[anim] {} root motion {}", key, enabled);
    }

    fn remove_entity(&mut self, key: &EntityKey) {
        debug!("[scene] remove {}", key);
    }

    fn show_chat(&mut self, player_id: &str, message: &str) {
        info!("[chat] {}: {}", player_id, message);
    }
}

impl Effects for LogCollaborators {
    fn request_effect(&mut self, request: EffectRequest) {
        debug!(
            "[fx] {} at ({:.2}, {:.2}, {:.2}) for {:.2}s, damage {:?}",
            request.effect_id,
            request.position.x,
            request.position.y,
            request.position.z,
            request.duration,
            request.damage
        );
    }
}

impl Audio for LogCollaborators {
    fn request_sound(&mut self, sound_id: &str, _position: Vec3) {
        debug!("[sfx] {}", sound_id);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Transform { key: EntityKey, position: Vec3, yaw: f32 },
    Trigger { key: EntityKey, name: String },
    Bool { key: EntityKey, name: String, value: bool },
    Int { key: EntityKey, name: String, value: i32 },
    Float { key: EntityKey, name: String, value: f32 },
    RootMotion { key: EntityKey, enabled: bool },
    Remove { key: EntityKey },
    Chat { player_id: String, message: String },
    Effect(EffectRequest),
    Sound { sound_id: String, position: Vec3 },
}

/// Shared log of collaborator calls. Clones see the same log, so a test can
/// keep one while the simulation owns the boxed collaborators.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            Box::new(self.clone()),
            Box::new(self.clone()),
            Box::new(self.clone()),
        )
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, call: Call) {
        self.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn triggers_for(&self, key: &EntityKey) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Trigger { key: k, name } if k == key => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn bools_for(&self, key: &EntityKey) -> Vec<(String, bool)> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Bool { key: k, name, value } if k == key => Some((name.clone(), *value)),
                _ => None,
            })
            .collect()
    }

    pub fn effects(&self) -> Vec<EffectRequest> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Effect(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<EntityKey> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Remove { key } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_transform(&self, key: &EntityKey) -> Option<(Vec3, f32)> {
        self.lock().iter().rev().find_map(|call| match call {
            Call::Transform { key: k, position, yaw } if k == key => Some((*position, *yaw)),
            _ => None,
        })
    }
}

impl Presentation for Recorder {
    fn set_entity_transform(&mut self, key: &EntityKey, position: Vec3, yaw: f32) {
        self.push(Call::Transform {
            key: key.clone(),
            position,
            yaw,
        });
    }

    fn play_animation_trigger(&mut self, key: &EntityKey, name: &str) {
        self.push(Call::Trigger {
            key: key.clone(),
            name: name.to_string(),
        });
    }

    fn set_animator_bool(&mut self, key: &EntityKey, name: &str, value: bool) {
        self.push(Call::Bool {
            key: key.clone(),
            name: name.to_string(),
            value,
        });
    }

    fn set_animator_int(&mut self, key: &EntityKey, name: &str, value: i32) {
        self.push(Call::Int {
            key: key.clone(),
            name: name.to_string(),
            value,
        });
    }

    fn set_animator_float(&mut self, key: &EntityKey, name: &str, value: f32) {
        self.push(Call::Float {
            key: key.clone(),
            name: name.to_string(),
            value,
        });
    }

    fn set_root_motion(&mut self, key: &EntityKey, enabled: bool) {
        self.push(Call::RootMotion {
            key: key.clone(),
            enabled,
        });
    }

    fn remove_entity(&mut self, key: &EntityKey) {
        self.push(Call::Remove { key: key.clone() });
    }

    fn show_chat(&mut self, player_id: &str, message: &str) {
        self.push(Call::Chat {
            player_id: player_id.to_string(),
            message: message.to_string(),
        });
    }
}

impl Effects for Recorder {
    fn request_effect(&mut self, request: EffectRequest) {
        self.push(Call::Effect(request));
    }
}

impl Audio for Recorder {
    fn request_sound(&mut self, sound_id: &str, position: Vec3) {
        self.push(Call::Sound {
            sound_id: sound_id.to_string(),
            position,
        });
    }
}
