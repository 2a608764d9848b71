//! Monster AI built on the behavior tree runtime
//!
//! Conditions and actions here read and write the shared blackboard keys in
//! [`keys`]. The network layer feeds server decisions in through the same keys
//! (`command`, `target`, `meteor_positions`), so a server-driven tree and a
//! locally-deciding tree use the same building blocks.

pub mod actions;
pub mod archetype;
pub mod conditions;
pub mod meteor;

pub use actions::{AttackAction, ChaseTarget, FaceTarget, SetStageFromHealth};
pub use archetype::Archetype;
pub use conditions::{DetectEnemy, HasTarget, IsHealthUnder, WithinRange};
pub use meteor::{MeteorConfig, MeteorStrikeAction};

/// Blackboard keys shared by AI nodes and the message handlers.
pub mod keys {
    /// Text: name of the action the server asked for
    pub const COMMAND: &str = "command";
    /// Entity: who the monster is acting against
    pub const TARGET: &str = "target";
    /// Entity: target assigned by the server, refreshed every tick
    pub const SERVER_TARGET: &str = "server_target";
    /// Float: damage carried by the last attack command
    pub const ATTACK_DAMAGE: &str = "attack_damage";
    /// Int: current combat stage
    pub const STAGE: &str = "stage";
    /// Points: ground positions for the next meteor strike
    pub const METEOR_POSITIONS: &str = "meteor_positions";
}

/// Animator parameter names used by the monster rig.
pub mod anim {
    pub const ATTACK: &str = "Attack";
    pub const IS_ATTACKING: &str = "IsAttacking";
    pub const CHASE: &str = "Chase";
    pub const START_ROTATION: &str = "StartRotation";
    pub const METEOR_ATTACK: &str = "MeteorAttack";
    pub const IS_CASTING_METEOR: &str = "IsCastingMeteor";
    pub const DIE: &str = "Die";
    pub const DAMAGED: &str = "Damaged";
    pub const KNOCK_BACK: &str = "KnockBack";
    pub const IS_MOVING: &str = "IsMoving";
    pub const IS_TURNING_LEFT: &str = "IsTurningLeft";
    pub const IS_TURNING_RIGHT: &str = "IsTurningRight";
}

/// One effect fired during an attack, placed in normalized attack time
/// (0 = start of the swing, 1 = end).
#[derive(Debug, Clone, PartialEq)]
pub struct EffectTiming {
    pub effect_id: String,
    pub activation: f32,
    pub deactivation: f32,
    /// Spawn at the target instead of at the attacker
    pub at_target: bool,
}

impl EffectTiming {
    pub fn new(effect_id: &str, activation: f32, deactivation: f32) -> Self {
        Self {
            effect_id: effect_id.to_string(),
            activation,
            deactivation,
            at_target: false,
        }
    }

    pub fn at_target(mut self) -> Self {
        self.at_target = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttackConfig {
    pub name: String,
    pub trigger: String,
    pub sound_id: Option<String>,
    /// Seconds from wind-up to recovery
    pub duration: f32,
    pub range: f32,
    pub effects: Vec<EffectTiming>,
}

impl AttackConfig {
    pub fn melee() -> Self {
        Self {
            name: "melee".to_string(),
            trigger: anim::ATTACK.to_string(),
            sound_id: Some("melee_swing".to_string()),
            duration: 1.0,
            range: 3.0,
            effects: vec![EffectTiming::new("melee_slash", 0.35, 0.55)],
        }
    }

    pub fn combo() -> Self {
        Self {
            name: "combo".to_string(),
            trigger: "Attack2".to_string(),
            sound_id: Some("melee_swing".to_string()),
            duration: 1.4,
            range: 3.0,
            effects: vec![
                EffectTiming::new("melee_slash", 0.25, 0.4),
                EffectTiming::new("melee_slash", 0.6, 0.75),
            ],
        }
    }

    pub fn heavy() -> Self {
        Self {
            name: "heavy".to_string(),
            trigger: "Attack3".to_string(),
            sound_id: Some("heavy_swing".to_string()),
            duration: 1.8,
            range: 4.0,
            effects: vec![EffectTiming::new("ground_crack", 0.55, 0.8)],
        }
    }

    pub fn ranged() -> Self {
        Self {
            name: "ranged".to_string(),
            trigger: "RangedAttack".to_string(),
            sound_id: Some("projectile_cast".to_string()),
            duration: 1.2,
            range: 15.0,
            effects: vec![
                EffectTiming::new("cast_glow", 0.1, 0.5),
                EffectTiming::new("projectile_impact", 0.5, 0.9).at_target(),
            ],
        }
    }

    pub fn breath() -> Self {
        Self {
            name: "breath".to_string(),
            trigger: "Breath".to_string(),
            sound_id: Some("breath_roar".to_string()),
            duration: 2.5,
            range: 8.0,
            effects: vec![EffectTiming::new("fire_breath", 0.3, 0.9)],
        }
    }

    pub fn stomp() -> Self {
        Self {
            name: "stomp".to_string(),
            trigger: "Stomp".to_string(),
            sound_id: Some("stomp_impact".to_string()),
            duration: 1.5,
            range: 6.0,
            effects: vec![EffectTiming::new("shockwave", 0.45, 0.7)],
        }
    }
}
