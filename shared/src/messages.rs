//! Wire message records exchanged with the game server
//!
//! Every frame on the wire carries exactly one [`WireMessage`]. Payloads are
//! plain typed records; players are addressed by their string id and monsters
//! by their integer id.

use crate::codec::DecodeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Login {
    pub player_id: String,
    pub player_template: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Logout {
    pub player_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnMyPlayer {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation_y: f32,
    pub player_template: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnOtherPlayer {
    pub player_id: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation_y: f32,
    pub player_template: i32,
}

/// Authoritative transform sample for a player.
///
/// `fx/fy/fz` is the forward (movement) direction and `speed` its magnitude,
/// used for dead-reckoning between samples.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub player_id: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub fx: f32,
    pub fy: f32,
    pub fz: f32,
    pub speed: f32,
    pub rotation_y: f32,
}

/// Monsters live on the ground plane, so only X and Z travel on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnMonster {
    pub monster_id: i32,
    pub x: f32,
    pub z: f32,
    pub rotation_y: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveMonster {
    pub monster_id: i32,
    pub x: f32,
    pub z: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonsterTarget {
    pub monster_id: i32,
    pub target_player_id: String,
    pub has_target: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonsterAttack {
    pub monster_id: i32,
    pub target_player_id: String,
    pub attack_type: i32,
    pub damage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonsterDamage {
    pub monster_id: i32,
    pub damage: f32,
    pub current_hp: i32,
    pub hit_point: Point3,
    pub hit_normal: Point3,
    pub hit_effect_type: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundPoint {
    pub x: f32,
    pub z: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeteorStrike {
    pub monster_id: i32,
    pub positions: Vec<GroundPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerDamage {
    pub player_id: String,
    pub damage: f32,
    pub attack_type: i32,
    pub hit_point: Point3,
}

/// Debug path emitted by the server's navigation code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathTest {
    pub paths: Vec<Point3>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chat {
    pub player_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplyRootMotion {
    pub player_id: String,
    pub root_motion: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimatorSetInteger {
    pub player_id: String,
    pub anim_id: String,
    pub condition: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimatorSetFloat {
    pub player_id: String,
    pub anim_id: String,
    pub condition: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimatorSetBool {
    pub player_id: String,
    pub anim_id: String,
    pub condition: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimatorSetTrigger {
    pub player_id: String,
    pub anim_id: String,
}

/// Tagged union carried by every frame.
///
/// The variant order is the wire tag; append new variants at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireMessage {
    Login(Login),
    Logout(Logout),
    SpawnMyPlayer(SpawnMyPlayer),
    SpawnOtherPlayer(SpawnOtherPlayer),
    PlayerPosition(PlayerPosition),
    SpawnMonster(SpawnMonster),
    MoveMonster(MoveMonster),
    MonsterTarget(MonsterTarget),
    MonsterAttack(MonsterAttack),
    MonsterDamage(MonsterDamage),
    MeteorStrike(MeteorStrike),
    PlayerDamage(PlayerDamage),
    PathTest(PathTest),
    Chat(Chat),
    ApplyRootMotion(ApplyRootMotion),
    AnimatorSetInteger(AnimatorSetInteger),
    AnimatorSetFloat(AnimatorSetFloat),
    AnimatorSetBool(AnimatorSetBool),
    AnimatorSetTrigger(AnimatorSetTrigger),
}

impl WireMessage {
    /// Short name of the variant, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Login(_) => "Login",
            WireMessage::Logout(_) => "Logout",
            WireMessage::SpawnMyPlayer(_) => "SpawnMyPlayer",
            WireMessage::SpawnOtherPlayer(_) => "SpawnOtherPlayer",
            WireMessage::PlayerPosition(_) => "PlayerPosition",
            WireMessage::SpawnMonster(_) => "SpawnMonster",
            WireMessage::MoveMonster(_) => "MoveMonster",
            WireMessage::MonsterTarget(_) => "MonsterTarget",
            WireMessage::MonsterAttack(_) => "MonsterAttack",
            WireMessage::MonsterDamage(_) => "MonsterDamage",
            WireMessage::MeteorStrike(_) => "MeteorStrike",
            WireMessage::PlayerDamage(_) => "PlayerDamage",
            WireMessage::PathTest(_) => "PathTest",
            WireMessage::Chat(_) => "Chat",
            WireMessage::ApplyRootMotion(_) => "ApplyRootMotion",
            WireMessage::AnimatorSetInteger(_) => "AnimatorSetInteger",
            WireMessage::AnimatorSetFloat(_) => "AnimatorSetFloat",
            WireMessage::AnimatorSetBool(_) => "AnimatorSetBool",
            WireMessage::AnimatorSetTrigger(_) => "AnimatorSetTrigger",
        }
    }

    /// Checks field constraints the serializer cannot express.
    ///
    /// Player ids must be non-empty wherever the payload addresses a player,
    /// monster ids must be non-negative and every float must be finite.
    pub fn validate(&self) -> Result<(), DecodeError> {
        match self {
            WireMessage::Login(m) => require_player_id(&m.player_id),
            WireMessage::Logout(m) => require_player_id(&m.player_id),
            WireMessage::SpawnMyPlayer(m) => require_finite(&[m.x, m.y, m.z, m.rotation_y]),
            WireMessage::SpawnOtherPlayer(m) => {
                require_player_id(&m.player_id)?;
                require_finite(&[m.x, m.y, m.z, m.rotation_y])
            }
            WireMessage::PlayerPosition(m) => {
                require_player_id(&m.player_id)?;
                require_finite(&[m.x, m.y, m.z, m.fx, m.fy, m.fz, m.speed, m.rotation_y])
            }
            WireMessage::SpawnMonster(m) => {
                require_monster_id(m.monster_id)?;
                require_finite(&[m.x, m.z, m.rotation_y])
            }
            WireMessage::MoveMonster(m) => {
                require_monster_id(m.monster_id)?;
                require_finite(&[m.x, m.z])
            }
            WireMessage::MonsterTarget(m) => {
                require_monster_id(m.monster_id)?;
                if m.has_target {
                    require_player_id(&m.target_player_id)?;
                }
                Ok(())
            }
            WireMessage::MonsterAttack(m) => {
                require_monster_id(m.monster_id)?;
                require_finite(&[m.damage])
            }
            WireMessage::MonsterDamage(m) => {
                require_monster_id(m.monster_id)?;
                require_finite(&[m.damage])?;
                require_point(&m.hit_point)?;
                require_point(&m.hit_normal)
            }
            WireMessage::MeteorStrike(m) => {
                require_monster_id(m.monster_id)?;
                for p in &m.positions {
                    require_finite(&[p.x, p.z])?;
                }
                Ok(())
            }
            WireMessage::PlayerDamage(m) => {
                require_player_id(&m.player_id)?;
                require_finite(&[m.damage])?;
                require_point(&m.hit_point)
            }
            WireMessage::PathTest(m) => {
                for p in &m.paths {
                    require_point(p)?;
                }
                Ok(())
            }
            WireMessage::Chat(m) => require_player_id(&m.player_id),
            WireMessage::ApplyRootMotion(m) => require_player_id(&m.player_id),
            WireMessage::AnimatorSetInteger(m) => require_animator(&m.player_id, &m.anim_id),
            WireMessage::AnimatorSetFloat(m) => {
                require_animator(&m.player_id, &m.anim_id)?;
                require_finite(&[m.condition])
            }
            WireMessage::AnimatorSetBool(m) => require_animator(&m.player_id, &m.anim_id),
            WireMessage::AnimatorSetTrigger(m) => require_animator(&m.player_id, &m.anim_id),
        }
    }

    pub fn login(player_id: &str, player_template: i32) -> Self {
        WireMessage::Login(Login {
            player_id: player_id.to_string(),
            player_template,
        })
    }

    pub fn logout(player_id: &str) -> Self {
        WireMessage::Logout(Logout {
            player_id: player_id.to_string(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn player_position(
        player_id: &str,
        x: f32,
        y: f32,
        z: f32,
        forward: (f32, f32, f32),
        speed: f32,
        rotation_y: f32,
    ) -> Self {
        WireMessage::PlayerPosition(PlayerPosition {
            player_id: player_id.to_string(),
            x,
            y,
            z,
            fx: forward.0,
            fy: forward.1,
            fz: forward.2,
            speed,
            rotation_y,
        })
    }

    pub fn monster_damage(
        monster_id: i32,
        damage: f32,
        current_hp: i32,
        hit_point: Point3,
        hit_normal: Point3,
        hit_effect_type: i32,
    ) -> Self {
        WireMessage::MonsterDamage(MonsterDamage {
            monster_id,
            damage,
            current_hp,
            hit_point,
            hit_normal,
            hit_effect_type,
        })
    }

    pub fn player_damage(player_id: &str, damage: f32, attack_type: i32, hit_point: Point3) -> Self {
        WireMessage::PlayerDamage(PlayerDamage {
            player_id: player_id.to_string(),
            damage,
            attack_type,
            hit_point,
        })
    }
}

fn require_player_id(player_id: &str) -> Result<(), DecodeError> {
    if player_id.trim().is_empty() {
        Err(DecodeError::MissingEntityId)
    } else {
        Ok(())
    }
}

fn require_monster_id(monster_id: i32) -> Result<(), DecodeError> {
    if monster_id < 0 {
        Err(DecodeError::InvalidField("monster_id"))
    } else {
        Ok(())
    }
}

fn require_animator(player_id: &str, anim_id: &str) -> Result<(), DecodeError> {
    require_player_id(player_id)?;
    if anim_id.is_empty() {
        return Err(DecodeError::InvalidField("anim_id"));
    }
    Ok(())
}

fn require_finite(values: &[f32]) -> Result<(), DecodeError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(DecodeError::InvalidField("non-finite float"))
    }
}

fn require_point(point: &Point3) -> Result<(), DecodeError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(DecodeError::InvalidField("non-finite point"))
    }
}
