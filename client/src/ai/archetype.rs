use super::actions::{AttackAction, ChaseTarget, FaceTarget, SetStageFromHealth};
use super::conditions::{DetectEnemy, HasTarget, WithinRange};
use super::meteor::MeteorStrikeAction;
use super::{keys, AttackConfig};
use crate::bt::{
    BehaviorTree, Cooldown, Selector, Sequence, ServerDrivenSelector, StageBasedSelector, Wait,
    WaitForCommand,
};
use std::fmt;
use std::str::FromStr;

/// Which tree a newly spawned monster gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    /// Acts only on server commands
    ServerDriven,
    /// Chases and swings at the nearest player
    Grunt,
    /// Picks attacks from a pool that widens as health drops
    Boss,
}

impl FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "server" | "server-driven" | "server_driven" => Ok(Archetype::ServerDriven),
            "grunt" => Ok(Archetype::Grunt),
            "boss" => Ok(Archetype::Boss),
            other => Err(format!(
                "unknown archetype '{}' (expected server-driven, grunt or boss)",
                other
            )),
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Archetype::ServerDriven => "server-driven",
            Archetype::Grunt => "grunt",
            Archetype::Boss => "boss",
        };
        f.write_str(name)
    }
}

/// Command name written for a server attack of type `attack_type`.
pub fn attack_command(attack_type: i32) -> String {
    format!("attack_{}", attack_type)
}

pub const METEOR_COMMAND: &str = "meteor_strike";

impl Archetype {
    pub fn build(self, stage_seed: Option<u64>) -> BehaviorTree {
        match self {
            Archetype::ServerDriven => BehaviorTree::new(server_driven()),
            Archetype::Grunt => BehaviorTree::new(grunt()),
            Archetype::Boss => BehaviorTree::new(boss(stage_seed)),
        }
    }
}

fn strike(config: AttackConfig) -> Sequence {
    Sequence::new()
        .with(HasTarget)
        .with(AttackAction::new(config))
}

/// Attack types 1-3 are melee variants and 4 is ranged; 0 is treated as a
/// plain melee swing.
fn server_driven() -> ServerDrivenSelector {
    ServerDrivenSelector::new(keys::COMMAND, WaitForCommand::new(keys::COMMAND))
        .with_action(attack_command(0), strike(AttackConfig::melee()))
        .with_action(attack_command(1), strike(AttackConfig::melee()))
        .with_action(attack_command(2), strike(AttackConfig::combo()))
        .with_action(attack_command(3), strike(AttackConfig::heavy()))
        .with_action(attack_command(4), strike(AttackConfig::ranged()))
        .with_action(METEOR_COMMAND, MeteorStrikeAction::default())
}

fn grunt() -> Selector {
    let melee = AttackConfig::melee();
    let reach = melee.range;
    Selector::new()
        .with(
            Sequence::new()
                .with(DetectEnemy::new(12.0))
                .with(WithinRange::new(reach))
                .with(FaceTarget::default())
                .with(Cooldown::new(AttackAction::new(melee), 1.5)),
        )
        .with(
            Sequence::new()
                .with(DetectEnemy::new(12.0))
                .with(ChaseTarget::new(3.5, reach * 0.8, 2.0)),
        )
        .with(Wait::new(0.5))
}

fn boss(stage_seed: Option<u64>) -> Sequence {
    let pool = StageBasedSelector::new(keys::STAGE, vec![vec![0, 1], vec![0, 1, 2], vec![0, 1, 2, 3]])
        .with_seed(stage_seed)
        .with(
            Sequence::new()
                .with(WithinRange::new(4.0))
                .with(FaceTarget::default())
                .with(AttackAction::new(AttackConfig::heavy())),
        )
        .with(ChaseTarget::new(4.0, 3.0, 2.5))
        .with(
            Sequence::new()
                .with(WithinRange::new(8.0))
                .with(FaceTarget::default())
                .with(AttackAction::new(AttackConfig::breath())),
        )
        .with(
            Sequence::new()
                .with(WithinRange::new(6.0))
                .with(AttackAction::new(AttackConfig::stomp())),
        );

    Sequence::new()
        .with(DetectEnemy::new(20.0))
        .with(SetStageFromHealth::new(vec![70, 30]))
        .with(pool)
}
