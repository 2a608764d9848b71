use super::keys;
use crate::bt::{Context, Node, NodeStatus};
use crate::registry::EntityHandle;

/// Live entity stored under [`keys::TARGET`], if it still exists.
pub(crate) fn current_target(ctx: &Context<'_>) -> Option<EntityHandle> {
    ctx.blackboard
        .get_entity(keys::TARGET)
        .filter(|&handle| ctx.world.get(handle).map_or(false, |record| record.alive))
}

/// Picks a target within `range`. A live server-assigned target wins;
/// otherwise the nearest player is chosen. Writes the result to
/// [`keys::TARGET`].
pub struct DetectEnemy {
    range: f32,
}

impl DetectEnemy {
    pub fn new(range: f32) -> Self {
        Self { range }
    }
}

impl Node for DetectEnemy {
    fn name(&self) -> &'static str {
        "DetectEnemy"
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        let Some(me) = ctx.me().map(|record| record.position()) else {
            return NodeStatus::Failure;
        };

        let assigned = ctx
            .blackboard
            .get_entity(keys::SERVER_TARGET)
            .and_then(|handle| ctx.world.get(handle))
            .filter(|record| record.alive && record.position().distance(me) <= self.range)
            .map(|record| record.handle);

        let found = assigned.or_else(|| {
            ctx.world
                .nearest_player(me, self.range)
                .map(|(handle, _)| handle)
        });

        ctx.blackboard.set_entity(keys::TARGET, found);
        if found.is_some() {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        }
    }
}

pub struct HasTarget;

impl Node for HasTarget {
    fn name(&self) -> &'static str {
        "HasTarget"
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        if current_target(ctx).is_some() {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        }
    }
}

pub struct WithinRange {
    range: f32,
}

impl WithinRange {
    pub fn new(range: f32) -> Self {
        Self { range }
    }
}

impl Node for WithinRange {
    fn name(&self) -> &'static str {
        "WithinRange"
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        let distance = current_target(ctx)
            .and_then(|target| ctx.world.get(target))
            .zip(ctx.me())
            .map(|(target, me)| target.position().distance(me.position()));
        match distance {
            Some(d) if d <= self.range => NodeStatus::Success,
            _ => NodeStatus::Failure,
        }
    }
}

/// Succeeds while known health is below `threshold`.
pub struct IsHealthUnder {
    threshold: i32,
}

impl IsHealthUnder {
    pub fn new(threshold: i32) -> Self {
        Self { threshold }
    }
}

impl Node for IsHealthUnder {
    fn name(&self) -> &'static str {
        "IsHealthUnder"
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        match ctx.me().and_then(|record| record.health) {
            Some(hp) if hp < self.threshold => NodeStatus::Success,
            _ => NodeStatus::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bt::test_support::Harness;
    use crate::bt::Task;
    use crate::registry::{EntityKey, EntityKind};
    use glam::Vec3;

    fn spawn_player(harness: &mut Harness, id: &str, at: Vec3) -> EntityHandle {
        harness
            .world
            .spawn(EntityKey::Player(id.to_string()), EntityKind::RemotePlayer, at, 0.0, 0)
    }

    #[test]
    fn test_detect_nearest_player() {
        let mut harness = Harness::new();
        spawn_player(&mut harness, "far", Vec3::new(8.0, 0.0, 0.0));
        let near = spawn_player(&mut harness, "near", Vec3::new(0.0, 0.0, 3.0));

        let mut detect = Task::new(DetectEnemy::new(10.0));
        assert_eq!(detect.tick(&mut harness.ctx(0.1)), NodeStatus::Success);
        assert_eq!(harness.blackboard.get_entity(keys::TARGET), Some(near));
    }

    #[test]
    fn test_detect_prefers_server_target() {
        let mut harness = Harness::new();
        let far = spawn_player(&mut harness, "far", Vec3::new(8.0, 0.0, 0.0));
        spawn_player(&mut harness, "near", Vec3::new(0.0, 0.0, 3.0));
        harness.blackboard.set_entity(keys::SERVER_TARGET, Some(far));

        let mut detect = Task::new(DetectEnemy::new(10.0));
        assert_eq!(detect.tick(&mut harness.ctx(0.1)), NodeStatus::Success);
        assert_eq!(harness.blackboard.get_entity(keys::TARGET), Some(far));
    }

    #[test]
    fn test_detect_nothing_in_range_clears_target() {
        let mut harness = Harness::new();
        spawn_player(&mut harness, "far", Vec3::new(50.0, 0.0, 0.0));
        harness.blackboard.set_entity(keys::TARGET, Some(harness.entity));

        let mut detect = Task::new(DetectEnemy::new(10.0));
        assert_eq!(detect.tick(&mut harness.ctx(0.1)), NodeStatus::Failure);
        assert_eq!(harness.blackboard.get_entity(keys::TARGET), None);
    }

    #[test]
    fn test_has_target_fails_after_despawn() {
        let mut harness = Harness::new();
        let target = spawn_player(&mut harness, "p", Vec3::new(1.0, 0.0, 0.0));
        harness.blackboard.set_entity(keys::TARGET, Some(target));

        let mut has = Task::new(HasTarget);
        let mut near = Task::new(WithinRange::new(2.0));
        assert_eq!(has.tick(&mut harness.ctx(0.1)), NodeStatus::Success);
        assert_eq!(near.tick(&mut harness.ctx(0.1)), NodeStatus::Success);

        harness.world.despawn(&EntityKey::Player("p".to_string()));
        assert_eq!(has.tick(&mut harness.ctx(0.1)), NodeStatus::Failure);
        assert_eq!(near.tick(&mut harness.ctx(0.1)), NodeStatus::Failure);
    }

    #[test]
    fn test_health_under() {
        let mut harness = Harness::new();
        let mut low = Task::new(IsHealthUnder::new(50));
        assert_eq!(low.tick(&mut harness.ctx(0.1)), NodeStatus::Failure);

        harness.world.set_health(&EntityKey::Monster(1), 20);
        assert_eq!(low.tick(&mut harness.ctx(0.1)), NodeStatus::Success);
    }
}
