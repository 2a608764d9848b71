//! Behavior tree runtime
//!
//! Trees are built from [`Node`]s wrapped in [`Task`]s, which run the
//! enter/tick/exit lifecycle. Composites resume at the child that returned
//! `Running` on the previous tick. Every tree owns a [`Blackboard`] that the
//! network layer writes commands into and the nodes read from.

pub mod blackboard;
pub mod composite;
pub mod decorator;
pub mod leaf;
pub mod node;
pub mod server_driven;
pub mod stage;

pub use blackboard::{Blackboard, Value};
pub use composite::{Selector, Sequence};
pub use decorator::{AlwaysSucceed, Cooldown, Inverter, Repeat};
pub use leaf::{Action, Condition, Wait};
pub use node::{BehaviorTree, Context, Node, NodeStatus, Task};
pub use server_driven::{ServerDrivenSelector, WaitForCommand};
pub use stage::StageBasedSelector;

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Blackboard, Context};
    use crate::collaborators::{Collaborators, Recorder};
    use crate::registry::{EntityHandle, EntityKey, EntityKind, EntityRegistry};
    use glam::Vec3;

    /// Owns everything a [`Context`] borrows, for ticking nodes directly.
    pub(crate) struct Harness {
        pub entity: EntityHandle,
        pub now: f64,
        pub blackboard: Blackboard,
        pub world: EntityRegistry,
        pub out: Collaborators,
        pub recorder: Recorder,
    }

    impl Harness {
        pub fn new() -> Self {
            let mut world = EntityRegistry::default();
            let entity = world.spawn(EntityKey::Monster(1), EntityKind::Monster, Vec3::ZERO, 0.0, 0);
            let recorder = Recorder::new();
            Self {
                entity,
                now: 0.0,
                blackboard: Blackboard::new(),
                world,
                out: recorder.collaborators(),
                recorder,
            }
        }

        pub fn ctx(&mut self, dt: f32) -> Context<'_> {
            Context {
                entity: self.entity,
                dt,
                now: self.now,
                blackboard: &mut self.blackboard,
                world: &mut self.world,
                out: &mut self.out,
            }
        }
    }
}
