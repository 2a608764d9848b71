use super::blackboard::Blackboard;
use crate::collaborators::Collaborators;
use crate::registry::{EntityHandle, EntityKey, EntityRecord, EntityRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Running,
    Success,
    Failure,
}

/// Everything a node may touch during one tick.
pub struct Context<'a> {
    /// The entity this tree belongs to
    pub entity: EntityHandle,
    /// Seconds since the previous tick
    pub dt: f32,
    /// Seconds since the simulation started
    pub now: f64,
    pub blackboard: &'a mut Blackboard,
    pub world: &'a mut EntityRegistry,
    pub out: &'a mut Collaborators,
}

impl<'a> Context<'a> {
    pub fn me(&self) -> Option<&EntityRecord> {
        self.world.get(self.entity)
    }

    pub fn my_key(&self) -> Option<EntityKey> {
        self.me().map(|record| record.key.clone())
    }
}

/// A behavior tree node.
///
/// `enter` runs before the first `tick` of an activation and `exit` after the
/// tick that returns a non-`Running` status. `abort` is called instead of
/// finishing when a parent gives up on a running node; the node must undo any
/// side effects it started.
pub trait Node: Send {
    fn name(&self) -> &'static str;

    fn enter(&mut self, _ctx: &mut Context<'_>) {}

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus;

    fn exit(&mut self, _ctx: &mut Context<'_>, _status: NodeStatus) {}

    fn abort(&mut self, _ctx: &mut Context<'_>) {}
}

/// Owns a node and drives its enter/tick/exit lifecycle.
pub struct Task {
    node: Box<dyn Node>,
    active: bool,
}

impl Task {
    pub fn new(node: impl Node + 'static) -> Self {
        Self::boxed(Box::new(node))
    }

    pub fn boxed(node: Box<dyn Node>) -> Self {
        Self {
            node,
            active: false,
        }
    }

    pub fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        if !self.active {
            self.node.enter(ctx);
            self.active = true;
        }
        let status = self.node.tick(ctx);
        if status != NodeStatus::Running {
            self.node.exit(ctx, status);
            self.active = false;
        }
        status
    }

    /// Interrupts the node if it is mid-activation.
    pub fn abort(&mut self, ctx: &mut Context<'_>) {
        if self.active {
            self.node.abort(ctx);
            self.node.exit(ctx, NodeStatus::Failure);
            self.active = false;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn name(&self) -> &'static str {
        self.node.name()
    }
}

/// One entity's tree together with its blackboard.
pub struct BehaviorTree {
    root: Task,
    blackboard: Blackboard,
    ticks: u64,
    last_status: Option<NodeStatus>,
}

impl BehaviorTree {
    pub fn new(root: impl Node + 'static) -> Self {
        Self::with_blackboard(root, Blackboard::new())
    }

    pub fn with_blackboard(root: impl Node + 'static, blackboard: Blackboard) -> Self {
        Self {
            root: Task::new(root),
            blackboard,
            ticks: 0,
            last_status: None,
        }
    }

    pub fn tick(
        &mut self,
        entity: EntityHandle,
        dt: f32,
        now: f64,
        world: &mut EntityRegistry,
        out: &mut Collaborators,
    ) -> NodeStatus {
        let mut ctx = Context {
            entity,
            dt,
            now,
            blackboard: &mut self.blackboard,
            world,
            out,
        };
        let status = self.root.tick(&mut ctx);
        self.ticks += 1;
        self.last_status = Some(status);
        status
    }

    /// Interrupts whatever is running, e.g. before the entity is removed.
    pub fn abort(&mut self, entity: EntityHandle, world: &mut EntityRegistry, out: &mut Collaborators) {
        let mut ctx = Context {
            entity,
            dt: 0.0,
            now: 0.0,
            blackboard: &mut self.blackboard,
            world,
            out,
        };
        self.root.abort(&mut ctx);
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_status(&self) -> Option<NodeStatus> {
        self.last_status
    }

    pub fn root_name(&self) -> &'static str {
        self.root.name()
    }
}
