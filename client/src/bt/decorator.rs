use super::node::{Context, Node, NodeStatus, Task};

/// Swaps `Success` and `Failure`.
pub struct Inverter {
    child: Task,
}

impl Inverter {
    pub fn new(child: impl Node + 'static) -> Self {
        Self {
            child: Task::new(child),
        }
    }
}

impl Node for Inverter {
    fn name(&self) -> &'static str {
        "Inverter"
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        match self.child.tick(ctx) {
            NodeStatus::Success => NodeStatus::Failure,
            NodeStatus::Failure => NodeStatus::Success,
            NodeStatus::Running => NodeStatus::Running,
        }
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        self.child.abort(ctx);
    }
}

/// Reports `Success` whenever the child finishes.
pub struct AlwaysSucceed {
    child: Task,
}

impl AlwaysSucceed {
    pub fn new(child: impl Node + 'static) -> Self {
        Self {
            child: Task::new(child),
        }
    }
}

impl Node for AlwaysSucceed {
    fn name(&self) -> &'static str {
        "AlwaysSucceed"
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        match self.child.tick(ctx) {
            NodeStatus::Running => NodeStatus::Running,
            _ => NodeStatus::Success,
        }
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        self.child.abort(ctx);
    }
}

/// Re-runs the child after each success, up to `limit` times when given.
/// A child failure ends the repeat with `Failure`.
pub struct Repeat {
    child: Task,
    limit: Option<u32>,
    count: u32,
}

impl Repeat {
    pub fn new(child: impl Node + 'static, limit: Option<u32>) -> Self {
        Self {
            child: Task::new(child),
            limit,
            count: 0,
        }
    }
}

impl Node for Repeat {
    fn name(&self) -> &'static str {
        "Repeat"
    }

    fn enter(&mut self, _ctx: &mut Context<'_>) {
        self.count = 0;
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        match self.child.tick(ctx) {
            NodeStatus::Success => {
                self.count += 1;
                match self.limit {
                    Some(limit) if self.count >= limit => NodeStatus::Success,
                    _ => NodeStatus::Running,
                }
            }
            other => other,
        }
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        self.child.abort(ctx);
        self.count = 0;
    }
}

/// Fails without ticking the child until `cooldown` seconds have passed
/// since the child last succeeded.
pub struct Cooldown {
    child: Task,
    cooldown: f64,
    ready_at: f64,
}

impl Cooldown {
    pub fn new(child: impl Node + 'static, cooldown: f32) -> Self {
        Self {
            child: Task::new(child),
            cooldown: f64::from(cooldown),
            ready_at: f64::NEG_INFINITY,
        }
    }
}

impl Node for Cooldown {
    fn name(&self) -> &'static str {
        "Cooldown"
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        if !self.child.is_active() && ctx.now < self.ready_at {
            return NodeStatus::Failure;
        }
        let status = self.child.tick(ctx);
        if status == NodeStatus::Success {
            self.ready_at = ctx.now + self.cooldown;
        }
        status
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        self.child.abort(ctx);
    }
}
