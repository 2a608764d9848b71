use super::node::{Context, Node, NodeStatus};

/// Leaf that checks a predicate.
pub struct Condition<F> {
    name: &'static str,
    check: F,
}

impl<F> Condition<F>
where
    F: FnMut(&mut Context<'_>) -> bool + Send,
{
    pub fn new(name: &'static str, check: F) -> Self {
        Self { name, check }
    }
}

impl<F> Node for Condition<F>
where
    F: FnMut(&mut Context<'_>) -> bool + Send,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        if (self.check)(ctx) {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        }
    }
}

/// Leaf that runs a closure each tick and returns its status.
pub struct Action {
    name: &'static str,
    run: Box<dyn FnMut(&mut Context<'_>) -> NodeStatus + Send>,
}

impl Action {
    pub fn new<F>(name: &'static str, run: F) -> Self
    where
        F: FnMut(&mut Context<'_>) -> NodeStatus + Send + 'static,
    {
        Self {
            name,
            run: Box::new(run),
        }
    }
}

impl Node for Action {
    fn name(&self) -> &'static str {
        self.name
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        (self.run)(ctx)
    }
}

/// Stays `Running` for a fixed number of seconds.
pub struct Wait {
    duration: f32,
    elapsed: f32,
}

impl Wait {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
        }
    }
}

impl Node for Wait {
    fn name(&self) -> &'static str {
        "Wait"
    }

    fn enter(&mut self, _ctx: &mut Context<'_>) {
        self.elapsed = 0.0;
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        self.elapsed += ctx.dt;
        if self.elapsed >= self.duration {
            NodeStatus::Success
        } else {
            NodeStatus::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bt::node::Task;
    use crate::bt::test_support::Harness;

    #[test]
    fn test_condition_reads_blackboard() {
        let mut harness = Harness::new();
        let mut cond = Task::new(Condition::new("flag", |ctx: &mut Context<'_>| {
            ctx.blackboard.get_bool("flag").unwrap_or(false)
        }));

        assert_eq!(cond.tick(&mut harness.ctx(0.1)), NodeStatus::Failure);
        harness.blackboard.set_bool("flag", true);
        assert_eq!(cond.tick(&mut harness.ctx(0.1)), NodeStatus::Success);
    }

    #[test]
    fn test_wait_counts_simulation_time() {
        let mut harness = Harness::new();
        let mut wait = Task::new(Wait::new(0.5));
        assert_eq!(wait.tick(&mut harness.ctx(0.3)), NodeStatus::Running);
        assert_eq!(wait.tick(&mut harness.ctx(0.3)), NodeStatus::Success);
        assert_eq!(wait.tick(&mut harness.ctx(0.3)), NodeStatus::Running);
    }
}
