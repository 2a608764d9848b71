use super::node::{Context, Node, NodeStatus, Task};
use log::{debug, warn};

/// Runs `Success` once a text command shows up under `key`; `Running` until
/// then. The command is left in place for the selector to consume.
pub struct WaitForCommand {
    key: &'static str,
}

impl WaitForCommand {
    pub fn new(key: &'static str) -> Self {
        Self { key }
    }
}

impl Node for WaitForCommand {
    fn name(&self) -> &'static str {
        "WaitForCommand"
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        if ctx.blackboard.get_text(self.key).is_some() {
            NodeStatus::Success
        } else {
            NodeStatus::Running
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Running(usize),
}

/// Idles in a wait node until the server names an action, then runs the
/// subtree registered under that name and goes back to waiting.
pub struct ServerDrivenSelector {
    command_key: &'static str,
    wait: Task,
    actions: Vec<(String, Task)>,
    phase: Phase,
}

impl ServerDrivenSelector {
    pub fn new(command_key: &'static str, wait: impl Node + 'static) -> Self {
        Self {
            command_key,
            wait: Task::new(wait),
            actions: Vec::new(),
            phase: Phase::Waiting,
        }
    }

    pub fn with_action(mut self, command: impl Into<String>, action: impl Node + 'static) -> Self {
        self.actions.push((command.into(), Task::new(action)));
        self
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }
}

impl Node for ServerDrivenSelector {
    fn name(&self) -> &'static str {
        "ServerDrivenSelector"
    }

    fn enter(&mut self, _ctx: &mut Context<'_>) {
        self.phase = Phase::Waiting;
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        if self.phase == Phase::Waiting {
            match self.wait.tick(ctx) {
                NodeStatus::Success => {}
                other => return other,
            }

            let command = ctx.blackboard.take_text(self.command_key);
            let index = command
                .as_deref()
                .and_then(|c| self.actions.iter().position(|(name, _)| name == c));
            match index {
                Some(index) => {
                    debug!("Running server command {}", self.actions[index].0);
                    self.phase = Phase::Running(index);
                }
                None => {
                    warn!("No action registered for command {:?}", command);
                    return NodeStatus::Running;
                }
            }
        }

        match self.phase {
            Phase::Running(index) => {
                let status = self.actions[index].1.tick(ctx);
                if status != NodeStatus::Running {
                    self.phase = Phase::Waiting;
                }
                status
            }
            Phase::Waiting => NodeStatus::Running,
        }
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        self.wait.abort(ctx);
        for (_, action) in &mut self.actions {
            action.abort(ctx);
        }
        self.phase = Phase::Waiting;
    }
}
