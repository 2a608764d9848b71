use super::node::{Context, Node, NodeStatus, Task};
use log::warn;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Selector whose eligible children depend on an integer stage read from the
/// blackboard. Eligible children are tried in a shuffled order that is drawn
/// once per activation; the first success wins.
pub struct StageBasedSelector {
    stage_key: &'static str,
    children: Vec<Task>,
    stages: Vec<Vec<usize>>,
    rng: StdRng,
    order: Vec<usize>,
    position: usize,
}

impl StageBasedSelector {
    /// `stages[n]` lists the child indices usable in stage `n`.
    pub fn new(stage_key: &'static str, stages: Vec<Vec<usize>>) -> Self {
        Self {
            stage_key,
            children: Vec::new(),
            stages,
            rng: StdRng::from_entropy(),
            order: Vec::new(),
            position: 0,
        }
    }

    /// Fixes the shuffle sequence, for replays and tests.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_seed(self, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => self.seeded(seed),
            None => self,
        }
    }

    pub fn with(mut self, child: impl Node + 'static) -> Self {
        self.children.push(Task::new(child));
        self
    }

    /// Child indices in the order they will be tried this activation.
    pub fn execution_order(&self) -> &[usize] {
        &self.order
    }

    fn eligible(&self, stage: Option<i32>) -> Vec<usize> {
        let indices = stage
            .and_then(|s| usize::try_from(s).ok())
            .and_then(|s| self.stages.get(s));
        match indices {
            Some(indices) => indices
                .iter()
                .copied()
                .filter(|&i| i < self.children.len())
                .collect(),
            None => {
                warn!(
                    "{} holds {:?}, which names no stage; nothing to run",
                    self.stage_key, stage
                );
                Vec::new()
            }
        }
    }
}

impl Node for StageBasedSelector {
    fn name(&self) -> &'static str {
        "StageBasedSelector"
    }

    fn enter(&mut self, ctx: &mut Context<'_>) {
        let stage = ctx.blackboard.get_int(self.stage_key);
        self.order = self.eligible(stage);
        self.order.shuffle(&mut self.rng);
        self.position = 0;
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        while let Some(&index) = self.order.get(self.position) {
            match self.children[index].tick(ctx) {
                NodeStatus::Success => return NodeStatus::Success,
                NodeStatus::Running => return NodeStatus::Running,
                NodeStatus::Failure => self.position += 1,
            }
        }
        NodeStatus::Failure
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        for child in &mut self.children {
            child.abort(ctx);
        }
        self.order.clear();
        self.position = 0;
    }
}
