use super::node::{Context, Node, NodeStatus, Task};

/// Runs children in order until one fails. Resumes at the running child.
pub struct Sequence {
    children: Vec<Task>,
    current: usize,
}

impl Sequence {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            current: 0,
        }
    }

    pub fn with(mut self, child: impl Node + 'static) -> Self {
        self.children.push(Task::new(child));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Sequence {
    fn name(&self) -> &'static str {
        "Sequence"
    }

    fn enter(&mut self, _ctx: &mut Context<'_>) {
        self.current = 0;
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        while let Some(child) = self.children.get_mut(self.current) {
            match child.tick(ctx) {
                NodeStatus::Success => self.current += 1,
                NodeStatus::Failure => return NodeStatus::Failure,
                NodeStatus::Running => return NodeStatus::Running,
            }
        }
        NodeStatus::Success
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        for child in &mut self.children {
            child.abort(ctx);
        }
        self.current = 0;
    }
}

/// Runs children in order until one succeeds. Resumes at the running child.
pub struct Selector {
    children: Vec<Task>,
    current: usize,
}

impl Selector {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            current: 0,
        }
    }

    pub fn with(mut self, child: impl Node + 'static) -> Self {
        self.children.push(Task::new(child));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Selector {
    fn name(&self) -> &'static str {
        "Selector"
    }

    fn enter(&mut self, _ctx: &mut Context<'_>) {
        self.current = 0;
    }

    fn tick(&mut self, ctx: &mut Context<'_>) -> NodeStatus {
        while let Some(child) = self.children.get_mut(self.current) {
            match child.tick(ctx) {
                NodeStatus::Failure => self.current += 1,
                NodeStatus::Success => return NodeStatus::Success,
                NodeStatus::Running => return NodeStatus::Running,
            }
        }
        NodeStatus::Failure
    }

    fn abort(&mut self, ctx: &mut Context<'_>) {
        for child in &mut self.children {
            child.abort(ctx);
        }
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bt::leaf::{Action, Wait};
    use crate::bt::test_support::Harness;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>, status: NodeStatus) -> Action {
        let counter = Arc::clone(counter);
        Action::new("count", move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            status
        })
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let (a, b, c) = (
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
        );
        let mut seq = Task::new(
            Sequence::new()
                .with(counting(&a, NodeStatus::Success))
                .with(counting(&b, NodeStatus::Failure))
                .with(counting(&c, NodeStatus::Success)),
        );
        let mut harness = Harness::new();

        assert_eq!(seq.tick(&mut harness.ctx(0.1)), NodeStatus::Failure);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(c.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_selector_stops_at_first_success() {
        let (a, b, c) = (
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
        );
        let mut sel = Task::new(
            Selector::new()
                .with(counting(&a, NodeStatus::Failure))
                .with(counting(&b, NodeStatus::Success))
                .with(counting(&c, NodeStatus::Success)),
        );
        let mut harness = Harness::new();

        assert_eq!(sel.tick(&mut harness.ctx(0.1)), NodeStatus::Success);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(c.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sequence_resumes_at_running_child() {
        let first = Arc::new(AtomicUsize::new(0));
        let mut seq = Task::new(
            Sequence::new()
                .with(counting(&first, NodeStatus::Success))
                .with(Wait::new(0.25)),
        );
        let mut harness = Harness::new();

        assert_eq!(seq.tick(&mut harness.ctx(0.1)), NodeStatus::Running);
        assert_eq!(seq.tick(&mut harness.ctx(0.1)), NodeStatus::Running);
        assert_eq!(seq.tick(&mut harness.ctx(0.1)), NodeStatus::Success);
        assert_eq!(first.load(Ordering::SeqCst), 1);

        assert_eq!(seq.tick(&mut harness.ctx(0.1)), NodeStatus::Running);
        assert_eq!(first.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_abort_resets_running_child() {
        let mut seq = Task::new(Sequence::new().with(Wait::new(1.0)));
        let mut harness = Harness::new();

        assert_eq!(seq.tick(&mut harness.ctx(0.6)), NodeStatus::Running);
        seq.abort(&mut harness.ctx(0.0));
        assert!(!seq.is_active());

        assert_eq!(seq.tick(&mut harness.ctx(0.6)), NodeStatus::Running);
        assert_eq!(seq.tick(&mut harness.ctx(0.6)), NodeStatus::Success);
    }

    #[test]
    fn test_empty_composites() {
        let mut harness = Harness::new();
        assert_eq!(
            Task::new(Sequence::new()).tick(&mut harness.ctx(0.1)),
            NodeStatus::Success
        );
        assert_eq!(
            Task::new(Selector::new()).tick(&mut harness.ctx(0.1)),
            NodeStatus::Failure
        );
    }
}
