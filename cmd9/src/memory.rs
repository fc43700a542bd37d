//! Memory stacks and the multi-stack frame list

use crate::error::{Cmd9Error, Cmd9Result};
use crate::value::MemoryItem;

/// LIFO container of command results.
#[derive(Debug, Clone, Default)]
pub struct MemoryStack {
    items: Vec<MemoryItem>,
    locked: bool,
}

impl MemoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: MemoryItem) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Cmd9Result<MemoryItem> {
        self.items.pop().ok_or(Cmd9Error::MemoryEmpty)
    }

    pub fn peek(&self) -> Cmd9Result<&MemoryItem> {
        self.items.last().ok_or(Cmd9Error::MemoryEmpty)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryItem> {
        self.items.iter().rev()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// A locked stack does not receive automatic command results.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// Ordered list of memory stacks; the last one is active.
///
/// The base frame is never removed. Isolated runs set a floor that
/// [`MultiStack::remove_stack`] will not cross until the run unwinds.
#[derive(Debug, Clone)]
pub struct MultiStack {
    frames: Vec<MemoryStack>,
    floors: Vec<usize>,
}

impl Default for MultiStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiStack {
    pub fn new() -> Self {
        Self {
            frames: vec![MemoryStack::new()],
            floors: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn active(&self) -> &MemoryStack {
        // frames always holds the base frame
        &self.frames[self.frames.len() - 1]
    }

    pub fn active_mut(&mut self) -> &mut MemoryStack {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn frames(&self) -> impl Iterator<Item = &MemoryStack> {
        self.frames.iter().rev()
    }

    /// Push a fresh empty stack and make it active.
    pub fn add_stack(&mut self) {
        self.frames.push(MemoryStack::new());
        tracing::trace!(depth = self.frames.len(), "Memory frame added");
    }

    /// Discard the active stack and reactivate the one beneath.
    pub fn remove_stack(&mut self) -> Cmd9Result<MemoryStack> {
        let limit = self.floors.last().copied().unwrap_or(1);
        if self.frames.len() <= limit {
            return Err(Cmd9Error::StackFrameCritical(if limit == 1 {
                "cannot remove the base memory stack".to_string()
            } else {
                "cannot remove a memory stack owned by an isolated run".to_string()
            }));
        }
        let removed = self.frames.pop().ok_or_else(|| {
            Cmd9Error::StackFrameCritical("no memory stack to remove".to_string())
        })?;
        tracing::trace!(depth = self.frames.len(), "Memory frame removed");
        Ok(removed)
    }

    /// Open an isolated frame; returns the depth to restore with [`MultiStack::leave_isolated`].
    pub(crate) fn enter_isolated(&mut self) -> usize {
        let restore_to = self.frames.len();
        self.add_stack();
        self.floors.push(self.frames.len());
        restore_to
    }

    /// Drop every frame opened since the matching [`MultiStack::enter_isolated`].
    pub(crate) fn leave_isolated(&mut self, restore_to: usize) {
        while self.floors.last().is_some_and(|floor| *floor > restore_to) {
            self.floors.pop();
        }
        self.truncate(restore_to);
    }

    /// Drop frames above `depth`, keeping at least the base frame.
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
        while self.floors.last().is_some_and(|floor| *floor > self.frames.len()) {
            self.floors.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_peek() {
        let mut stack = MemoryStack::new();
        assert!(matches!(stack.pop(), Err(Cmd9Error::MemoryEmpty)));
        assert!(matches!(stack.peek(), Err(Cmd9Error::MemoryEmpty)));
        stack.push(MemoryItem::Int(1));
        stack.push(MemoryItem::Int(2));
        assert_eq!(stack.peek().unwrap(), &MemoryItem::Int(2));
        assert_eq!(stack.count(), 2);
        assert_eq!(stack.pop().unwrap(), MemoryItem::Int(2));
        assert_eq!(stack.count(), 1);
    }

    #[test]
    fn test_iterate_most_recent_first() {
        let mut stack = MemoryStack::new();
        for i in 0..3 {
            stack.push(MemoryItem::Int(i));
        }
        let order: Vec<_> = stack.iter().map(ToString::to_string).collect();
        assert_eq!(order, vec!["2", "1", "0"]);
    }

    #[test]
    fn test_lock_flag() {
        let mut stack = MemoryStack::new();
        stack.lock();
        assert!(stack.is_locked());
        stack.unlock();
        assert!(!stack.is_locked());
    }

    #[test]
    fn test_base_frame_is_permanent() {
        let mut multi = MultiStack::new();
        assert!(matches!(
            multi.remove_stack(),
            Err(Cmd9Error::StackFrameCritical(_))
        ));
        multi.add_stack();
        multi.active_mut().push(MemoryItem::Bool(true));
        assert_eq!(multi.depth(), 2);
        let removed = multi.remove_stack().unwrap();
        assert_eq!(removed.count(), 1);
        assert_eq!(multi.depth(), 1);
    }

    #[test]
    fn test_isolated_floor_blocks_removal() {
        let mut multi = MultiStack::new();
        let restore = multi.enter_isolated();
        assert!(multi.remove_stack().is_err());
        multi.add_stack();
        multi.add_stack();
        assert!(multi.remove_stack().is_ok());
        multi.leave_isolated(restore);
        assert_eq!(multi.depth(), 1);
        multi.add_stack();
        assert!(multi.remove_stack().is_ok());
    }

    #[test]
    fn test_nested_isolation_unwinds() {
        let mut multi = MultiStack::new();
        multi.active_mut().push(MemoryItem::text("outer"));
        let outer = multi.enter_isolated();
        let inner = multi.enter_isolated();
        multi.add_stack();
        multi.leave_isolated(inner);
        assert_eq!(multi.depth(), 2);
        multi.leave_isolated(outer);
        assert_eq!(multi.depth(), 1);
        assert_eq!(multi.active().peek().unwrap(), &MemoryItem::text("outer"));
    }
}
