use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Deferred work keyed by deadline. Nothing runs by itself: the owner polls
/// [`Timeline::pop_due`] and arms whatever wake-up it has for [`Timeline::next_deadline`].
#[derive(Debug)]
pub struct Timeline<T> {
    next_id: u64,
    queue: BTreeMap<(Instant, TaskId), T>,
    deadlines: HashMap<TaskId, Instant>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: Instant, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.insert((at, id), task);
        self.deadlines.insert(id, at);
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        let at = self.deadlines.remove(&id)?;
        self.queue.remove(&(at, id))
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn deadline(&self, id: TaskId) -> Option<Instant> {
        self.deadlines.get(&id).copied()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    /// Removes the earliest task due at or before `now`. Ties run in scheduling order.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TaskId, Instant, T)> {
        let entry = self.queue.first_entry()?;
        let (at, id) = *entry.key();
        if at > now {
            return None;
        }
        let task = entry.remove();
        self.deadlines.remove(&id);
        Some((id, at, task))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pops_in_deadline_order() {
        let t0 = Instant::now();
        let mut timeline = Timeline::new();
        timeline.schedule(t0 + Duration::from_millis(20), "late");
        timeline.schedule(t0 + Duration::from_millis(10), "early");
        timeline.schedule(t0 + Duration::from_millis(10), "early-second");

        assert_eq!(timeline.next_deadline(), Some(t0 + Duration::from_millis(10)));
        assert!(timeline.pop_due(t0).is_none());

        let now = t0 + Duration::from_millis(15);
        let order: Vec<_> = std::iter::from_fn(|| timeline.pop_due(now))
            .map(|(_, _, task)| task)
            .collect();
        assert_eq!(order, vec!["early", "early-second"]);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut timeline = Timeline::new();
        let id = timeline.schedule(t0, 1);
        assert!(timeline.is_pending(id));
        assert_eq!(timeline.cancel(id), Some(1));
        assert_eq!(timeline.cancel(id), None);
        assert!(!timeline.is_pending(id));
        assert!(timeline.is_empty());
        assert_eq!(timeline.next_deadline(), None);
    }

    #[test]
    fn test_popped_task_is_no_longer_pending() {
        let t0 = Instant::now();
        let mut timeline = Timeline::new();
        let id = timeline.schedule(t0, ());
        let (popped, at, ()) = timeline.pop_due(t0).unwrap();
        assert_eq!((popped, at), (id, t0));
        assert!(!timeline.is_pending(id));
        assert_eq!(timeline.cancel(id), None);
    }
}
