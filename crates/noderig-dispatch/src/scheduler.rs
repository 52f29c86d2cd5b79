//! Deferred task queue.
//!
//! The host's update cycle is modelled as a tick counter. A task scheduled
//! at tick `t` with delay `d` becomes due at `t + d` and runs when the
//! queue is advanced to that tick. There is at most one pending task per
//! (handler, graph) pair: scheduling the same pair again before it runs
//! keeps the original due tick.

use indexmap::IndexMap;

/// A deferred `process_tree` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredTask {
    pub handler: String,
    pub graph: String,
    pub due: u64,
}

/// FIFO of pending tasks keyed by (handler, graph).
#[derive(Debug, Default)]
pub struct DeferredQueue {
    tick: u64,
    tasks: IndexMap<(String, String), u64>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Schedules a task `delay` ticks from now (at least one). Returns
    /// `false` if the pair was already pending.
    pub fn schedule(&mut self, handler: &str, graph: &str, delay: u64) -> bool {
        let key = (handler.to_string(), graph.to_string());
        if self.tasks.contains_key(&key) {
            return false;
        }
        self.tasks.insert(key, self.tick + delay.max(1));
        true
    }

    /// Advances one tick and removes the tasks now due, in scheduling order.
    pub fn advance(&mut self) -> Vec<DeferredTask> {
        self.tick += 1;
        let now = self.tick;
        let mut due = Vec::new();
        self.tasks.retain(|(handler, graph), at| {
            if *at > now {
                return true;
            }
            due.push(DeferredTask {
                handler: handler.clone(),
                graph: graph.clone(),
                due: *at,
            });
            false
        });
        due
    }

    /// Drops every pending task of `handler`. Returns how many were dropped.
    pub fn cancel_handler(&mut self, handler: &str) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|(name, _), _| name != handler);
        before - self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Pending tasks in scheduling order.
    pub fn pending(&self) -> impl Iterator<Item = DeferredTask> + '_ {
        self.tasks.iter().map(|((handler, graph), due)| DeferredTask {
            handler: handler.clone(),
            graph: graph.clone(),
            due: *due,
        })
    }
}
