//! Host-cycle driver.
//!
//! Plays the part of the editor's event loop for hosts that don't have
//! one: each [`Driver::cycle`] delivers the pending change records to the
//! registry and then drains one tick of the deferred queue. Rewrites
//! produce new change records, which the next cycle feeds back in, so
//! [`Driver::settle`] loops until the handlers converge.

use tracing::{debug, info};

use noderig_core::{GraphHost, UpdateSource};

use crate::error::DispatchError;
use crate::registry::{HandlerRegistry, TaskReport};

/// What one host cycle did.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub notifications: usize,
    pub scheduled: usize,
    pub tasks: Vec<TaskReport>,
}

/// Accumulated result of [`Driver::settle`].
#[derive(Debug, Default)]
pub struct SettleReport {
    pub cycles: usize,
    pub tasks: Vec<TaskReport>,
}

impl SettleReport {
    /// Tasks whose rewrite changed a graph.
    pub fn applied(&self) -> usize {
        self.tasks.iter().filter(|t| t.outcome.changed_graph()).count()
    }

    /// Tasks that failed, by handler and graph.
    pub fn failed(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.outcome.is_failed())
    }
}

/// Owns a host and the registry listening to it.
pub struct Driver<H: GraphHost + UpdateSource> {
    host: H,
    registry: HandlerRegistry<H>,
}

impl<H: GraphHost + UpdateSource> Driver<H> {
    /// Wraps `host` and registers `registry` with it.
    pub fn new(host: H, mut registry: HandlerRegistry<H>) -> Self {
        registry.register();
        Driver { host, registry }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &HandlerRegistry<H> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry<H> {
        &mut self.registry
    }

    /// Unregisters the registry and hands the host back.
    pub fn into_host(mut self) -> H {
        self.registry.unregister();
        self.host
    }

    /// Delivers pending updates, then runs one tick of deferred work.
    pub fn cycle(&mut self) -> CycleReport {
        let batch = self.host.take_updates();
        let scheduled = self.registry.on_notifications(&self.host, &batch);
        let tasks = self.registry.run_pending(&mut self.host);
        debug!(
            tick = self.registry.pending().tick(),
            notifications = batch.len(),
            scheduled,
            ran = tasks.len(),
            "host cycle"
        );
        CycleReport {
            notifications: batch.len(),
            scheduled,
            tasks,
        }
    }

    /// Cycles until a cycle sees no updates and leaves nothing queued.
    pub fn settle(&mut self) -> Result<SettleReport, DispatchError> {
        let max_cycles = self.registry.config().max_cycles;
        let mut report = SettleReport::default();
        while report.cycles < max_cycles {
            let cycle = self.cycle();
            report.cycles += 1;
            let quiet = cycle.notifications == 0 && cycle.tasks.is_empty();
            report.tasks.extend(cycle.tasks);
            if quiet && self.registry.pending().is_empty() {
                info!(cycles = report.cycles, applied = report.applied(), "settled");
                return Ok(report);
            }
        }
        Err(DispatchError::Unsettled {
            cycles: max_cycles,
            pending: self.registry.pending().len(),
        })
    }
}
