//! Handler registry and dispatch.
//!
//! [`HandlerRegistry`] is the single entry point the host integration talks
//! to. It fans each notification batch out to the registered handlers and
//! queues the rewrites they ask for, then runs the due ones when the host
//! drains the queue. Nothing a handler does, including panicking, escapes
//! the registry: every failure is logged against the handler and graph
//! and reported as [`Outcome::Failed`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use noderig_core::{ChangeRecord, GraphHost};
use noderig_rewrite::{
    GraphRewriteHandler, Outcome, RewriteError, SeedLinkRewriter, SingleSocketCollapser,
    SkipReason,
};

use crate::change::affected_graphs;
use crate::config::DispatchConfig;
use crate::scheduler::{DeferredQueue, DeferredTask};

/// What one deferred task did.
#[derive(Debug)]
pub struct TaskReport {
    pub handler: String,
    pub graph: String,
    pub outcome: Outcome,
}

/// Ordered set of rewrite handlers plus the deferred queue feeding them.
pub struct HandlerRegistry<H: GraphHost> {
    handlers: IndexMap<String, Box<dyn GraphRewriteHandler<H>>>,
    registered: bool,
    queue: DeferredQueue,
    config: DispatchConfig,
}

impl<H: GraphHost> HandlerRegistry<H> {
    /// Creates an empty, unregistered registry.
    pub fn new(config: DispatchConfig) -> Self {
        HandlerRegistry {
            handlers: IndexMap::new(),
            registered: false,
            queue: DeferredQueue::new(),
            config,
        }
    }

    /// Creates a registry holding the seed rewriter and the single-socket
    /// collapser, in that order.
    pub fn with_default_handlers(config: DispatchConfig) -> Self {
        let seed = SeedLinkRewriter::new(config.seed.clone());
        let mut registry = Self::new(config);
        registry.register_handler(seed);
        registry.register_handler(SingleSocketCollapser);
        registry
    }

    /// Adds a handler. A handler whose name is already registered is
    /// ignored; returns `false` in that case.
    pub fn register_handler<T>(&mut self, handler: T) -> bool
    where
        T: GraphRewriteHandler<H> + 'static,
    {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            debug!(handler = %name, "handler already registered");
            return false;
        }
        self.config.ensure_handler(&name);
        info!(handler = %name, "registered handler");
        self.handlers.insert(name, Box::new(handler));
        true
    }

    /// Removes a handler and drops its pending tasks. Returns `false` if no
    /// handler of that name was registered.
    pub fn unregister_handler(&mut self, name: &str) -> bool {
        if self.handlers.shift_remove(name).is_none() {
            return false;
        }
        let dropped = self.queue.cancel_handler(name);
        info!(handler = %name, dropped, "unregistered handler");
        true
    }

    /// Starts accepting notification batches.
    pub fn register(&mut self) {
        if self.registered {
            return;
        }
        self.registered = true;
        info!(handlers = self.handlers.len(), "dispatcher registered");
    }

    /// Stops accepting batches and discards all pending tasks.
    pub fn unregister(&mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;
        self.queue.clear();
        info!("dispatcher unregistered");
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn pending(&self) -> &DeferredQueue {
        &self.queue
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DispatchConfig {
        &mut self.config
    }

    /// Runs the eligibility test of every enabled handler against every
    /// graph changed in `batch` and queues a rewrite for each match.
    ///
    /// Never mutates the host. Returns the number of newly queued tasks.
    pub fn on_notifications(&mut self, host: &H, batch: &[ChangeRecord]) -> usize {
        if !self.registered {
            debug!(records = batch.len(), "dispatcher not registered, ignoring batch");
            return 0;
        }
        let delay = self.config.defer_ticks();
        let mut scheduled = 0;
        for graph_name in affected_graphs(batch) {
            let Some(graph) = host.graph(&graph_name) else {
                debug!(graph = %graph_name, "changed graph no longer exists");
                continue;
            };
            for (name, handler) in &self.handlers {
                if !self.config.is_enabled(name) {
                    continue;
                }
                let verdict = panic::catch_unwind(AssertUnwindSafe(|| {
                    handler.should_process_tree(graph)
                }));
                match verdict {
                    Ok(Ok(true)) => {
                        if self.queue.schedule(name, &graph_name, delay) {
                            debug!(handler = %name, graph = %graph_name, "scheduled rewrite");
                            scheduled += 1;
                        }
                    }
                    Ok(Ok(false)) => {}
                    Ok(Err(err)) => {
                        warn!(
                            handler = %name,
                            graph = %graph_name,
                            error = %err,
                            "eligibility check failed"
                        )
                    }
                    Err(payload) => {
                        warn!(
                            handler = %name,
                            graph = %graph_name,
                            panic = %panic_message(payload.as_ref()),
                            "eligibility check panicked"
                        )
                    }
                }
            }
        }
        scheduled
    }

    /// Advances the queue one tick and runs the tasks now due.
    pub fn run_pending(&mut self, host: &mut H) -> Vec<TaskReport> {
        self.queue
            .advance()
            .into_iter()
            .map(|task| self.run_task(host, task))
            .collect()
    }

    fn run_task(&self, host: &mut H, task: DeferredTask) -> TaskReport {
        let outcome = match self.handlers.get(&task.handler) {
            None => Outcome::Skipped(SkipReason::HandlerUnavailable {
                handler: task.handler.clone(),
            }),
            Some(handler) => {
                panic::catch_unwind(AssertUnwindSafe(|| handler.process_tree(host, &task.graph)))
                    .unwrap_or_else(|payload| {
                        Outcome::Failed(RewriteError::Internal {
                            reason: format!("panicked: {}", panic_message(payload.as_ref())),
                        })
                    })
            }
        };
        log_outcome(&task, &outcome);
        TaskReport {
            handler: task.handler,
            graph: task.graph,
            outcome,
        }
    }
}

fn log_outcome(task: &DeferredTask, outcome: &Outcome) {
    let (handler, graph) = (task.handler.as_str(), task.graph.as_str());
    match outcome {
        Outcome::Applied(summary) if summary.is_noop() => {
            debug!(handler, graph, "rewrite found nothing to do")
        }
        Outcome::Applied(summary) => {
            info!(
                handler,
                graph,
                nodes_added = summary.nodes_added,
                nodes_changed = summary.nodes_changed,
                links_added = summary.links_added,
                links_removed = summary.links_removed,
                failures = summary.failures.len(),
                "applied rewrite"
            )
        }
        Outcome::Skipped(reason) => debug!(handler, graph, %reason, "skipped rewrite"),
        Outcome::Failed(err) => warn!(handler, graph, error = %err, "rewrite failed"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
