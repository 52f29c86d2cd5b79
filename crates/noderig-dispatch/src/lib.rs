//! Reactive dispatch of graph rewrites.
//!
//! The host delivers change notifications; [`HandlerRegistry`] decides which
//! handlers care about which graphs and queues their rewrites for a later
//! host cycle, so graphs are never mutated while the host is still
//! propagating changes. [`Driver`] runs that loop for an in-process host.

pub mod change;
pub mod config;
pub mod driver;
pub mod error;
pub mod registry;
pub mod scheduler;

pub use change::affected_graphs;
pub use config::{DispatchConfig, HandlerSetting, CONFIG_ENV, DEFER_TICKS_ENV};
pub use driver::{CycleReport, Driver, SettleReport};
pub use error::DispatchError;
pub use registry::{HandlerRegistry, TaskReport};
pub use scheduler::{DeferredQueue, DeferredTask};
