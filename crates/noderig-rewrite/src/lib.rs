//! Idempotent graph rewrites for the node editor.
//!
//! Two strategies ship here behind the [`GraphRewriteHandler`] trait:
//! [`SeedLinkRewriter`] decorrelates seed inputs and
//! [`SingleSocketCollapser`] tidies group pseudo-nodes. Both are written
//! against the host traits in `noderig-core` and converge: running either
//! on its own output changes nothing.
//!
//! [`match_group_interface`] and [`fit_widths`] are one-shot passes the
//! host runs on request rather than on change notifications.

pub mod collapse;
pub mod error;
pub mod geometry;
pub mod handler;
pub mod matching;
pub mod offset;
pub mod resize;
pub mod seed;

pub use collapse::SingleSocketCollapser;
pub use error::RewriteError;
pub use geometry::locate;
pub use handler::{with_graph, GraphRewriteHandler, Outcome, RewriteSummary, SkipReason};
pub use matching::match_group_interface;
pub use offset::{next_free, OffsetAllocator};
pub use resize::fit_widths;
pub use seed::{SeedLinkRewriter, SeedOptions, OFFSET_MARKER, RANDOM_MARKER};
