//! Browser-facing side of the engine: capability traits, coordinate
//! resolution, command dispatch, snapshot capture

pub mod capability;
pub mod dispatch;
pub mod resolve;
pub mod snapshot;

pub use capability::{ElementProbe, PageCapability, Point, ScrollDirection, Viewport, VisualContext};
pub use dispatch::Command;
pub use resolve::{resolve_point, ResolvedTarget};
pub use snapshot::{capture_page_snapshot, PageSnapshot};
