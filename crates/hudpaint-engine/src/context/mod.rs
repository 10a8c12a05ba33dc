//! Drawing context: the path, state, clip and group engine.
//!
//! Scope:
//! - [`DrawingContext`]: immediate-mode drawing API bound to one surface
//! - [`GraphicsState`]: the snapshot `save`/`restore` push and pop
//! - [`ClipRegion`]: bounding-box clip approximation
//! - group push/pop and the lowering of drawing ops to rasterizer meshes

mod clip;
#[allow(clippy::module_inception)]
mod context;
mod draw;
mod group;
mod state;

pub use clip::ClipRegion;
pub use context::DrawingContext;
pub use group::GroupFrame;
pub use state::{ContextConfig, DEFAULT_TOLERANCE, GraphicsState};
