mod dash;
mod outline;
#[allow(clippy::module_inception)]
mod path;

pub use dash::{Dash, MAX_DASH_PIECES};
pub(crate) use dash::polyline_length;
pub use outline::{Element, SubPath};
pub use path::{Path, PathSegment};
