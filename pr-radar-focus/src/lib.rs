//! Focus-area generation (C4): turns a `GitDiff` into an ordered list of
//! reviewable `FocusArea`s.

pub mod errors;
pub mod generate;
pub mod id;
pub mod model;
pub mod oracle;
pub mod render;

pub use errors::{FocusError, FocusResult};
pub use generate::generate_focus_areas;
pub use id::focus_id;
pub use model::{FocusArea, FocusType};
pub use oracle::{NoSubdivideOracle, SubdivideHint, SubdivideOracle};
pub use render::{render_hunk_content, render_range_content};
