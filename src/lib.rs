pub mod error;
pub mod render;
pub mod signal;
pub mod view;

pub use error::ScopeError;
pub use render::instruction::{DrawList, Instruction, TextMetrics};
pub use render::layout::Layout;
pub use signal::snapshot::DrawSnapshot;
pub use view::mode::ScopeMode;
pub use view::scope::{Frame, ScopeOptions, StaticScope};
