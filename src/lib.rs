// vectorwand: raster → SVG tracing plus a magic-wand recolor engine with
// bounded undo/redo. The `vectorwand` binary is a small desktop editor on top.

pub mod bitmap;
pub mod color;
pub mod compose;
pub mod config;
pub mod curve;
pub mod document;
pub mod draw;
pub mod error;
pub mod history;
pub mod overlay;
pub mod select;
pub mod session;
pub mod tracer;
pub mod types;
pub mod vectorize;
pub mod worker;

pub use bitmap::Bitmap;
pub use color::Rgb;
pub use compose::{compose, compose_compound, regroup_svg, Layer};
pub use config::EditorConfig;
pub use curve::{fit, Curve};
pub use document::VectorDocument;
pub use error::{Error, Result};
pub use history::{History, HistoryEntry, MAX_HISTORY};
pub use select::{flood_select, select_shapes, Selection};
pub use session::{EditSession, SessionState, Tool, ToolSettings};
pub use tracer::{ContourRule, Path, Sign, Tracer, TurnPolicy};
pub use vectorize::{vectorize, TraceOptions};
pub use worker::{spawn_vectorize, TraceJob, TraceOutcome};
