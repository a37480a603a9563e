//! Structured output envelope and payload models.

mod data;
mod format;
mod model;
mod result_builder;
mod text;

pub use data::*;
pub use format::OutputFormat;
pub use model::*;
pub use result_builder::{ResultBuilder, print_result};
pub use text::render_lines;
