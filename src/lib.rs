#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod graph;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod session;

#[cfg(feature = "cli")]
pub use cli::run;
pub use format::{FormatOptions, format_document};
pub use graph::GraphView;
pub use layout::{FormatterParameters, ParameterFormatter};
pub use session::FormatSession;
