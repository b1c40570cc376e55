//! Casebook Render Library
//!
//! Prepares annotated casebook pages for printing and export.
//! The command-line binary is in main.rs.
//!
//! # Modules
//!
//! - `dom`: Owned HTML tree with stable node ids and text splitting
//! - `annotations`: Annotation records and the page scan that collects them
//! - `mapper`: Character offsets to text-node ranges
//! - `render`: Annotation markup, footnotes and external links
//! - `print`: Paginated or flat layout into the output container
//! - `printable`: The end-to-end pipeline
//! - `overlay`: Layered highlight colors and print settings CSS

pub mod annotations;
pub mod config;
pub mod dom;
pub mod error;
pub mod mapper;
pub mod overlay;
pub mod print;
pub mod printable;
pub mod render;

pub use config::Config;
pub use error::{AnnotationError, RenderError, Result};
pub use printable::{render_printable, PrintableOutput};
