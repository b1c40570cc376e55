//! HTML document model
//!
//! Provides an owned, mutable HTML tree used by every rendering stage:
//! - Parsing via html5ever
//! - Arena storage with stable node ids
//! - Text splitting with position resolution across splits
//! - Serialization back to HTML

mod parse;
mod serialize;
mod tree;

pub use parse::DomError;
pub use tree::{Document, NodeData, NodeId};
