//! HTML parsing into the arena tree
//!
//! html5ever builds an `RcDom`, which is then converted into a [`Document`].

use std::io;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use super::tree::{Document, NodeData, NodeId};

/// Errors while building a document
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Failed to parse HTML: {0}")]
    Parse(#[from] io::Error),
}

impl Document {
    /// Parse a complete HTML document
    pub fn parse(html: &str) -> Result<Self, DomError> {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut reader = io::Cursor::new(html.as_bytes());
        let dom = parse_document(RcDom::default(), opts)
            .from_utf8()
            .read_from(&mut reader)?;

        let mut doc = Document::new();
        let root = doc.root();
        let children = dom.document.children.borrow();
        for child in children.iter() {
            convert_handle(&mut doc, root, child);
        }
        Ok(doc)
    }
}

fn convert_handle(doc: &mut Document, parent: NodeId, handle: &Handle) {
    let data = match &handle.data {
        RcNodeData::Doctype { name, .. } => NodeData::Doctype {
            name: name.to_string(),
        },
        RcNodeData::Element { name, attrs, .. } => NodeData::Element {
            tag_name: name.local.to_string(),
            attributes: attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect(),
        },
        RcNodeData::Text { contents } => NodeData::Text {
            content: contents.borrow().to_string(),
        },
        RcNodeData::Comment { contents } => NodeData::Comment {
            content: contents.to_string(),
        },
        _ => return,
    };

    let id = doc.create_node(data);
    doc.append_child(parent, id);

    // Template contents hang off a separate fragment in RcDom
    if let RcNodeData::Element {
        template_contents, ..
    } = &handle.data
    {
        if let Some(content) = template_contents.borrow().as_ref() {
            for child in content.children.borrow().iter() {
                convert_handle(doc, id, child);
            }
            return;
        }
    }

    for child in handle.children.borrow().iter() {
        convert_handle(doc, id, child);
    }
}
