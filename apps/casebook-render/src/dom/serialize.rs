//! HTML serialization

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::tree::{Document, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Document {
    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            self.write_node(*child, &mut out, false);
        }
        out
    }

    /// Serialize a node including its own tag
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out, false);
        out
    }

    /// Serialize the children of a node
    pub fn inner_html(&self, id: NodeId) -> String {
        let raw = self
            .tag_name(id)
            .is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, &mut out, raw);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String, raw_text: bool) {
        match self.data(id) {
            NodeData::Document => {
                for child in self.children(id) {
                    self.write_node(*child, out, false);
                }
            }
            NodeData::Doctype { name } => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
            }
            NodeData::Text { content } => {
                if raw_text {
                    out.push_str(content);
                } else {
                    out.push_str(&encode_text(content));
                }
            }
            NodeData::Comment { content } => {
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
            }
            NodeData::Element {
                tag_name,
                attributes,
            } => {
                out.push('<');
                out.push_str(tag_name);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&tag_name.as_str()) {
                    return;
                }

                let raw = RAW_TEXT_ELEMENTS.contains(&tag_name.as_str());
                for child in self.children(id) {
                    self.write_node(*child, out, raw);
                }
                out.push_str("</");
                out.push_str(tag_name);
                out.push('>');
            }
        }
    }
}
