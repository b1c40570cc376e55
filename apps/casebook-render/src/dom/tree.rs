//! Arena-backed HTML tree
//!
//! Nodes live in a single `Vec` and are addressed by [`NodeId`]. Ids stay
//! valid for the lifetime of the document: detaching or moving a node never
//! invalidates it, which lets the annotation renderer hold on to ids across
//! mutations.

/// Handle to a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index (stable for the lifetime of the document)
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype {
        name: String,
    },
    Element {
        tag_name: String,
        attributes: Vec<(String, String)>,
    },
    Text {
        content: String,
    },
    Comment {
        content: String,
    },
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Right-hand part created when this text node was split
    continuation: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            continuation: None,
        }
    }
}

/// A mutable HTML document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            root: NodeId(0),
        }
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever allocated (detached nodes included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    // ============================================
    // Queries
    // ============================================

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Element { .. })
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text { .. })
    }

    /// Text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text { content } => Some(content),
            _ => None,
        }
    }

    /// Length of a text node in chars (0 for anything else)
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(|t| t.chars().count()).unwrap_or(0)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id.0].data {
            NodeData::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Check if this element has a specific class
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|c| c.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// All nodes below `id` (excluding `id`) in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Text nodes below `id` in document order
    pub fn text_leaves(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.is_text(*n))
            .collect()
    }

    /// Concatenated text of every text node below `id`, whitespace included
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.text_leaves(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// First element below `id` matching the predicate
    pub fn find_first_element<F>(&self, id: NodeId, mut predicate: F) -> Option<NodeId>
    where
        F: FnMut(&Self, NodeId) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .find(|n| self.is_element(*n) && predicate(self, *n))
    }

    /// All elements below `id` matching the predicate, in document order
    pub fn find_elements<F>(&self, id: NodeId, mut predicate: F) -> Vec<NodeId>
    where
        F: FnMut(&Self, NodeId) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.is_element(*n) && predicate(self, *n))
            .collect()
    }

    /// First element in the document whose attribute equals `value`
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.find_first_element(self.root, |doc, n| doc.attr(n, name) == Some(value))
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_by_attr("id", id)
    }

    /// First element with the given tag name
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find_first_element(self.root, |doc, n| {
            doc.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case(tag))
        })
    }

    // ============================================
    // Construction and mutation
    // ============================================

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag_name: &str, attributes: &[(&str, &str)]) -> NodeId {
        self.alloc(NodeData::Element {
            tag_name: tag_name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::Text {
            content: content.to_string(),
        })
    }

    pub(crate) fn create_node(&mut self, data: NodeData) -> NodeId {
        self.alloc(data)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            match attributes.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some((_, v)) => *v = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
    }

    /// Remove a node from its parent (the node and its subtree stay allocated)
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    /// Insert `new` as the previous sibling of `reference`
    ///
    /// Does nothing when `reference` is detached.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        self.insert_sibling(reference, new, 0);
    }

    /// Insert `new` as the next sibling of `reference`
    ///
    /// Does nothing when `reference` is detached.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        self.insert_sibling(reference, new, 1);
    }

    fn insert_sibling(&mut self, reference: NodeId, new: NodeId, shift: usize) {
        let Some(parent) = self.nodes[reference.0].parent else {
            return;
        };
        self.detach(new);
        let siblings = &mut self.nodes[parent.0].children;
        let Some(pos) = siblings.iter().position(|c| *c == reference) else {
            return;
        };
        siblings.insert(pos + shift, new);
        self.nodes[new.0].parent = Some(parent);
    }

    /// Put `wrapper` where `node` is and move `node` inside it
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) {
        self.insert_before(node, wrapper);
        self.append_child(wrapper, node);
    }

    /// Split a text node at a char offset
    ///
    /// The original id keeps the text before `at`; the returned node holds
    /// the rest and is inserted right after it. The new node is recorded as
    /// the continuation of the original so positions measured against the
    /// unsplit text can still be resolved with [`Document::resolve_position`].
    /// Returns `None` if `id` is not a text node.
    pub fn split_text(&mut self, id: NodeId, at: usize) -> Option<NodeId> {
        let content = self.text(id)?.to_string();
        let byte_at = content
            .char_indices()
            .nth(at)
            .map(|(i, _)| i)
            .unwrap_or(content.len());
        let (left, right) = content.split_at(byte_at);

        let right_id = self.create_text(right);
        self.nodes[id.0].data = NodeData::Text {
            content: left.to_string(),
        };
        self.nodes[right_id.0].continuation = self.nodes[id.0].continuation;
        self.nodes[id.0].continuation = Some(right_id);
        self.insert_after(id, right_id);
        Some(right_id)
    }

    /// Continuation created by the last split of a text node
    pub fn continuation(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].continuation
    }

    /// Map a char offset measured against the unsplit text of `node` to the
    /// text node that now holds it
    ///
    /// An offset that falls exactly on a split boundary stays in the earlier
    /// node unless `prefer_later` is set, in which case it moves to the start
    /// of the continuation.
    pub fn resolve_position(&self, node: NodeId, offset: usize, prefer_later: bool) -> (NodeId, usize) {
        let mut node = node;
        let mut offset = offset;
        while let Some(next) = self.nodes[node.0].continuation {
            let len = self.text_len(node);
            if offset > len || (prefer_later && offset == len) {
                offset -= len;
                node = next;
            } else {
                break;
            }
        }
        (node, offset)
    }

    /// Copy a subtree; the copy is detached and shares no ids with the source
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.alloc(self.nodes[id.0].data.clone());
        let mut stack = vec![(id, copy)];
        while let Some((src, dst)) = stack.pop() {
            let children = self.nodes[src.0].children.clone();
            for child in children {
                let child_copy = self.alloc(self.nodes[child.0].data.clone());
                self.append_child(dst, child_copy);
                stack.push((child, child_copy));
            }
        }
        copy
    }

    /// Node-for-node equality of two subtrees (possibly in different documents)
    ///
    /// Compares node kind, tag names, attributes (in order) and text.
    pub fn structurally_equal(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let mut stack = vec![(a, b)];
        while let Some((x, y)) = stack.pop() {
            if self.data(x) != other.data(y) {
                return false;
            }
            let (xs, ys) = (self.children(x), other.children(y));
            if xs.len() != ys.len() {
                return false;
            }
            stack.extend(xs.iter().copied().zip(ys.iter().copied()));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(doc: &mut Document, parts: &[&str]) -> NodeId {
        let p = doc.create_element("p", &[]);
        let root = doc.root();
        doc.append_child(root, p);
        for part in parts {
            let t = doc.create_text(part);
            doc.append_child(p, t);
        }
        p
    }

    #[test]
    fn test_text_content_and_leaves() {
        let mut doc = Document::new();
        let p = paragraph(&mut doc, &["Hello ", "world"]);

        assert_eq!(doc.text_leaves(p).len(), 2);
        assert_eq!(doc.text_content(p), "Hello world");
    }

    #[test]
    fn test_split_text_keeps_original_id_on_left() {
        let mut doc = Document::new();
        let p = paragraph(&mut doc, &["Hello world"]);
        let leaf = doc.children(p)[0];

        let right = doc.split_text(leaf, 6).unwrap();

        assert_eq!(doc.text(leaf), Some("Hello "));
        assert_eq!(doc.text(right), Some("world"));
        assert_eq!(doc.children(p), &[leaf, right]);
        assert_eq!(doc.continuation(leaf), Some(right));
    }

    #[test]
    fn test_split_text_counts_chars_not_bytes() {
        let mut doc = Document::new();
        let p = paragraph(&mut doc, &["naïve café"]);
        let leaf = doc.children(p)[0];

        let right = doc.split_text(leaf, 6).unwrap();

        assert_eq!(doc.text(leaf), Some("naïve "));
        assert_eq!(doc.text(right), Some("café"));
    }

    #[test]
    fn test_resolve_position_follows_split_chain() {
        let mut doc = Document::new();
        let p = paragraph(&mut doc, &["abcdefghij"]);
        let leaf = doc.children(p)[0];
        let mid = doc.split_text(leaf, 3).unwrap();
        let tail = doc.split_text(mid, 4).unwrap();

        assert_eq!(doc.resolve_position(leaf, 2, false), (leaf, 2));
        assert_eq!(doc.resolve_position(leaf, 3, false), (leaf, 3));
        assert_eq!(doc.resolve_position(leaf, 3, true), (mid, 0));
        assert_eq!(doc.resolve_position(leaf, 8, false), (tail, 1));
        assert_eq!(doc.resolve_position(leaf, 10, false), (tail, 3));
    }

    #[test]
    fn test_wrap_moves_node_into_wrapper() {
        let mut doc = Document::new();
        let p = paragraph(&mut doc, &["a", "b", "c"]);
        let b = doc.children(p)[1];
        let span = doc.create_element("span", &[("class", "x")]);

        doc.wrap(b, span);

        assert_eq!(doc.children(p).len(), 3);
        assert_eq!(doc.children(p)[1], span);
        assert_eq!(doc.parent(b), Some(span));
        assert_eq!(doc.text_content(p), "abc");
    }

    #[test]
    fn test_deep_clone_is_structurally_equal() {
        let mut doc = Document::new();
        let p = paragraph(&mut doc, &["one", "two"]);
        doc.set_attr(p, "data-node-id", "7");

        let copy = doc.deep_clone(p);

        assert_ne!(copy, p);
        assert!(doc.parent(copy).is_none());
        assert!(doc.structurally_equal(p, &doc, copy));

        let t = doc.children(copy)[0];
        doc.split_text(t, 1);
        assert!(!doc.structurally_equal(p, &doc, copy));
    }

    #[test]
    fn test_set_and_remove_attr() {
        let mut doc = Document::new();
        let a = doc.create_element("a", &[("href", "https://example.com")]);

        doc.set_attr(a, "target", "_blank");
        doc.set_attr(a, "href", "https://example.org");
        assert_eq!(doc.attr(a, "target"), Some("_blank"));
        assert_eq!(doc.attr(a, "HREF"), Some("https://example.org"));

        doc.remove_attr(a, "target");
        assert!(doc.attr(a, "target").is_none());
    }
}
