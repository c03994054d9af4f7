#![forbid(unsafe_code)]

//! Headless element tree for tests and UI-less hosts.
//!
//! `HeadlessTree` implements [`ElementTree`] over an in-memory node arena.
//! It is designed for:
//!
//! - **CI environments** with no real UI toolkit
//! - **Binding verification** by inspecting node state after renders
//! - **Event simulation** via [`HeadlessTree::dispatch`] and
//!   [`HeadlessTree::trigger`], which bubble like delegated DOM events
//!
//! # Example
//!
//! ```
//! use ftui_bind::headless::{HeadlessTree, NodeSpec};
//! use ftui_bind::tree::{Element, ElementTree};
//!
//! let tree = HeadlessTree::new(
//!     NodeSpec::new("div")
//!         .id("view")
//!         .child(NodeSpec::new("span").id("name"))
//!         .child(NodeSpec::new("input").class("age")),
//! );
//! let spans = tree.query("#name");
//! assert_eq!(spans.len(), 1);
//! spans[0].set_text("Joe");
//! assert_eq!(tree.query("").len(), 1);
//! assert_eq!(tree.query("")[0].text(), "Joe");
//! ```

pub mod selector;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::reactive::Subscription;
use crate::tree::{Dimension, Element, ElementRef, ElementTree, EventHandler, UiEvent};

pub use selector::{Selector, SelectorError};

pub(crate) type NodeId = usize;

/// Declarative description of a node and its children.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    value: String,
    properties: BTreeMap<String, bool>,
    visible: bool,
    width: f64,
    height: f64,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// A visible node with tag `tag` and no content.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            properties: BTreeMap::new(),
            visible: true,
            width: 0.0,
            height: 0.0,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Add a class; may be called repeatedly.
    #[must_use]
    pub fn class(mut self, class: impl AsRef<str>) -> Self {
        let entry = self.attributes.entry("class".to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(class.as_ref());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, on: bool) -> Self {
        self.properties.insert(name.into(), on);
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    #[must_use]
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) tag: String,
    pub(crate) attributes: BTreeMap<String, String>,
    text: String,
    markup: Option<String>,
    value: String,
    properties: BTreeMap<String, bool>,
    visible: bool,
    width: f64,
    height: f64,
    pub(crate) parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Node storage. Detached nodes stay in the arena but lose their parent
/// link, so stale handles remain valid but unreachable from the root.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id]
    }

    fn insert(&mut self, spec: NodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeData {
            tag: spec.tag,
            attributes: spec.attributes,
            text: spec.text,
            markup: None,
            value: spec.value,
            properties: spec.properties,
            visible: spec.visible,
            width: spec.width,
            height: spec.height,
            parent,
            children: Vec::new(),
        });
        for child in spec.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id].children.push(child_id);
        }
        id
    }

    /// 1-based position among siblings sharing the node's tag.
    pub(crate) fn position_of_type(&self, id: NodeId) -> Option<usize> {
        let tag = &self.nodes[id].tag;
        let Some(parent) = self.nodes[id].parent else {
            return Some(1);
        };
        self.nodes[parent]
            .children
            .iter()
            .filter(|&&sibling| self.nodes[sibling].tag.eq_ignore_ascii_case(tag))
            .position(|&sibling| sibling == id)
            .map(|p| p + 1)
    }

    /// Strict descendants of `root` in document order.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[root].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes[parent].parent;
        }
        false
    }

    fn text_content(&self, id: NodeId) -> String {
        let mut out = self.nodes[id].text.clone();
        for &child in &self.nodes[id].children {
            out.push_str(&self.text_content(child));
        }
        out
    }

    fn detach_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id].children);
        for child in children {
            self.nodes[child].parent = None;
        }
    }
}

struct Delegation {
    event: String,
    /// `None` scopes the handler to the delegation root itself.
    selector: Option<Selector>,
    root: NodeId,
    handler: Weak<dyn Fn(&UiEvent)>,
}

#[derive(Default)]
struct Shared {
    arena: RefCell<Arena>,
    delegations: RefCell<Vec<Delegation>>,
}

/// An in-memory UI tree scoped to one root node.
pub struct HeadlessTree {
    shared: Rc<Shared>,
    root: NodeId,
}

impl std::fmt::Debug for HeadlessTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessTree")
            .field("root", &self.root)
            .field("nodes", &self.shared.arena.borrow().nodes.len())
            .field("delegations", &self.delegation_count())
            .finish()
    }
}

impl HeadlessTree {
    /// Build a tree from `root`.
    #[must_use]
    pub fn new(root: NodeSpec) -> Rc<Self> {
        let shared = Rc::new(Shared::default());
        let root = shared.arena.borrow_mut().insert(root, None);
        Rc::new(Self { shared, root })
    }

    /// A tree sharing this one's nodes and delegations, rooted at the first
    /// element matching `selector`.
    #[must_use]
    pub fn subtree(&self, selector: &str) -> Option<Rc<Self>> {
        let node = self.select_ids(selector).into_iter().next()?;
        Some(Rc::new(Self {
            shared: Rc::clone(&self.shared),
            root: node,
        }))
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> HeadlessElement {
        self.element(self.root)
    }

    /// Concrete handles for `selector` (the root for the empty selector).
    #[must_use]
    pub fn select(&self, selector: &str) -> Vec<HeadlessElement> {
        self.select_ids(selector)
            .into_iter()
            .map(|id| self.element(id))
            .collect()
    }

    /// First element matching `selector`.
    #[must_use]
    pub fn first(&self, selector: &str) -> Option<HeadlessElement> {
        self.select(selector).into_iter().next()
    }

    /// Append `spec` as the last child of `parent`.
    pub fn append(&self, parent: &HeadlessElement, spec: NodeSpec) -> HeadlessElement {
        let id = {
            let mut arena = self.shared.arena.borrow_mut();
            let id = arena.insert(spec, Some(parent.node));
            arena.node_mut(parent.node).children.push(id);
            id
        };
        self.element(id)
    }

    /// Fire `event` at `target`, bubbling to the document root. Returns the
    /// number of handlers invoked.
    pub fn dispatch(&self, event: &str, target: &HeadlessElement) -> usize {
        let calls: Vec<(Rc<dyn Fn(&UiEvent)>, NodeId)> = {
            let arena = self.shared.arena.borrow();
            let mut delegations = self.shared.delegations.borrow_mut();
            delegations.retain(|d| d.handler.strong_count() > 0);

            let mut path = vec![target.node];
            let mut current = arena.node(target.node).parent;
            while let Some(parent) = current {
                path.push(parent);
                current = arena.node(parent).parent;
            }

            let mut calls = Vec::new();
            for &node in &path {
                for delegation in delegations.iter().filter(|d| d.event == event) {
                    let matched = match &delegation.selector {
                        None => node == delegation.root,
                        Some(selector) => {
                            arena.is_descendant_of(node, delegation.root)
                                && selector.matches(&arena, node)
                        }
                    };
                    if matched && let Some(handler) = delegation.handler.upgrade() {
                        calls.push((handler, node));
                    }
                }
            }
            calls
        };

        for (handler, node) in &calls {
            let ui_event = UiEvent {
                name: event.to_string(),
                current_target: Rc::new(self.element(*node)),
            };
            handler(&ui_event);
        }
        calls.len()
    }

    /// Fire `event` at every element matching `selector`. Returns the
    /// total number of handlers invoked.
    pub fn trigger(&self, event: &str, selector: &str) -> usize {
        self.select(selector)
            .iter()
            .map(|target| self.dispatch(event, target))
            .sum()
    }

    /// Live delegated handlers across the whole shared tree.
    #[must_use]
    pub fn delegation_count(&self) -> usize {
        self.shared
            .delegations
            .borrow()
            .iter()
            .filter(|d| d.handler.strong_count() > 0)
            .count()
    }

    fn element(&self, node: NodeId) -> HeadlessElement {
        HeadlessElement {
            shared: Rc::clone(&self.shared),
            node,
        }
    }

    fn select_ids(&self, selector: &str) -> Vec<NodeId> {
        let selector = selector.trim();
        if selector.is_empty() {
            return vec![self.root];
        }
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(%err, "headless query failed");
                return Vec::new();
            }
        };
        let arena = self.shared.arena.borrow();
        arena
            .descendants(self.root)
            .into_iter()
            .filter(|&id| parsed.matches(&arena, id))
            .collect()
    }
}

impl ElementTree for HeadlessTree {
    fn query(&self, selector: &str) -> Vec<ElementRef> {
        self.select(selector)
            .into_iter()
            .map(|element| Rc::new(element) as ElementRef)
            .collect()
    }

    fn delegate(&self, event: &str, selector: &str, handler: EventHandler) -> Subscription {
        let selector = selector.trim();
        let parsed = if selector.is_empty() {
            None
        } else {
            match Selector::parse(selector) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warn!(%err, event, "delegated listener not attached");
                    return Subscription::detached();
                }
            }
        };
        let strong: Rc<dyn Fn(&UiEvent)> = Rc::from(handler);
        self.shared.delegations.borrow_mut().push(Delegation {
            event: event.to_string(),
            selector: parsed,
            root: self.root,
            handler: Rc::downgrade(&strong),
        });
        Subscription::new(strong)
    }
}

/// Handle to one headless node.
#[derive(Clone)]
pub struct HeadlessElement {
    shared: Rc<Shared>,
    node: NodeId,
}

impl std::fmt::Debug for HeadlessElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arena = self.shared.arena.borrow();
        let data = arena.node(self.node);
        f.debug_struct("HeadlessElement")
            .field("node", &self.node)
            .field("tag", &data.tag)
            .field("attributes", &data.attributes)
            .finish()
    }
}

impl HeadlessElement {
    /// Whether the node is still attached under a parent (or is a root).
    #[must_use]
    pub fn is_attached(&self) -> bool {
        let arena = self.shared.arena.borrow();
        self.node == 0 || arena.node(self.node).parent.is_some()
    }

    /// Own visibility flag, ignoring ancestors.
    #[must_use]
    pub fn display_flag(&self) -> bool {
        self.shared.arena.borrow().node(self.node).visible
    }

    fn with<R>(&self, f: impl FnOnce(&NodeData) -> R) -> R {
        f(self.shared.arena.borrow().node(self.node))
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut NodeData) -> R) -> R {
        f(self.shared.arena.borrow_mut().node_mut(self.node))
    }
}

impl Element for HeadlessElement {
    fn text(&self) -> String {
        self.shared.arena.borrow().text_content(self.node)
    }

    fn set_text(&self, text: &str) {
        let mut arena = self.shared.arena.borrow_mut();
        arena.detach_children(self.node);
        let data = arena.node_mut(self.node);
        data.text = text.to_string();
        data.markup = None;
    }

    fn html(&self) -> String {
        let arena = self.shared.arena.borrow();
        match &arena.node(self.node).markup {
            Some(markup) => markup.clone(),
            None => escape_markup(&arena.text_content(self.node)),
        }
    }

    fn set_html(&self, html: &str) {
        let mut arena = self.shared.arena.borrow_mut();
        arena.detach_children(self.node);
        let data = arena.node_mut(self.node);
        data.text = strip_tags(html);
        data.markup = Some(html.to_string());
    }

    fn value(&self) -> String {
        self.with(|data| data.value.clone())
    }

    fn set_value(&self, value: &str) {
        self.with_mut(|data| data.value = value.to_string());
    }

    fn property(&self, name: &str) -> bool {
        self.with(|data| data.properties.get(name).copied().unwrap_or(false))
    }

    fn set_property(&self, name: &str, on: bool) {
        self.with_mut(|data| {
            data.properties.insert(name.to_string(), on);
        });
    }

    fn is_visible(&self) -> bool {
        let arena = self.shared.arena.borrow();
        let mut current = Some(self.node);
        while let Some(id) = current {
            if !arena.node(id).visible {
                return false;
            }
            current = arena.node(id).parent;
        }
        true
    }

    fn set_visible(&self, visible: bool) {
        self.with_mut(|data| data.visible = visible);
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.with(|data| data.attributes.get(name).cloned())
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.with_mut(|data| {
            data.attributes.insert(name.to_string(), value.to_string());
        });
    }

    fn remove_attribute(&self, name: &str) {
        self.with_mut(|data| {
            data.attributes.remove(name);
        });
    }

    fn dimension(&self, dimension: Dimension) -> f64 {
        self.with(|data| match dimension {
            Dimension::Width => data.width,
            Dimension::Height => data.height,
        })
    }

    fn set_dimension(&self, dimension: Dimension, value: f64) {
        self.with_mut(|data| match dimension {
            Dimension::Width => data.width = value,
            Dimension::Height => data.height = value,
        });
    }
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn strip_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
