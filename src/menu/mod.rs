//! Menu tree stored in an arena. Parents are indices, so the tree has a single owner.

use crate::error::MenuError;

pub mod navigator;

pub use navigator::{Key, Navigator, RunResult, ShutdownTimer, ViewLine, ViewLineKind};

/// Action result that asks the navigator to return to the parent menu.
pub const BACK_TOKEN: &str = "back";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Back,
    Show(String),
    /// Display the text and end the run as a failure.
    Abort(String),
}

impl Outcome {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text == BACK_TOKEN {
            Outcome::Back
        } else {
            Outcome::Show(text)
        }
    }
}

pub type Action = Box<dyn FnMut() -> Outcome>;
/// Receives the confirmed text. The returned notice is shown under the menu.
pub type SubmitFn = Box<dyn FnMut(&str) -> Option<String>>;
pub type DescribeFn = Box<dyn Fn() -> String>;

pub struct TextInput {
    pub prompt: String,
    /// Evaluated each time the input opens, so it can show current values.
    pub describe: DescribeFn,
    pub on_submit: SubmitFn,
}

impl TextInput {
    pub fn new(
        prompt: impl Into<String>,
        describe: impl Fn() -> String + 'static,
        on_submit: impl FnMut(&str) -> Option<String> + 'static,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            describe: Box::new(describe),
            on_submit: Box::new(on_submit),
        }
    }
}

pub enum NodeKind {
    Content(Action),
    Submenu(Vec<NodeId>),
    TextInput(TextInput),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

pub struct MenuNode {
    pub title: String,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

pub struct MenuTree {
    nodes: Vec<MenuNode>,
}

impl MenuTree {
    /// A tree holding only an empty root submenu.
    pub fn new(root_title: impl Into<String>) -> Self {
        Self {
            nodes: vec![MenuNode {
                title: root_title.into(),
                parent: None,
                kind: NodeKind::Submenu(Vec::new()),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &MenuNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut MenuNode {
        &mut self.nodes[id.0]
    }

    pub fn title(&self, id: NodeId) -> &str {
        &self.nodes[id.0].title
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children of a submenu; empty for leaves.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Submenu(children) => children,
            _ => &[],
        }
    }

    pub fn add_submenu(
        &mut self,
        parent: NodeId,
        title: impl Into<String>,
    ) -> Result<NodeId, MenuError> {
        self.attach(parent, title.into(), NodeKind::Submenu(Vec::new()))
    }

    pub fn add_content(
        &mut self,
        parent: NodeId,
        title: impl Into<String>,
        action: impl FnMut() -> Outcome + 'static,
    ) -> Result<NodeId, MenuError> {
        self.attach(parent, title.into(), NodeKind::Content(Box::new(action)))
    }

    pub fn add_text_input(
        &mut self,
        parent: NodeId,
        title: impl Into<String>,
        input: TextInput,
    ) -> Result<NodeId, MenuError> {
        self.attach(parent, title.into(), NodeKind::TextInput(input))
    }

    fn attach(
        &mut self,
        parent: NodeId,
        title: String,
        kind: NodeKind,
    ) -> Result<NodeId, MenuError> {
        let id = NodeId(self.nodes.len());
        match &mut self.nodes[parent.0].kind {
            NodeKind::Submenu(children) => children.push(id),
            _ => return Err(MenuError::NotASubmenu(self.nodes[parent.0].title.clone())),
        }
        self.nodes.push(MenuNode {
            title,
            parent: Some(parent),
            kind,
        });
        Ok(id)
    }
}
