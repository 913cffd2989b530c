use std::{borrow::Cow, num::NonZeroU32};

use crate::number::Number;

/// Text payload of string, raw and key slots.
///
/// `Cow::Borrowed` marks a payload the node does not own.
pub type Text = Cow<'static, str>;

/// Handle to a node stored in an [`Arena`](crate::Arena).
///
/// Handles are generation-checked: once a node is freed, every handle to it
/// stops resolving, even after its slot is reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: NonZeroU32,
}

impl NodeId {
    #[inline]
    pub(crate) fn new(index: u32, generation: NonZeroU32) -> NodeId {
        NodeId { index, generation }
    }
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.index as usize
    }
    #[inline]
    pub(crate) fn slot(self) -> u32 {
        self.index
    }
    #[inline]
    pub(crate) fn generation(self) -> NonZeroU32 {
        self.generation
    }
}

/// The kind of a node as seen through reference edges.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A stale handle or a reference whose target is gone.
    Invalid,
    Null,
    False,
    True,
    Number,
    String,
    Raw,
    Array,
    Object,
}

impl Kind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Invalid => "invalid",
            Kind::Null => "null",
            Kind::False => "false",
            Kind::True => "true",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Raw => "raw",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Null,
    False,
    True,
    Number(Number),
    String(Text),
    Raw(Text),
    Array,
    Object,
    /// Non-owning edge to another node.
    Reference(NodeId),
}

impl Payload {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Payload::Null => Kind::Null,
            Payload::False => Kind::False,
            Payload::True => Kind::True,
            Payload::Number(_) => Kind::Number,
            Payload::String(_) => Kind::String,
            Payload::Raw(_) => Kind::Raw,
            Payload::Array => Kind::Array,
            Payload::Object => Kind::Object,
            Payload::Reference(_) => Kind::Invalid,
        }
    }

    pub(crate) fn is_container(&self) -> bool {
        matches!(self, Payload::Array | Payload::Object)
    }

    /// Bytes owned by this payload outside of the node itself.
    pub(crate) fn owned_bytes(&self) -> usize {
        match self {
            Payload::String(Cow::Owned(text)) | Payload::Raw(Cow::Owned(text)) => text.len(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) key: Option<Text>,
    pub(crate) payload: Payload,
}

impl Node {
    pub(crate) fn new(payload: Payload) -> Node {
        Node {
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            first_child: None,
            last_child: None,
            key: None,
            payload,
        }
    }

    /// Bytes charged to the allocator hooks for this node.
    pub(crate) fn footprint(&self) -> usize {
        let key = match &self.key {
            Some(Cow::Owned(key)) => key.len(),
            _ => 0,
        };
        std::mem::size_of::<Node>() + key + self.payload.owned_bytes()
    }
}

pub(crate) fn key_footprint(key: &Text) -> usize {
    match key {
        Cow::Owned(key) => key.len(),
        Cow::Borrowed(_) => 0,
    }
}
