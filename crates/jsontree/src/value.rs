//! Constructors, type predicates, accessors and lookups.
use std::{borrow::Cow, iter::FusedIterator};

use crate::{
    node::{key_footprint, Kind, Node, NodeId, Payload, Text},
    Arena, Error, Number,
};

impl Arena {
    fn create(&mut self, payload: Payload) -> Result<NodeId, Error> {
        self.alloc(Node::new(payload))
    }

    /// Create a detached `null` node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_null(&mut self) -> Result<NodeId, Error> {
        self.create(Payload::Null)
    }

    /// Create a detached `true` node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_true(&mut self) -> Result<NodeId, Error> {
        self.create(Payload::True)
    }

    /// Create a detached `false` node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_false(&mut self) -> Result<NodeId, Error> {
        self.create(Payload::False)
    }

    /// Create a detached boolean node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_bool(&mut self, value: bool) -> Result<NodeId, Error> {
        self.create(if value { Payload::True } else { Payload::False })
    }

    /// Create a detached number node. Integral values in `i64` range get an integer shadow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_number(&mut self, value: f64) -> Result<NodeId, Error> {
        self.create(Payload::Number(Number::from_f64(value)))
    }

    pub(crate) fn create_number_from(&mut self, number: Number) -> Result<NodeId, Error> {
        self.create(Payload::Number(number))
    }

    /// Create a detached string node holding a copy of `text`.
    ///
    /// `None` produces an empty string rather than a `null` node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_string<'s>(&mut self, text: impl Into<Option<&'s str>>) -> Result<NodeId, Error> {
        let text = text.into().unwrap_or_default();
        self.create(Payload::String(Cow::Owned(text.to_owned())))
    }

    pub(crate) fn create_owned_string(&mut self, text: String) -> Result<NodeId, Error> {
        self.create(Payload::String(Cow::Owned(text)))
    }

    /// Create a detached raw node. Its text is printed verbatim.
    ///
    /// `None` produces an empty raw node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_raw<'s>(&mut self, text: impl Into<Option<&'s str>>) -> Result<NodeId, Error> {
        let text = text.into().unwrap_or_default();
        self.create(Payload::Raw(Cow::Owned(text.to_owned())))
    }

    /// Create a string node that borrows `text` instead of copying it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_string_reference(&mut self, text: &'static str) -> Result<NodeId, Error> {
        self.create(Payload::String(Cow::Borrowed(text)))
    }

    /// Create a detached empty array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_array(&mut self) -> Result<NodeId, Error> {
        self.create(Payload::Array)
    }

    /// Create a detached empty object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse the node.
    pub fn create_object(&mut self) -> Result<NodeId, Error> {
        self.create(Payload::Object)
    }

    /// Create a node that reads as the array `target` without owning it.
    ///
    /// Returns `None` if `target` is not an array.
    pub fn create_array_reference(&mut self, target: NodeId) -> Option<NodeId> {
        self.create_container_reference(target, Kind::Array)
    }

    /// Create a node that reads as the object `target` without owning it.
    ///
    /// Returns `None` if `target` is not an object.
    pub fn create_object_reference(&mut self, target: NodeId) -> Option<NodeId> {
        self.create_container_reference(target, Kind::Object)
    }

    fn create_container_reference(&mut self, target: NodeId, kind: Kind) -> Option<NodeId> {
        let target = self.resolve(target)?;
        if self.kind(target) != kind {
            return None;
        }
        self.create(Payload::Reference(target)).ok()
    }

    /// A non-owning node standing for `target`, which may be of any kind.
    pub(crate) fn create_reference(&mut self, target: NodeId) -> Result<NodeId, Error> {
        let target = self.resolve(target).ok_or(Error::InvalidNode)?;
        self.create(Payload::Reference(target))
    }

    /// Create an array of integer numbers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse any node. Nothing is leaked.
    pub fn create_int_array(&mut self, values: &[i64]) -> Result<NodeId, Error> {
        self.create_array_of(values, |arena, value| {
            arena.create_number_from(Number::from_i64(*value))
        })
    }

    /// Create an array of numbers from single-precision floats.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse any node. Nothing is leaked.
    pub fn create_float_array(&mut self, values: &[f32]) -> Result<NodeId, Error> {
        self.create_array_of(values, |arena, value| {
            arena.create_number(f64::from(*value))
        })
    }

    /// Create an array of numbers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse any node. Nothing is leaked.
    pub fn create_double_array(&mut self, values: &[f64]) -> Result<NodeId, Error> {
        self.create_array_of(values, |arena, value| arena.create_number(*value))
    }

    /// Create an array of strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the allocator hooks refuse any node. Nothing is leaked.
    pub fn create_string_array(&mut self, values: &[&str]) -> Result<NodeId, Error> {
        self.create_array_of(values, |arena, value| arena.create_string(*value))
    }

    fn create_array_of<T>(
        &mut self,
        values: &[T],
        mut create: impl FnMut(&mut Arena, &T) -> Result<NodeId, Error>,
    ) -> Result<NodeId, Error> {
        let array = self.create_array()?;
        for value in values {
            match create(self, value) {
                Ok(item) => self.link_last(array, item),
                Err(error) => {
                    self.free_tree(array);
                    return Err(error);
                }
            }
        }
        Ok(array)
    }

    /// The kind of the node, looking through references.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Kind {
        self.resolved(id)
            .map_or(Kind::Invalid, |node| node.payload.kind())
    }

    #[must_use]
    pub fn is_invalid(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Invalid
    }
    #[must_use]
    pub fn is_null(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Null
    }
    #[must_use]
    pub fn is_false(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::False
    }
    #[must_use]
    pub fn is_true(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::True
    }
    #[must_use]
    pub fn is_bool(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Kind::True | Kind::False)
    }
    #[must_use]
    pub fn is_number(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Number
    }
    #[must_use]
    pub fn is_string(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::String
    }
    #[must_use]
    pub fn is_raw(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Raw
    }
    #[must_use]
    pub fn is_array(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Array
    }
    #[must_use]
    pub fn is_object(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Object
    }

    /// Whether the node's payload is borrowed rather than owned.
    ///
    /// True for item/array/object references and for string references.
    #[must_use]
    pub fn is_reference(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| {
            matches!(
                node.payload,
                Payload::Reference(_)
                    | Payload::String(Cow::Borrowed(_))
                    | Payload::Raw(Cow::Borrowed(_))
            )
        })
    }

    /// Whether the node's key is a borrowed static string.
    #[must_use]
    pub fn is_const_key(&self, id: NodeId) -> bool {
        self.node(id)
            .is_some_and(|node| matches!(node.key, Some(Cow::Borrowed(_))))
    }

    #[must_use]
    pub fn number(&self, id: NodeId) -> Option<Number> {
        match self.resolved(id)?.payload {
            Payload::Number(number) => Some(number),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self, id: NodeId) -> Option<f64> {
        self.number(id).map(|number| number.as_f64())
    }

    /// The integer shadow of a number node.
    #[must_use]
    pub fn as_i64(&self, id: NodeId) -> Option<i64> {
        self.number(id).and_then(|number| number.as_i64())
    }

    /// The numeric value, or NaN if the node is not a number.
    #[must_use]
    pub fn number_value(&self, id: NodeId) -> f64 {
        self.as_number(id).unwrap_or(f64::NAN)
    }

    #[must_use]
    pub fn as_bool(&self, id: NodeId) -> Option<bool> {
        match self.resolved(id)?.payload {
            Payload::True => Some(true),
            Payload::False => Some(false),
            _ => None,
        }
    }

    /// The text of a string node.
    #[must_use]
    pub fn as_str(&self, id: NodeId) -> Option<&str> {
        match &self.resolved(id)?.payload {
            Payload::String(text) => Some(text),
            _ => None,
        }
    }

    /// The verbatim text of a raw node.
    #[must_use]
    pub fn raw_text(&self, id: NodeId) -> Option<&str> {
        match &self.resolved(id)?.payload {
            Payload::Raw(text) => Some(text),
            _ => None,
        }
    }

    /// The key the node is stored under in its object.
    #[must_use]
    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.node(id)?.key.as_deref()
    }

    /// The container owning the node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Set the value of a number node and return the stored value.
    ///
    /// The integer shadow is recomputed from the new value. Returns `None` for other kinds.
    pub fn set_number(&mut self, id: NodeId, value: f64) -> Option<f64> {
        let node = self.node_mut(id)?;
        match &mut node.payload {
            Payload::Number(number) => {
                *number = Number::from_f64(value);
                Some(value)
            }
            _ => None,
        }
    }

    /// Replace the text of an owned string node and return the previous text.
    ///
    /// Returns `None` if the node is not a string, if it borrows its text, or if the hooks refuse
    /// the new buffer.
    pub fn set_string(&mut self, id: NodeId, text: &str) -> Option<Text> {
        let previous_len = match &self.node(id)?.payload {
            Payload::String(Cow::Owned(previous)) => previous.len(),
            _ => return None,
        };
        self.charge(text.len()).ok()?;
        let node = self.node_mut(id)?;
        let previous = std::mem::replace(
            &mut node.payload,
            Payload::String(Cow::Owned(text.to_owned())),
        );
        self.release(previous_len);
        match previous {
            Payload::String(previous) => Some(previous),
            _ => None,
        }
    }

    /// Flip a boolean node. Other kinds are left untouched and `false` is returned.
    pub fn set_bool(&mut self, id: NodeId, value: bool) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        match node.payload {
            Payload::True | Payload::False => {
                node.payload = if value { Payload::True } else { Payload::False };
                true
            }
            _ => false,
        }
    }

    /// Replace the node's key with an owned copy of `key`.
    pub(crate) fn set_key(&mut self, id: NodeId, key: Text) -> Result<(), Error> {
        let new_len = key_footprint(&key);
        let old_len = self
            .node(id)
            .ok_or(Error::InvalidNode)?
            .key
            .as_ref()
            .map_or(0, key_footprint);
        self.charge(new_len)?;
        if let Some(node) = self.node_mut(id) {
            node.key = Some(key);
        }
        self.release(old_len);
        Ok(())
    }

    /// Number of items in an array or members in an object. Zero for other kinds.
    #[must_use]
    pub fn array_size(&self, id: NodeId) -> usize {
        self.items(id).count()
    }

    /// The item at `index` of an array (or the member at that position of an object).
    #[must_use]
    pub fn array_item(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.items(id).nth(index)
    }

    /// The first member whose key matches `key`, ignoring ASCII case.
    #[must_use]
    pub fn object_item(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.find_member(id, key, false)
    }

    /// The first member whose key equals `key`.
    #[must_use]
    pub fn object_item_case_sensitive(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.find_member(id, key, true)
    }

    #[must_use]
    pub fn has_object_item(&self, id: NodeId, key: &str) -> bool {
        self.object_item(id, key).is_some()
    }

    pub(crate) fn find_member(
        &self,
        id: NodeId,
        key: &str,
        case_sensitive: bool,
    ) -> Option<NodeId> {
        if !self.is_object(id) {
            return None;
        }
        self.items(id).find(|&member| {
            self.key(member)
                .is_some_and(|candidate| keys_match(candidate, key, case_sensitive))
        })
    }

    /// Iterate over the items of an array or the members of an object, in order.
    ///
    /// References to containers are looked through. Other kinds yield nothing.
    #[must_use]
    pub fn items(&self, id: NodeId) -> Items<'_> {
        let next = self
            .resolved(id)
            .filter(|node| node.payload.is_container())
            .and_then(|node| node.first_child);
        Items { arena: self, next }
    }
}

#[inline]
pub(crate) fn keys_match(candidate: &str, key: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        candidate == key
    } else {
        candidate.eq_ignore_ascii_case(key)
    }
}

/// Iterator over the children of a container. See [`Arena::items`].
#[derive(Debug, Clone)]
pub struct Items<'a> {
    arena: &'a Arena,
    next: Option<NodeId>,
}

impl Iterator for Items<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.arena.node(current).and_then(|node| node.next_sibling);
        Some(current)
    }
}

impl FusedIterator for Items<'_> {}
