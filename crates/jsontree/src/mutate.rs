//! Operations that attach, detach, replace, copy and free nodes.
//!
//! Every operation that takes ownership of a node checks its preconditions before touching the
//! tree: on failure the tree is left exactly as it was and the caller still owns the node it
//! tried to attach.
use std::borrow::Cow;

use crate::{
    node::{Node, NodeId, Payload, Text},
    value::keys_match,
    Arena, CIRCULAR_LIMIT,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Container {
    Array,
    Object,
}

impl Arena {
    /// Whether `id` is an owning container of the given kind. References do not qualify.
    fn is_container(&self, id: NodeId, container: Container) -> bool {
        self.node(id).is_some_and(|node| {
            matches!(
                (&node.payload, container),
                (Payload::Array, Container::Array) | (Payload::Object, Container::Object)
            )
        })
    }

    /// Whether `child` can become an owned child of `parent` without breaking the tree.
    fn can_adopt(&self, parent: NodeId, child: NodeId) -> bool {
        match self.node(child) {
            Some(node) => node.parent.is_none() && !self.is_ancestor_or_self(child, parent),
            None => false,
        }
    }

    /// Append `item` to `array`, transferring ownership.
    ///
    /// Fails if `array` is not an array, if `item` is already attached somewhere, or if `item`
    /// is `array` itself or one of its ancestors.
    pub fn add_item_to_array(&mut self, array: NodeId, item: NodeId) -> bool {
        if !self.is_container(array, Container::Array) || !self.can_adopt(array, item) {
            return false;
        }
        self.link_last(array, item);
        true
    }

    /// Append `item` to `object` under a copy of `key`, transferring ownership.
    pub fn add_item_to_object(&mut self, object: NodeId, key: &str, item: NodeId) -> bool {
        self.add_member(object, Cow::Owned(key.to_owned()), item)
    }

    /// Like [`Arena::add_item_to_object`], but the key is borrowed instead of copied.
    pub fn add_item_to_object_cs(
        &mut self,
        object: NodeId,
        key: &'static str,
        item: NodeId,
    ) -> bool {
        self.add_member(object, Cow::Borrowed(key), item)
    }

    fn add_member(&mut self, object: NodeId, key: Text, item: NodeId) -> bool {
        if !self.is_container(object, Container::Object) || !self.can_adopt(object, item) {
            return false;
        }
        if self.set_key(item, key).is_err() {
            return false;
        }
        self.link_last(object, item);
        true
    }

    /// Append a non-owning reference to `item` to `array`. The caller keeps owning `item`.
    pub fn add_item_reference_to_array(&mut self, array: NodeId, item: NodeId) -> bool {
        if !self.is_container(array, Container::Array) {
            return false;
        }
        let Ok(reference) = self.create_reference(item) else {
            return false;
        };
        self.link_last(array, reference);
        true
    }

    /// Add a non-owning reference to `item` to `object` under `key`.
    pub fn add_item_reference_to_object(
        &mut self,
        object: NodeId,
        key: &str,
        item: NodeId,
    ) -> bool {
        if !self.is_container(object, Container::Object) {
            return false;
        }
        let Ok(reference) = self.create_reference(item) else {
            return false;
        };
        if self.add_member(object, Cow::Owned(key.to_owned()), reference) {
            true
        } else {
            self.free_tree(reference);
            false
        }
    }

    /// Insert `item` at `index`, shifting later items right. An index past the end appends.
    pub fn insert_item_in_array(&mut self, array: NodeId, index: usize, item: NodeId) -> bool {
        if !self.is_container(array, Container::Array) || !self.can_adopt(array, item) {
            return false;
        }
        let sibling = self.children(array).nth(index);
        match sibling {
            Some(sibling) => self.link_before(array, sibling, item),
            None => self.link_last(array, item),
        }
        true
    }

    /// Unlink `item` from `parent` and hand it back to the caller.
    pub fn detach_item_via_pointer(&mut self, parent: NodeId, item: NodeId) -> Option<NodeId> {
        if self.node(item)?.parent != Some(parent) {
            return None;
        }
        self.unlink(item);
        Some(item)
    }

    /// Unlink the item at `index` from `array` and hand it back to the caller.
    pub fn detach_item_from_array(&mut self, array: NodeId, index: usize) -> Option<NodeId> {
        let item = self.own_item(array, index)?;
        self.detach_item_via_pointer(array, item)
    }

    /// Unlink the first member matching `key` (ignoring ASCII case) and hand it back.
    pub fn detach_item_from_object(&mut self, object: NodeId, key: &str) -> Option<NodeId> {
        let item = self.own_member(object, key, false)?;
        self.detach_item_via_pointer(object, item)
    }

    /// Unlink the first member whose key equals `key` and hand it back.
    pub fn detach_item_from_object_case_sensitive(
        &mut self,
        object: NodeId,
        key: &str,
    ) -> Option<NodeId> {
        let item = self.own_member(object, key, true)?;
        self.detach_item_via_pointer(object, item)
    }

    /// Detach and free the item at `index`.
    pub fn delete_item_from_array(&mut self, array: NodeId, index: usize) -> bool {
        self.detach_item_from_array(array, index)
            .is_some_and(|item| self.delete(item))
    }

    /// Detach and free the first member matching `key`, ignoring ASCII case.
    pub fn delete_item_from_object(&mut self, object: NodeId, key: &str) -> bool {
        self.detach_item_from_object(object, key)
            .is_some_and(|item| self.delete(item))
    }

    /// Detach and free the first member whose key equals `key`.
    pub fn delete_item_from_object_case_sensitive(&mut self, object: NodeId, key: &str) -> bool {
        self.detach_item_from_object_case_sensitive(object, key)
            .is_some_and(|item| self.delete(item))
    }

    /// Put `replacement` in place of `item` and free `item`.
    ///
    /// A replacement without a key inherits the key of the node it replaces.
    pub fn replace_item_via_pointer(
        &mut self,
        parent: NodeId,
        item: NodeId,
        replacement: NodeId,
    ) -> bool {
        let Some(node) = self.node(item) else {
            return false;
        };
        if node.parent != Some(parent)
            || !self.node(parent).is_some_and(|node| node.payload.is_container())
            || !self.can_adopt(parent, replacement)
        {
            return false;
        }
        let inherited = match (&node.key, self.node(replacement).map(|node| &node.key)) {
            (Some(key), Some(None)) => Some(key.clone()),
            _ => None,
        };
        if let Some(key) = inherited {
            if self.set_key(replacement, key).is_err() {
                return false;
            }
        }
        self.link_before(parent, item, replacement);
        self.unlink(item);
        self.free_tree(item);
        true
    }

    /// Replace the item at `index` of `array`. Fails if there is no such item.
    pub fn replace_item_in_array(
        &mut self,
        array: NodeId,
        index: usize,
        replacement: NodeId,
    ) -> bool {
        match self.own_item(array, index) {
            Some(item) => self.replace_item_via_pointer(array, item, replacement),
            None => false,
        }
    }

    /// Replace the first member matching `key` (ignoring ASCII case). The replacement is stored
    /// under a copy of `key`.
    pub fn replace_item_in_object(
        &mut self,
        object: NodeId,
        key: &str,
        replacement: NodeId,
    ) -> bool {
        self.replace_member(object, key, replacement, false)
    }

    /// Replace the first member whose key equals `key`.
    pub fn replace_item_in_object_case_sensitive(
        &mut self,
        object: NodeId,
        key: &str,
        replacement: NodeId,
    ) -> bool {
        self.replace_member(object, key, replacement, true)
    }

    fn replace_member(
        &mut self,
        object: NodeId,
        key: &str,
        replacement: NodeId,
        case_sensitive: bool,
    ) -> bool {
        let Some(item) = self.own_member(object, key, case_sensitive) else {
            return false;
        };
        if !self.can_adopt(object, replacement) {
            return false;
        }
        if self.set_key(replacement, Cow::Owned(key.to_owned())).is_err() {
            return false;
        }
        self.replace_item_via_pointer(object, item, replacement)
    }

    fn own_item(&self, array: NodeId, index: usize) -> Option<NodeId> {
        if !self.is_container(array, Container::Array) {
            return None;
        }
        self.children(array).nth(index)
    }

    fn own_member(&self, object: NodeId, key: &str, case_sensitive: bool) -> Option<NodeId> {
        if !self.is_container(object, Container::Object) {
            return None;
        }
        self.children(object).find(|&member| {
            self.key(member)
                .is_some_and(|candidate| keys_match(candidate, key, case_sensitive))
        })
    }

    /// Copy a node into a new detached node that owns all of its data.
    ///
    /// References are copied as the data they point at. With `recursive` set, container
    /// children are copied too; otherwise the copy of a container is empty. Returns `None` if
    /// the hooks refuse an allocation, or if a path through the structure follows more
    /// reference edges than the circular reference limit.
    pub fn duplicate(&mut self, id: NodeId, recursive: bool) -> Option<NodeId> {
        let root = self.copy_node(id)?;
        if !recursive {
            return Some(root);
        }
        let references = usize::from(self.is_reference_node(id));
        let mut stack = vec![(self.resolve(id)?, root, references)];
        while let Some((source, target, references)) = stack.pop() {
            let children: Vec<NodeId> = self.children(source).collect();
            for child in children {
                let Some(copy) = self.copy_node(child) else {
                    self.free_tree(root);
                    return None;
                };
                self.link_last(target, copy);
                let Some(resolved) = self.resolve(child).filter(|&resolved| {
                    self.node(resolved)
                        .is_some_and(|node| node.payload.is_container())
                }) else {
                    continue;
                };
                let references = references + usize::from(self.is_reference_node(child));
                if references > CIRCULAR_LIMIT {
                    log::trace!("Duplication followed more than {CIRCULAR_LIMIT} references");
                    self.free_tree(root);
                    return None;
                }
                stack.push((resolved, copy, references));
            }
        }
        Some(root)
    }

    fn copy_node(&mut self, id: NodeId) -> Option<NodeId> {
        let key = self.node(id)?.key.clone().map(into_owned);
        let payload = match &self.resolved(id)?.payload {
            Payload::String(text) => Payload::String(into_owned(text.clone())),
            Payload::Raw(text) => Payload::Raw(into_owned(text.clone())),
            payload => payload.clone(),
        };
        let mut node = Node::new(payload);
        node.key = key;
        self.alloc(node).ok()
    }

    /// Free `id` and everything it owns, unlinking it from its parent first.
    ///
    /// Nodes reachable only through reference edges are left alone.
    pub fn delete(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.unlink(id);
        self.free_tree(id);
        true
    }

    fn add_created(
        &mut self,
        object: NodeId,
        key: &str,
        created: Result<NodeId, crate::Error>,
    ) -> Option<NodeId> {
        let item = created.ok()?;
        if self.add_item_to_object(object, key, item) {
            Some(item)
        } else {
            self.free_tree(item);
            None
        }
    }

    /// Create a `null` member of `object` under `key`.
    pub fn add_null_to_object(&mut self, object: NodeId, key: &str) -> Option<NodeId> {
        let created = self.create_null();
        self.add_created(object, key, created)
    }

    pub fn add_true_to_object(&mut self, object: NodeId, key: &str) -> Option<NodeId> {
        let created = self.create_true();
        self.add_created(object, key, created)
    }

    pub fn add_false_to_object(&mut self, object: NodeId, key: &str) -> Option<NodeId> {
        let created = self.create_false();
        self.add_created(object, key, created)
    }

    pub fn add_bool_to_object(&mut self, object: NodeId, key: &str, value: bool) -> Option<NodeId> {
        let created = self.create_bool(value);
        self.add_created(object, key, created)
    }

    pub fn add_number_to_object(
        &mut self,
        object: NodeId,
        key: &str,
        value: f64,
    ) -> Option<NodeId> {
        let created = self.create_number(value);
        self.add_created(object, key, created)
    }

    pub fn add_string_to_object(
        &mut self,
        object: NodeId,
        key: &str,
        value: &str,
    ) -> Option<NodeId> {
        let created = self.create_string(value);
        self.add_created(object, key, created)
    }

    pub fn add_raw_to_object(&mut self, object: NodeId, key: &str, value: &str) -> Option<NodeId> {
        let created = self.create_raw(value);
        self.add_created(object, key, created)
    }

    pub fn add_object_to_object(&mut self, object: NodeId, key: &str) -> Option<NodeId> {
        let created = self.create_object();
        self.add_created(object, key, created)
    }

    pub fn add_array_to_object(&mut self, object: NodeId, key: &str) -> Option<NodeId> {
        let created = self.create_array();
        self.add_created(object, key, created)
    }
}

fn into_owned(text: Text) -> Text {
    Cow::Owned(text.into_owned())
}
