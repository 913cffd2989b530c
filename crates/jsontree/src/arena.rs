use std::{iter::successors, num::NonZeroU32, sync::Arc};

use crate::{
    hooks::{self, Hooks},
    node::{Node, NodeId, Payload},
    Error,
};

/// One storage slot. A vacant slot keeps its generation so stale handles keep failing.
#[derive(Debug)]
struct Entry {
    generation: NonZeroU32,
    node: Option<Node>,
}

/// Storage for JSON trees.
///
/// Every node lives in an arena and is addressed by a generation-checked [`NodeId`]. Nodes
/// created by constructors or detached from their parent are roots owned by the caller; nodes
/// linked under a container are owned by it and are freed together with it. Reference nodes
/// point at another node without owning it.
///
/// All node and string storage is charged to the arena's [`Hooks`].
pub struct Arena {
    entries: Vec<Entry>,
    vacant: Vec<u32>,
    live: usize,
    hooks: Arc<dyn Hooks>,
}

/// Default initial capacity in nodes.
const DEFAULT_ARENA_CAPACITY: usize = 64;

impl Arena {
    /// Create an arena that uses the process-wide allocator hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hooks(hooks::global())
    }

    /// Create an arena with room for `capacity` nodes before it reallocates.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut arena = Self::new();
        arena.entries.reserve(capacity);
        arena
    }

    /// Create an arena that charges its storage to `hooks` instead of the process-wide hooks.
    #[must_use]
    pub fn with_hooks(hooks: Arc<dyn Hooks>) -> Self {
        Arena {
            entries: Vec::with_capacity(DEFAULT_ARENA_CAPACITY),
            vacant: Vec::new(),
            live: 0,
            hooks,
        }
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether `id` points to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub(crate) fn hooks(&self) -> &dyn Hooks {
        &*self.hooks
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        let entry = self.entries.get(id.index())?;
        if entry.generation == id.generation() {
            entry.node.as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let entry = self.entries.get_mut(id.index())?;
        if entry.generation == id.generation() {
            entry.node.as_mut()
        } else {
            None
        }
    }

    /// Charge `size` bytes to the hooks.
    pub(crate) fn charge(&self, size: usize) -> Result<(), Error> {
        if self.hooks.allocate(size) {
            Ok(())
        } else {
            Err(Error::Allocation { requested: size })
        }
    }

    pub(crate) fn release(&self, size: usize) {
        self.hooks.free(size);
    }

    /// Store a detached node.
    pub(crate) fn alloc(&mut self, node: Node) -> Result<NodeId, Error> {
        let footprint = node.footprint();
        self.charge(footprint)?;
        let id = if let Some(index) = self.vacant.pop() {
            let entry = &mut self.entries[index as usize];
            entry.node = Some(node);
            NodeId::new(index, entry.generation)
        } else {
            let Ok(index) = u32::try_from(self.entries.len()) else {
                self.release(footprint);
                return Err(Error::Allocation {
                    requested: footprint,
                });
            };
            if self.entries.try_reserve(1).is_err() {
                self.release(footprint);
                return Err(Error::Allocation {
                    requested: footprint,
                });
            }
            self.entries.push(Entry {
                generation: NonZeroU32::MIN,
                node: Some(node),
            });
            NodeId::new(index, NonZeroU32::MIN)
        };
        self.live += 1;
        Ok(id)
    }

    /// Free `root` and every node it owns. Reference edges are not followed.
    ///
    /// The caller is responsible for unlinking `root` from its parent first.
    pub(crate) fn free_tree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.take(id) else {
                continue;
            };
            if node.payload.is_container() {
                let mut child = node.first_child;
                while let Some(current) = child {
                    child = self.node(current).and_then(|node| node.next_sibling);
                    stack.push(current);
                }
            }
        }
    }

    /// Remove a single node from its slot and retire the handle.
    fn take(&mut self, id: NodeId) -> Option<Node> {
        let entry = self.entries.get_mut(id.index())?;
        if entry.generation != id.generation() {
            return None;
        }
        let node = entry.node.take()?;
        // A slot whose generation would wrap is retired instead of reused.
        if let Some(next) = entry.generation.checked_add(1) {
            entry.generation = next;
            self.vacant.push(id.slot());
        }
        self.live -= 1;
        self.hooks.free(node.footprint());
        Some(node)
    }

    /// Direct children of `id`, without resolving references.
    pub(crate) fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.node(id).and_then(|node| node.first_child);
        successors(first, |&child| self.node(child).and_then(|node| node.next_sibling))
    }

    /// The node holding the data `id` stands for: `id` itself, or the target of a reference.
    pub(crate) fn resolve(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id)?.payload {
            Payload::Reference(target) => {
                // References are created against their final target, so one hop suffices.
                let node = self.node(target)?;
                if matches!(node.payload, Payload::Reference(_)) {
                    None
                } else {
                    Some(target)
                }
            }
            _ => Some(id),
        }
    }

    /// Whether `id` is a non-owning edge to another node.
    #[inline]
    pub(crate) fn is_reference_node(&self, id: NodeId) -> bool {
        self.node(id)
            .is_some_and(|node| matches!(node.payload, Payload::Reference(_)))
    }

    #[inline]
    pub(crate) fn resolved(&self, id: NodeId) -> Option<&Node> {
        self.resolve(id).and_then(|id| self.node(id))
    }

    /// Whether `candidate` is `node` or one of its ancestors along owning edges.
    pub(crate) fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        successors(Some(node), |&current| self.node(current)?.parent).any(|id| id == candidate)
    }

    /// Append a detached `child` to `parent`.
    pub(crate) fn link_last(&mut self, parent: NodeId, child: NodeId) {
        let last = self.node(parent).and_then(|node| node.last_child);
        self.link_between(parent, last, None, child);
    }

    /// Insert a detached `child` right before `sibling`, which must be a child of `parent`.
    pub(crate) fn link_before(&mut self, parent: NodeId, sibling: NodeId, child: NodeId) {
        let prev = self.node(sibling).and_then(|node| node.prev_sibling);
        self.link_between(parent, prev, Some(sibling), child);
    }

    fn link_between(
        &mut self,
        parent: NodeId,
        prev: Option<NodeId>,
        next: Option<NodeId>,
        child: NodeId,
    ) {
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        match prev.and_then(|prev| self.node_mut(prev)) {
            Some(prev) => prev.next_sibling = Some(child),
            None => {
                if let Some(node) = self.node_mut(parent) {
                    node.first_child = Some(child);
                }
            }
        }
        match next.and_then(|next| self.node_mut(next)) {
            Some(next) => next.prev_sibling = Some(child),
            None => {
                if let Some(node) = self.node_mut(parent) {
                    node.last_child = Some(child);
                }
            }
        }
    }

    /// Unlink `child` from its parent, if it has one. The node stays allocated.
    pub(crate) fn unlink(&mut self, child: NodeId) {
        let Some(node) = self.node_mut(child) else {
            return;
        };
        let Some(parent) = node.parent.take() else {
            return;
        };
        let prev = node.prev_sibling.take();
        let next = node.next_sibling.take();
        match prev.and_then(|prev| self.node_mut(prev)) {
            Some(prev) => prev.next_sibling = next,
            None => {
                if let Some(node) = self.node_mut(parent) {
                    node.first_child = next;
                }
            }
        }
        match next.and_then(|next| self.node_mut(next)) {
            Some(next) => next.prev_sibling = prev,
            None => {
                if let Some(node) = self.node_mut(parent) {
                    node.last_child = prev;
                }
            }
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        if self.live > 0 {
            log::trace!("Releasing {} live nodes", self.live);
        }
        for entry in &mut self.entries {
            if let Some(node) = entry.node.take() {
                self.hooks.free(node.footprint());
            }
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("live", &self.live)
            .field("slots", &self.entries.len())
            .field("vacant", &self.vacant.len())
            .finish_non_exhaustive()
    }
}
