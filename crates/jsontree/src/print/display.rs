use core::fmt;

use super::{PrintOptions, Printer};
use crate::{Arena, NodeId};

/// Formats a node as JSON. Created by [`Arena::display`].
#[derive(Clone, Copy)]
pub struct JsonAdapter<'a> {
    arena: &'a Arena,
    node_id: NodeId,
}

impl<'a> JsonAdapter<'a> {
    pub(super) fn new(arena: &'a Arena, node_id: NodeId) -> Self {
        JsonAdapter { arena, node_id }
    }
}

impl fmt::Display for JsonAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = PrintOptions::new().pretty(f.alternate());
        Printer::new(self.arena, f, &options)
            .run(self.node_id)
            .map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for JsonAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonAdapter")
            .field("node_id", &self.node_id)
            .finish_non_exhaustive()
    }
}
