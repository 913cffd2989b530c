//! Deep structural equality.
use std::borrow::Cow;

use ahash::{AHashMap, AHashSet};

use crate::{node::Payload, value::keys_match, Arena, NodeId, CIRCULAR_LIMIT};

/// Objects with at least this many members are compared through a key index.
const INDEX_THRESHOLD: usize = 32;

impl Arena {
    /// Whether `a` and `b` hold equal data.
    ///
    /// Kinds must match exactly. Numbers are equal within a relative epsilon, strings and
    /// object keys respect `case_sensitive` (ASCII only), raw text is compared byte-wise. Arrays
    /// must have equal items in the same order. Objects must have the same number of members,
    /// and every key on either side must find its first match on the other side with an equal
    /// value. References compare as their targets. Invalid nodes are never equal to anything,
    /// and neither is a structure where one path follows more reference edges than the circular
    /// reference limit.
    #[must_use]
    pub fn compare(&self, a: NodeId, b: NodeId, case_sensitive: bool) -> bool {
        self.compare_with(a, self, b, case_sensitive)
    }

    /// Like [`Arena::compare`], with `b` living in `other`.
    #[must_use]
    pub fn compare_with(&self, a: NodeId, other: &Arena, b: NodeId, case_sensitive: bool) -> bool {
        Comparison {
            left: self,
            right: other,
            case_sensitive,
        }
        .run(a, b)
    }
}

/// Two nodes that must be equal, with the reference edges followed to reach each of them.
#[derive(Clone, Copy)]
struct Pending {
    left: NodeId,
    right: NodeId,
    left_references: usize,
    right_references: usize,
}

struct Comparison<'a> {
    left: &'a Arena,
    right: &'a Arena,
    case_sensitive: bool,
}

impl Comparison<'_> {
    /// Check pairs from an explicit worklist; the trees are equal when every pair is.
    fn run(&self, a: NodeId, b: NodeId) -> bool {
        let mut pending = vec![Pending {
            left: a,
            right: b,
            left_references: 0,
            right_references: 0,
        }];
        while let Some(pair) = pending.pop() {
            if !self.check(pair, &mut pending) {
                return false;
            }
        }
        true
    }

    /// Compare the nodes of `pair` and queue their children.
    fn check(&self, pair: Pending, pending: &mut Vec<Pending>) -> bool {
        let left_references =
            pair.left_references + usize::from(self.left.is_reference_node(pair.left));
        let right_references =
            pair.right_references + usize::from(self.right.is_reference_node(pair.right));
        if left_references > CIRCULAR_LIMIT || right_references > CIRCULAR_LIMIT {
            return false;
        }
        let lhs = self.left.resolved(pair.left);
        let rhs = self.right.resolved(pair.right);
        let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
            return false;
        };
        let child = |left, right| Pending {
            left,
            right,
            left_references,
            right_references,
        };
        match (&lhs.payload, &rhs.payload) {
            (Payload::Null, Payload::Null)
            | (Payload::True, Payload::True)
            | (Payload::False, Payload::False) => true,
            (Payload::Number(l), Payload::Number(r)) => numbers_eq(l.as_f64(), r.as_f64()),
            (Payload::String(l), Payload::String(r)) => keys_match(l, r, self.case_sensitive),
            (Payload::Raw(l), Payload::Raw(r)) => l.as_bytes() == r.as_bytes(),
            (Payload::Array, Payload::Array) => {
                let mut left = self.left.items(pair.left);
                let mut right = self.right.items(pair.right);
                loop {
                    match (left.next(), right.next()) {
                        (Some(l), Some(r)) => pending.push(child(l, r)),
                        (None, None) => return true,
                        _ => return false,
                    }
                }
            }
            (Payload::Object, Payload::Object) => {
                let count = self.left.items(pair.left).count();
                if count != self.right.items(pair.right).count() {
                    return false;
                }
                let Some(members) = self.pair_members(pair.left, pair.right, count) else {
                    return false;
                };
                pending.extend(members.into_iter().map(|(l, r)| child(l, r)));
                true
            }
            _ => false,
        }
    }

    /// Pair every member of `a` with its first match in `b`, and every member of `b` with its
    /// first match in `a`. Returns `None` if some key has no match.
    fn pair_members(&self, a: NodeId, b: NodeId, count: usize) -> Option<Vec<(NodeId, NodeId)>> {
        let in_right = Lookup::new(self.right, b, count, self.case_sensitive);
        let mut pairs = Vec::with_capacity(count);
        for member in self.left.items(a) {
            let key = self.left.key(member).unwrap_or_default();
            pairs.push((member, in_right.first(key, self.case_sensitive)?));
        }
        // With unique keys the reverse direction finds the same pairs again; duplicate keys
        // can add new ones.
        let in_left = Lookup::new(self.left, a, count, self.case_sensitive);
        let seen: Option<AHashSet<(NodeId, NodeId)>> =
            (count >= INDEX_THRESHOLD).then(|| pairs.iter().copied().collect());
        let mut extra = Vec::new();
        for member in self.right.items(b) {
            let key = self.right.key(member).unwrap_or_default();
            let pair = (in_left.first(key, self.case_sensitive)?, member);
            let known = match &seen {
                Some(seen) => seen.contains(&pair),
                None => pairs.contains(&pair),
            };
            if !known {
                extra.push(pair);
            }
        }
        pairs.extend(extra);
        Some(pairs)
    }
}

/// Finds the first member of an object with a given key.
enum Lookup<'a> {
    Scan { arena: &'a Arena, object: NodeId },
    /// First member for every distinct key.
    Index(AHashMap<Cow<'a, str>, NodeId>),
}

impl<'a> Lookup<'a> {
    fn new(arena: &'a Arena, object: NodeId, count: usize, case_sensitive: bool) -> Lookup<'a> {
        if count < INDEX_THRESHOLD {
            return Lookup::Scan { arena, object };
        }
        let mut index = AHashMap::with_capacity(count);
        for member in arena.items(object) {
            let key = normalize(arena.key(member).unwrap_or_default(), case_sensitive);
            index.entry(key).or_insert(member);
        }
        Lookup::Index(index)
    }

    fn first(&self, key: &str, case_sensitive: bool) -> Option<NodeId> {
        match self {
            Lookup::Scan { arena, object } => arena.items(*object).find(|&member| {
                arena
                    .key(member)
                    .is_some_and(|candidate| keys_match(candidate, key, case_sensitive))
            }),
            Lookup::Index(index) => index.get(normalize(key, case_sensitive).as_ref()).copied(),
        }
    }
}

fn normalize(key: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive || !key.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(key.to_ascii_lowercase())
    }
}

#[inline]
fn numbers_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= a.abs().max(b.abs()) * f64::EPSILON
}
