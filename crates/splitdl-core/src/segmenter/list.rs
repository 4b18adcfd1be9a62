//! Ordered, arena-backed doubly-linked list of segments.
//!
//! Nodes live in a `Vec` slot arena and link to each other by index. A
//! [`SegmentId`] carries the slot generation, so a handle to a removed node
//! never aliases a node that later reuses the slot.

use std::sync::Arc;

use super::Segment;

/// Stable handle to a node in a [`SegmentList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
struct Node {
    segment: Arc<Segment>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    node: Option<Node>,
}

/// Segments ordered by `begin`. Not synchronized; the coordinator wraps it
/// in its structural lock.
#[derive(Debug, Default)]
pub struct SegmentList {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl SegmentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<SegmentId> {
        self.head.map(|i| self.id_at(i))
    }

    pub fn back(&self) -> Option<SegmentId> {
        self.tail.map(|i| self.id_at(i))
    }

    pub fn next(&self, id: SegmentId) -> Option<SegmentId> {
        self.node(id)?.next.map(|i| self.id_at(i))
    }

    pub fn prev(&self, id: SegmentId) -> Option<SegmentId> {
        self.node(id)?.prev.map(|i| self.id_at(i))
    }

    pub fn get(&self, id: SegmentId) -> Option<&Arc<Segment>> {
        self.node(id).map(|n| &n.segment)
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.node(id).is_some()
    }

    /// Appends at the tail.
    pub fn push_back(&mut self, segment: Arc<Segment>) -> SegmentId {
        let index = self.alloc(Node {
            segment,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(t) => self.node_mut(t).next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        self.id_at(index)
    }

    /// Inserts immediately before `at`. Returns `None` if `at` is stale.
    pub fn insert_before(&mut self, at: SegmentId, segment: Arc<Segment>) -> Option<SegmentId> {
        let at_prev = self.node(at)?.prev;
        let index = self.alloc(Node {
            segment,
            prev: at_prev,
            next: Some(at.index),
        });
        match at_prev {
            Some(p) => self.node_mut(p).next = Some(index),
            None => self.head = Some(index),
        }
        self.node_mut(at.index).prev = Some(index);
        self.len += 1;
        Some(self.id_at(index))
    }

    /// Inserts before the first node whose `begin` is `>=` the new segment's
    /// `begin`, or at the tail if there is none. O(n).
    pub fn insert_sorted(&mut self, segment: Arc<Segment>) -> SegmentId {
        let begin = segment.begin();
        let mut cursor = self.front();
        while let Some(id) = cursor {
            if self.get(id).map(|s| s.begin() >= begin).unwrap_or(false) {
                if let Some(new_id) = self.insert_before(id, Arc::clone(&segment)) {
                    return new_id;
                }
            }
            cursor = self.next(id);
        }
        self.push_back(segment)
    }

    /// Unlinks `id` in O(1). Returns `None` if it was already removed.
    pub fn remove(&mut self, id: SegmentId) -> Option<Arc<Segment>> {
        self.node(id)?;
        let slot = &mut self.slots[id.index];
        let node = slot.node.take()?;
        slot.generation += 1;
        self.free.push(id.index);

        match node.prev {
            Some(p) => self.node_mut(p).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.node_mut(n).prev = node.prev,
            None => self.tail = node.prev,
        }
        self.len -= 1;
        Some(node.segment)
    }

    /// Front-to-back iteration.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    /// Removes every node, returning the segments in order.
    pub fn drain(&mut self) -> Vec<Arc<Segment>> {
        let out: Vec<Arc<Segment>> = self.iter().map(|(_, s)| Arc::clone(s)).collect();
        *self = Self::default();
        out
    }

    fn id_at(&self, index: usize) -> SegmentId {
        SegmentId {
            index,
            generation: self.slots[index].generation,
        }
    }

    fn node(&self, id: SegmentId) -> Option<&Node> {
        let slot = self.slots.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Internal link fix-ups only; indices come from live links.
    fn node_mut(&mut self, index: usize) -> &mut Node {
        self.slots[index]
            .node
            .as_mut()
            .expect("linked index points at a live node")
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.slots[index].node = Some(node);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            }
        }
    }
}

pub struct Iter<'a> {
    list: &'a SegmentList,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (SegmentId, &'a Arc<Segment>);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let node = self.list.slots[index].node.as_ref()?;
        self.cursor = node.next;
        Some((self.list.id_at(index), &node.segment))
    }
}
