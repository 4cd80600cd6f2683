//! Playback queue
//!
//! Ordered list of items plus a cursor naming the selected entry:
//!
//! ```text
//!   0  Item A
//!   1  Item B   <- current_index
//!   2  Item C
//! ```
//!
//! Mutations never fail. Out-of-range indices are clamped (insert) or ignored
//! (removal, reorder), and the cursor is shifted so it keeps naming the same
//! item whenever that item survives the mutation.

use segue_core::QueueItem;

/// Result of removing an entry from the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// The removed item
    pub item: QueueItem,

    /// Index the item occupied before removal
    pub index: usize,

    /// Whether the removed entry was the selected one
    pub was_current: bool,
}

/// Ordered queue with a selection cursor
///
/// Invariant: `current_index` is `None` or `< len()`, and it is `None`
/// whenever the queue is empty.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    items: Vec<QueueItem>,
    current_index: Option<usize>,
}

impl PlaybackQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item, clamping `index` into `[0, len]`
    ///
    /// Returns the index the item landed at. If it landed at or before the
    /// selected entry, the cursor moves down one so the selection is
    /// unchanged.
    pub fn insert(&mut self, item: QueueItem, index: usize) -> usize {
        let index = index.min(self.items.len());
        self.items.insert(index, item);

        if let Some(current) = self.current_index {
            if index <= current {
                self.current_index = Some(current + 1);
            }
        }

        index
    }

    /// Append an item
    pub fn enqueue(&mut self, item: QueueItem) -> usize {
        self.insert(item, self.items.len())
    }

    /// Remove the entry at `index`
    ///
    /// Returns `None` for an out-of-range index. When the selected entry is
    /// removed the cursor steps back to the preceding entry (or to no
    /// selection at the head), so that advancing lands on the item that
    /// followed the removed one.
    pub fn dequeue_at(&mut self, index: usize) -> Option<Removal> {
        if index >= self.items.len() {
            return None;
        }

        let item = self.items.remove(index);
        let was_current = self.current_index == Some(index);

        self.current_index = match self.current_index {
            Some(current) if current == index => index.checked_sub(1),
            Some(current) if index < current => Some(current - 1),
            other => other,
        };

        if self.items.is_empty() {
            self.current_index = None;
        }

        Some(Removal {
            item,
            index,
            was_current,
        })
    }

    /// Remove the first entry equal to `item`
    pub fn dequeue_by_value(&mut self, item: &QueueItem) -> Option<Removal> {
        let index = self.items.iter().position(|candidate| candidate == item)?;
        self.dequeue_at(index)
    }

    /// Move the entry at `from` to `to`
    ///
    /// Both indices must be in range; otherwise nothing happens and `false`
    /// is returned. The cursor follows the selected item.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let len = self.items.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if let Some(current) = self.current_index {
            self.current_index = Some(if current == from {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }

        true
    }

    /// Remove every entry and drop the selection
    pub fn clear(&mut self) {
        self.items.clear();
        self.current_index = None;
    }

    /// Select the entry at `index`
    ///
    /// Returns `false` (and leaves the cursor alone) for an out-of-range
    /// index.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.current_index = Some(index);
            true
        } else {
            false
        }
    }

    /// Index that advancing would select
    ///
    /// With no selection this is the head of the queue. At the tail it is
    /// the head again when `wrap` is set, otherwise `None`.
    pub fn next_index(&self, wrap: bool) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }

        match self.current_index {
            None => Some(0),
            Some(current) if current + 1 < self.items.len() => Some(current + 1),
            Some(_) if wrap => Some(0),
            Some(_) => None,
        }
    }

    /// Index before the selection, if any
    pub fn previous_index(&self) -> Option<usize> {
        self.current_index.and_then(|current| current.checked_sub(1))
    }

    /// Immutable ordered copy of the queue
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.clone()
    }

    /// Get item at index
    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    /// Selected item
    pub fn current(&self) -> Option<&QueueItem> {
        self.current_index.and_then(|index| self.items.get(index))
    }

    /// Selected index
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Iterate over the items in order
    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }

    /// Total number of items in queue
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
