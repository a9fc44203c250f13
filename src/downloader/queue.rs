//! Ordered queue of item ids waiting to be downloaded.

use std::collections::VecDeque;

/// FIFO of resolved item ids
///
/// Owned by the caller until handed to
/// [`DownloadEngine::run`](super::DownloadEngine::run), which drains it one
/// item at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadQueue {
    items: VecDeque<String>,
}

impl DownloadQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an id at the back
    pub fn enqueue(&mut self, id: impl Into<String>) {
        self.items.push_back(id.into());
    }

    /// Take the next id from the front
    pub fn dequeue(&mut self) -> Option<String> {
        self.items.pop_front()
    }

    /// Number of ids still waiting
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for DownloadQueue {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for DownloadQueue {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.items.extend(iter.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = DownloadQueue::new();
        queue.enqueue("3");
        queue.enqueue(String::from("1"));
        queue.extend(["2", "2"]);

        assert_eq!(queue.len(), 4);
        assert_eq!(queue.dequeue().as_deref(), Some("3"));
        assert_eq!(queue.dequeue().as_deref(), Some("1"));
        assert_eq!(queue.dequeue().as_deref(), Some("2"));
        assert_eq!(queue.dequeue().as_deref(), Some("2"));
        assert!(queue.dequeue().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_collect_from_resolved_ids() {
        let ids = vec!["10".to_string(), "11".to_string()];
        let queue: DownloadQueue = ids.into_iter().collect();
        assert_eq!(queue.len(), 2);
    }
}
