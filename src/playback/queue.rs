//! FIFO with an explicit "now playing" slot.

use std::collections::VecDeque;

/// Whether an item is currently driving the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing is playing.
    #[default]
    Idle,
    /// The current item's audio and visemes are active.
    Playing,
}

/// Outcome of [`PlaybackQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// The queue was idle; the item is now current.
    Started,
    /// Something was playing; the item waits at `position` (1 = next).
    Queued {
        /// 1-based position among waiting items.
        position: usize,
    },
}

/// Ordered playback queue.
///
/// At most one item is current. Waiting items keep arrival order and are
/// promoted one at a time by [`advance`](Self::advance).
#[derive(Debug)]
pub struct PlaybackQueue<T> {
    current: Option<T>,
    pending: VecDeque<T>,
}

impl<T> Default for PlaybackQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PlaybackQueue<T> {
    /// An empty, idle queue.
    pub fn new() -> Self {
        Self {
            current: None,
            pending: VecDeque::new(),
        }
    }

    /// Append `item`. If idle, it becomes current immediately.
    pub fn enqueue(&mut self, item: T) -> Enqueued {
        if self.current.is_none() {
            self.current = Some(item);
            return Enqueued::Started;
        }
        self.pending.push_back(item);
        Enqueued::Queued {
            position: self.pending.len(),
        }
    }

    /// Finish the current item and promote the next waiting one.
    ///
    /// Returns the finished item, or `None` if the queue was idle.
    pub fn advance(&mut self) -> Option<T> {
        let finished = self.current.take();
        if finished.is_some() {
            self.current = self.pending.pop_front();
        }
        finished
    }

    /// The item now playing.
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        if self.current.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    /// Items waiting behind the current one.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Current plus waiting items.
    pub fn len(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }

    /// Whether nothing is playing or waiting.
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Drop everything, returning to idle.
    pub fn clear(&mut self) {
        self.current = None;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn first_item_starts_immediately() {
        let mut queue = PlaybackQueue::new();
        assert_eq!(queue.state(), PlaybackState::Idle);
        assert_eq!(queue.enqueue("a"), Enqueued::Started);
        assert_eq!(queue.state(), PlaybackState::Playing);
        assert_eq!(queue.current(), Some(&"a"));
    }

    #[test]
    fn enqueue_while_busy_keeps_current() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue(1);
        assert_eq!(queue.enqueue(2), Enqueued::Queued { position: 1 });
        assert_eq!(queue.enqueue(3), Enqueued::Queued { position: 2 });
        assert_eq!(queue.current(), Some(&1));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn three_quick_items_play_in_order_then_idle() {
        let mut queue = PlaybackQueue::new();
        for i in 1..=3 {
            queue.enqueue(i);
        }
        let mut played = Vec::new();
        while let Some(current) = queue.current().copied() {
            played.push(current);
            assert_eq!(queue.advance(), Some(current));
        }
        assert_eq!(played, vec![1, 2, 3]);
        assert_eq!(queue.state(), PlaybackState::Idle);
        assert!(queue.is_empty());
    }

    #[test]
    fn advance_when_idle_is_a_no_op() {
        let mut queue: PlaybackQueue<u8> = PlaybackQueue::new();
        assert_eq!(queue.advance(), None);
        assert_eq!(queue.state(), PlaybackState::Idle);
    }

    #[test]
    fn interleaved_operations_keep_one_current_and_fifo_order() {
        let mut queue = PlaybackQueue::new();
        let mut finished = Vec::new();
        let ops = [true, true, false, true, false, false, true, false, false];
        let mut next = 0;
        for enqueue in ops {
            if enqueue {
                queue.enqueue(next);
                next += 1;
            } else if let Some(done) = queue.advance() {
                finished.push(done);
            }
            assert!(queue.len() <= next);
            assert_eq!(queue.state() == PlaybackState::Playing, queue.current().is_some());
        }
        assert_eq!(finished, vec![0, 1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut queue = PlaybackQueue::new();
        queue.enqueue('a');
        queue.enqueue('b');
        queue.clear();
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.state(), PlaybackState::Idle);
    }
}
