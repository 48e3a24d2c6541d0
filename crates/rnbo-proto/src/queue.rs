//! A thread-safe (not realtime-safe) FIFO queue.
//!
//! Ported from the runner's `Queue<T>`: a `Mutex` + `Condvar` blocking queue
//! used for the command stream and other cross-thread, non-realtime handoffs.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

pub struct Queue<T> {
    inner: Mutex<VecDeque<T>>,
    condition: Condvar,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            condition: Condvar::new(),
        }
    }

    /// Push from any thread.
    pub fn push(&self, item: T) {
        let mut guard = self.inner.lock().unwrap();
        guard.push_back(item);
        self.condition.notify_one();
    }

    /// Block until an item is available.
    pub fn pop(&self) -> T {
        let mut guard = self.inner.lock().unwrap();
        loop {
            if let Some(item) = guard.pop_front() {
                return item;
            }
            guard = self.condition.wait(guard).unwrap();
        }
    }

    /// Wait up to `timeout` for an item.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let mut guard = self.inner.lock().unwrap();
        if guard.is_empty() {
            let (g, _) = self.condition.wait_timeout(guard, timeout).unwrap();
            guard = g;
        }
        guard.pop_front()
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn try_pop_empty() {
        let q: Queue<i32> = Queue::new();
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn push_pop_order() {
        let q: Queue<i32> = Queue::new();
        q.push(1);
        q.push(2);
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn pop_timeout_returns_none_when_empty() {
        let q: Queue<i32> = Queue::new();
        assert_eq!(q.pop_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn blocking_pop_wakes_on_push() {
        let q = Arc::new(Queue::new());
        let q2 = q.clone();
        let handle = thread::spawn(move || q2.pop());
        thread::sleep(Duration::from_millis(20));
        q.push(42);
        assert_eq!(handle.join().unwrap(), 42);
    }
}
