//! Fixed-capacity pen event queue from interrupt context to the main loop
//!
//! A single-producer, single-consumer queue on top of
//! [`heapless::spsc::Queue`].  [`EventQueue::split`] hands out exactly one
//! [`Producer`], used by the touch interrupt handler, and one [`Consumer`],
//! used by the main loop.  Neither side takes a lock or a critical section.
//!
//! When the queue is full the newest event is dropped; the producer never
//! waits and never allocates.
//!
//! `EventQueue<S>` has `S` slots and holds at most `S - 1` events, one slot
//! is kept free to tell a full queue from an empty one.

use heapless::spsc;

use crate::pen::{PenEvent, PenEventSink};

/// Default number of pen events held between main loop passes
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Queue holding [`DEFAULT_QUEUE_CAPACITY`] events
pub type PenEventQueue = EventQueue<{ DEFAULT_QUEUE_CAPACITY + 1 }>;

/// Queue of pen events with `S` slots
pub struct EventQueue<const S: usize> {
    inner: spsc::Queue<PenEvent, S>,
}

impl<const S: usize> EventQueue<S> {
    /// Create an empty queue
    ///
    /// Usable in a `static` initializer.
    pub const fn new() -> EventQueue<S> {
        EventQueue {
            inner: spsc::Queue::new(),
        }
    }

    /// Split into the producer and consumer halves
    ///
    /// Borrowing the queue mutably guarantees there is only ever one of each.
    pub fn split(&mut self) -> (Producer<'_, S>, Consumer<'_, S>) {
        let (producer, consumer) = self.inner.split();
        (Producer { inner: producer }, Consumer { inner: consumer })
    }

    /// Maximum number of events held, `S - 1`
    pub const fn capacity(&self) -> usize {
        S - 1
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }
}

impl<const S: usize> Default for EventQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Writing half of an [`EventQueue`], for interrupt context
pub struct Producer<'a, const S: usize> {
    inner: spsc::Producer<'a, PenEvent, S>,
}

impl<'a, const S: usize> Producer<'a, S> {
    /// Append `event` unless the queue is full
    ///
    /// Returns `false`, dropping the event, when there is no free slot.
    /// Runs in constant time.
    pub fn try_enqueue(&mut self, event: PenEvent) -> bool {
        match self.inner.enqueue(event) {
            Ok(()) => true,
            Err(dropped) => {
                trace!("pen event queue full, dropped {:?}", dropped);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    pub fn is_full(&self) -> bool {
        !self.inner.ready()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl<'a, const S: usize> PenEventSink for Producer<'a, S> {
    fn push(&mut self, event: PenEvent) -> bool {
        self.try_enqueue(event)
    }
}

/// Reading half of an [`EventQueue`], for the main loop
pub struct Consumer<'a, const S: usize> {
    inner: spsc::Consumer<'a, PenEvent, S>,
}

impl<'a, const S: usize> Consumer<'a, S> {
    /// Remove the oldest event, if any
    pub fn dequeue(&mut self) -> Option<PenEvent> {
        self.inner.dequeue()
    }

    /// Iterate over the events queued right now, oldest first
    ///
    /// Events enqueued while draining are left for the next call, so the
    /// iteration always ends.
    pub fn drain(&mut self) -> Drain<'_, 'a, S> {
        let pending = self.inner.len();
        Drain {
            consumer: self,
            pending,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.inner.ready()
    }

    pub fn is_full(&self) -> bool {
        self.inner.len() == self.inner.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

/// Iterator returned by [`Consumer::drain`]
pub struct Drain<'c, 'a, const S: usize> {
    consumer: &'c mut Consumer<'a, S>,
    pending: usize,
}

impl<'c, 'a, const S: usize> Iterator for Drain<'c, 'a, S> {
    type Item = PenEvent;

    fn next(&mut self) -> Option<PenEvent> {
        if self.pending == 0 {
            return None;
        }
        self.pending -= 1;
        self.consumer.dequeue()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.pending))
    }
}
