//! Bounded single-producer single-consumer tick queue.

use common::MarketTick;
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A bounded SPSC ring carrying ticks from one venue worker to the graph
/// updater. `try_push` and `try_pop` are wait-free.
///
/// Contract: at most one thread pushes and at most one thread pops at any
/// time. The engine enforces this by giving each venue its own queue and
/// draining all queues from a single updater task.
pub struct TickQueue {
    buffer: Box<[UnsafeCell<MaybeUninit<MarketTick>>]>,
    mask: usize,
    /// Next write position, owned by the producer.
    head: CachePadded<AtomicUsize>,
    /// Next read position, owned by the consumer.
    tail: CachePadded<AtomicUsize>,
}

unsafe impl Send for TickQueue {}
unsafe impl Sync for TickQueue {}

impl TickQueue {
    /// Creates a queue holding at least `capacity` ticks, rounded up to the
    /// next power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            buffer,
            mask: capacity - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.head
            .load(Ordering::Acquire)
            .wrapping_sub(self.tail.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueues a tick, handing it back when the ring is full.
    pub fn try_push(&self, tick: MarketTick) -> Result<(), MarketTick> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head.wrapping_sub(tail) == self.buffer.len() {
            return Err(tick);
        }

        // Safety: SPSC contract; the slot at `head` is not visible to the
        // consumer until the Release store below.
        unsafe {
            (*self.buffer[head & self.mask].get()).write(tick);
        }
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Dequeues the oldest tick, if any.
    pub fn try_pop(&self) -> Option<MarketTick> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        // Safety: SPSC contract; the Acquire load of `head` ordered the
        // producer's write of this slot before us, and the slot is not
        // reused until the Release store below.
        let tick = unsafe { (*self.buffer[tail & self.mask].get()).assume_init_read() };
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(tick)
    }
}

impl Drop for TickQueue {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}
