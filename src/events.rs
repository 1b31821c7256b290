//! Interrupt-deferred task queue.
//!
//! Each periodic trigger owns one [`Event`].  Trigger callbacks run in a
//! restricted context (timer interrupt / timer task), so all they do is push
//! the event id into a lock-free ring.  The main loop is the only consumer:
//! it sleeps until something is pending, then runs the associated task to
//! completion.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ measure  tmr │────▶│              │     │              │
//! │ display  tmr │────▶│  Event Queue │────▶│  Main Loop   │
//! │ log      tmr │────▶│  (lock-free) │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! ## Overrun policy
//!
//! Each event has a pending flag.  A trigger that fires while its event is
//! still queued is coalesced into the pending instance, so the queue never
//! holds two copies of the same task and the single consumer never runs two
//! instances of it at once.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Capacity of the global queue.  One slot per event kind plus the slot the
/// ring keeps empty to tell full from empty.
pub const EVENT_QUEUE_CAP: usize = 4;

const _: () = assert!(EVENT_QUEUE_CAP > Event::COUNT);

/// Deferred tasks, one per periodic trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Event {
    /// Read both sensors and run fault handling.
    MeasureTick = 0,
    /// Recompute dew points, decide the relay, refresh the display.
    DisplayTick = 1,
    /// Append a data-log record and flush when due.
    LogTick = 2,
}

impl Event {
    /// Number of event kinds.
    pub const COUNT: usize = 3;

    /// Every event, in discriminant order.
    pub const ALL: [Event; Self::COUNT] = [Self::MeasureTick, Self::DisplayTick, Self::LogTick];

    /// Dense index for per-event tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decode a raw slot value.
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::MeasureTick),
            1 => Some(Self::DisplayTick),
            2 => Some(Self::LogTick),
            _ => None,
        }
    }

    /// Short name used in logs and timer names.
    pub const fn name(self) -> &'static str {
        match self {
            Self::MeasureTick => "measure",
            Self::DisplayTick => "display",
            Self::LogTick => "log",
        }
    }
}

/// Outcome of [`EventQueue::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushResult {
    /// The event was appended to the ring.
    Queued,
    /// The same event was already pending; this fire was folded into it.
    Coalesced,
    /// The ring was full and the event was dropped.
    Dropped,
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// Producer: the timer context (one writer).  Consumer: the main loop (one
// reader).  Slots are atomics, so no `unsafe` is needed to share the ring
// through a `static`.

/// Fixed-capacity single-producer / single-consumer event ring.
pub struct EventQueue<const N: usize> {
    head: AtomicU8,
    tail: AtomicU8,
    slots: [AtomicU8; N],
    pending: [AtomicBool; Event::COUNT],
    coalesced: AtomicU32,
    dropped: AtomicU32,
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl<const N: usize> EventQueue<N> {
    /// Create an empty queue.  `N` must be in `2..=255`.
    pub const fn new() -> Self {
        assert!(N >= 2 && N <= u8::MAX as usize, "queue capacity out of range");
        Self {
            head: AtomicU8::new(0),
            tail: AtomicU8::new(0),
            slots: [const { AtomicU8::new(0) }; N],
            pending: [const { AtomicBool::new(false) }; Event::COUNT],
            coalesced: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            ready: Signal::new(),
        }
    }

    /// Push an event.  Safe to call from the trigger context: never
    /// allocates and never blocks.
    pub fn push(&self, event: Event) -> PushResult {
        let idx = event.index();
        if self.pending[idx].swap(true, Ordering::AcqRel) {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            return PushResult::Coalesced;
        }

        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let next_head = Self::advance(head);

        if next_head == tail {
            self.pending[idx].store(false, Ordering::Release);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return PushResult::Dropped;
        }

        self.slots[head as usize].store(event as u8, Ordering::Relaxed);
        self.head.store(next_head, Ordering::Release);
        self.ready.signal(());
        PushResult::Queued
    }

    /// Pop the oldest event.  Consumer side only.
    pub fn pop(&self) -> Option<Event> {
        loop {
            let tail = self.tail.load(Ordering::Relaxed);
            let head = self.head.load(Ordering::Acquire);

            if tail == head {
                return None;
            }

            let raw = self.slots[tail as usize].load(Ordering::Relaxed);
            self.tail.store(Self::advance(tail), Ordering::Release);

            // Slots only ever hold values written by `push`; skip anything else.
            if let Some(event) = Event::from_u8(raw) {
                self.pending[event.index()].store(false, Ordering::Release);
                return Some(event);
            }
        }
    }

    /// Drain all pending events into a callback, in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    /// Block the consumer until at least one event is pending.
    ///
    /// Must not be called from a trigger context.
    pub fn wait(&self) {
        while self.is_empty() {
            futures_lite::future::block_on(self.ready.wait());
        }
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        tail == head
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire) as usize;
        let tail = self.tail.load(Ordering::Relaxed) as usize;
        (head + N - tail) % N
    }

    /// Whether `event` is currently waiting in the ring.
    pub fn is_pending(&self, event: Event) -> bool {
        self.pending[event.index()].load(Ordering::Acquire)
    }

    /// Fires folded into an already-pending event since boot.
    pub fn coalesced(&self) -> u32 {
        self.coalesced.load(Ordering::Relaxed)
    }

    /// Fires lost to a full ring since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    const fn advance(index: u8) -> u8 {
        ((index as usize + 1) % N) as u8
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Global queue ──────────────────────────────────────────────
//
// Timer callbacks have no context pointer to a queue instance, so the
// firmware shares one static ring between the trigger context and the
// main loop.

static EVENTS: EventQueue<EVENT_QUEUE_CAP> = EventQueue::new();

/// The process-wide queue.
pub fn global() -> &'static EventQueue<EVENT_QUEUE_CAP> {
    &EVENTS
}

/// Push an event into the global queue.
/// Safe to call from the trigger context (lock-free).
pub fn push_event(event: Event) -> PushResult {
    EVENTS.push(event)
}

/// Pop the next event from the global queue.
pub fn pop_event() -> Option<Event> {
    EVENTS.pop()
}

/// Drain all pending events of the global queue into a callback.
pub fn drain_events(handler: impl FnMut(Event)) {
    EVENTS.drain(handler);
}

/// Idle-wait on the global queue.
pub fn wait_for_event() {
    EVENTS.wait();
}

/// Number of pending events in the global queue.
pub fn queue_len() -> usize {
    EVENTS.len()
}

/// Coalesced fires of the global queue.
pub fn coalesced_count() -> u32 {
    EVENTS.coalesced()
}
