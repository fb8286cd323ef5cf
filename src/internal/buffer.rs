// src/internal/buffer.rs

//! The flavor-specific buffers that back every channel.
//!
//! Exactly one buffer instance backs each channel, shared between its two
//! endpoint sides. All cross-thread synchronization lives here: each buffer
//! owns a single `parking_lot::Mutex` guarding every mutable field, plus the
//! condition variables of its discipline. The topology layer above never
//! takes a lock of its own, so no lock nesting is possible anywhere in the
//! crate.
//!
//! All waits are predicate loops: a woken thread re-checks its condition
//! before proceeding, so spurious and stolen wakeups are harmless.
//! Notifications are issued after the guard is released, and each state
//! change wakes at most one waiter of the relevant kind.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

use crate::flavor::Flavor;
use crate::telemetry;

const LOC_PUSH: &str = "Buffer::push";
const LOC_POP: &str = "Buffer::pop";

const EVT_P_WAIT_NOT_FULL: &str = "P:WaitNotFull";
const EVT_P_WAIT_SLOT_EMPTY: &str = "P:WaitSlotEmpty";
const EVT_P_WAIT_DRAINED: &str = "P:WaitDrained";
const EVT_C_WAIT_NOT_EMPTY: &str = "C:WaitNotEmpty";
const EVT_C_TOOK_SLOT: &str = "C:TookSlot";

const CTR_PUSH_PARKS: &str = "PushParks";
const CTR_POP_PARKS: &str = "PopParks";

/// A channel buffer, dispatching on flavor.
///
/// The three disciplines share one contract: `push` blocks while the buffer
/// cannot accept the value, `pop` blocks while no value is available, and
/// values come out in push order. The flavor is fixed at construction.
pub(crate) enum Buffer<T> {
  Unbounded(UnboundedBuffer<T>),
  Bounded(BoundedBuffer<T>),
  Rendezvous(RendezvousBuffer<T>),
}

impl<T> Buffer<T> {
  /// Builds the buffer for `flavor`. `Bounded(0)` degenerates to a
  /// rendezvous buffer, preserving the convention that a zero-capacity
  /// synchronous channel is a hand-off.
  pub(crate) fn new(flavor: Flavor) -> Self {
    match flavor {
      Flavor::Unbounded => Buffer::Unbounded(UnboundedBuffer::new()),
      Flavor::Bounded(0) | Flavor::Rendezvous => Buffer::Rendezvous(RendezvousBuffer::new()),
      Flavor::Bounded(capacity) => Buffer::Bounded(BoundedBuffer::new(capacity)),
    }
  }

  pub(crate) fn push(&self, value: T) {
    match self {
      Buffer::Unbounded(buf) => buf.push(value),
      Buffer::Bounded(buf) => buf.push(value),
      Buffer::Rendezvous(buf) => buf.push(value),
    }
  }

  pub(crate) fn pop(&self) -> T {
    match self {
      Buffer::Unbounded(buf) => buf.pop(),
      Buffer::Bounded(buf) => buf.pop(),
      Buffer::Rendezvous(buf) => buf.pop(),
    }
  }

  /// Instantaneous number of buffered values. A rendezvous buffer reports
  /// slot occupancy (0 or 1). Only meaningful as a snapshot.
  pub(crate) fn len(&self) -> usize {
    match self {
      Buffer::Unbounded(buf) => buf.queue.lock().len(),
      Buffer::Bounded(buf) => buf.queue.lock().len(),
      Buffer::Rendezvous(buf) => buf.state.lock().slot.is_some() as usize,
    }
  }
}

/// FIFO queue with no capacity limit and a single `not_empty` condvar.
///
/// `push` never blocks; memory grows with queue depth.
pub(crate) struct UnboundedBuffer<T> {
  queue: Mutex<VecDeque<T>>,
  not_empty: Condvar,
}

impl<T> UnboundedBuffer<T> {
  fn new() -> Self {
    UnboundedBuffer {
      queue: Mutex::new(VecDeque::new()),
      not_empty: Condvar::new(),
    }
  }

  fn push(&self, value: T) {
    {
      let mut queue = self.queue.lock();
      queue.push_back(value);
    }
    self.not_empty.notify_one();
  }

  fn pop(&self) -> T {
    let mut queue = self.queue.lock();
    loop {
      if let Some(value) = queue.pop_front() {
        return value;
      }
      telemetry::log_event(None, LOC_POP, EVT_C_WAIT_NOT_EMPTY, None);
      telemetry::increment_counter(LOC_POP, CTR_POP_PARKS);
      self.not_empty.wait(&mut queue);
    }
  }
}

/// FIFO queue with a fixed positive capacity.
///
/// `push` blocks on `not_full` while the queue is at capacity; `pop` signals
/// `not_full` after taking a value, so back-pressure resolves one producer
/// per consumed value.
pub(crate) struct BoundedBuffer<T> {
  queue: Mutex<VecDeque<T>>,
  capacity: usize,
  not_empty: Condvar,
  not_full: Condvar,
}

impl<T> BoundedBuffer<T> {
  fn new(capacity: usize) -> Self {
    debug_assert!(capacity > 0, "zero capacity is the rendezvous flavor");
    BoundedBuffer {
      queue: Mutex::new(VecDeque::with_capacity(capacity)),
      capacity,
      not_empty: Condvar::new(),
      not_full: Condvar::new(),
    }
  }

  fn push(&self, value: T) {
    {
      let mut queue = self.queue.lock();
      while queue.len() == self.capacity {
        telemetry::log_event(None, LOC_PUSH, EVT_P_WAIT_NOT_FULL, None);
        telemetry::increment_counter(LOC_PUSH, CTR_PUSH_PARKS);
        self.not_full.wait(&mut queue);
      }
      queue.push_back(value);
    }
    self.not_empty.notify_one();
  }

  fn pop(&self) -> T {
    let value = {
      let mut queue = self.queue.lock();
      loop {
        if let Some(value) = queue.pop_front() {
          break value;
        }
        telemetry::log_event(None, LOC_POP, EVT_C_WAIT_NOT_EMPTY, None);
        telemetry::increment_counter(LOC_POP, CTR_POP_PARKS);
        self.not_empty.wait(&mut queue);
      }
    };
    self.not_full.notify_one();
    value
  }
}

/// Zero-capacity hand-off cell.
///
/// Three condvars coordinate the exchange: producers queue on `slot_empty`,
/// consumers on `slot_filled`, and the producer whose value is in flight
/// waits on `slot_drained` until a consumer has taken it. The second wait is
/// what distinguishes a rendezvous from a size-1 bounded buffer: `push`
/// returns only after the matching `pop` has moved the value out.
///
/// Hand-off completion is tracked with the `takes` counter rather than slot
/// emptiness. Once a consumer empties the slot, another producer may refill
/// it before the drained producer gets back on the mutex, so "slot is empty"
/// is not a stable signal that *this* producer's value was consumed. Each
/// producer captures the counter at deposit time (its ticket) and returns
/// once the counter has moved past it. At most one producer can be awaiting
/// drain at a time, because the slot holds at most one in-flight value, so
/// `notify_one` on `slot_drained` is sufficient.
///
/// When several consumers race on one filled slot, the `Option::take` under
/// the mutex lets exactly one win; the losers observe an empty slot on
/// re-check and go back to waiting. Order among waiting producers or
/// consumers is condvar wake order, no fairness implied.
pub(crate) struct RendezvousBuffer<T> {
  state: Mutex<RendezvousState<T>>,
  slot_empty: Condvar,
  slot_filled: Condvar,
  slot_drained: Condvar,
}

struct RendezvousState<T> {
  slot: Option<T>,
  takes: u64,
}

impl<T> RendezvousBuffer<T> {
  fn new() -> Self {
    RendezvousBuffer {
      state: Mutex::new(RendezvousState {
        slot: None,
        takes: 0,
      }),
      slot_empty: Condvar::new(),
      slot_filled: Condvar::new(),
      slot_drained: Condvar::new(),
    }
  }

  fn push(&self, value: T) {
    let ticket = {
      let mut state = self.state.lock();
      while state.slot.is_some() {
        telemetry::log_event(None, LOC_PUSH, EVT_P_WAIT_SLOT_EMPTY, None);
        telemetry::increment_counter(LOC_PUSH, CTR_PUSH_PARKS);
        self.slot_empty.wait(&mut state);
      }
      state.slot = Some(value);
      state.takes
    };
    self.slot_filled.notify_one();

    let mut state = self.state.lock();
    while state.takes == ticket {
      telemetry::log_event(None, LOC_PUSH, EVT_P_WAIT_DRAINED, None);
      self.slot_drained.wait(&mut state);
    }
  }

  fn pop(&self) -> T {
    let value = {
      let mut state = self.state.lock();
      let value = loop {
        if let Some(value) = state.slot.take() {
          break value;
        }
        telemetry::log_event(None, LOC_POP, EVT_C_WAIT_NOT_EMPTY, None);
        telemetry::increment_counter(LOC_POP, CTR_POP_PARKS);
        self.slot_filled.wait(&mut state);
      };
      state.takes += 1;
      value
    };
    telemetry::log_event(None, LOC_POP, EVT_C_TOOK_SLOT, None);
    self.slot_drained.notify_one();
    self.slot_empty.notify_one();
    value
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::Arc;
  use std::thread;
  use std::time::Duration;

  #[test]
  fn unbounded_fifo() {
    let buf = Buffer::new(Flavor::Unbounded);
    for i in 0..64 {
      buf.push(i);
    }
    for i in 0..64 {
      assert_eq!(buf.pop(), i);
    }
  }

  #[test]
  fn bounded_zero_is_rendezvous() {
    let buf = Buffer::<u8>::new(Flavor::Bounded(0));
    assert!(matches!(buf, Buffer::Rendezvous(_)));
  }

  #[test]
  fn bounded_never_exceeds_capacity() {
    let buf = Arc::new(Buffer::new(Flavor::Bounded(4)));
    let producer = {
      let buf = Arc::clone(&buf);
      thread::spawn(move || {
        for i in 0..200 {
          buf.push(i);
        }
      })
    };
    let mut received = Vec::with_capacity(200);
    for _ in 0..200 {
      assert!(buf.len() <= 4);
      received.push(buf.pop());
    }
    producer.join().unwrap();
    assert_eq!(received, (0..200).collect::<Vec<_>>());
  }

  #[test]
  fn bounded_push_blocks_at_capacity() {
    let buf = Arc::new(Buffer::new(Flavor::Bounded(1)));
    buf.push(1);

    let started = Arc::new(AtomicBool::new(false));
    let blocked_push = {
      let buf = Arc::clone(&buf);
      let started = Arc::clone(&started);
      thread::spawn(move || {
        started.store(true, Ordering::Release);
        buf.push(2);
      })
    };

    while !started.load(Ordering::Acquire) {
      thread::yield_now();
    }
    thread::sleep(Duration::from_millis(100));
    assert!(!blocked_push.is_finished(), "push past capacity must block");

    assert_eq!(buf.pop(), 1);
    blocked_push.join().unwrap();
    assert_eq!(buf.pop(), 2);
  }

  #[test]
  fn rendezvous_push_waits_for_pop() {
    let buf = Arc::new(Buffer::new(Flavor::Rendezvous));
    let popped = Arc::new(AtomicBool::new(false));

    let producer = {
      let buf = Arc::clone(&buf);
      let popped = Arc::clone(&popped);
      thread::spawn(move || {
        buf.push(42);
        // The matching pop must already have taken the value.
        assert!(popped.load(Ordering::Acquire));
      })
    };

    thread::sleep(Duration::from_millis(50));
    popped.store(true, Ordering::Release);
    assert_eq!(buf.pop(), 42);
    producer.join().unwrap();
  }

  #[test]
  fn rendezvous_many_producers_one_consumer() {
    let buf = Arc::new(Buffer::new(Flavor::Rendezvous));
    let handles: Vec<_> = (0..8usize)
      .map(|i| {
        let buf = Arc::clone(&buf);
        thread::spawn(move || buf.push(i))
      })
      .collect();

    let mut seen = [false; 8];
    for _ in 0..8 {
      seen[buf.pop()] = true;
    }
    for handle in handles {
      handle.join().unwrap();
    }
    assert!(seen.iter().all(|&s| s));
  }

  #[test]
  fn rendezvous_pipelined_handoffs() {
    // Reuses one cell for many sequential exchanges, exercising the ticket
    // accounting across producer generations.
    let buf = Arc::new(Buffer::new(Flavor::Rendezvous));
    let taken = Arc::new(AtomicUsize::new(0));

    let consumer = {
      let buf = Arc::clone(&buf);
      let taken = Arc::clone(&taken);
      thread::spawn(move || {
        for i in 0..500usize {
          assert_eq!(buf.pop(), i);
          taken.fetch_add(1, Ordering::Release);
        }
      })
    };

    for i in 0..500usize {
      buf.push(i);
      // By the time push(i) returns, every earlier value has been counted.
      assert!(taken.load(Ordering::Acquire) >= i);
    }
    consumer.join().unwrap();
  }
}
