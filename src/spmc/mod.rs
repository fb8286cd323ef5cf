// src/spmc/mod.rs

//! Single-producer, multi-consumer channels.
//!
//! The single [`Sender`] owns the channel's buffer; any number of
//! [`Receiver`] clones observe it. Useful for the *fan-out* worker pattern,
//! where one thread distributes jobs to a pool: each value goes to exactly
//! one receiver. This is a work queue, not a broadcast: receivers compete
//! for values.
//!
//! ## Behavior
//!
//! - **Copy asymmetry**: `Receiver` is `Clone`, `Sender` is not. Both are
//!   movable.
//! - **Lifecycle**: dropping the `Sender` destroys the buffer; every later
//!   [`Receiver::recv`] fails with [`RecvError`], permanently. Dropping
//!   receivers is not observable from the sender.
//! - **Ordering**: values leave the buffer in send order; which receiver
//!   gets which value is whatever order their pops won the buffer mutex, no
//!   fairness implied.
//! - **Blocking**: `send` blocks per flavor; `recv` blocks while the channel
//!   is empty.
//!
//! # Examples
//!
//! ```
//! use strand::spmc;
//! use std::thread;
//!
//! let (tx, rx) = spmc::unbounded();
//!
//! let workers: Vec<_> = (0..4)
//!   .map(|_| {
//!     let rx = rx.clone();
//!     thread::spawn(move || rx.recv().unwrap())
//!   })
//!   .collect();
//!
//! for job in 0..4u32 {
//!   tx.send(job);
//! }
//!
//! let mut done: Vec<u32> = workers.into_iter().map(|w| w.join().unwrap()).collect();
//! done.sort_unstable();
//! assert_eq!(done, [0, 1, 2, 3]);
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::RecvError;
use crate::flavor::Flavor;
use crate::internal::buffer::Buffer;
use crate::telemetry;

const LOC_RECV: &str = "spmc::Receiver::recv";
const EVT_SENDER_EXPIRED: &str = "C:SenderExpired";
const CTR_EXPIRED_RECVS: &str = "ExpiredRecvs";

// --- Constructors ---

/// Creates an SPMC channel with the given flavor.
pub fn channel<T>(flavor: Flavor) -> (Sender<T>, Receiver<T>) {
  let tx = Sender::new(flavor);
  let rx = tx.receiver();
  (tx, rx)
}

/// Creates an unbounded SPMC channel. `send` never blocks.
pub fn unbounded<T>() -> (Sender<T>, Receiver<T>) {
  channel(Flavor::Unbounded)
}

/// Creates a bounded SPMC channel. `send` blocks while `capacity` values are
/// buffered; a capacity of zero gives a rendezvous channel.
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
  channel(Flavor::Bounded(capacity))
}

/// Creates a rendezvous SPMC channel. Every `send` blocks until one `recv`
/// has taken the value.
pub fn rendezvous<T>() -> (Sender<T>, Receiver<T>) {
  channel(Flavor::Rendezvous)
}

// --- Sender ---

/// The sending half of an SPMC channel.
///
/// The sender strongly owns the buffer: it exists exactly as long as the
/// sender does. Movable, not cloneable.
pub struct Sender<T> {
  buffer: Arc<Buffer<T>>,
}

impl<T> Sender<T> {
  /// Creates the sending half of a new channel with the given flavor.
  /// Receivers are minted from it with [`Sender::receiver`].
  pub fn new(flavor: Flavor) -> Self {
    Sender {
      buffer: Arc::new(Buffer::new(flavor)),
    }
  }

  /// Derives a new [`Receiver`] connected to this sender.
  pub fn receiver(&self) -> Receiver<T> {
    Receiver {
      buffer: Arc::downgrade(&self.buffer),
    }
  }

  /// Sends a value over the channel.
  ///
  /// Cannot fail: while the sender exists, so does the buffer. Blocks per
  /// flavor: never for unbounded, while the queue is full for bounded, and
  /// until one `recv` has taken the value for rendezvous. If every receiver
  /// has been dropped, a blocking send blocks forever.
  pub fn send(&self, value: T) {
    self.buffer.push(value)
  }

  /// Instantaneous number of buffered values.
  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  /// Whether the channel currently holds no values. A snapshot, like
  /// [`Sender::len`].
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<T> fmt::Debug for Sender<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sender")
      .field("len", &self.len())
      .finish_non_exhaustive()
  }
}

// --- Receiver ---

/// The receiving half of an SPMC channel.
///
/// Holds a weak observer of the buffer, so it can be cloned freely and can
/// detect the sender's disappearance. Each `recv` promotes the observer to a
/// temporary strong reference for the duration of the pop; the buffer can
/// therefore not be destroyed mid-operation.
pub struct Receiver<T> {
  buffer: Weak<Buffer<T>>,
}

impl<T> Receiver<T> {
  /// Receives a value, blocking while the channel is empty. Each value goes
  /// to exactly one receiver.
  ///
  /// # Errors
  ///
  /// Fails with [`RecvError`] if the [`Sender`] has been dropped.
  /// Expiration is permanent: every later recv fails too.
  pub fn recv(&self) -> Result<T, RecvError> {
    match self.buffer.upgrade() {
      Some(buffer) => Ok(buffer.pop()),
      None => {
        telemetry::log_event(None, LOC_RECV, EVT_SENDER_EXPIRED, None);
        telemetry::increment_counter(LOC_RECV, CTR_EXPIRED_RECVS);
        Err(RecvError)
      }
    }
  }

  /// Whether the sending half has been dropped. Once true, stays true.
  pub fn is_expired(&self) -> bool {
    self.buffer.strong_count() == 0
  }
}

impl<T> Clone for Receiver<T> {
  fn clone(&self) -> Self {
    Receiver {
      buffer: Weak::clone(&self.buffer),
    }
  }
}

impl<T> fmt::Debug for Receiver<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Receiver")
      .field("expired", &self.is_expired())
      .finish_non_exhaustive()
  }
}

// --- Channel facade ---

/// Both halves of an SPMC channel bundled into one object.
///
/// Convenient when one owner constructs the channel and hands out receivers;
/// `send` and `recv` delegate to the inner endpoints. Movable, not
/// cloneable.
pub struct Channel<T> {
  tx: Sender<T>,
  rx: Receiver<T>,
}

impl<T> Channel<T> {
  /// Creates a channel of the given flavor with both halves attached.
  pub fn new(flavor: Flavor) -> Self {
    let (tx, rx) = channel(flavor);
    Channel { tx, rx }
  }

  /// Sends a value through the inner sender.
  pub fn send(&self, value: T) {
    self.tx.send(value)
  }

  /// Receives a value through the inner receiver, blocking while the
  /// channel is empty. Cannot actually fail while the facade lives, since
  /// it owns the sender, but keeps the delegated signature.
  pub fn recv(&self) -> Result<T, RecvError> {
    self.rx.recv()
  }

  /// Derives a new [`Receiver`] connected to this channel.
  pub fn receiver(&self) -> Receiver<T> {
    self.tx.receiver()
  }

  /// Instantaneous number of buffered values.
  pub fn len(&self) -> usize {
    self.tx.len()
  }

  /// Whether the channel currently holds no values.
  pub fn is_empty(&self) -> bool {
    self.tx.is_empty()
  }

  /// Splits the facade back into its two endpoints.
  pub fn into_parts(self) -> (Sender<T>, Receiver<T>) {
    (self.tx, self.rx)
  }
}

impl<T> fmt::Debug for Channel<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Channel")
      .field("len", &self.len())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;
  use std::sync::Mutex;
  use std::thread;

  #[test]
  fn send_recv_smoke() {
    let (tx, rx) = unbounded();
    tx.send(10);
    assert_eq!(rx.recv().unwrap(), 10);
  }

  #[test]
  fn receiver_clones_compete_for_values() {
    let (tx, rx1) = unbounded();
    let rx2 = rx1.clone();
    tx.send(1);
    tx.send(2);

    let first = rx1.recv().unwrap();
    let second = rx2.recv().unwrap();
    assert_eq!(
      [first, second].iter().collect::<HashSet<_>>(),
      [1, 2].iter().collect::<HashSet<_>>()
    );
  }

  #[test]
  fn recv_after_sender_drop_fails() {
    let (tx, rx) = unbounded::<i32>();
    let rx2 = rx.clone();
    assert!(!rx.is_expired());
    drop(tx);
    assert!(rx.is_expired());
    assert_eq!(rx.recv(), Err(RecvError));
    // Terminal: clones and retries fail the same way.
    assert_eq!(rx2.recv(), Err(RecvError));
    assert_eq!(rx.recv(), Err(RecvError));
  }

  #[test]
  fn values_delivered_exactly_once() {
    let (tx, rx) = unbounded();
    let seen = Mutex::new(HashSet::new());

    thread::scope(|s| {
      for _ in 0..4 {
        let rx = rx.clone();
        let seen = &seen;
        s.spawn(move || {
          for _ in 0..25 {
            let value = rx.recv().unwrap();
            assert!(seen.lock().unwrap().insert(value), "value delivered twice");
          }
        });
      }
      for i in 0..100 {
        tx.send(i);
      }
    });

    assert_eq!(seen.lock().unwrap().len(), 100);
  }

  #[test]
  fn sender_is_movable() {
    let (tx, rx) = unbounded();
    let handle = thread::spawn(move || tx.send(String::from("hello")));
    assert_eq!(rx.recv().unwrap(), "hello");
    handle.join().unwrap();
  }

  #[test]
  fn facade_delegates() {
    let chan = Channel::new(Flavor::Unbounded);
    chan.send(1);
    let rx = chan.receiver();
    chan.send(2);
    assert_eq!(chan.recv().unwrap(), 1);
    assert_eq!(rx.recv().unwrap(), 2);

    let (tx, rx) = chan.into_parts();
    tx.send(3);
    assert_eq!(rx.recv().unwrap(), 3);
  }

  #[test]
  fn facade_drop_expires_derived_receivers() {
    let chan = Channel::<u8>::new(Flavor::Unbounded);
    let rx = chan.receiver();
    drop(chan);
    assert!(rx.is_expired());
    assert_eq!(rx.recv(), Err(RecvError));
  }
}
