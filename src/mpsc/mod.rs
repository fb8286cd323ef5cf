// src/mpsc/mod.rs

//! Multi-producer, single-consumer channels.
//!
//! The single [`Receiver`] owns the channel's buffer; any number of
//! [`Sender`] clones observe it. Useful for the *fan-in* pattern, where many
//! threads feed work or results to one consumer.
//!
//! ## Behavior
//!
//! - **Copy asymmetry**: `Sender` is `Clone`, `Receiver` is not. Both are
//!   movable.
//! - **Lifecycle**: dropping the `Receiver` destroys the buffer; every later
//!   [`Sender::send`] fails with [`SendError`], permanently. Dropping senders
//!   is not observable: a receiver on an empty channel with no senders left
//!   simply keeps blocking.
//! - **Ordering**: with one receiver, delivery is FIFO per producer, and the
//!   interleaving across producers is whatever order their pushes won the
//!   buffer mutex.
//! - **Blocking**: `send` blocks per flavor (never for unbounded, on a full
//!   queue for bounded, until the matching `recv` for rendezvous); `recv`
//!   blocks while the channel is empty.
//!
//! # Examples
//!
//! ```
//! use strand::mpsc;
//! use std::thread;
//!
//! let (tx, rx) = mpsc::unbounded();
//!
//! let handles: Vec<_> = (0..4u32)
//!   .map(|i| {
//!     let tx = tx.clone();
//!     thread::spawn(move || tx.send(i).unwrap())
//!   })
//!   .collect();
//!
//! let mut received: Vec<u32> = (0..4).map(|_| rx.recv()).collect();
//! received.sort_unstable();
//! assert_eq!(received, [0, 1, 2, 3]);
//!
//! for handle in handles {
//!   handle.join().unwrap();
//! }
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::SendError;
use crate::flavor::Flavor;
use crate::internal::buffer::Buffer;
use crate::telemetry;

const LOC_SEND: &str = "mpsc::Sender::send";
const EVT_RECEIVER_EXPIRED: &str = "S:ReceiverExpired";
const CTR_EXPIRED_SENDS: &str = "ExpiredSends";

// --- Constructors ---

/// Creates an MPSC channel with the given flavor.
pub fn channel<T>(flavor: Flavor) -> (Sender<T>, Receiver<T>) {
  let rx = Receiver::new(flavor);
  let tx = rx.sender();
  (tx, rx)
}

/// Creates an unbounded MPSC channel. `send` never blocks.
pub fn unbounded<T>() -> (Sender<T>, Receiver<T>) {
  channel(Flavor::Unbounded)
}

/// Creates a bounded MPSC channel. `send` blocks while `capacity` values are
/// buffered; a capacity of zero gives a rendezvous channel.
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
  channel(Flavor::Bounded(capacity))
}

/// Creates a rendezvous MPSC channel. Every `send` blocks until the matching
/// `recv` has taken the value.
pub fn rendezvous<T>() -> (Sender<T>, Receiver<T>) {
  channel(Flavor::Rendezvous)
}

// --- Receiver ---

/// The receiving half of an MPSC channel.
///
/// The receiver strongly owns the buffer: it exists exactly as long as the
/// receiver does. Movable, not cloneable.
pub struct Receiver<T> {
  buffer: Arc<Buffer<T>>,
}

impl<T> Receiver<T> {
  /// Creates the receiving half of a new channel with the given flavor.
  /// Senders are minted from it with [`Receiver::sender`].
  pub fn new(flavor: Flavor) -> Self {
    Receiver {
      buffer: Arc::new(Buffer::new(flavor)),
    }
  }

  /// Derives a new [`Sender`] connected to this receiver.
  pub fn sender(&self) -> Sender<T> {
    Sender {
      buffer: Arc::downgrade(&self.buffer),
    }
  }

  /// Receives a value, blocking while the channel is empty.
  ///
  /// Cannot fail: while the receiver exists, so does the buffer. If every
  /// sender has been dropped and the channel is empty, this call blocks
  /// forever.
  pub fn recv(&self) -> T {
    self.buffer.pop()
  }

  /// Instantaneous number of buffered values.
  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  /// Whether the channel currently holds no values. A snapshot, like
  /// [`Receiver::len`].
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<T> fmt::Debug for Receiver<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Receiver")
      .field("len", &self.len())
      .finish_non_exhaustive()
  }
}

// --- Sender ---

/// The sending half of an MPSC channel.
///
/// Holds a weak observer of the buffer, so it can be cloned freely and can
/// detect the receiver's disappearance. Each `send` promotes the observer to
/// a temporary strong reference for the duration of the push; the buffer can
/// therefore not be destroyed mid-operation.
pub struct Sender<T> {
  buffer: Weak<Buffer<T>>,
}

impl<T> Sender<T> {
  /// Sends a value over the channel.
  ///
  /// Blocks per flavor: never for unbounded, while the queue is full for
  /// bounded, and until the matching `recv` has taken the value for
  /// rendezvous.
  ///
  /// # Errors
  ///
  /// Fails with [`SendError`], returning the value, if the [`Receiver`] has
  /// been dropped. Expiration is permanent: every later send fails too.
  pub fn send(&self, value: T) -> Result<(), SendError<T>> {
    match self.buffer.upgrade() {
      Some(buffer) => {
        buffer.push(value);
        Ok(())
      }
      None => {
        telemetry::log_event(None, LOC_SEND, EVT_RECEIVER_EXPIRED, None);
        telemetry::increment_counter(LOC_SEND, CTR_EXPIRED_SENDS);
        Err(SendError(value))
      }
    }
  }

  /// Whether the receiving half has been dropped. Once true, stays true.
  pub fn is_expired(&self) -> bool {
    self.buffer.strong_count() == 0
  }
}

impl<T> Clone for Sender<T> {
  fn clone(&self) -> Self {
    Sender {
      buffer: Weak::clone(&self.buffer),
    }
  }
}

impl<T> fmt::Debug for Sender<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Sender")
      .field("expired", &self.is_expired())
      .finish_non_exhaustive()
  }
}

// --- Channel facade ---

/// Both halves of an MPSC channel bundled into one object.
///
/// Convenient when one owner constructs the channel and hands out senders;
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

  /// Sends a value through the inner sender. Cannot actually fail while the
  /// facade lives, since it owns the receiver, but keeps the delegated
  /// signature.
  pub fn send(&self, value: T) -> Result<(), SendError<T>> {
    self.tx.send(value)
  }

  /// Receives a value through the inner receiver, blocking while the
  /// channel is empty.
  pub fn recv(&self) -> T {
    self.rx.recv()
  }

  /// Derives a new [`Sender`] connected to this channel.
  pub fn sender(&self) -> Sender<T> {
    self.rx.sender()
  }

  /// Instantaneous number of buffered values.
  pub fn len(&self) -> usize {
    self.rx.len()
  }

  /// Whether the channel currently holds no values.
  pub fn is_empty(&self) -> bool {
    self.rx.is_empty()
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
