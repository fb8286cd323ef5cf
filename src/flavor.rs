// src/flavor.rs

//! Buffering flavor selection.

/// The buffering discipline backing a channel, fixed at construction.
///
/// Every channel constructor takes a `Flavor` (or uses one of the
/// per-flavor shorthands like [`mpsc::unbounded`](crate::mpsc::unbounded)).
/// The flavor decides when `send` blocks; `recv` blocks on an empty channel
/// under every flavor.
///
/// # Examples
///
/// ```
/// use strand::{mpsc, Flavor};
///
/// let (tx, rx) = mpsc::channel::<u32>(Flavor::Bounded(8));
/// tx.send(7).unwrap();
/// assert_eq!(rx.recv(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
  /// A FIFO queue with no capacity limit. `send` never blocks; memory grows
  /// with queue depth.
  Unbounded,
  /// A FIFO queue with the given capacity. `send` blocks while the queue is
  /// full. A capacity of zero degenerates to [`Flavor::Rendezvous`],
  /// preserving the convention that a zero-size synchronous channel is a
  /// hand-off.
  Bounded(usize),
  /// A zero-capacity hand-off. `send` returns only after a `recv` has taken
  /// the value, making every exchange a synchronization point between the
  /// two threads.
  Rendezvous,
}

impl Default for Flavor {
  /// Defaults to [`Flavor::Unbounded`], the flavor a bare constructor gives.
  fn default() -> Self {
    Flavor::Unbounded
  }
}
