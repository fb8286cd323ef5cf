// src/error.rs

//! The two ways a channel operation can fail.
//!
//! Expiration is terminal: once the strong side of a channel is gone, every
//! later operation through any observer endpoint fails the same way. The
//! strong side itself never sees an error: its counterpart disappearing is
//! an ordinary lifecycle event, observed only on the next operation.

use core::fmt;

/// Error returned by [`mpsc::Sender::send`](crate::mpsc::Sender::send) when
/// the receiving half of the channel has been dropped.
///
/// The unsent value is handed back to the caller.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct SendError<T>(pub(crate) T);

impl<T> SendError<T> {
  /// Consumes the error, returning the value that could not be sent.
  #[inline]
  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T> fmt::Debug for SendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("SendError(..)")
  }
}

impl<T> fmt::Display for SendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("receiver is expired")
  }
}

impl<T> std::error::Error for SendError<T> {}

/// Error returned by [`spmc::Receiver::recv`](crate::spmc::Receiver::recv)
/// when the sending half of the channel has been dropped.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RecvError;

impl fmt::Display for RecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("sender is expired")
  }
}

impl std::error::Error for RecvError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn send_error_returns_value() {
    let err = SendError(41);
    assert_eq!(err.into_inner(), 41);
  }

  #[test]
  fn send_error_debug_hides_value() {
    struct Opaque;
    let err = SendError(Opaque);
    assert_eq!(format!("{:?}", err), "SendError(..)");
  }

  #[test]
  fn display_texts() {
    assert_eq!(SendError(()).to_string(), "receiver is expired");
    assert_eq!(RecvError.to_string(), "sender is expired");
  }
}
