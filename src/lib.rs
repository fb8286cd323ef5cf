// src/lib.rs

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! Blocking channels for communicating between OS threads.
//!
//! Strand provides two channel topologies, each in three buffering flavors:
//!
//! | | [`mpsc`] | [`spmc`] |
//! |---|---|---|
//! | copyable side | `Sender` | `Receiver` |
//! | owning side | `Receiver` | `Sender` |
//! | fallible op | `send` ([`SendError`]) | `recv` ([`RecvError`]) |
//!
//! and [`Flavor`] selects unbounded, bounded, or rendezvous buffering at
//! construction. Every operation is synchronous: endpoints block on the
//! channel's internal condition variables until the operation can complete,
//! and there is no async surface, no timeouts, and no select.
//!
//! The non-copyable endpoint owns the channel's buffer; the copyable side
//! holds a weak observer of it. Dropping the owner is the only close
//! protocol: observers find out on their next operation, which fails with
//! the matching expiration error, permanently.
//!
//! # Examples
//!
//! ```
//! use strand::mpsc;
//! use std::thread;
//!
//! // A rendezvous channel makes every exchange a synchronization point.
//! let (tx, rx) = mpsc::rendezvous();
//!
//! let consumer = thread::spawn(move || rx.recv());
//!
//! // Returns only once the consumer has taken the value.
//! tx.send("handshake").unwrap();
//!
//! assert_eq!(consumer.join().unwrap(), "handshake");
//! ```

pub mod error;
pub mod mpsc;
pub mod spmc;
pub mod telemetry;

mod flavor;
mod internal;

pub use error::{RecvError, SendError};
pub use flavor::Flavor;
