// src/telemetry.rs

//! Opt-in event recording for debugging channel interleavings.
//!
//! With the `strand_telemetry` feature enabled, instrumented points in the
//! buffer and topology layers record sequence-numbered events (parks, wakes,
//! hand-offs, expirations) and counters into a global collector, and
//! [`print_telemetry_report`] dumps them in chronological order. With the
//! feature disabled (the default), every entry point is an inlined no-op.

#[cfg(feature = "strand_telemetry")]
mod enabled {
  use std::collections::HashMap;
  use std::fmt;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;
  use std::thread::{self, ThreadId};
  use std::time::Instant;

  static NEXT_EVENT_SEQUENCE_ID: AtomicUsize = AtomicUsize::new(0);

  /// One recorded channel event: a park, a wake, a hand-off, an expiration.
  #[derive(Clone)]
  pub struct ChannelEvent {
    /// Global sequence number, totally ordering all recorded events.
    pub seq_id: usize,
    /// When the event was recorded.
    pub timestamp: Instant,
    /// The thread the event happened on.
    pub os_thread_id: ThreadId,
    /// Optional id of the value involved, when the call site has one.
    pub item_id: Option<usize>,
    /// Code location, e.g. `Buffer::push`.
    pub location: &'static str,
    /// Event tag, e.g. `P:WaitNotFull`.
    pub event_type: &'static str,
    /// Optional free-form detail.
    pub message: Option<String>,
  }

  impl fmt::Debug for ChannelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("ChannelEvent")
        .field("seq", &self.seq_id)
        .field("os_tid", &self.os_thread_id)
        .field("item_id", &self.item_id)
        .field("loc", &self.location)
        .field("evt", &self.event_type)
        .field("msg", &self.message.as_deref().unwrap_or(""))
        .finish()
    }
  }

  type CounterKey = (&'static str, &'static str);

  struct CollectorData {
    events: Vec<ChannelEvent>,
    counters: HashMap<CounterKey, usize>,
    start_time: Instant,
  }

  impl CollectorData {
    fn new() -> Self {
      CollectorData {
        events: Vec::new(),
        counters: HashMap::new(),
        start_time: Instant::now(),
      }
    }
  }

  lazy_static::lazy_static! {
    static ref GLOBAL_COLLECTOR: Mutex<CollectorData> = Mutex::new(CollectorData::new());
  }

  /// Records one event into the global collector.
  pub fn log_event_fn(
    item_id: Option<usize>,
    location: &'static str,
    event_type: &'static str,
    message: Option<String>,
  ) {
    let event = ChannelEvent {
      seq_id: NEXT_EVENT_SEQUENCE_ID.fetch_add(1, Ordering::Relaxed),
      timestamp: Instant::now(),
      os_thread_id: thread::current().id(),
      item_id,
      location,
      event_type,
      message,
    };

    if let Ok(mut collector) = GLOBAL_COLLECTOR.lock() {
      collector.events.push(event);
    } else {
      eprintln!("[STRAND TELEMETRY] collector mutex poisoned while recording event");
    }
  }

  /// Bumps a named counter for `location`.
  pub fn increment_counter_fn(location: &'static str, counter_name: &'static str) {
    if let Ok(mut collector) = GLOBAL_COLLECTOR.lock() {
      *collector.counters.entry((location, counter_name)).or_insert(0) += 1;
    } else {
      eprintln!("[STRAND TELEMETRY] collector mutex poisoned while incrementing counter");
    }
  }

  /// Prints every recorded event in sequence order, then the counters.
  pub fn print_telemetry_report_fn() {
    if let Ok(collector) = GLOBAL_COLLECTOR.lock() {
      println!("\n--- Strand Telemetry Report ---");

      if collector.events.is_empty() {
        println!("[Events] none recorded");
      } else {
        println!("[Events] {} recorded:", collector.events.len());
        let mut sorted_events = collector.events.clone();
        sorted_events.sort_by_key(|e| e.seq_id);
        for event in sorted_events.iter() {
          let since_start = event.timestamp.duration_since(collector.start_time);
          println!(
            "  +{:<10.6}s [seq:{:<5}] tid:{:<18} item:{:<6} {:<22} {:<20} {}",
            since_start.as_secs_f64(),
            event.seq_id,
            format!("{:?}", event.os_thread_id),
            event.item_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            event.location,
            event.event_type,
            event.message.as_deref().unwrap_or("")
          );
        }
      }

      if collector.counters.is_empty() {
        println!("[Counters] none recorded");
      } else {
        println!("[Counters] {} recorded:", collector.counters.len());
        let mut sorted_counters: Vec<_> = collector.counters.iter().collect();
        sorted_counters.sort_by_key(|(key, _)| *key);
        for ((location, name), count) in sorted_counters {
          println!("  {:<22} {:<22} {}", location, name, count);
        }
      }
      println!("--- End of Telemetry Report ---");
    } else {
      eprintln!("[STRAND TELEMETRY] collector mutex poisoned, cannot print report");
    }
  }

  /// Clears all recorded events and counters and restarts the clock.
  pub fn clear_telemetry_fn() {
    if let Ok(mut collector) = GLOBAL_COLLECTOR.lock() {
      collector.events.clear();
      collector.counters.clear();
      collector.start_time = Instant::now();
    } else {
      eprintln!("[STRAND TELEMETRY] collector mutex poisoned, cannot clear data");
    }
    NEXT_EVENT_SEQUENCE_ID.store(0, Ordering::Relaxed);
  }
}

#[cfg(not(feature = "strand_telemetry"))]
mod disabled {
  /// No-op stand-in; enable `strand_telemetry` to record events.
  #[inline(always)]
  pub fn log_event_fn(
    _item_id: Option<usize>,
    _location: &'static str,
    _event_type: &'static str,
    _message: Option<String>,
  ) {
  }

  /// No-op stand-in; enable `strand_telemetry` to record counters.
  #[inline(always)]
  pub fn increment_counter_fn(_location: &'static str, _counter_name: &'static str) {}

  /// No-op stand-in; enable `strand_telemetry` to print a report.
  #[inline(always)]
  pub fn print_telemetry_report_fn() {}

  /// No-op stand-in; enable `strand_telemetry` to clear recorded data.
  #[inline(always)]
  pub fn clear_telemetry_fn() {}
}

#[cfg(feature = "strand_telemetry")]
pub use enabled::{
  clear_telemetry_fn as clear_telemetry, increment_counter_fn as increment_counter,
  log_event_fn as log_event, print_telemetry_report_fn as print_telemetry_report, ChannelEvent,
};

#[cfg(not(feature = "strand_telemetry"))]
pub use disabled::{
  clear_telemetry_fn as clear_telemetry, increment_counter_fn as increment_counter,
  log_event_fn as log_event, print_telemetry_report_fn as print_telemetry_report,
};
