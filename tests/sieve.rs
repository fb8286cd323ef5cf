//! Prime-sieve cascade: a chain of worker threads connected by bounded SPMC
//! channels. Each worker drops multiples of its own prime and forwards the
//! rest to a child worker bound to the first value that gets through; a
//! negative sentinel propagates down the chain and terminates every worker.
//! The set of spawned worker ids is exactly the primes in range.

use strand::{spmc, Flavor};

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

const STOP: i64 = -1;

fn spawn_worker(
  id: i64,
  rx: spmc::Receiver<i64>,
  spawned: Arc<Mutex<Vec<i64>>>,
) -> JoinHandle<()> {
  spawned.lock().unwrap().push(id);

  thread::spawn(move || {
    let tx = spmc::Sender::new(Flavor::Bounded(1));
    let mut child: Option<JoinHandle<()>> = None;

    loop {
      let value = rx.recv().expect("parent worker vanished without sentinel");
      if value < 0 {
        break;
      }
      if value % id == 0 {
        continue;
      }
      if child.is_none() {
        child = Some(spawn_worker(value, tx.receiver(), Arc::clone(&spawned)));
      }
      tx.send(value);
    }

    if let Some(child) = child {
      tx.send(STOP);
      child.join().expect("child worker panicked");
    }
  })
}

#[test]
fn cascade_spawns_one_worker_per_prime() {
  let n = 30;
  let spawned = Arc::new(Mutex::new(Vec::new()));

  let tx = spmc::Sender::new(Flavor::Bounded(1));
  let root = spawn_worker(2, tx.receiver(), Arc::clone(&spawned));

  for i in 3..n {
    tx.send(i);
  }
  tx.send(STOP);

  root.join().expect("root worker panicked");

  let mut ids = spawned.lock().unwrap().clone();
  ids.sort_unstable();
  assert_eq!(ids, [2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
}
