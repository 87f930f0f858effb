//! Reads integers from stdin and echoes them from a consumer thread.
//!
//! Run: cargo run -p stratum-queue --example spsc_echo
//! Enter `0` to exit. `RUST_LOG=trace` shows the queue being built.

use std::io::{self, BufRead};
use std::thread;

use stratum_queue::spsc;
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Please write some integer numbers. Enter '0' to exit...");

    let (mut tx, mut rx) = spsc::ring_queue::<i64>(1024);

    let consumer = thread::spawn(move || {
        loop {
            let Some(item) = rx.dequeue() else {
                // Stdin closed before a 0 arrived
                if rx.is_disconnected() && rx.is_empty() {
                    break;
                }
                thread::yield_now();
                continue;
            };

            println!("Your entered number: {item}");
            if item == 0 {
                break;
            }
        }
    });

    for line in io::stdin().lock().lines() {
        let line = line?;
        let mut item = match line.trim().parse::<i64>() {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(input = %line.trim(), error = %e, "not an integer");
                continue;
            }
        };
        let stop = item == 0;

        while let Err(full) = tx.enqueue(item) {
            item = full.into_inner();
            thread::yield_now();
        }

        if stop {
            break;
        }
    }

    drop(tx);
    consumer
        .join()
        .map_err(|_| io::Error::other("consumer thread panicked"))
}
