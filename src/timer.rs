/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Background one-shot alarm used by clients of the core (never by the
//! scheduling algorithms themselves). A dedicated thread waits on a
//! condition variable until either the deadline elapses or it is woken
//! by `set`/`unset`/`update_relative`; exactly zero or one callback fires
//! per arming.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

enum Command {
    Arm(Instant),
    Disarm,
    Shutdown,
}

struct Shared {
    command: Mutex<Option<Command>>,
    signal: Condvar,
}

/// A single-alarm background timer. Dropping it stops the worker thread.
pub struct Timer {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    /// Spawns the worker thread; `on_fire` runs on the timer thread
    /// whenever an armed deadline elapses without being superseded.
    pub fn new<F>(on_fire: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let shared = Arc::new(Shared { command: Mutex::new(None), signal: Condvar::new() });
        let worker_shared = Arc::clone(&shared);

        let handle = std::thread::spawn(move || {
            let mut deadline: Option<Instant> = None;
            loop {
                let mut guard = worker_shared.command.lock().unwrap();
                loop {
                    match guard.take() {
                        Some(Command::Arm(at)) => {
                            deadline = Some(at);
                            break;
                        }
                        Some(Command::Disarm) => {
                            deadline = None;
                            break;
                        }
                        Some(Command::Shutdown) => return,
                        None => {
                            if let Some(at) = deadline {
                                let now = Instant::now();
                                if now >= at {
                                    break;
                                }
                                let (g, timeout) =
                                    worker_shared.signal.wait_timeout(guard, at - now).unwrap();
                                guard = g;
                                if timeout.timed_out() && guard.is_none() {
                                    break;
                                }
                            } else {
                                guard = worker_shared.signal.wait(guard).unwrap();
                            }
                        }
                    }
                }
                drop(guard);

                if let Some(at) = deadline {
                    if Instant::now() >= at {
                        deadline = None;
                        on_fire();
                    }
                }
            }
        });

        Timer { shared, handle: Some(handle) }
    }

    fn send(&self, command: Command) {
        *self.shared.command.lock().unwrap() = Some(command);
        self.shared.signal.notify_one();
    }

    /// Arms the timer to fire after `delay` from now, replacing any
    /// pending arming.
    pub fn set(&self, delay: Duration) {
        self.send(Command::Arm(Instant::now() + delay));
    }

    /// Cancels any pending arming. A no-op if the timer was not armed.
    pub fn unset(&self) {
        self.send(Command::Disarm);
    }

    /// Re-arms relative to now, same as calling `unset` then `set`.
    pub fn update_relative(&self, delay: Duration) {
        self.set(delay);
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn fires_once_after_delay() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let timer = Timer::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        timer.set(Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unset_prevents_fire() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let timer = Timer::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        timer.set(Duration::from_millis(30));
        timer.unset();
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn update_relative_reschedules() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let timer = Timer::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        timer.set(Duration::from_millis(10));
        timer.update_relative(Duration::from_millis(60));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), 0, "original deadline must have been superseded");
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
