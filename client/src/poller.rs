//! Background refresh loop for a read view.
//!
//! A `Poller` runs `tick` once immediately and then every `interval` on its
//! own thread until it is stopped or dropped. `refresh` cuts the current wait
//! short, which is how confirmed transactions trigger an immediate re-fetch.

use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct Flags {
    stop: bool,
    refresh: bool,
}

#[derive(Default)]
struct Signal {
    flags: Mutex<Flags>,
    wake: Condvar,
}

impl Signal {
    fn raise(&self, set: impl FnOnce(&mut Flags)) {
        let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        set(&mut flags);
        self.wake.notify_all();
    }

    /// Sleep for `interval` or until signalled. Returns false once stopped.
    fn wait(&self, interval: Duration) -> bool {
        let flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut flags, _) = self
            .wake
            .wait_timeout_while(flags, interval, |flags| !flags.stop && !flags.refresh)
            .unwrap_or_else(PoisonError::into_inner);
        flags.refresh = false;
        !flags.stop
    }
}

/// Cloneable trigger for an immediate tick.
#[derive(Clone)]
pub struct RefreshHandle(Arc<Signal>);

impl RefreshHandle {
    pub fn refresh(&self) {
        self.0.raise(|flags| flags.refresh = true);
    }
}

pub struct Poller {
    name: String,
    signal: Arc<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn start<F>(name: &str, interval: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let signal = Arc::new(Signal::default());
        let worker_signal = signal.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || loop {
                tick();
                if !worker_signal.wait(interval) {
                    break;
                }
            })?;
        debug!(poller = name, ?interval, "poller started");
        Ok(Poller {
            name: name.to_string(),
            signal,
            handle: Some(handle),
        })
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle(self.signal.clone())
    }

    pub fn refresh(&self) {
        self.refresh_handle().refresh();
    }

    /// Stop the loop and wait for the in-progress tick, if any, to finish.
    pub fn stop(&mut self) {
        self.signal.raise(|flags| flags.stop = true);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                debug!(poller = %self.name, "poller thread panicked");
            }
            debug!(poller = %self.name, "poller stopped");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
