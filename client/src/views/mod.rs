//! Polled read views.
//!
//! Each view is a pure fetch function plus a `LiveView` cell that a
//! `Poller` keeps current. A failed read leaves the cell `Unavailable`, which
//! renders as a placeholder until the next tick succeeds.

pub mod market;
pub mod rewards;

use crate::chain::{ChainReader, ChainWriter};
use crate::flows::TransactionSequencer;
use crate::poller::{Poller, RefreshHandle};
use kardia_mining::Result;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

pub use market::*;
pub use rewards::*;

/// Shown in place of a value whose last read failed.
pub const PLACEHOLDER: &str = "--";
/// Shown before the first read completes.
pub const SYNCING: &str = "SYNCING...";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    Unavailable,
}

impl<T> ViewState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn render<F>(&self, show: F) -> String
    where
        F: FnOnce(&T) -> String,
    {
        match self {
            ViewState::Loading => SYNCING.to_string(),
            ViewState::Ready(value) => show(value),
            ViewState::Unavailable => PLACEHOLDER.to_string(),
        }
    }
}

/// Shared cell holding the latest state of one view.
pub struct LiveView<T> {
    name: &'static str,
    state: Arc<Mutex<ViewState<T>>>,
}

impl<T> Clone for LiveView<T> {
    fn clone(&self) -> Self {
        LiveView {
            name: self.name,
            state: self.state.clone(),
        }
    }
}

impl<T: Clone> LiveView<T> {
    pub fn new(name: &'static str) -> Self {
        LiveView {
            name,
            state: Arc::new(Mutex::new(ViewState::Loading)),
        }
    }

    pub fn update(&self, fetched: Result<T>) {
        let next = match fetched {
            Ok(value) => ViewState::Ready(value),
            Err(err) => {
                debug!(view = self.name, error = %err, "read failed, showing placeholder");
                ViewState::Unavailable
            }
        };
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub fn get(&self) -> ViewState<T> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Keep a fresh `LiveView` by running `fetch` on a poller thread.
pub fn poll_view<T, F>(
    name: &'static str,
    interval: Duration,
    mut fetch: F,
) -> io::Result<(LiveView<T>, Poller)>
where
    T: Clone + Send + 'static,
    F: FnMut() -> Result<T> + Send + 'static,
{
    let view = LiveView::new(name);
    let cell = view.clone();
    let poller = Poller::start(name, interval, move || cell.update(fetch()))?;
    Ok((view, poller))
}

/// Re-fetch the given views whenever the sequencer confirms a transaction.
pub fn refresh_on_confirmed<C>(sequencer: &TransactionSequencer<C>, handles: Vec<RefreshHandle>)
where
    C: ChainReader + ChainWriter,
{
    sequencer.subscribe(move |event| {
        if event.invalidates_views() {
            for handle in &handles {
                handle.refresh();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::Action;
    use crate::instructions::token_instructions::APPROVE;
    use crate::test_utils::{addr, test_config, tokens, FixedClock, MockChain};
    use kardia_mining::ErrorCode;
    use std::sync::mpsc;

    #[test]
    fn failed_read_shows_placeholder_until_next_success() {
        let view = LiveView::<u64>::new("test");
        assert_eq!(view.get().render(|v| v.to_string()), SYNCING);

        view.update(Ok(7));
        assert_eq!(view.get(), ViewState::Ready(7));

        view.update(Err(ErrorCode::ReadFailure("timeout".into())));
        assert_eq!(view.get().render(|v| v.to_string()), PLACEHOLDER);

        view.clone().update(Ok(8));
        assert_eq!(view.get().ready(), Some(&8));
    }

    #[test]
    fn confirmed_transaction_refreshes_views() {
        let chain = Arc::new(MockChain::default());
        let sequencer = TransactionSequencer::new(
            chain.clone(),
            Arc::new(FixedClock::at(1)),
            Arc::new(test_config()),
        );
        let (tx, rx) = mpsc::channel();
        let (_view, poller) = poll_view("test", Duration::from_secs(3_600), move || {
            let _ = tx.send(());
            Ok(0u64)
        })
        .unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        refresh_on_confirmed(&sequencer, vec![poller.refresh_handle()]);

        chain.fail_send(APPROVE, ErrorCode::UserRejected);
        assert!(sequencer.execute(addr(0x0E), Action::Stake(tokens(1))).is_err());
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        chain.clear_failures();
        sequencer.execute(addr(0x0E), Action::Stake(tokens(1))).unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
}
