//! Per-view state controller.
//!
//! Mounting a view spawns one task that owns the view's state. The task issues the
//! initial fetch, applies completions, and re-schedules a fetch `poll_interval` after
//! every completion while the last good snapshot is still active. A failed poll keeps
//! the schedule; a failed mount fetch does not. Every fetch carries a generation
//! number; a completion is applied only if its generation is the one the controller
//! is waiting for, so superseded results can never overwrite newer state.
//!
//! At most one fetch per generation chain is outstanding: a refresh requested while a
//! fetch is in flight is queued and issued right after that fetch completes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use runboard_api_client::ApiError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::source::ResourceSource;
use crate::state::ViewState;

enum Command<S> {
    /// Refresh request carrying the handle's ticket number.
    Refresh(u64),
    Remount(Arc<S>),
}

struct Completion<T> {
    generation: u64,
    result: Result<T, ApiError>,
}

/// Highest refresh ticket covered by an applied fetch, with the state that fetch produced.
type Served<T> = (u64, ViewState<T>);

/// Handle to a mounted view. Dropping it unmounts the view.
pub struct ViewHandle<S: ResourceSource> {
    commands: mpsc::UnboundedSender<Command<S>>,
    state: watch::Receiver<ViewState<S::Output>>,
    served: watch::Receiver<Served<S::Output>>,
    requested: AtomicU64,
    source: Mutex<Arc<S>>,
    task: JoinHandle<()>,
}

impl<S: ResourceSource> ViewHandle<S> {
    /// Mount a view: enter `Loading` and issue the first fetch.
    pub fn mount(source: S, poll_interval: Duration) -> Self {
        let source = Arc::new(source);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ViewState::Idle);
        let (served_tx, served_rx) = watch::channel((0, ViewState::Idle));

        let task = tokio::spawn(run(
            Arc::clone(&source),
            poll_interval,
            commands_rx,
            state_tx,
            served_tx,
        ));

        Self {
            commands: commands_tx,
            state: state_rx,
            served: served_rx,
            requested: AtomicU64::new(0),
            source: Mutex::new(source),
            task,
        }
    }

    /// Re-issue the fetch from whatever state the view is in (manual retry or an
    /// out-of-band refresh after a user action).
    pub fn refresh(&self) {
        let ticket = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
        if self.commands.send(Command::Refresh(ticket)).is_err() {
            tracing::debug!("Refresh requested on a stopped view");
        }
    }

    /// Point the view at another resource (identifier change).
    pub fn remount(&self, source: S) {
        let source = Arc::new(source);
        *self.source.lock().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&source);
        if self.commands.send(Command::Remount(source)).is_err() {
            tracing::debug!("Remount requested on a stopped view");
        }
    }

    /// The resource the view currently shows (the latest mount or remount).
    pub fn source(&self) -> Arc<S> {
        Arc::clone(&self.source.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn state(&self) -> ViewState<S::Output> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<S::Output>> {
        self.state.clone()
    }

    /// Wait until the view shows either data or an error.
    pub async fn settled(&self) -> ViewState<S::Output> {
        let mut receiver = self.state.clone();
        let settled = match receiver.wait_for(|state| state.is_settled()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Wait until a fetch issued after every `refresh()` made so far has been applied,
    /// and return the state it produced.
    ///
    /// A fetch that was already in flight when the refresh arrived does not count.
    pub async fn caught_up(&self) -> ViewState<S::Output> {
        let target = self.requested.load(Ordering::SeqCst);
        let mut receiver = self.served.clone();
        let caught_up = match receiver.wait_for(|(ticket, _)| *ticket >= target).await {
            Ok(served) => served.1.clone(),
            Err(_) => self.state(),
        };
        caught_up
    }

    /// Stop the view: cancels any pending poll timer; completions of fetches still in
    /// flight are ignored.
    pub fn unmount(self) {
        self.task.abort();
    }
}

impl<S: ResourceSource> Drop for ViewHandle<S> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Controller<S: ResourceSource> {
    source: Arc<S>,
    poll_interval: Duration,
    generation: u64,
    /// Generation of the outstanding fetch and the refresh ticket it covers.
    in_flight: Option<(u64, u64)>,
    refresh_queued: bool,
    /// Highest refresh ticket received so far.
    latest_ticket: u64,
    /// Whether the last applied snapshot asked for polling.
    polling: bool,
    next_poll: Option<Instant>,
    state: watch::Sender<ViewState<S::Output>>,
    served: watch::Sender<Served<S::Output>>,
    completions: mpsc::UnboundedSender<Completion<S::Output>>,
}

impl<S: ResourceSource> Controller<S> {
    fn issue(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        self.in_flight = Some((generation, self.latest_ticket));
        self.next_poll = None;
        self.state.send_replace(ViewState::Loading);

        tracing::debug!(view = %self.source.key(), generation, "Issuing fetch");

        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = source.fetch().await;
            // The receiver is gone once the view has been unmounted.
            let _ = completions.send(Completion { generation, result });
        });
    }

    fn request_refresh(&mut self) {
        if let Some((generation, _)) = self.in_flight {
            tracing::debug!(
                view = %self.source.key(),
                generation,
                "Fetch in flight, queueing refresh"
            );
            self.refresh_queued = true;
        } else {
            self.issue();
        }
    }

    fn remount(&mut self, source: Arc<S>) {
        tracing::debug!(from = %self.source.key(), to = %source.key(), "Remounting view");
        self.source = source;
        self.refresh_queued = false;
        self.polling = false;
        self.issue();
    }

    fn complete(&mut self, completion: Completion<S::Output>) {
        let covered = match self.in_flight {
            Some((generation, covered)) if generation == completion.generation => covered,
            _ => {
                tracing::debug!(
                    view = %self.source.key(),
                    generation = completion.generation,
                    current = self.generation,
                    "Discarding superseded fetch result"
                );
                return;
            }
        };
        self.in_flight = None;

        let applied = match completion.result {
            Ok(snapshot) => {
                self.polling = self.source.should_poll(&snapshot);
                ViewState::Ready(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    view = %self.source.key(),
                    error = %e,
                    polling = self.polling,
                    "Fetch failed"
                );
                ViewState::Failed(e.to_string())
            }
        };
        self.next_poll = self
            .polling
            .then(|| Instant::now() + self.poll_interval);
        self.state.send_replace(applied.clone());
        self.served.send_replace((covered, applied));

        if self.refresh_queued {
            self.refresh_queued = false;
            self.issue();
        } else if self.next_poll.is_none() {
            tracing::debug!(view = %self.source.key(), "View settled, no poll scheduled");
        }
    }
}

async fn run<S: ResourceSource>(
    source: Arc<S>,
    poll_interval: Duration,
    mut commands: mpsc::UnboundedReceiver<Command<S>>,
    state: watch::Sender<ViewState<S::Output>>,
    served: watch::Sender<Served<S::Output>>,
) {
    let (completions_tx, mut completions_rx) = mpsc::unbounded_channel();
    let mut controller = Controller {
        source,
        poll_interval,
        generation: 0,
        in_flight: None,
        refresh_queued: false,
        latest_ticket: 0,
        polling: false,
        next_poll: None,
        state,
        served,
        completions: completions_tx,
    };

    controller.issue();

    loop {
        let poll_at = controller.next_poll;
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Refresh(ticket)) => {
                    controller.latest_ticket = controller.latest_ticket.max(ticket);
                    controller.request_refresh();
                }
                Some(Command::Remount(source)) => controller.remount(source),
                None => break,
            },
            Some(completion) = completions_rx.recv() => controller.complete(completion),
            _ = sleep_until(poll_at.unwrap_or_else(Instant::now)), if poll_at.is_some() => {
                tracing::debug!(view = %controller.source.key(), "Poll tick");
                controller.request_refresh();
            }
        }
    }

    tracing::debug!(view = %controller.source.key(), "View stopped");
}
