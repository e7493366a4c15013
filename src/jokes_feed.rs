//! Rolling list of recently fetched jokes.
//!
//! Network work runs on the tokio runtime and reports back over a channel;
//! the UI thread drains it with [`JokesFeed::poll`] once per frame, the same
//! way the window polls any other background load.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;

use crate::cancel::CancelToken;
use crate::chuck_client::{fetch_batch, JokeSource};
use crate::list_rules::{insert_bounded, ROLLING_LIST_CAPACITY};
use crate::models::{FetchClock, Joke, JokeItem};

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub batch_size: usize,
    pub capacity: usize,
    pub refresh_interval: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            capacity: ROLLING_LIST_CAPACITY,
            refresh_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub items: Vec<JokeItem>,
    pub loading: bool,
    /// Set when the initial batch failed; the list stays hidden until a retry.
    pub error: Option<String>,
    /// Last failed refresh tick. Does not hide the list.
    pub tick_error: Option<String>,
    pub running: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedNotice {
    BatchFailed(String),
    TickFailed(String),
}

#[derive(Debug)]
enum FeedEvent {
    BatchLoaded {
        generation: u64,
        jokes: Vec<Joke>,
        first_fetched_at: i64,
    },
    BatchFailed {
        generation: u64,
        message: String,
    },
    Ticked {
        ticker: u64,
        item: JokeItem,
    },
    TickFailed {
        ticker: u64,
        message: String,
    },
}

struct Ticker {
    id: u64,
    cancel: CancelToken,
    running: Arc<AtomicBool>,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

pub struct JokesFeed<S: JokeSource> {
    source: Arc<S>,
    runtime: Handle,
    settings: FeedSettings,
    clock: Arc<FetchClock>,
    state: FeedState,
    tx: Sender<FeedEvent>,
    rx: Receiver<FeedEvent>,
    batch_generation: u64,
    batch_cancel: Option<CancelToken>,
    ticker: Option<Ticker>,
    next_ticker_id: u64,
    waker: Option<Waker>,
}

impl<S: JokeSource> JokesFeed<S> {
    pub fn new(source: Arc<S>, runtime: Handle, settings: FeedSettings) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            runtime,
            settings,
            clock: Arc::new(FetchClock::new()),
            state: FeedState::default(),
            tx,
            rx,
            batch_generation: 0,
            batch_cancel: None,
            ticker: None,
            next_ticker_id: 1,
            waker: None,
        }
    }

    /// Called from background tasks whenever a result is queued, so the UI
    /// can schedule a repaint.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Fetches a fresh batch, replacing the list once every joke arrived.
    /// A batch still in flight is cancelled and its result ignored.
    pub fn load_initial(&mut self) {
        if let Some(previous) = self.batch_cancel.take() {
            previous.cancel();
        }
        self.batch_generation += 1;
        self.state.loading = true;
        self.state.error = None;

        let cancel = CancelToken::new();
        self.batch_cancel = Some(cancel.clone());

        let generation = self.batch_generation;
        let count = self.settings.batch_size;
        let source = self.source.clone();
        let clock = self.clock.clone();
        let tx = self.tx.clone();
        let waker = self.waker.clone();

        tracing::debug!(generation, count, "loading joke batch");
        self.runtime.spawn(async move {
            let event = match fetch_batch(source.as_ref(), count, &cancel).await {
                Ok(jokes) => {
                    let first_fetched_at = clock.reserve(jokes.len());
                    FeedEvent::BatchLoaded {
                        generation,
                        jokes,
                        first_fetched_at,
                    }
                }
                Err(e) if e.is_aborted() => return,
                Err(e) => {
                    tracing::warn!(error = %e, generation, "joke batch failed");
                    FeedEvent::BatchFailed {
                        generation,
                        message: e.to_string(),
                    }
                }
            };
            if tx.send(event).is_ok() {
                if let Some(waker) = waker {
                    waker();
                }
            }
        });
    }

    /// Starts the periodic refresh. The first fetch goes out immediately.
    pub fn start_timer(&mut self) {
        if self.ticker.is_some() {
            return;
        }

        let id = self.next_ticker_id;
        self.next_ticker_id += 1;
        let cancel = CancelToken::new();
        let running = Arc::new(AtomicBool::new(true));
        self.ticker = Some(Ticker {
            id,
            cancel: cancel.clone(),
            running: running.clone(),
        });
        self.state.running = true;
        self.state.tick_error = None;

        let period = self.settings.refresh_interval;
        let source = self.source.clone();
        let clock = self.clock.clone();
        let tx = self.tx.clone();
        let waker = self.waker.clone();

        tracing::info!(ticker = id, period_ms = period.as_millis() as u64, "refresh timer started");
        self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                // Each tick runs on its own so a slow request never delays the next
                let source = source.clone();
                let clock = clock.clone();
                let tx = tx.clone();
                let waker = waker.clone();
                let running = running.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let result = source.fetch_random_joke(&cancel).await;
                    // Checked when the result lands, not when the request went out
                    if !running.load(Ordering::SeqCst) {
                        tracing::debug!(ticker = id, "discarding joke that arrived after stop");
                        return;
                    }
                    let event = match result {
                        Ok(joke) => FeedEvent::Ticked {
                            ticker: id,
                            item: JokeItem::new(joke, clock.next()),
                        },
                        Err(e) if e.is_aborted() => return,
                        Err(e) => {
                            tracing::warn!(error = %e, ticker = id, "refresh tick failed");
                            FeedEvent::TickFailed {
                                ticker: id,
                                message: e.to_string(),
                            }
                        }
                    };
                    if tx.send(event).is_ok() {
                        if let Some(waker) = waker {
                            waker();
                        }
                    }
                });
            }
            tracing::debug!(ticker = id, "refresh timer loop exited");
        });
    }

    pub fn stop_timer(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        ticker.running.store(false, Ordering::SeqCst);
        ticker.cancel.cancel();
        self.state.running = false;
        tracing::info!(ticker = ticker.id, "refresh timer stopped");
    }

    pub fn toggle_timer(&mut self) {
        if self.is_running() {
            self.stop_timer();
        } else {
            self.start_timer();
        }
    }

    /// Applies every queued result to the state. Results from superseded
    /// batches or stopped timers are dropped here.
    pub fn poll(&mut self) -> Vec<FeedNotice> {
        let mut notices = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            if let Some(notice) = self.apply(event) {
                notices.push(notice);
            }
        }
        notices
    }

    fn apply(&mut self, event: FeedEvent) -> Option<FeedNotice> {
        match event {
            FeedEvent::BatchLoaded {
                generation,
                jokes,
                first_fetched_at,
            } => {
                if generation != self.batch_generation {
                    tracing::debug!(generation, "ignoring superseded batch");
                    return None;
                }
                let capacity = self.settings.capacity;
                self.state.items = jokes
                    .into_iter()
                    .enumerate()
                    .fold(Vec::new(), |items, (offset, joke)| {
                        insert_bounded(&items, JokeItem::new(joke, first_fetched_at + offset as i64), capacity)
                    });
                self.state.loading = false;
                self.state.error = None;
                self.batch_cancel = None;
                tracing::info!(count = self.state.items.len(), "joke batch loaded");
                None
            }
            FeedEvent::BatchFailed { generation, message } => {
                if generation != self.batch_generation {
                    return None;
                }
                self.state.loading = false;
                self.state.error = Some(message.clone());
                self.batch_cancel = None;
                Some(FeedNotice::BatchFailed(message))
            }
            FeedEvent::Ticked { ticker, item } => {
                if !self.is_current_ticker(ticker) {
                    tracing::debug!(ticker, "ignoring joke from stopped timer");
                    return None;
                }
                self.state.items = insert_bounded(&self.state.items, item, self.settings.capacity);
                self.state.tick_error = None;
                None
            }
            FeedEvent::TickFailed { ticker, message } => {
                if !self.is_current_ticker(ticker) {
                    return None;
                }
                self.state.tick_error = Some(message.clone());
                Some(FeedNotice::TickFailed(message))
            }
        }
    }

    fn is_current_ticker(&self, id: u64) -> bool {
        self.ticker.as_ref().is_some_and(|ticker| ticker.id == id)
    }

    /// Cancels everything in flight. Nothing queued afterwards is applied.
    pub fn shutdown(&mut self) {
        self.stop_timer();
        if let Some(cancel) = self.batch_cancel.take() {
            cancel.cancel();
        }
        // Bumping the generation orphans any batch result already queued
        self.batch_generation += 1;
        self.state.loading = false;
    }
}

impl<S: JokeSource> Drop for JokesFeed<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
