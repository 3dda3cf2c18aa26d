use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::adapters::{AdapterContext, AppLifecycle, PlayerAdapter, SignalSink};
use crate::clock::{Clock, SystemClock};
use crate::models::EventData;
use crate::settings::CollectorConfig;
use crate::state::{NoopDelegate, PlaybackState, SessionDelegate};
use crate::timer::{TimerFired, TimerSink, TokioScheduler};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

enum Message<S> {
    Signal(S),
    Timer(TimerFired),
    Lifecycle(AppLifecycle),
    ResetSource,
    EventData(oneshot::Sender<EventData>),
    State(oneshot::Sender<PlaybackState>),
    Destroy(oneshot::Sender<()>),
}

pub struct CollectorOptions {
    pub config: CollectorConfig,
    pub clock: Arc<dyn Clock>,
    pub delegate: Arc<dyn SessionDelegate>,
}

impl CollectorOptions {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn SessionDelegate>) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            config: CollectorConfig::default(),
            clock: Arc::new(SystemClock),
            delegate: Arc::new(NoopDelegate),
        }
    }
}

/// Handle to a collector task that owns one player adapter.
///
/// Backend callbacks, timer firings and host calls all become messages on
/// one channel, so the adapter never sees two of them at once. Dropping the
/// last handle stops the task and destroys the adapter.
pub struct CollectorHandle<S: Send + 'static> {
    tx: mpsc::UnboundedSender<Message<S>>,
    signals: SignalSink<S>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<S: Send + 'static> Clone for CollectorHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            signals: self.signals.clone(),
            task: Arc::clone(&self.task),
        }
    }
}

impl<S: Send + 'static> CollectorHandle<S> {
    /// Builds the adapter with `build` and starts its task on the current
    /// tokio runtime.
    pub fn spawn<A, F>(options: CollectorOptions, build: F) -> Result<Self>
    where
        A: PlayerAdapter<Signal = S>,
        F: FnOnce(AdapterContext, SignalSink<S>) -> A,
    {
        let runtime =
            Handle::try_current().context("collector needs a running tokio runtime")?;
        let (tx, rx) = mpsc::unbounded_channel::<Message<S>>();

        let timer_tx = tx.downgrade();
        let timer_sink: TimerSink = Arc::new(move |fired: TimerFired| {
            if let Some(tx) = timer_tx.upgrade() {
                let _ = tx.send(Message::Timer(fired));
            }
        });

        let signal_tx = tx.downgrade();
        let signals = SignalSink::new(move |signal: S| {
            if let Some(tx) = signal_tx.upgrade() {
                let _ = tx.send(Message::Signal(signal));
            }
        });

        let context = AdapterContext::new(
            Arc::new(options.config),
            options.clock,
            Arc::new(TokioScheduler::new(runtime.clone(), timer_sink)),
            options.delegate,
        );
        let adapter = build(context, signals.clone());
        log_info!(
            "[{}] {} collector started",
            adapter.state_machine().impression_id(),
            adapter.kind().as_str()
        );

        let task = runtime.spawn(run_collector(adapter, rx));

        Ok(Self {
            tx,
            signals,
            task: Arc::new(Mutex::new(Some(task))),
        })
    }

    /// Sink to hand to backend callbacks. It does not keep the task alive.
    pub fn signals(&self) -> SignalSink<S> {
        self.signals.clone()
    }

    pub fn post(&self, signal: S) {
        self.send(Message::Signal(signal));
    }

    pub fn background(&self) {
        self.send(Message::Lifecycle(AppLifecycle::Background));
    }

    pub fn foreground(&self) {
        self.send(Message::Lifecycle(AppLifecycle::Foreground));
    }

    pub fn reset_source(&self) {
        self.send(Message::ResetSource);
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    pub async fn event_data(&self) -> Result<EventData> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Message::EventData(reply))
            .map_err(|_| anyhow!("collector has stopped"))?;
        response
            .await
            .context("collector stopped before answering the snapshot request")
    }

    pub async fn state(&self) -> Result<PlaybackState> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Message::State(reply))
            .map_err(|_| anyhow!("collector has stopped"))?;
        response
            .await
            .context("collector stopped before answering the state request")
    }

    /// Destroys the adapter and waits for the task to finish. Safe to call
    /// more than once, from any clone.
    pub async fn destroy(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        if self.tx.send(Message::Destroy(reply)).is_ok() {
            let _ = response.await;
        }

        let task = self.task.lock().await.take();
        if let Some(task) = task {
            task.await.context("collector task failed to join")?;
        }
        Ok(())
    }

    fn send(&self, message: Message<S>) {
        if self.tx.send(message).is_err() {
            log_debug!("collector has stopped; dropping message");
        }
    }
}

async fn run_collector<A: PlayerAdapter>(
    mut adapter: A,
    mut rx: mpsc::UnboundedReceiver<Message<A::Signal>>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            Message::Signal(signal) => adapter.handle_signal(signal),
            Message::Timer(fired) => adapter.handle_timer(fired),
            Message::Lifecycle(event) => adapter.on_lifecycle(event),
            Message::ResetSource => adapter.reset_source_state(),
            Message::EventData(reply) => {
                let _ = reply.send(adapter.create_event_data());
            }
            Message::State(reply) => {
                let _ = reply.send(adapter.state_machine().state());
            }
            Message::Destroy(reply) => {
                adapter.destroy();
                let _ = reply.send(());
                break;
            }
        }
    }

    adapter.destroy();
    log_info!(
        "[{}] collector stopped",
        adapter.state_machine().impression_id()
    );
}
