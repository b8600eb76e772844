//! Daemon process wiring.
//!
//! ```text
//! IntervalTickProvider ──TickSignal──▶ pump_ticks ──▶ TimerEngine ◀── RequestHandler ◀── IpcServer
//!                                                          │
//!                                                     TimerEvent
//!                                                          ▼
//!                                                    EventNotifier
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::types::CountdownConfig;

use super::ipc::{IpcServer, RequestHandler};
use super::notifier::EventNotifier;
use super::ticker::{IntervalTickProvider, TickSignal};
use super::timer::{TickOutcome, TimerEngine};

/// Forwards tick signals to the engine until the channel closes.
///
/// Returns the number of completions observed.
pub async fn pump_ticks(
    engine: Arc<Mutex<TimerEngine>>,
    mut tick_rx: mpsc::UnboundedReceiver<TickSignal>,
) -> u64 {
    let mut completions = 0;
    while let Some(signal) = tick_rx.recv().await {
        let outcome = engine.lock().await.on_source_tick(signal.source_id);
        if let TickOutcome::Completed { .. } = outcome {
            completions += 1;
        }
    }
    completions
}

/// Runs the daemon until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound or the server fails.
pub async fn run_daemon(config: CountdownConfig) -> Result<()> {
    let socket_path = config
        .resolve_socket_path()
        .context("ソケットパスを決定できません")?;

    let (tick_tx, tick_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let provider = IntervalTickProvider::new(config.tick_interval(), tick_tx);
    let engine = Arc::new(Mutex::new(TimerEngine::new(Box::new(provider), event_tx)));

    let notifier = EventNotifier::from_config(&config.sound);
    let notifier_task = tokio::spawn(notifier.run(event_rx));
    let pump_task = tokio::spawn(pump_ticks(engine.clone(), tick_rx));

    let server = IpcServer::new(&socket_path)?;
    let handler = Arc::new(RequestHandler::new(
        engine.clone(),
        config.default_duration_seconds,
    ));

    info!("Daemon listening on {}", socket_path.display());

    let result = tokio::select! {
        result = server.serve(handler) => result,
        signal = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            signal.context("シグナルの待機に失敗しました")
        }
    };

    // Release the tick source before the engine goes away.
    engine.lock().await.cancel();
    pump_task.abort();
    drop(engine);
    drop(server);

    // The engine held the last event sender; the notifier drains and exits.
    if notifier_task.await.is_err() {
        debug!("Notifier task ended abnormally");
    }

    result
}
