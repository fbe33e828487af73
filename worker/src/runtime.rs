//! Worker event loop — one pub/sub subscription, an optional initial
//! task, optional periodic polling, and graceful shutdown on
//! interrupt.
//!
//! A single `select!` loop drives everything, so the orchestrator is
//! never invoked concurrently: a polling tick waits for an in-flight
//! message task and vice versa.

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt as _;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::orchestrator::{Orchestrator, TaskBackend};
use crate::spec::{self, WorkerSpec};

/// Run the worker until the message stream closes or an interrupt
/// arrives. The channel subscription is released on every exit path.
///
/// # Errors
///
/// Returns an error only for setup failures (bus unreachable,
/// subscribe refused). Per-message and per-poll failures are logged
/// and the loop continues.
pub async fn run<B: TaskBackend>(
    spec: &WorkerSpec,
    redis_url: &str,
    orchestrator: &Orchestrator<B>,
) -> Result<()> {
    let client = redis::Client::open(redis_url)
        .with_context(|| format!("invalid message bus url {redis_url}"))?;
    let mut pubsub = client
        .get_async_pubsub()
        .await
        .context("cannot connect to message bus")?;
    pubsub
        .subscribe(&spec.channel)
        .await
        .with_context(|| format!("cannot subscribe to {}", spec.channel))?;
    info!(agent = %spec.agent, channel = %spec.channel, "subscribed");

    // The initial task runs to completion before the loop; its result
    // is observed but never required for the loop to proceed.
    if let Some(task) = &spec.initial_task {
        match orchestrator.orchestrate(task).await {
            Ok(response) => info!(%response, "initial task completed"),
            Err(e) => warn!(error = ?e, "initial task failed"),
        }
    }

    let mut poll = spec.polling.as_ref().map(|polling| {
        let mut interval = tokio::time::interval(Duration::from_secs(polling.interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        (interval, polling.prompt.clone())
    });
    if let Some((interval, _)) = &mut poll {
        // Consume the immediate first tick so polling starts one
        // interval after startup, not at it.
        interval.reset();
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    {
        let mut messages = pubsub.on_message();
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("interrupt received, shutting down");
                    break;
                }
                message = messages.next() => {
                    let Some(message) = message else {
                        warn!("message stream closed");
                        break;
                    };
                    match message.get_payload::<String>() {
                        Ok(payload) => dispatch_payload(orchestrator, &payload).await,
                        Err(e) => warn!(error = ?e, "undecodable payload skipped"),
                    }
                }
                () = next_tick(&mut poll) => {
                    let Some((_, prompt)) = &poll else { continue };
                    match orchestrator.orchestrate(prompt).await {
                        Ok(response) => info!(%response, "polling task completed"),
                        Err(e) => warn!(error = ?e, "polling task failed"),
                    }
                }
            }
        }
    }

    pubsub
        .unsubscribe(&spec.channel)
        .await
        .with_context(|| format!("cannot unsubscribe from {}", spec.channel))?;
    info!(channel = %spec.channel, "subscription released");
    Ok(())
}

/// Decode one inbound payload and run it through the orchestrator.
/// Failures are logged, never propagated — a bad message must not
/// take the worker down.
pub async fn dispatch_payload<B: TaskBackend>(orchestrator: &Orchestrator<B>, payload: &str) {
    let task = spec::task_from_payload(payload);
    match orchestrator.orchestrate(&task).await {
        Ok(response) => info!(%response, "task completed"),
        Err(e) => warn!(error = ?e, "task failed"),
    }
}

/// Resolve on the next polling tick, or never when polling is off.
async fn next_tick(poll: &mut Option<(Interval, String)>) {
    match poll {
        Some((interval, _)) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
