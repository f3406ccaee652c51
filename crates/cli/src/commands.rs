//! One function per subcommand

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use lobcast_core::RecordSet;
use lobcast_gateway::OrderBookPayload;
use lobcast_ports::QueueBroker;
use lobcast_runner::config::BrokerKind;
use lobcast_runner::{
    Delivery, DepthPoller, Dispatcher, ResultRelay, RunnerConfig, build_broker,
    build_local_pipeline, build_pipeline,
};
use lobcast_server::{AppState, serve as serve_api, serve_stream};
use tokio::sync::watch;

/// Flip a watch flag on Ctrl-C; every role waits on a receiver of it
fn install_shutdown() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Ctrl-C received, shutting down"),
            Err(e) => log::error!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = tx.send(true);
    });
    rx
}

fn shutdown_signal(mut rx: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

pub async fn worker(
    mut config: RunnerConfig,
    poll: bool,
    worker_id: Option<String>,
) -> anyhow::Result<()> {
    if worker_id.is_some() {
        config.dispatcher.worker_id = worker_id;
        config.validate()?;
    }
    if config.dispatcher.delivery == Delivery::AtLeastOnce && config.dispatcher.worker_id.is_none()
    {
        log::warn!(
            "No worker id set; messages in flight at a crash stay parked until a worker with the same id starts"
        );
    }

    let shutdown = install_shutdown();
    let broker = build_broker(&config.broker)?;
    let pipeline = build_pipeline(&config)?;

    let poller = if poll {
        // In-process queues only reach the worker through the same handle
        let poll_broker: Arc<dyn QueueBroker> = match config.broker.kind {
            BrokerKind::Memory => broker.clone(),
            BrokerKind::Redis => build_broker(&config.broker)?,
        };
        let poller = DepthPoller::new(poll_broker, config.to_poller_config());
        Some(tokio::spawn(poller.run_until(shutdown_signal(shutdown.clone()))))
    } else {
        None
    };

    let dispatcher = Dispatcher::new(broker, pipeline, config.to_dispatcher_config());
    let stats = dispatcher.run_until(shutdown_signal(shutdown)).await;
    log::info!(
        "Worker stopped: {} received, {} published, {} discarded ({} panicked), {} transport failures",
        stats.received,
        stats.published,
        stats.discarded,
        stats.panics,
        stats.transport_failures
    );

    if let Some(handle) = poller {
        let pushed = handle.await?;
        log::info!("Poller stopped after {} snapshots", pushed);
    }
    Ok(())
}

pub async fn serve(config: RunnerConfig, bind: Option<String>) -> anyhow::Result<()> {
    let shutdown = install_shutdown();
    let pipeline = build_local_pipeline(&config)?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let state = Arc::new(AppState::new(Arc::new(pipeline)));
    serve_api(&bind, state, shutdown_signal(shutdown))
        .await
        .with_context(|| format!("HTTP server on {}", bind))?;
    Ok(())
}

pub async fn poll(config: RunnerConfig) -> anyhow::Result<()> {
    if config.broker.kind == BrokerKind::Memory {
        bail!("poll needs a shared broker; use `worker --poll` with in-process queues");
    }
    let shutdown = install_shutdown();
    let broker = build_broker(&config.broker)?;
    let poller = DepthPoller::new(broker, config.to_poller_config());
    let pushed = poller.run_until(shutdown_signal(shutdown)).await;
    log::info!("Poller stopped after {} snapshots", pushed);
    Ok(())
}

pub async fn stream(config: RunnerConfig, bind: Option<String>) -> anyhow::Result<()> {
    if config.broker.kind == BrokerKind::Memory {
        bail!("stream needs a shared broker; in-process queues never see worker results");
    }
    let shutdown = install_shutdown();
    let relay = ResultRelay::new(build_broker(&config.broker)?, config.to_relay_config());
    let results = relay.sender();
    let relay_task = tokio::spawn(relay.run_until(shutdown_signal(shutdown.clone())));

    let bind = bind.unwrap_or_else(|| config.stream.bind.clone());
    serve_stream(&bind, results, shutdown_signal(shutdown))
        .await
        .with_context(|| format!("stream server on {}", bind))?;
    relay_task.await?;
    Ok(())
}

pub async fn push(config: RunnerConfig, file: &Path, wait: Option<u64>) -> anyhow::Result<()> {
    if config.broker.kind == BrokerKind::Memory {
        bail!("push needs a shared broker; in-process queues never reach a worker");
    }
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let book = OrderBookPayload::from_json(&payload)
        .with_context(|| format!("{} is not an order-book snapshot", file.display()))?;
    log::info!(
        "Pushing {} ({} bid / {} ask levels)",
        file.display(),
        book.bids.len(),
        book.asks.len()
    );

    let broker = build_broker(&config.broker)?;
    let wait = wait.map(Duration::from_secs);
    if let Some(result) = push_snapshot(broker.as_ref(), &config, &payload, wait).await? {
        let value: serde_json::Value = serde_json::from_str(&result)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

/// Push one snapshot; with `wait`, also take the next result off the results queue
///
/// Results carry no request id, so the result taken may belong to another
/// producer and is then lost to the stream and to other readers.
async fn push_snapshot(
    broker: &dyn QueueBroker,
    config: &RunnerConfig,
    payload: &str,
    wait: Option<Duration>,
) -> anyhow::Result<Option<String>> {
    broker.push(&config.queues.inbound, payload).await?;
    let queued = broker.len(&config.queues.inbound).await?;
    log::info!(
        "Pushed to {} ({} waiting); results go to {}",
        config.queues.inbound,
        queued,
        config.queues.outbound
    );

    let Some(wait) = wait else {
        return Ok(None);
    };
    log::warn!(
        "Taking the next result from {}; it may not be the one for this snapshot",
        config.queues.outbound
    );
    match broker.blocking_pop(&config.queues.outbound, wait).await? {
        Some((_, result)) => Ok(Some(result)),
        None => bail!("no result on {} within {:?}", config.queues.outbound, wait),
    }
}

pub async fn predict(config: RunnerConfig, file: &Path) -> anyhow::Result<()> {
    let reader = std::fs::File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let records = RecordSet::from_csv_reader(reader)?;
    let pipeline = build_local_pipeline(&config)?;
    let response = pipeline.predict_records(&records).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
