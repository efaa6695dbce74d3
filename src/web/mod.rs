use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    daily::DailyUpdate,
    engine::{Engine, EngineSettings},
    scenario::Scenario,
};

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub total_days: u64,
    pub frame: Option<DailyUpdate>,
    pub completed: bool,
}

#[derive(Clone)]
struct AppState {
    broadcaster: broadcast::Sender<String>,
    latest_frame: Arc<Mutex<Option<DailyUpdate>>>,
    frames: Arc<Mutex<Vec<DailyUpdate>>>,
    total_days: u64,
    scenario_name: String,
    simulation_done: Arc<AtomicBool>,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub days: u64,
    pub snapshot_interval: u64,
    pub snapshot_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

/// Runs the simulation on a blocking thread and streams each daily update
/// to subscribers as JSON.
pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        days,
        snapshot_interval,
        snapshot_dir,
        host,
        port,
    } = config;

    let scenario_name = scenario.name.clone();
    let mut sim = scenario.build_simulation()?;
    let mut engine = Engine::new(EngineSettings {
        scenario_name: scenario_name.clone(),
        snapshot_interval_days: snapshot_interval,
        snapshot_dir,
        stats_interval_days: scenario.config.stats_interval_days,
    });

    let (tx, _) = broadcast::channel::<String>(512);
    let latest_frame: Arc<Mutex<Option<DailyUpdate>>> = Arc::new(Mutex::new(None));
    let frames: Arc<Mutex<Vec<DailyUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let simulation_done = Arc::new(AtomicBool::new(false));

    let latest_for_sim = latest_frame.clone();
    let frames_for_sim = frames.clone();
    let done_for_sim = simulation_done.clone();
    let tx_for_sim = tx.clone();

    let sim_handle = tokio::task::spawn_blocking(move || -> Result<()> {
        engine.run_with_hook(&mut sim, days, |update| {
            if let Ok(mut guard) = latest_for_sim.lock() {
                *guard = Some(update.clone());
            }
            if let Ok(mut guard) = frames_for_sim.lock() {
                guard.push(update.clone());
            }
            if let Ok(payload) = serde_json::to_string(update) {
                let _ = tx_for_sim.send(payload);
            }
        })?;
        done_for_sim.store(true, Ordering::SeqCst);
        Ok(())
    });

    let state = Arc::new(AppState {
        broadcaster: tx,
        latest_frame,
        frames,
        total_days: days,
        scenario_name: scenario_name.clone(),
        simulation_done,
    });

    let scenario_label = scenario_name.clone();
    tokio::spawn(async move {
        match sim_handle.await {
            Ok(Ok(())) => log::info!("[web] simulation completed for '{scenario_label}'"),
            Ok(Err(err)) => log::error!("[web] simulation error: {err:?}"),
            Err(err) => log::error!("[web] simulation task failed: {err:?}"),
        }
    });

    let router = Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/frames", get(all_frames))
        .route("/api/events", get(stream_events))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    log::info!("[web] '{scenario_name}' streaming at http://{addr} (Ctrl+C to stop)");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    log::info!("[web] shutting down");
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let frame = state
        .latest_frame
        .lock()
        .map(|guard| guard.clone())
        .unwrap_or_default();
    Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        total_days: state.total_days,
        frame,
        completed: state.simulation_done.load(Ordering::SeqCst),
    })
}

#[derive(Serialize)]
struct FramesResponse {
    scenario: String,
    total_days: u64,
    completed: bool,
    frames: Vec<DailyUpdate>,
}

async fn all_frames(State(state): State<Arc<AppState>>) -> Json<FramesResponse> {
    let frames = state
        .frames
        .lock()
        .map(|guard| guard.clone())
        .unwrap_or_default();
    Json(FramesResponse {
        scenario: state.scenario_name.clone(),
        total_days: state.total_days,
        completed: state.simulation_done.load(Ordering::SeqCst),
        frames,
    })
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
