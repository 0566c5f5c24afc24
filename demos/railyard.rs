//! # Example: railyard
//!
//! A small rail-inspection fleet running on the blackboard under supervision.
//!
//! Shows how to:
//! - Implement [`Producer`] by hand and with [`ProducerFn`].
//! - Give one producer its own [`BackoffPolicy`] through [`ProducerSpec`].
//! - Subscribe an observer to the decisions layer.
//! - Attach [`LogWriter`] and poll [`Supervisor::snapshot`] like a dashboard would.
//!
//! ## Flow
//! ```text
//! A1  Wheel Acoustics    ──► RAW_SENSOR        (every 500ms)
//! A19 Bearing Health     ──► COMPONENT_HEALTH  (reads RAW_SENSOR)
//! A30 Failure Forecaster ──► PREDICTIONS       (crashes now and then, exponential backoff)
//! A39 Emergency Protocol ──► DECISIONS         (reads COMPONENT_HEALTH) ──► alert observer
//! A50 Self-Healing       ──► NETWORK_STATE     (reads supervisor health)
//!
//! monitor loop (1s): snapshot(COMPONENT_HEALTH) ──► info!(json)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info,agentvisor=debug cargo run --example railyard
//! ```
//! Stops on Ctrl-C or after `RAILYARD_SECS` seconds (default 15).

use std::sync::{Arc, Weak};
use std::time::Duration;

use agentvisor::{
    BackoffPolicy, Blackboard, BoardConfig, JitterPolicy, LayerId, LogWriter, Observation,
    ObserverError, ObserverFn, Producer, ProducerError, ProducerFn, ProducerSpec, Subscribe,
    Supervisor, SupervisorConfig, layers,
};
use async_trait::async_trait;
use rand::Rng;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Sleeps for `period` unless cancelled first.
async fn pace(ctx: &CancellationToken, period: Duration) -> Result<(), ProducerError> {
    tokio::select! {
        _ = ctx.cancelled() => Err(ProducerError::Canceled),
        _ = tokio::time::sleep(period) => Ok(()),
    }
}

fn write(
    board: &Blackboard,
    layer: LayerId,
    id: &str,
    payload: &serde_json::Value,
    priority: i32,
) -> Result<(), ProducerError> {
    board
        .write_with_priority(layer, id, payload, priority)
        .map(|_| ())
        .map_err(|e| ProducerError::fail(e.to_string()))
}

struct WheelAcoustics;

#[async_trait]
impl Producer for WheelAcoustics {
    fn id(&self) -> &str {
        "A1"
    }

    fn display_name(&self) -> &str {
        "Wheel Acoustics"
    }

    async fn run(
        &self,
        board: Arc<Blackboard>,
        ctx: CancellationToken,
    ) -> Result<(), ProducerError> {
        loop {
            let (rms, peak_hz) = {
                let mut rng = rand::rng();
                (rng.random_range(0.1..0.9_f64), rng.random_range(800..2400_u32))
            };
            let payload = json!({ "rms": rms, "peak_hz": peak_hz });
            write(&board, layers::RAW_SENSOR, self.id(), &payload, 0)?;
            pace(&ctx, Duration::from_millis(500)).await?;
        }
    }
}

async fn bearing_health(
    board: Arc<Blackboard>,
    ctx: CancellationToken,
) -> Result<(), ProducerError> {
    loop {
        let rms = board
            .read(layers::RAW_SENSOR, "A1")
            .map_err(|e| ProducerError::fail(e.to_string()))?
            .and_then(|obs| obs.payload["rms"].as_f64())
            .unwrap_or(0.0);
        let health = (100.0 - rms * 40.0).clamp(0.0, 100.0);
        write(&board, layers::COMPONENT_HEALTH, "A19", &json!({ "bearing": health }), 0)?;
        pace(&ctx, Duration::from_secs(1)).await?;
    }
}

async fn failure_forecaster(
    board: Arc<Blackboard>,
    ctx: CancellationToken,
) -> Result<(), ProducerError> {
    loop {
        let (risk, diverged) = {
            let mut rng = rand::rng();
            (rng.random_range(0.0..1.0_f64), rng.random_bool(0.2))
        };
        if diverged {
            return Err(ProducerError::fail("forecast model diverged"));
        }
        write(&board, layers::PREDICTIONS, "A30", &json!({ "failure_risk_7d": risk }), 0)?;
        pace(&ctx, Duration::from_secs(1)).await?;
    }
}

async fn emergency_protocol(
    board: Arc<Blackboard>,
    ctx: CancellationToken,
) -> Result<(), ProducerError> {
    loop {
        let health = board
            .get_all_health(layers::COMPONENT_HEALTH)
            .map_err(|e| ProducerError::fail(e.to_string()))?;
        let worst = health
            .values()
            .filter_map(|v| v["bearing"].as_f64())
            .fold(100.0_f64, f64::min);
        let (level, priority) = match worst {
            w if w < 70.0 => ("HIGH", 9),
            w if w < 85.0 => ("MEDIUM", 5),
            _ => ("LOW", 0),
        };
        write(
            &board,
            layers::DECISIONS,
            "A39",
            &json!({ "alert_level": level, "worst_bearing": worst }),
            priority,
        )?;
        pace(&ctx, Duration::from_secs(2)).await?;
    }
}

/// Publishes supervisor integrity; holds only a weak handle so the supervisor can drop.
async fn self_healing(
    sup: Weak<Supervisor>,
    board: Arc<Blackboard>,
    ctx: CancellationToken,
) -> Result<(), ProducerError> {
    loop {
        let Some(health) = sup.upgrade().map(|s| s.health()) else {
            return Err(ProducerError::Canceled);
        };
        write(
            &board,
            layers::NETWORK_STATE,
            "A50",
            &json!({
                "system_integrity": health.integrity(),
                "healthy_agents": health.healthy_count,
                "total_agents": health.total_count,
            }),
            0,
        )?;
        pace(&ctx, Duration::from_secs(5)).await?;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,agentvisor=debug".into()),
        )
        .init();

    let secs: u64 = std::env::var("RAILYARD_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(15);

    let board = Arc::new(Blackboard::new(BoardConfig::default()));
    board.subscribe(
        layers::DECISIONS,
        ObserverFn::arc("alerts", |_layer: LayerId, obs: Arc<Observation>| async move {
            if obs.priority >= 5 {
                warn!(producer = %obs.producer_id, payload = %obs.payload, "decision alert");
            }
            Ok::<_, ObserverError>(())
        }),
    )?;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::builder(Arc::clone(&board), SupervisorConfig::default())
        .with_subscribers(subs)
        .build();

    sup.register(Arc::new(WheelAcoustics))?;
    sup.register(ProducerFn::arc("A19", "Bearing Health", bearing_health))?;
    sup.register_spec(
        ProducerSpec::new(ProducerFn::arc("A30", "Failure Forecaster", failure_forecaster))
            .with_backoff(
                BackoffPolicy::exponential(Duration::from_millis(250), Duration::from_secs(4))
                    .with_jitter(JitterPolicy::Equal),
            ),
    )?;
    sup.register(ProducerFn::arc("A39", "Emergency Protocol", emergency_protocol))?;
    let weak = Arc::downgrade(&sup);
    sup.register(ProducerFn::arc(
        "A50",
        "Self-Healing Monitor",
        move |board: Arc<Blackboard>, ctx: CancellationToken| {
            self_healing(weak.clone(), board, ctx)
        },
    ))?;

    let started = sup.start_all()?;
    info!(started, secs, "railyard running");

    let deadline = tokio::time::sleep(Duration::from_secs(secs));
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let snapshot = sup.snapshot(layers::COMPONENT_HEALTH)?;
                info!(snapshot = %serde_json::to_string(&snapshot)?, "system update");
            }
            _ = &mut deadline => break,
            _ = &mut ctrl_c => break,
        }
    }

    if let Err(e) = sup.stop_all().await {
        warn!(error = %e, label = e.as_label(), "shutdown incomplete");
    }
    for p in sup.producers() {
        info!(
            id = %p.id,
            name = %p.name,
            status = p.status.as_str(),
            restarts = p.restarts,
            "final status"
        );
    }
    Ok(())
}
