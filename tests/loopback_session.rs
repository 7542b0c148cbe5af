//! Loopback session tests through the public API
//!
//! Both peers run in-process on 127.0.0.1 with a private discovery port, so
//! these tests never touch the real broadcast domain.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures::StreamExt;
use roverlink::discovery::DiscoveryListener;
use roverlink::{
    ControlInput, FunctionBits, KnownVehicles, LinkConfig, RecordingActuator, Roverlink,
    SessionPhase, SessionState, SharedInput, SimulatedSensors, UpdateRate,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn loopback_config() -> Result<LinkConfig> {
    let port = std::net::UdpSocket::bind((LOCALHOST, 0))?.local_addr()?.port();
    let yaml = format!(
        r#"
discovery:
  port: {port}
  bind_address: 127.0.0.1
  broadcast_address: 127.0.0.1
  beacon_interval_ms: 50
  receive_timeout_ms: 50
control:
  port: 0
  interval_ms: 10
telemetry:
  port: 0
  interval_ms: 10
vehicle:
  name: Car1
  sensor_interval_ms: 10
"#
    );
    Ok(LinkConfig::from_yaml(&yaml)?)
}

async fn wait_for_phase(
    state: &mut watch::Receiver<SessionState>,
    phase: SessionPhase,
) -> Result<SessionState> {
    let state = tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| s.phase() == phase))
        .await
        .with_context(|| format!("timed out waiting for {phase:?}"))??
        .clone();
    Ok(state)
}

#[tokio::test]
async fn announcement_reaches_listener() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let config = loopback_config()?;
    let listener =
        DiscoveryListener::bind(config.discovery_bind_addr(), config.receive_timeout()).await?;
    let (known_tx, mut known) = watch::channel(KnownVehicles::new());
    let cancel = CancellationToken::new();
    let listening = tokio::spawn(listener.run(known_tx, cancel.clone()));

    let vehicle =
        Roverlink::vehicle(config, SimulatedSensors::new(), RecordingActuator::new()).await?;

    tokio::time::timeout(Duration::from_secs(5), known.wait_for(|k| !k.is_empty()))
        .await
        .context("no announcement received")??;
    let record = known.borrow().get(0).cloned().context("known set empty")?;

    assert_eq!(record.name, "Car1");
    assert_eq!(record.address, LOCALHOST);
    assert_eq!(record.control_port, vehicle.control_addr().port());
    assert_eq!(record.telemetry_port, vehicle.telemetry_addr().port());

    // Repeated beacons do not duplicate the record.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(known.borrow().len(), 1);

    cancel.cancel();
    listening.await?;
    vehicle.stop().await;
    Ok(())
}

#[tokio::test]
async fn full_session_and_recovery() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let config = loopback_config()?;
    let actuator = Arc::new(RecordingActuator::new());
    let vehicle =
        Roverlink::vehicle(config.clone(), SimulatedSensors::new(), Arc::clone(&actuator)).await?;

    let input = SharedInput::new();
    input.set(ControlInput {
        gear: 1,
        steering: -1.0,
        throttle: 0.25,
        brake: 0.0,
        functions: FunctionBits::NONE.with_horn(true),
    });
    let console = Roverlink::console(config, input)?;

    let mut vehicles = Box::pin(console.vehicle_updates());
    loop {
        let list = tokio::time::timeout(Duration::from_secs(5), vehicles.next())
            .await
            .context("vehicle was never discovered")?
            .context("vehicle stream ended")?;
        if !list.is_empty() {
            break;
        }
    }
    console.select_index(0)?;

    let mut console_state = console.watch_state();
    let mut vehicle_state = vehicle.watch_state();
    wait_for_phase(&mut console_state, SessionPhase::Connected).await?;
    wait_for_phase(&mut vehicle_state, SessionPhase::Connected).await?;

    let mut controls = Box::pin(vehicle.control_updates());
    let frame = tokio::time::timeout(Duration::from_secs(2), controls.next())
        .await
        .context("no control frame")?
        .context("control stream ended")?;
    assert_eq!(frame.gear, 1);
    assert_eq!(frame.steering, -127);
    assert_eq!(frame.throttle, 25);
    assert!(frame.function_bits.horn());

    let mut telemetry = Box::pin(console.subscribe_telemetry(UpdateRate::Native));
    let sample = tokio::time::timeout(Duration::from_secs(2), telemetry.next())
        .await
        .context("no telemetry")?
        .context("telemetry stream ended")?;
    assert!(sample.voltage > 6.0);

    // Vehicle goes away: the console must fall back to discovery on its own.
    let vehicle_final = vehicle.stop().await;
    assert!(vehicle_final.is_stopped());
    assert!(actuator.safe_state_count() >= 1);

    let recovered = tokio::time::timeout(
        Duration::from_secs(5),
        console_state.wait_for(|s| s.phase() == SessionPhase::Discovering && s.cycle() == 2),
    )
    .await
    .context("console did not restart discovery")??
    .clone();
    match recovered.last_error() {
        Some(e) if e.is_session_ending() => {}
        other => bail!("unexpected session end reason: {other:?}"),
    }

    let console_final = console.stop().await;
    assert!(console_final.is_stopped());
    Ok(())
}

#[tokio::test]
async fn config_round_trips_through_yaml() -> Result<()> {
    let config = loopback_config()?;
    let reparsed = LinkConfig::from_yaml(&config.to_yaml()?)?;
    assert_eq!(reparsed, config);
    assert_eq!(
        reparsed.broadcast_target(),
        SocketAddr::new(LOCALHOST, config.discovery.port)
    );
    Ok(())
}
