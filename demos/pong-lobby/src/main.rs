use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use matchforge::prelude::*;
use tracing::info;

type BoxError = Box<dyn Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Simulated clients
// ---------------------------------------------------------------------------

/// Plays one client: prints everything it receives and confirms readiness
/// on its `patience`-th ready-check. Returns once the match has started.
async fn play(
    handle: MatchHandle,
    me: PlayerId,
    mut events: EventReceiver,
    patience: u32,
) -> Result<(), MatchforgeError> {
    let mut beats = 0;
    while let Some(event) = events.recv().await {
        let wire = JsonCodec.encode(&event)?;
        println!("{me} <- {}", String::from_utf8_lossy(&wire));

        match event {
            OutboundEvent::ReadyCheck => {
                beats += 1;
                if beats == patience {
                    handle.set_ready(me).await?;
                }
            }
            OutboundEvent::StateSync(state) if state.status == Status::Started => break,
            _ => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

/// Runs one match from open to start and returns the state the store holds
/// afterwards.
async fn run_lobby(config: SessionConfig) -> Result<SessionState, BoxError> {
    let store = Arc::new(MemoryStore::new());
    let mut registry = MatchRegistry::new(Arc::clone(&store), config);

    let match_id = MatchId::new("pong-1");
    let (alice, bob) = (PlayerId(1), PlayerId(2));

    // Subscribe before opening so both clients see match-begin.
    let sink = ChannelSink::new();
    let alice_events = sink.subscribe(alice);
    let bob_events = sink.subscribe(bob);

    let setup = MatchSetup::new(match_id.clone(), [alice, bob])
        .profile(PlayerSnapshot::new(alice, "alice").with_avatar("/avatars/alice.png"))
        .profile(PlayerSnapshot::new(bob, "bob"));
    let handle = registry.open_setup(setup, sink).await?;

    let alice_task = tokio::spawn(play(handle.clone(), alice, alice_events, 1));
    let bob_task = tokio::spawn(play(handle.clone(), bob, bob_events, 2));

    registry.route_connect(&match_id, alice).await?;
    // Bob's first connection drops before it sticks.
    registry.route_connect(&match_id, bob).await?;
    registry.route_disconnect(&match_id, bob).await?;
    registry.route_connect(&match_id, bob).await?;

    alice_task.await??;
    bob_task.await??;

    let live = registry.state(&match_id).await?;
    info!(%match_id, status = %live.status, "lobby finished");
    registry.close(&match_id).await?;

    let stored = store
        .load(&match_id)
        .await?
        .ok_or("match state missing from store")?;
    Ok(stored)
}

fn parse_policy(arg: Option<String>) -> Result<DisconnectPolicy, BoxError> {
    match arg {
        Some(name) => Ok(serde_json::from_value(serde_json::Value::String(name))?),
        None => Ok(DisconnectPolicy::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    matchforge::logging::init();

    let policy = parse_policy(std::env::args().nth(1))?;
    let config = SessionConfig::default()
        .with_disconnect_policy(policy)
        .with_ready_check(HeartbeatConfig::with_period(Duration::from_millis(250)));
    eprintln!("running pong lobby (disconnect policy: {policy})");

    let state = run_lobby(config).await?;
    println!("final <- {}", String::from_utf8_lossy(&JsonCodec.encode(&state)?));
    Ok(())
}
