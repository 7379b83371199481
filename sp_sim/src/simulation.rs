//! Scripted estimation session.
//!
//! Spawns one [`ClientSession`] per simulated participant against a shared
//! [`MemoryStore`], plays a number of voting rounds with random cards, then
//! runs a raffle. The creator's session is the one observed; the other
//! sessions keep running so presence, reveal delays and the raffle draw are
//! exercised for every client.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use story_poker::{
    CardValue, ClientSession, Identity, MemoryStore, RaffleManager, RaffleWinner, ReactionBoard,
    RoomManager, SessionEvent, SessionHandle, TallySummary, VotingRound, models::RaffleType,
    session::EVENT_CAPACITY,
};
use tokio::sync::mpsc::{self, Receiver};

use crate::{config::SimConfig, logging};

/// Chance that a participant sits a round out
const ABSTAIN_PROBABILITY: f64 = 0.1;

/// Outcome of one revealed round
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub votes: usize,
    pub summary: TallySummary,
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct SimReport {
    pub room_id: String,
    pub seed: u64,
    pub rounds: Vec<RoundReport>,
    pub raffle_winner: Option<RaffleWinner>,
    /// Participants still marked active after every session shut down
    pub still_active: usize,
}

struct SimClient {
    rooms: RoomManager,
    voting: VotingRound,
    handle: SessionHandle,
}

/// Run the scripted session described by `config`
///
/// # Errors
///
/// Returns an error if any store operation fails or a session does not
/// report an expected event within [`SimConfig::step_timeout`].
pub async fn run(config: &SimConfig) -> anyhow::Result<SimReport> {
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let timeout = config.step_timeout();
    tracing::info!(seed = seed, participants = config.participants, "Starting simulation");

    let store = Arc::new(MemoryStore::new());
    let creator = RoomManager::new(store.clone(), identity(0))
        .with_creator_enforcement(config.session.enforce_creator);
    let room_id = creator
        .create_room(&config.room_name)
        .await
        .context("Failed to create room")?;
    tracing::info!(room_id = %room_id, room_name = %config.room_name, "Room created");

    let mut clients = Vec::with_capacity(config.participants);
    let mut creator_events = None;
    for index in 0..config.participants {
        let identity = identity(index);
        let (handle, events) = ClientSession::spawn(
            store.clone(),
            identity.clone(),
            &room_id,
            None,
            config.session.clone(),
        )
        .await
        .with_context(|| format!("Failed to spawn session for {}", identity.user_id))?;

        if index == 0 {
            let (sink, observed) = mpsc::channel(EVENT_CAPACITY);
            tokio::spawn(forward(events, sink));
            creator_events = Some(observed);
        } else {
            tokio::spawn(drain(identity.user_id.clone(), events));
        }

        let rooms = RoomManager::new(store.clone(), identity)
            .with_creator_enforcement(config.session.enforce_creator);
        clients.push(SimClient {
            voting: VotingRound::new(rooms.clone()),
            rooms,
            handle,
        });
    }
    let mut events = creator_events.ok_or_else(|| anyhow!("No participants to simulate"))?;
    let host = VotingRound::new(creator.clone());

    let mut rounds = Vec::with_capacity(config.rounds);
    for round in 1..=config.rounds {
        if round == 1 {
            host.start(&room_id).await?;
        } else {
            host.start_again(&room_id).await?;
            wait_for(&mut events, timeout, |event| {
                matches!(event, SessionEvent::CardsHidden).then_some(())
            })
            .await?;
        }

        let mut votes = 0;
        for client in &clients {
            if rng.random_bool(ABSTAIN_PROBABILITY) {
                continue;
            }
            let card = random_card(&mut rng);
            let room = client.rooms.snapshot(&room_id).await?;
            client.voting.select_card(&room, card).await?;
            tracing::debug!(user_id = client.rooms.user_id(), card = %card, "Card selected");
            votes += 1;
        }

        host.reveal(&room_id).await?;
        let summary = wait_for(&mut events, timeout, |event| match event {
            SessionEvent::CardsRevealed(summary) => Some(summary),
            _ => None,
        })
        .await?;

        logging::log_round(
            round,
            summary.consensus.active_voters,
            summary.average,
            &summary.rounded_average.to_string(),
            summary.consensus.has_consensus,
        );

        if let Some(reactor) = clients.choose(&mut rng) {
            ReactionBoard::new(reactor.rooms.clone(), config.session.reaction_ttl)
                .add_reaction(&room_id, creator.user_id(), "🎉")
                .await?;
        }

        rounds.push(RoundReport { votes, summary });
    }

    let raffle_winner = if config.raffle {
        Some(run_raffle(&creator, &clients, &room_id, &mut events, timeout).await?)
    } else {
        None
    };

    for client in &clients {
        client
            .handle
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to shut down session: {e}"))?;
    }

    let still_active = creator.snapshot(&room_id).await?.active_participants().count();
    tracing::info!(room_id = %room_id, still_active = still_active, "Simulation finished");

    Ok(SimReport {
        room_id,
        seed,
        rounds,
        raffle_winner,
        still_active,
    })
}

async fn run_raffle(
    creator: &RoomManager,
    clients: &[SimClient],
    room_id: &str,
    events: &mut Receiver<SessionEvent>,
    timeout: Duration,
) -> anyhow::Result<RaffleWinner> {
    let raffles = RaffleManager::new(creator.clone());
    raffles.set_type(room_id, RaffleType::SingleSelection).await?;
    for client in clients {
        raffles.add_participant(room_id, client.rooms.user_id()).await?;
    }
    raffles.add_manual_participant(room_id, "Guest").await?;
    raffles.start(room_id).await?;

    wait_for(events, timeout, |event| {
        matches!(event, SessionEvent::RaffleCountdownStarted).then_some(())
    })
    .await?;
    let winner = wait_for(events, timeout, |event| match event {
        SessionEvent::RaffleDrawn(winner) => Some(winner),
        _ => None,
    })
    .await?;

    tracing::info!(winner = %winner.name, kind = ?winner.kind, "Raffle drawn");
    Ok(winner)
}

fn identity(index: usize) -> Identity {
    Identity::new(format!("user{}", index + 1), format!("Participant {}", index + 1))
}

fn random_card<R: Rng + ?Sized>(rng: &mut R) -> CardValue {
    let deck: Vec<CardValue> = CardValue::deck().collect();
    deck.choose(rng).copied().unwrap_or(CardValue::Unknown)
}

/// Wait for the first event `pick` accepts, skipping the rest
async fn wait_for<T>(
    events: &mut Receiver<SessionEvent>,
    timeout: Duration,
    mut pick: impl FnMut(SessionEvent) -> Option<T>,
) -> anyhow::Result<T> {
    tokio::time::timeout(timeout, async {
        while let Some(event) = events.recv().await {
            if let Some(value) = pick(event) {
                return Ok(value);
            }
        }
        Err(anyhow!("Session stopped before the expected event"))
    })
    .await
    .map_err(|_| anyhow!("Timed out after {timeout:?} waiting for session event"))?
}

/// Relay everything but snapshots, which arrive once per store write
async fn forward(mut events: Receiver<SessionEvent>, sink: mpsc::Sender<SessionEvent>) {
    while let Some(event) = events.recv().await {
        if matches!(event, SessionEvent::Snapshot(_)) {
            continue;
        }
        if sink.send(event).await.is_err() {
            break;
        }
    }
}

/// Keep a background client's event queue empty
async fn drain(user_id: String, mut events: Receiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Snapshot(_) => {}
            SessionEvent::Kicked | SessionEvent::RoomClosed => {
                tracing::warn!(user_id = %user_id, event = ?event, "Session stopped");
            }
            other => tracing::debug!(user_id = %user_id, event = ?other, "Session event"),
        }
    }
}
