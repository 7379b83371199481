//! Per-client session loop.

use super::{
    messages::{SessionEvent, SessionMessage, TimerEvent},
    timer::{Countdown, Ticker},
};
use crate::{
    breaks::{BreakTick, BreakTimer},
    config::SessionConfig,
    models::{BreakStatus, Identity, Participant, RaffleStatus, RaffleWinner, Room, RoomId},
    raffle::RaffleManager,
    reactions::ReactionBoard,
    room::{RoomError, RoomManager, RoomResult},
    store::{RoomStore, Snapshot, Subscription},
    tally::summarize,
    voting::{RevealAction, RevealGate},
};
use chrono::Utc;
use std::{collections::HashSet, ops::ControlFlow, sync::Arc};
use tokio::sync::{mpsc, oneshot};

/// Inbox capacity of a session
const INBOX_CAPACITY: usize = 64;

/// Event channel capacity; events beyond it are dropped with a warning
pub const EVENT_CAPACITY: usize = 256;

/// Handle for stopping a running session
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    room_id: RoomId,
}

impl SessionHandle {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Whether the session loop has exited
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Mark the participant inactive and stop the session
    pub async fn shutdown(&self) -> Result<(), String> {
        let (response, done) = oneshot::channel();
        self.sender
            .send(SessionMessage::Shutdown { response })
            .await
            .map_err(|_| "Session is closed".to_string())?;
        done.await.map_err(|_| "Session is closed".to_string())
    }
}

/// One client's view of a room.
///
/// Owns every local timer (reveal delay, raffle countdown, break countdown,
/// reaction sweep) and reacts to whole-room snapshots from the store.
pub struct ClientSession {
    room_id: RoomId,
    config: SessionConfig,

    rooms: RoomManager,
    raffles: RaffleManager,
    breaks: BreakTimer,
    reactions: ReactionBoard,

    subscription: Subscription,
    inbox: mpsc::Receiver<SessionMessage>,
    inbox_sender: mpsc::Sender<SessionMessage>,
    events: mpsc::Sender<SessionEvent>,

    /// Last validated snapshot
    latest: Option<Room>,

    gate: RevealGate,
    reveal_timer: Countdown,
    raffle_timer: Countdown,
    /// Raffle countdown ran for the current pending draw
    raffle_armed: bool,
    /// Countdown elapsed while another client was the designated drawer
    raffle_waiting: bool,
    announced_winner: Option<RaffleWinner>,
    break_ticker: Ticker,
    sweep_ticker: Ticker,
    seen_reactions: HashSet<String>,
}

impl ClientSession {
    /// Enter `room_id` and start the session loop.
    ///
    /// # Arguments
    ///
    /// * `store` - Shared document store
    /// * `identity` - The local user
    /// * `room_id` - Room to enter
    /// * `previous_room` - Room the user was last in, marked inactive
    /// * `config` - Timer and policy settings
    ///
    /// # Errors
    ///
    /// * `RoomError::Validation` - Invalid config or room id
    /// * `RoomError::NotFound` - Room does not exist
    pub async fn spawn(
        store: Arc<dyn RoomStore>,
        identity: Identity,
        room_id: &str,
        previous_room: Option<&str>,
        config: SessionConfig,
    ) -> RoomResult<(SessionHandle, mpsc::Receiver<SessionEvent>)> {
        config.validate().map_err(RoomError::Validation)?;

        let rooms = RoomManager::new(store.clone(), identity)
            .with_creator_enforcement(config.enforce_creator);
        rooms.enter_room(room_id, previous_room).await?;
        let subscription = store.subscribe(room_id).await?;

        let (inbox_sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (events, event_receiver) = mpsc::channel(EVENT_CAPACITY);

        let session = Self {
            room_id: room_id.to_string(),
            raffles: RaffleManager::new(rooms.clone()),
            breaks: BreakTimer::new(rooms.clone()),
            reactions: ReactionBoard::new(rooms.clone(), config.reaction_ttl),
            rooms,
            config,
            subscription,
            inbox,
            inbox_sender: inbox_sender.clone(),
            events,
            latest: None,
            gate: RevealGate::new(),
            reveal_timer: Countdown::new(),
            raffle_timer: Countdown::new(),
            raffle_armed: false,
            raffle_waiting: false,
            announced_winner: None,
            break_ticker: Ticker::new(),
            sweep_ticker: Ticker::new(),
            seen_reactions: HashSet::new(),
        };

        tokio::spawn(session.run());

        let handle = SessionHandle {
            sender: inbox_sender,
            room_id: room_id.to_string(),
        };
        Ok((handle, event_receiver))
    }

    async fn run(mut self) {
        log::info!(
            "Session for {} in room {} starting",
            self.rooms.user_id(),
            self.room_id
        );

        self.sweep_ticker.start(
            self.config.reaction_sweep,
            self.inbox_sender.clone(),
            TimerEvent::SweepReactions,
        );

        loop {
            tokio::select! {
                snapshot = self.subscription.next() => {
                    let Some(snapshot) = snapshot else {
                        log::warn!("Room {}: store closed the subscription", self.room_id);
                        self.emit(SessionEvent::RoomClosed);
                        break;
                    };
                    if self.handle_snapshot(snapshot).is_break() {
                        break;
                    }
                }

                Some(message) = self.inbox.recv() => {
                    match message {
                        SessionMessage::Timer(event) => self.handle_timer(event).await,
                        SessionMessage::Shutdown { response } => {
                            if let Err(e) = self.rooms.set_inactive(&self.room_id).await {
                                log::warn!("Room {}: failed to mark {} inactive: {}", self.room_id, self.rooms.user_id(), e);
                            }
                            let _ = response.send(());
                            break;
                        }
                    }
                }
            }
        }

        log::info!(
            "Session for {} in room {} stopped",
            self.rooms.user_id(),
            self.room_id
        );
    }

    fn handle_snapshot(&mut self, snapshot: Snapshot) -> ControlFlow<()> {
        let Some(value) = snapshot else {
            log::info!("Room {} no longer exists", self.room_id);
            self.emit(SessionEvent::RoomClosed);
            return ControlFlow::Break(());
        };

        let room = match Room::from_snapshot(&self.room_id, &value) {
            Ok(room) => room,
            Err(e) => {
                log::warn!("Room {}: ignoring invalid snapshot: {}", self.room_id, e);
                return ControlFlow::Continue(());
            }
        };

        // Membership was established by `enter_room` before subscribing
        let me = room.participant(self.rooms.user_id()).cloned();
        if me.is_none() {
            log::info!(
                "User {} was removed from room {}",
                self.rooms.user_id(),
                self.room_id
            );
            self.emit(SessionEvent::Kicked);
            return ControlFlow::Break(());
        }

        self.emit(SessionEvent::Snapshot(room.clone()));
        self.observe_round(&room);
        self.observe_raffle(&room);
        self.observe_break(me.as_ref());
        self.observe_reactions(&room);
        self.latest = Some(room);

        ControlFlow::Continue(())
    }

    fn observe_round(&mut self, room: &Room) {
        match self.gate.observe(room.status) {
            RevealAction::StartCountdown => {
                self.reveal_timer.start(
                    self.config.reveal_delay,
                    self.inbox_sender.clone(),
                    TimerEvent::RevealElapsed,
                );
                self.emit(SessionEvent::RevealCountdownStarted);
            }
            RevealAction::RevealNow => {
                self.emit(SessionEvent::CardsRevealed(summarize(room.participants.values())));
            }
            RevealAction::Hide => {
                self.reveal_timer.cancel();
                self.emit(SessionEvent::CardsHidden);
            }
            RevealAction::Nothing => {}
        }
    }

    fn observe_raffle(&mut self, room: &Room) {
        let raffle = room.raffle_or_default();

        if let Some(winner) = raffle.winner {
            self.raffle_timer.cancel();
            self.raffle_armed = false;
            self.raffle_waiting = false;
            if self.announced_winner.as_ref() != Some(&winner) {
                self.announced_winner = Some(winner.clone());
                self.emit(SessionEvent::RaffleDrawn(winner));
            }
            return;
        }

        match raffle.status {
            RaffleStatus::Pending if !self.raffle_armed => {
                self.raffle_armed = true;
                self.raffle_timer.start(
                    self.config.raffle_countdown,
                    self.inbox_sender.clone(),
                    TimerEvent::RaffleCountdownElapsed,
                );
                self.emit(SessionEvent::RaffleCountdownStarted);
            }
            RaffleStatus::Pending => {
                if self.raffle_waiting
                    && self.config.draw_policy.should_draw(room, self.rooms.user_id())
                {
                    log::info!(
                        "Room {}: {} took over the raffle draw",
                        self.room_id,
                        self.rooms.user_id()
                    );
                    self.raffle_waiting = false;
                    self.notify_self(TimerEvent::RaffleCountdownElapsed);
                }
            }
            RaffleStatus::None | RaffleStatus::Completed => {
                self.raffle_timer.cancel();
                self.raffle_armed = false;
                self.raffle_waiting = false;
                self.announced_winner = None;
            }
        }
    }

    fn observe_break(&mut self, me: Option<&Participant>) {
        let on_timed_break = me.is_some_and(|p| p.break_status == BreakStatus::Time);

        if on_timed_break && !self.break_ticker.is_running() {
            self.break_ticker.start(
                self.config.break_tick,
                self.inbox_sender.clone(),
                TimerEvent::BreakTick,
            );
        } else if !on_timed_break {
            self.break_ticker.cancel();
        }
    }

    fn observe_reactions(&mut self, room: &Room) {
        self.seen_reactions
            .retain(|reaction_id| room.reactions.contains_key(reaction_id));

        for (reaction_id, reaction) in &room.reactions {
            if self.seen_reactions.insert(reaction_id.clone()) {
                self.emit(SessionEvent::ReactionReceived(reaction.clone()));
            }
        }
    }

    async fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::RevealElapsed => {
                if self.gate.countdown_elapsed()
                    && let Some(room) = &self.latest
                {
                    let summary = summarize(room.participants.values());
                    self.emit(SessionEvent::CardsRevealed(summary));
                }
            }
            TimerEvent::RaffleCountdownElapsed => self.draw_raffle().await,
            TimerEvent::BreakTick => self.tick_break().await,
            TimerEvent::SweepReactions => {
                let now = Utc::now().timestamp_millis();
                if let Err(e) = self.reactions.clean_old_reactions(&self.room_id, now).await {
                    log::warn!("Room {}: reaction sweep failed: {}", self.room_id, e);
                }
            }
        }
    }

    async fn draw_raffle(&mut self) {
        let Some(room) = self.latest.as_ref() else {
            return;
        };

        let raffle = room.raffle_or_default();
        if raffle.status != RaffleStatus::Pending || raffle.winner.is_some() {
            return;
        }

        if !self.config.draw_policy.should_draw(room, self.rooms.user_id()) {
            log::debug!(
                "Room {}: {} waiting for the designated drawer",
                self.room_id,
                self.rooms.user_id()
            );
            self.raffle_waiting = true;
            return;
        }

        if let Err(e) = self.raffles.draw(&self.room_id).await {
            log::warn!("Room {}: raffle draw failed, retrying: {}", self.room_id, e);
            self.raffle_timer.start(
                self.config.raffle_countdown,
                self.inbox_sender.clone(),
                TimerEvent::RaffleCountdownElapsed,
            );
        }
    }

    async fn tick_break(&mut self) {
        let me = self
            .latest
            .as_ref()
            .and_then(|room| room.participant(self.rooms.user_id()))
            .cloned();
        let Some(me) = me else {
            return;
        };

        match self.breaks.tick(&self.room_id, &me).await {
            Ok(BreakTick::Ended) => {
                self.break_ticker.cancel();
                self.emit(SessionEvent::BreakEnded);
            }
            Ok(BreakTick::Continue(_)) => {}
            Ok(BreakTick::Idle) => self.break_ticker.cancel(),
            // Timers are self-correcting: the next tick retries
            Err(e) => log::warn!("Room {}: break tick failed: {}", self.room_id, e),
        }
    }

    /// Queue a timer event without waiting for a timer
    fn notify_self(&self, event: TimerEvent) {
        if let Err(e) = self.inbox_sender.try_send(SessionMessage::Timer(event)) {
            log::warn!("Room {}: failed to queue {:?}: {}", self.room_id, event, e);
        }
    }

    fn emit(&self, event: SessionEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("Room {}: event channel full, dropping event", self.room_id);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
