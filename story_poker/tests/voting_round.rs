/// Integration tests for the voting round
///
/// These tests cover the round state machine end to end: transitions,
/// atomic point resets and the tally computed from the revealed snapshot.
use std::sync::Arc;

use story_poker::{
    CardValue, Identity, MemoryStore, RoomManager, RoundStatus, VotingError, VotingRound,
    store::{RoomStore, StorePath},
    summarize,
};

struct Client {
    rooms: RoomManager,
    voting: VotingRound,
}

fn client(store: &Arc<MemoryStore>, user_id: &str) -> Client {
    let rooms = RoomManager::new(store.clone(), Identity::new(user_id, user_id));
    Client {
        voting: VotingRound::new(rooms.clone()),
        rooms,
    }
}

async fn vote(client: &Client, room_id: &str, card: CardValue) {
    let room = client.rooms.snapshot(room_id).await.unwrap();
    client.voting.select_card(&room, card).await.unwrap();
}

#[tokio::test]
async fn test_unanimous_round_reaches_consensus() {
    let store = Arc::new(MemoryStore::new());
    let a = client(&store, "a");
    let b = client(&store, "b");
    let c = client(&store, "c");
    let room_id = a.rooms.create_room("r").await.unwrap();
    b.rooms.join_room(&room_id).await.unwrap();
    c.rooms.join_room(&room_id).await.unwrap();

    a.voting.start(&room_id).await.unwrap();
    for client in [&a, &b, &c] {
        vote(client, &room_id, CardValue::Points(5)).await;
    }
    a.voting.reveal(&room_id).await.unwrap();

    let room = a.rooms.snapshot(&room_id).await.unwrap();
    assert_eq!(room.status, RoundStatus::Completed);

    let consensus = summarize(room.participants.values()).consensus;
    assert!(consensus.has_consensus);
    assert_eq!(consensus.consensus_point, Some(CardValue::Points(5)));
    assert_eq!(consensus.active_voters, 3);
}

#[tokio::test]
async fn test_start_again_is_one_store_update() {
    let store = Arc::new(MemoryStore::new());
    let a = client(&store, "a");
    let b = client(&store, "b");
    let room_id = a.rooms.create_room("r").await.unwrap();
    b.rooms.join_room(&room_id).await.unwrap();

    a.voting.start(&room_id).await.unwrap();
    vote(&a, &room_id, CardValue::Points(3)).await;
    vote(&b, &room_id, CardValue::Unknown).await;
    a.voting.reveal(&room_id).await.unwrap();

    let mut subscription = store.subscribe(&room_id).await.unwrap();
    subscription.next().await.unwrap();

    a.voting.start_again(&room_id).await.unwrap();

    // The very next snapshot already has both changes
    let snapshot = subscription.next().await.unwrap().unwrap();
    assert_eq!(snapshot["status"], "voting");
    for user_id in ["a", "b"] {
        assert!(snapshot["participants"][user_id].get("point").is_none());
    }
}

#[tokio::test]
async fn test_tally_after_reveal() {
    let store = Arc::new(MemoryStore::new());
    let a = client(&store, "a");
    let b = client(&store, "b");
    let room_id = a.rooms.create_room("r").await.unwrap();
    b.rooms.join_room(&room_id).await.unwrap();

    a.voting.start(&room_id).await.unwrap();
    vote(&a, &room_id, CardValue::Points(3)).await;
    vote(&b, &room_id, CardValue::Points(5)).await;
    a.voting.reveal(&room_id).await.unwrap();

    let room = b.rooms.snapshot(&room_id).await.unwrap();
    let summary = summarize(room.participants.values());

    assert_eq!(summary.average, 4.0);
    assert_eq!(summary.rounded_average, CardValue::Points(3));
    assert_eq!(summary.proximity.percentage(), 50.0);
    assert!(!summary.consensus.has_consensus);
}

#[tokio::test]
async fn test_cards_locked_after_reveal() {
    let store = Arc::new(MemoryStore::new());
    let a = client(&store, "a");
    let room_id = a.rooms.create_room("r").await.unwrap();
    a.voting.start(&room_id).await.unwrap();
    a.voting.reveal(&room_id).await.unwrap();

    let room = a.rooms.snapshot(&room_id).await.unwrap();
    let result = a.voting.select_card(&room, CardValue::Points(2)).await;

    assert!(matches!(
        result,
        Err(VotingError::VotingClosed(RoundStatus::Completed))
    ));
}

#[tokio::test]
async fn test_missing_status_is_treated_as_voting() {
    let store = Arc::new(MemoryStore::new());
    let a = client(&store, "a");
    let room_id = a.rooms.create_room("r").await.unwrap();
    store
        .remove(&StorePath::room(&room_id).child("status"))
        .await
        .unwrap();

    let room = a.rooms.snapshot(&room_id).await.unwrap();
    assert_eq!(room.status, RoundStatus::Voting);
    assert_eq!(
        a.voting.reveal(&room_id).await.unwrap(),
        RoundStatus::Completed
    );
}

#[tokio::test]
async fn test_creator_enforcement_blocks_transitions() {
    let store = Arc::new(MemoryStore::new());
    let a = client(&store, "a");
    let room_id = a.rooms.create_room("r").await.unwrap();

    let b_rooms = RoomManager::new(store.clone(), Identity::new("b", "b"))
        .with_creator_enforcement(true);
    b_rooms.join_room(&room_id).await.unwrap();
    let result = VotingRound::new(b_rooms).start(&room_id).await;

    assert!(matches!(result, Err(VotingError::Room(_))));
    let room = a.rooms.snapshot(&room_id).await.unwrap();
    assert_eq!(room.status, RoundStatus::Waiting);
}
