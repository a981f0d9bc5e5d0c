//! Integration tests for the session registry and session actors.

use gambit_protocol::{NameRoster, Role, ServerEvent, SessionId};
use gambit_room::{MoveRefusal, SessionConfig, SessionError, SessionRegistry};
use gambit_rules::{Chess, Color, INITIAL_FEN, MoveRequest, Square};
use gambit_transport::ConnectionId;
use tokio::sync::mpsc;

type Rx = mpsc::UnboundedReceiver<ServerEvent>;

// =========================================================================
// Helpers
// =========================================================================

fn conn(n: u64) -> ConnectionId {
    ConnectionId::new(n)
}

fn mv(from: &str, to: &str) -> MoveRequest {
    MoveRequest::new(from.parse::<Square>().unwrap(), to.parse::<Square>().unwrap())
}

fn drain(rx: &mut Rx) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn join(
    registry: &mut SessionRegistry<Chess>,
    id: &str,
    n: u64,
    name: &str,
) -> (gambit_room::SessionHandle, Role, Rx) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (handle, role) = registry
        .join(&SessionId::from(id), conn(n), name.to_string(), tx)
        .await
        .unwrap();
    (handle, role, rx)
}

fn roster(white: Option<&str>, black: Option<&str>) -> NameRoster {
    NameRoster {
        white: white.map(String::from),
        black: black.map(String::from),
    }
}

// =========================================================================
// Seating
// =========================================================================

#[tokio::test]
async fn test_roles_assigned_in_join_order() {
    let mut registry = SessionRegistry::<Chess>::default();
    let (_, r1, _rx1) = join(&mut registry, "g", 1, "A").await;
    let (_, r2, _rx2) = join(&mut registry, "g", 2, "B").await;
    let (_, r3, _rx3) = join(&mut registry, "g", 3, "C").await;
    let (_, r4, _rx4) = join(&mut registry, "g", 4, "D").await;

    assert_eq!(
        [r1, r2, r3, r4],
        [Role::White, Role::Black, Role::Spectator, Role::Spectator]
    );
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let mut registry = SessionRegistry::<Chess>::default();
    let (h1, r1, _rx1) = join(&mut registry, "one", 1, "A").await;
    let (_, r2, _rx2) = join(&mut registry, "two", 2, "B").await;

    assert_eq!(r1, Role::White);
    assert_eq!(r2, Role::White);
    assert_eq!(registry.len(), 2);

    h1.propose_move(conn(1), mv("e2", "e4")).await.unwrap();
    let two = registry.get(&SessionId::from("two")).unwrap();
    assert_eq!(two.info().await.unwrap().move_count, 0);

    let mut ids = registry.session_ids();
    ids.sort();
    assert_eq!(ids, [SessionId::from("one"), SessionId::from("two")]);
}

// =========================================================================
// Scenario: two players, one move, one disconnect
// =========================================================================

#[tokio::test]
async fn test_two_player_game_and_reset() {
    let mut registry = SessionRegistry::<Chess>::default();
    let id = SessionId::from("A1");

    let (alice, role, mut alice_rx) = join(&mut registry, "A1", 1, "Alice").await;
    assert_eq!(role, Role::White);
    assert_eq!(
        drain(&mut alice_rx),
        vec![
            ServerEvent::PlayerRole(Role::White),
            ServerEvent::BoardState(INITIAL_FEN.into()),
            ServerEvent::MoveHistory(vec![]),
            ServerEvent::PlayerNames(roster(Some("Alice"), None)),
        ]
    );

    let (bob, role, mut bob_rx) = join(&mut registry, "A1", 2, "Bob").await;
    assert_eq!(role, Role::Black);
    assert_eq!(
        drain(&mut alice_rx),
        vec![ServerEvent::PlayerNames(roster(Some("Alice"), Some("Bob")))]
    );
    assert_eq!(
        drain(&mut bob_rx).last(),
        Some(&ServerEvent::PlayerNames(roster(Some("Alice"), Some("Bob"))))
    );

    alice.propose_move(conn(1), mv("e2", "e4")).await.unwrap();
    let after_e4 = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    for rx in [&mut alice_rx, &mut bob_rx] {
        assert_eq!(
            drain(rx),
            vec![
                ServerEvent::BoardState(after_e4.into()),
                ServerEvent::MoveHistory(vec!["e4".into()]),
            ]
        );
    }
    assert_eq!(alice.info().await.unwrap().side_to_move, Color::Black);

    // Bob tries a white pawn: dropped, nobody hears about it.
    let err = bob.propose_move(conn(2), mv("e2", "e4")).await.unwrap_err();
    assert!(matches!(err, SessionError::Refused(MoveRefusal::Rule(_))));
    assert!(drain(&mut alice_rx).is_empty());
    assert!(drain(&mut bob_rx).is_empty());

    let departure = registry.leave(&id, conn(2)).await.unwrap().unwrap();
    assert!(departure.reset);
    assert_eq!(
        drain(&mut alice_rx),
        vec![
            ServerEvent::GameReset,
            ServerEvent::BoardState(INITIAL_FEN.into()),
            ServerEvent::MoveHistory(vec![]),
            ServerEvent::PlayerNames(roster(None, None)),
        ]
    );

    let info = alice.info().await.unwrap();
    assert_eq!(info.white, None);
    assert_eq!(info.black, None);
    assert_eq!(info.move_count, 0);
    assert_eq!(info.member_count, 1);
}

// =========================================================================
// Move preconditions
// =========================================================================

#[tokio::test]
async fn test_out_of_turn_move_is_not_applied() {
    let mut registry = SessionRegistry::<Chess>::default();
    let (_, _, mut white_rx) = join(&mut registry, "g", 1, "W").await;
    let (black, _, mut black_rx) = join(&mut registry, "g", 2, "B").await;
    drain(&mut white_rx);
    drain(&mut black_rx);

    let err = black.propose_move(conn(2), mv("e7", "e5")).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Refused(MoveRefusal::NotYourTurn(Color::White))
    ));
    assert!(drain(&mut white_rx).is_empty());
    assert_eq!(black.info().await.unwrap().move_count, 0);
}

#[tokio::test]
async fn test_each_accepted_move_grows_log_by_one() {
    let mut registry = SessionRegistry::<Chess>::default();
    let (white, _, mut rx) = join(&mut registry, "g", 1, "W").await;
    let (black, _, _brx) = join(&mut registry, "g", 2, "B").await;
    drain(&mut rx);

    let moves = [(&white, 1, "e2", "e4"), (&black, 2, "c7", "c5"), (&white, 1, "g1", "f3")];
    let mut last_fen = INITIAL_FEN.to_string();
    for (i, (handle, n, from, to)) in moves.into_iter().enumerate() {
        handle.propose_move(conn(n), mv(from, to)).await.unwrap();
        let events = drain(&mut rx);
        let [ServerEvent::BoardState(fen), ServerEvent::MoveHistory(log)] = events.as_slice() else {
            panic!("unexpected events {events:?}");
        };
        assert_ne!(*fen, last_fen);
        assert_eq!(log.len(), i + 1);
        last_fen = fen.clone();
    }
}

#[tokio::test]
async fn test_spectator_cannot_move() {
    let mut registry = SessionRegistry::<Chess>::default();
    let (_, _, _w) = join(&mut registry, "g", 1, "W").await;
    let (_, _, _b) = join(&mut registry, "g", 2, "B").await;
    let (spectator, role, _s) = join(&mut registry, "g", 3, "S").await;
    assert_eq!(role, Role::Spectator);

    let err = spectator.propose_move(conn(3), mv("e2", "e4")).await.unwrap_err();
    assert!(matches!(err, SessionError::Refused(MoveRefusal::Spectator)));
}

#[tokio::test]
async fn test_rejection_notice_goes_to_proposer_only() {
    let config = SessionConfig::default().with_rejection_notices(true);
    let mut registry = SessionRegistry::<Chess>::new(config);
    let (white, _, mut white_rx) = join(&mut registry, "g", 1, "W").await;
    let (_, _, mut black_rx) = join(&mut registry, "g", 2, "B").await;
    drain(&mut white_rx);
    drain(&mut black_rx);

    let _ = white.propose_move(conn(1), mv("e2", "e5")).await;

    let events = drain(&mut white_rx);
    assert!(matches!(events.as_slice(), [ServerEvent::MoveRejected(_)]));
    assert!(drain(&mut black_rx).is_empty());
}

// =========================================================================
// Departures
// =========================================================================

#[tokio::test]
async fn test_spectator_leave_keeps_game() {
    let mut registry = SessionRegistry::<Chess>::default();
    let (white, _, mut white_rx) = join(&mut registry, "g", 1, "W").await;
    let (_, _, _b) = join(&mut registry, "g", 2, "B").await;
    let (_, _, _s) = join(&mut registry, "g", 3, "S").await;
    white.propose_move(conn(1), mv("d2", "d4")).await.unwrap();
    drain(&mut white_rx);

    let departure = registry
        .leave(&SessionId::from("g"), conn(3))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(departure.role, Role::Spectator);
    assert!(!departure.reset);

    assert!(drain(&mut white_rx).is_empty());
    let info = white.info().await.unwrap();
    assert_eq!(info.white.as_deref(), Some("W"));
    assert_eq!(info.black.as_deref(), Some("B"));
    assert_eq!(info.move_count, 1);
}

#[tokio::test]
async fn test_last_leave_removes_session() {
    let mut registry = SessionRegistry::<Chess>::default();
    let id = SessionId::from("g");
    let (old, _, _rx) = join(&mut registry, "g", 1, "W").await;
    old.propose_move(conn(1), mv("e2", "e4")).await.unwrap();

    registry.leave(&id, conn(1)).await.unwrap();
    assert!(registry.get(&id).is_none());
    assert!(registry.is_empty());

    // A new join with the same id starts from scratch.
    let (fresh, role, mut rx) = join(&mut registry, "g", 2, "X").await;
    assert_eq!(role, Role::White);
    assert_eq!(drain(&mut rx)[1], ServerEvent::BoardState(INITIAL_FEN.into()));
    assert_eq!(fresh.info().await.unwrap().move_count, 0);
}

#[tokio::test]
async fn test_leave_unknown_session_is_noop() {
    let mut registry = SessionRegistry::<Chess>::default();
    let result = registry.leave(&SessionId::from("nope"), conn(1)).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_removed_session_handle_is_unavailable() {
    let mut registry = SessionRegistry::<Chess>::default();
    let id = SessionId::from("g");
    let (handle, _, _rx) = join(&mut registry, "g", 1, "W").await;

    registry.remove(&id).await.unwrap();
    tokio::task::yield_now().await;

    let err = handle.info().await.unwrap_err();
    assert!(matches!(err, SessionError::Unavailable(_)));
}

#[tokio::test]
async fn test_remove_after_actor_stopped_still_drops_entry() {
    let mut registry = SessionRegistry::<Chess>::default();
    let id = SessionId::from("g");
    let (handle, _, _rx) = join(&mut registry, "g", 1, "W").await;

    handle.shutdown().await.unwrap();
    while !handle.is_closed() {
        tokio::task::yield_now().await;
    }

    assert!(registry.remove(&id).await.is_some());
    assert!(registry.is_empty());
}
