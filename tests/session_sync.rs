use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use chess_sync_server::dataaccess::{GameStore, MemoryDataAccess, UserStore};
use chess_sync_server::error::SessionError;
use chess_sync_server::game::{Color, GameStatus, InvalidMove, Move, Position};
use chess_sync_server::models::{CommandType, GameId, ServerMessage, UserGameCommand};
use chess_sync_server::websocket::{ConnectionId, DeliveryError, Outbox, SessionRegistry, Synchronizer};

#[derive(Default)]
struct RecordingOutbox {
    sent: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl RecordingOutbox {
    fn take(&self) -> Vec<ServerMessage> {
        self.sent
            .lock()
            .drain(..)
            .map(|raw| serde_json::from_str(&raw).unwrap())
            .collect()
    }
}

impl Outbox for RecordingOutbox {
    fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DeliveryError::Closed);
        }
        self.sent.lock().push(payload.to_owned());
        Ok(())
    }
}

struct Client {
    id: ConnectionId,
    token: String,
    outbox: Arc<RecordingOutbox>,
}

impl Client {
    fn command(&self, command_type: CommandType, game_id: GameId, mv: Option<Move>) -> UserGameCommand {
        UserGameCommand {
            command_type,
            auth_token: self.token.clone(),
            game_id,
            chess_move: mv,
        }
    }
}

struct Table {
    store: Arc<MemoryDataAccess>,
    sync: Synchronizer,
    game_id: GameId,
}

impl Table {
    /// alice plays white, bob plays black, carol has no seat.
    fn new() -> Self {
        let store = Arc::new(MemoryDataAccess::new());
        let game_id = store.create_game("table").unwrap();
        let sync = Synchronizer::new(store.clone(), store.clone(), Arc::new(SessionRegistry::new()));
        Self {
            store,
            sync,
            game_id,
        }
    }

    fn client(&self, name: &str, seat: Option<Color>) -> Client {
        let auth = self.store.register(name, "pw").unwrap();
        if let Some(color) = seat {
            self.store.claim_seat(self.game_id, color, name).unwrap();
        }
        Client {
            id: ConnectionId::new(),
            token: auth.auth_token,
            outbox: Arc::new(RecordingOutbox::default()),
        }
    }

    fn connect(&self, client: &Client) -> Result<(), SessionError> {
        let cmd = client.command(CommandType::Connect, self.game_id, None);
        self.sync.connect(client.id, client.outbox.clone(), &cmd)
    }

    fn play(&self, client: &Client, mv: Move) -> Result<(), SessionError> {
        let cmd = client.command(CommandType::MakeMove, self.game_id, Some(mv));
        self.sync.make_move(client.id, &cmd)
    }

    fn resign(&self, client: &Client) -> Result<(), SessionError> {
        let cmd = client.command(CommandType::Resign, self.game_id, None);
        self.sync.resign(client.id, &cmd)
    }

    fn status(&self) -> GameStatus {
        self.store.load_game(self.game_id).unwrap().unwrap().game.status
    }
}

fn mv(from: (i8, i8), to: (i8, i8)) -> Move {
    Move::new(Position::new(from.0, from.1), Position::new(to.0, to.1))
}

fn notifications(messages: &[ServerMessage]) -> Vec<&str> {
    messages
        .iter()
        .filter_map(|m| match m {
            ServerMessage::Notification { message } => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

/// Three connected clients with their join traffic already drained.
fn seated_table() -> (Table, Client, Client, Client) {
    let table = Table::new();
    let alice = table.client("alice", Some(Color::White));
    let bob = table.client("bob", Some(Color::Black));
    let carol = table.client("carol", None);
    for c in [&alice, &bob, &carol] {
        table.connect(c).unwrap();
    }
    for c in [&alice, &bob, &carol] {
        c.outbox.take();
    }
    (table, alice, bob, carol)
}

#[test]
fn connect_loads_game_and_announces_seat() {
    let table = Table::new();
    let alice = table.client("alice", Some(Color::White));
    let bob = table.client("bob", Some(Color::Black));
    let carol = table.client("carol", None);

    table.connect(&alice).unwrap();
    let to_alice = alice.outbox.take();
    assert_eq!(to_alice.len(), 1);
    assert!(matches!(&to_alice[0], ServerMessage::LoadGame { game } if game.turn == Color::White));

    table.connect(&bob).unwrap();
    assert!(matches!(bob.outbox.take().as_slice(), [ServerMessage::LoadGame { .. }]));
    assert_eq!(notifications(&alice.outbox.take()), vec!["bob joined as black"]);

    table.connect(&carol).unwrap();
    assert!(matches!(carol.outbox.take().as_slice(), [ServerMessage::LoadGame { .. }]));
    for other in [&alice, &bob] {
        assert_eq!(
            notifications(&other.outbox.take()),
            vec!["carol is observing the game"]
        );
    }
    assert_eq!(table.sync.registry().connections_in(table.game_id).len(), 3);
}

#[test]
fn connect_rejects_bad_token_and_unknown_game() {
    let table = Table::new();
    let alice = table.client("alice", Some(Color::White));

    let forged = Client {
        token: "not-a-token".into(),
        ..table.client("mallory", None)
    };
    assert_eq!(table.connect(&forged), Err(SessionError::Unauthenticated));

    let cmd = alice.command(CommandType::Connect, 99, None);
    assert_eq!(
        table.sync.connect(alice.id, alice.outbox.clone(), &cmd),
        Err(SessionError::GameNotFound(99))
    );
    assert!(table.sync.registry().is_empty());
    assert!(alice.outbox.take().is_empty());
}

#[test]
fn accepted_move_is_saved_and_broadcast() {
    let (table, alice, bob, carol) = seated_table();

    table.play(&alice, mv((2, 5), (4, 5))).unwrap();

    let stored = table.store.load_game(table.game_id).unwrap().unwrap();
    assert_eq!(stored.game.turn, Color::Black);

    let to_alice = alice.outbox.take();
    assert!(notifications(&to_alice).is_empty());
    assert!(matches!(to_alice.as_slice(), [ServerMessage::LoadGame { game }] if *game == stored.game));

    for other in [&bob, &carol] {
        let got = other.outbox.take();
        assert_eq!(notifications(&got), vec!["alice moved from e2 to e4"]);
        assert!(matches!(got.last(), Some(ServerMessage::LoadGame { game }) if *game == stored.game));
    }
}

#[test]
fn out_of_turn_move_reaches_only_the_sender() {
    let (table, alice, bob, carol) = seated_table();

    assert_eq!(table.play(&bob, mv((7, 5), (5, 5))), Err(SessionError::NotYourTurn));

    let cmd = bob.command(CommandType::MakeMove, table.game_id, Some(mv((7, 5), (5, 5))));
    table.sync.dispatch(bob.id, bob.outbox.clone(), cmd);
    assert_eq!(
        bob.outbox.take(),
        vec![ServerMessage::error("not your turn")]
    );
    assert!(alice.outbox.take().is_empty());
    assert!(carol.outbox.take().is_empty());

    let stored = table.store.load_game(table.game_id).unwrap().unwrap();
    assert_eq!(stored.game.turn, Color::White);
}

#[test]
fn observers_cannot_move_or_resign() {
    let (table, alice, bob, carol) = seated_table();

    assert_eq!(
        table.play(&carol, mv((2, 5), (4, 5))),
        Err(SessionError::ObserverAction("make moves"))
    );
    assert_eq!(table.resign(&carol), Err(SessionError::ObserverAction("resign")));

    for c in [&alice, &bob, &carol] {
        assert!(c.outbox.take().is_empty());
    }
    assert_eq!(table.status(), GameStatus::Normal);
}

#[test]
fn illegal_and_missing_moves_are_refused() {
    let (table, alice, bob, _carol) = seated_table();

    let bogus = mv((1, 1), (5, 1));
    assert_eq!(
        table.play(&alice, bogus),
        Err(SessionError::InvalidMove(InvalidMove::Illegal(bogus)))
    );

    let cmd = alice.command(CommandType::MakeMove, table.game_id, None);
    assert_eq!(table.sync.make_move(alice.id, &cmd), Err(SessionError::MissingMove));

    assert!(bob.outbox.take().is_empty());
    let stored = table.store.load_game(table.game_id).unwrap().unwrap();
    assert_eq!(stored.game.turn, Color::White);
}

#[test]
fn commands_before_connect_are_refused() {
    let table = Table::new();
    let alice = table.client("alice", Some(Color::White));

    assert_eq!(table.play(&alice, mv((2, 5), (4, 5))), Err(SessionError::NotConnected));
    assert_eq!(table.resign(&alice), Err(SessionError::NotConnected));
    assert_eq!(table.sync.leave(alice.id), Err(SessionError::NotConnected));
}

#[test]
fn checkmate_is_announced_and_ends_play() {
    let (table, alice, bob, carol) = seated_table();

    table.play(&alice, mv((2, 6), (3, 6))).unwrap();
    table.play(&bob, mv((7, 5), (5, 5))).unwrap();
    table.play(&alice, mv((2, 7), (4, 7))).unwrap();
    for c in [&alice, &bob, &carol] {
        c.outbox.take();
    }

    table.play(&bob, mv((8, 4), (4, 8))).unwrap();
    assert_eq!(table.status(), GameStatus::Checkmate);

    let to_carol = carol.outbox.take();
    assert_eq!(
        notifications(&to_carol),
        vec![
            "bob moved from d8 to h4",
            "alice is in checkmate. bob wins the game!",
        ]
    );
    assert!(matches!(
        to_carol.last(),
        Some(ServerMessage::LoadGame { game }) if game.status == GameStatus::Checkmate
    ));
    assert_eq!(
        notifications(&bob.outbox.take()),
        vec!["alice is in checkmate. bob wins the game!"]
    );
    assert_eq!(alice.outbox.take().len(), 3);

    assert_eq!(table.play(&alice, mv((2, 1), (3, 1))), Err(SessionError::GameOver));
    assert_eq!(table.resign(&alice), Err(SessionError::GameOver));
    assert!(carol.outbox.take().is_empty());
}

#[test]
fn resignation_is_final() {
    let (table, alice, bob, carol) = seated_table();

    table.resign(&bob).unwrap();
    assert_eq!(table.status(), GameStatus::Resigned);

    for c in [&alice, &bob, &carol] {
        let got = c.outbox.take();
        assert_eq!(
            notifications(&got),
            vec!["bob has resigned and forfeited the game. Game Over."]
        );
        assert!(matches!(
            got.last(),
            Some(ServerMessage::LoadGame { game }) if game.status == GameStatus::Resigned
        ));
    }

    assert_eq!(table.resign(&alice), Err(SessionError::GameOver));
    assert_eq!(table.play(&alice, mv((2, 5), (4, 5))), Err(SessionError::GameOver));
}

#[test]
fn leaving_vacates_the_seat_and_notifies_the_rest() {
    let (table, alice, bob, carol) = seated_table();

    table.sync.leave(alice.id).unwrap();

    let record = table.store.load_game(table.game_id).unwrap().unwrap();
    assert_eq!(record.white_username, None);
    assert_eq!(record.black_username.as_deref(), Some("bob"));
    assert!(table.sync.registry().get(&alice.id).is_none());
    assert!(alice.outbox.take().is_empty());
    for c in [&bob, &carol] {
        assert_eq!(notifications(&c.outbox.take()), vec!["alice left the game"]);
    }
    assert_eq!(table.sync.leave(alice.id), Err(SessionError::NotConnected));
}

#[test]
fn observer_leaving_keeps_seats() {
    let (table, _alice, bob, carol) = seated_table();

    table.sync.disconnect(carol.id);
    table.sync.disconnect(carol.id);

    let record = table.store.load_game(table.game_id).unwrap().unwrap();
    assert_eq!(record.white_username.as_deref(), Some("alice"));
    assert_eq!(record.black_username.as_deref(), Some("bob"));
    assert_eq!(notifications(&bob.outbox.take()), vec!["carol left the game"]);
}

#[test]
fn racing_duplicate_moves_apply_once() {
    let table = Table::new();
    let alice = table.client("alice", Some(Color::White));
    let second = Client {
        id: ConnectionId::new(),
        token: table.store.login("alice", "pw").unwrap().auth_token,
        outbox: Arc::new(RecordingOutbox::default()),
    };
    table.connect(&alice).unwrap();
    table.connect(&second).unwrap();

    let results: Vec<Result<(), SessionError>> = std::thread::scope(|s| {
        let handles: Vec<_> = [&alice, &second]
            .into_iter()
            .map(|c| {
                let table = &table;
                s.spawn(move || table.play(c, mv((2, 5), (4, 5))))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.contains(&Err(SessionError::NotYourTurn)));
    let stored = table.store.load_game(table.game_id).unwrap().unwrap();
    assert_eq!(stored.game.turn, Color::Black);
}

#[test]
fn unreachable_peer_is_dropped_and_others_still_hear_the_move() {
    let (table, alice, bob, carol) = seated_table();
    carol.outbox.closed.store(true, Ordering::SeqCst);

    table.play(&alice, mv((2, 5), (4, 5))).unwrap();

    assert!(table.sync.registry().get(&carol.id).is_none());
    assert_eq!(table.sync.registry().connections_in(table.game_id).len(), 2);
    let to_bob = bob.outbox.take();
    assert_eq!(notifications(&to_bob), vec!["alice moved from e2 to e4"]);
    assert!(matches!(to_bob.last(), Some(ServerMessage::LoadGame { game }) if game.turn == Color::Black));
    assert!(matches!(alice.outbox.take().as_slice(), [ServerMessage::LoadGame { .. }]));
}

#[test]
fn connecting_to_another_game_leaves_the_first() {
    let (table, alice, bob, carol) = seated_table();
    let other = table.store.create_game("other").unwrap();

    let cmd = alice.command(CommandType::Connect, other, None);
    table.sync.connect(alice.id, alice.outbox.clone(), &cmd).unwrap();

    let first = table.store.load_game(table.game_id).unwrap().unwrap();
    assert_eq!(first.white_username, None);
    for c in [&bob, &carol] {
        assert_eq!(notifications(&c.outbox.take()), vec!["alice left the game"]);
    }
    assert_eq!(table.sync.registry().get(&alice.id).unwrap().game_id, other);
    assert!(matches!(alice.outbox.take().as_slice(), [ServerMessage::LoadGame { .. }]));
}

#[test]
fn seat_claimed_after_connecting_is_vacated_on_leave() {
    let table = Table::new();
    let alice = table.client("alice", Some(Color::White));
    let dave = table.client("dave", None);
    table.connect(&alice).unwrap();
    table.connect(&dave).unwrap();

    table.store.claim_seat(table.game_id, Color::Black, "dave").unwrap();
    table.sync.leave(dave.id).unwrap();

    let record = table.store.load_game(table.game_id).unwrap().unwrap();
    assert_eq!(record.black_username, None);
    assert_eq!(record.white_username.as_deref(), Some("alice"));
}
