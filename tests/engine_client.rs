//! Protocol-level tests driving the controller with a scripted transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use uci_client::{Engine, EngineError, OptionValue, PipeError, Transport};

/// Transport that records outbound commands and replays queued chunks.
#[derive(Clone, Default)]
struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

#[derive(Default)]
struct MockInner {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<String>,
    fail_receives: bool,
}

impl MockTransport {
    fn new() -> Self {
        MockTransport::default()
    }

    fn push_line(&self, line: &str) {
        self.push_chunk(format!("{line}\n").as_bytes());
    }

    fn push_chunk(&self, chunk: &[u8]) {
        self.inner.lock().unwrap().inbound.push_back(chunk.to_vec());
    }

    fn sent(&self) -> Vec<String> {
        self.inner.lock().unwrap().sent.clone()
    }

    fn fail_receives(&self) {
        self.inner.lock().unwrap().fail_receives = true;
    }
}

impl Transport for MockTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), PipeError> {
        self.inner
            .lock()
            .unwrap()
            .sent
            .push(String::from_utf8_lossy(message).into_owned());
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, PipeError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_receives {
            return Err(PipeError::Closed);
        }
        Ok(inner.inbound.pop_front())
    }
}

/// Queue a full handshake and run `init`, returning the connected engine.
fn handshake_engine() -> (Engine<MockTransport>, MockTransport) {
    let mock = MockTransport::new();
    mock.push_line("id name Mock Engine");
    mock.push_line("id author Mock Author");
    mock.push_line("option name Ponder type check default false");
    mock.push_line("option name Hash type spin default 16 min 1 max 2048");
    mock.push_line("option name Style type combo default Solid var Solid var Aggressive");
    mock.push_line("option name Clear Hash type button");
    mock.push_line("option name Debug Log File type string default engine.log");
    mock.push_line("uciok");

    let mut engine = Engine::with_transport(mock.clone());
    engine.init().expect("handshake should converge");
    (engine, mock)
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("condition not reached before deadline");
}

#[test]
fn test_handshake_collects_identity_and_options() {
    let (engine, mock) = handshake_engine();

    assert_eq!(engine.name(), "Mock Engine");
    assert_eq!(engine.author(), "Mock Author");
    assert_eq!(mock.sent(), ["uci\n"]);

    let options = engine.options();
    assert_eq!(options.len(), 5);
    assert_eq!(options[0].name, "Ponder");
    assert_eq!(
        options[1].value,
        OptionValue::Spin {
            value: 16,
            min: 1,
            max: 2048
        }
    );
    assert_eq!(
        options[2].value,
        OptionValue::Combo {
            values: vec!["Solid".to_string(), "Aggressive".to_string()],
            selected: 0
        }
    );
    assert_eq!(options[3].value, OptionValue::Button);
    assert_eq!(options[4].value, OptionValue::Text("engine.log".to_string()));
}

#[test]
fn test_handshake_times_out_on_silent_engine() {
    let mock = MockTransport::new();
    let mut engine = Engine::with_transport(mock);

    let err = engine
        .init_timeout(Duration::from_millis(50))
        .expect_err("silent engine must time out");
    assert!(matches!(err, EngineError::HandshakeTimeout { .. }));
}

#[test]
fn test_handshake_survives_arbitrary_chunking() {
    let mock = MockTransport::new();
    mock.push_chunk(b"id name Spl");
    mock.push_chunk(b"it Engine\nid auth");
    mock.push_chunk(b"or Someone\nuciok\n");

    let mut engine = Engine::with_transport(mock);
    engine.init().unwrap();
    assert_eq!(engine.name(), "Split Engine");
    assert_eq!(engine.author(), "Someone");
}

#[test]
fn test_run_before_handshake_fails() {
    let mut engine = Engine::with_transport(MockTransport::new());
    assert!(matches!(engine.run(), Err(EngineError::NotReady)));
}

#[test]
fn test_run_while_running_fails_not_ready() {
    let (mut engine, mock) = handshake_engine();

    engine.run().unwrap();
    assert!(matches!(engine.run(), Err(EngineError::NotReady)));

    // the failed call sent nothing
    let gos = mock.sent().iter().filter(|c| *c == "go\n").count();
    assert_eq!(gos, 1);
    engine.stop().unwrap();
}

#[test]
fn test_spin_bounds_are_enforced_before_sending() {
    let (engine, mock) = handshake_engine();

    assert!(!engine.set_spin("Hash", 4000).unwrap());
    assert!(!engine.set_spin("Hash", 0).unwrap());
    assert!(engine.set_spin("Hash", 15).unwrap());

    let sent = mock.sent();
    assert_eq!(sent.last().map(String::as_str), Some("setoption name Hash value 15\n"));
    // the two rejected values never reached the wire
    assert_eq!(sent.len(), 2);

    let options = engine.options();
    assert_eq!(
        options[1].value,
        OptionValue::Spin {
            value: 15,
            min: 1,
            max: 2048
        }
    );
}

#[test]
fn test_setters_render_expected_commands() {
    let (engine, mock) = handshake_engine();

    assert!(engine.set_check("Ponder", true).unwrap());
    assert!(engine.set_combo("Style", "Aggressive").unwrap());
    assert!(engine.set_button("Clear Hash").unwrap());
    assert!(engine.set_string("Debug Log File", "trace.log").unwrap());

    assert_eq!(
        &mock.sent()[1..],
        [
            "setoption name Ponder value true\n",
            "setoption name Style value Aggressive\n",
            "setoption name Clear Hash\n",
            "setoption name Debug Log File value trace.log\n",
        ]
    );
}

#[test]
fn test_setters_reject_unknown_or_mistyped_options() {
    let (engine, mock) = handshake_engine();

    assert!(!engine.set_check("NoSuchOption", true).unwrap());
    // right name, wrong kind
    assert!(!engine.set_spin("Ponder", 1).unwrap());
    assert!(!engine.set_combo("Style", "aggressive").unwrap());
    assert!(!engine.set_button("Hash").unwrap());

    assert_eq!(mock.sent(), ["uci\n"]);
}

#[test]
fn test_set_combo_index_sends_newly_selected_value() {
    let (engine, mock) = handshake_engine();

    assert!(engine.set_combo_index("Style", 1).unwrap());
    assert_eq!(
        mock.sent().last().map(String::as_str),
        Some("setoption name Style value Aggressive\n")
    );

    let options = engine.options();
    assert_eq!(
        options[2].value,
        OptionValue::Combo {
            values: vec!["Solid".to_string(), "Aggressive".to_string()],
            selected: 1
        }
    );

    assert!(!engine.set_combo_index("Style", 2).unwrap());
    assert_eq!(mock.sent().len(), 2);
}

#[test]
fn test_option_lookup_is_case_insensitive() {
    let (engine, mock) = handshake_engine();

    assert!(engine.set_spin("hash", 64).unwrap());
    assert_eq!(
        mock.sent().last().map(String::as_str),
        Some("setoption name hash value 64\n")
    );
}

#[test]
fn test_running_search_publishes_best_continuation() {
    let (mut engine, mock) = handshake_engine();

    let (tx, rx) = std::sync::mpsc::channel();
    let tx = Mutex::new(tx);
    engine.set_update_callback(move |best| {
        let _ = tx.lock().unwrap().send(best.clone());
    });

    engine.run().unwrap();
    assert!(engine.is_running());

    mock.push_line("info depth 4 score cp 20 nodes 1000 pv e2e4 e7e5");
    mock.push_line("info depth 6 score cp 40 nodes 9000 pv d2d4 d7d5 g1f3");

    let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(first.depth, 4);

    let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(second.depth, 6);
    assert_eq!(second.score, 40);
    assert!(!second.mate);
    let pv: Vec<String> = second.continuation.iter().map(ToString::to_string).collect();
    assert_eq!(pv, ["d2d4", "d7d5", "g1f3"]);

    engine.stop().unwrap();
    assert!(!engine.is_running());
    assert_eq!(engine.best_continuation(), second);
}

#[test]
fn test_engine_accessors_usable_from_update_callback() {
    let (mut engine, mock) = handshake_engine();

    let (update_tx, update_rx) = std::sync::mpsc::channel();
    let (ack_tx, ack_rx) = std::sync::mpsc::channel::<()>();
    let (done_tx, done_rx) = std::sync::mpsc::channel();
    let update_tx = Mutex::new(update_tx);
    let ack_rx = Mutex::new(ack_rx);
    let done_tx = Mutex::new(done_tx);

    // park the reader inside the callback until the main thread has read
    // the model; the read must not have to wait for the callback to return
    engine.set_update_callback(move |best| {
        update_tx.lock().unwrap().send(best.clone()).unwrap();
        let acked = ack_rx
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(2))
            .is_ok();
        done_tx.lock().unwrap().send(acked).unwrap();
    });

    engine.run().unwrap();
    mock.push_line("info depth 2 score cp 17 pv d2d4 d7d5");

    let update = update_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(engine.best_continuation(), update);
    ack_tx.send(()).unwrap();

    let acked = done_rx.recv_timeout(Duration::from_secs(4)).unwrap();
    assert!(acked, "reading the model blocked until the callback gave up");
    engine.stop().unwrap();
}

#[test]
fn test_info_without_pv_still_updates_depth_and_score() {
    let (mut engine, mock) = handshake_engine();
    engine.run().unwrap();

    mock.push_line("info depth 12 score cp 99 nodes 1234567");
    wait_for(|| engine.best_continuation().depth == 12);

    let best = engine.best_continuation();
    assert_eq!(best.score, 99);
    assert!(!best.mate);
    assert!(best.continuation.is_empty());
    engine.stop().unwrap();
}

#[test]
fn test_mate_score_sets_and_clears_flag() {
    let (mut engine, mock) = handshake_engine();
    engine.run().unwrap();

    mock.push_line("info depth 8 score mate 2 pv f3f7");
    wait_for(|| engine.best_continuation().mate);
    assert_eq!(engine.best_continuation().score, 2);

    mock.push_line("info depth 9 score cp 310 pv f3f7");
    wait_for(|| !engine.best_continuation().mate);
    engine.stop().unwrap();
}

#[test]
fn test_bestmove_sets_ponder_move() {
    let (mut engine, mock) = handshake_engine();
    engine.run().unwrap();

    mock.push_line("bestmove d2d4 ponder d7d5");
    wait_for(|| engine.best_continuation().ponder_move.is_some());
    assert_eq!(
        engine
            .best_continuation()
            .ponder_move
            .map(|m| m.to_string()),
        Some("d7d5".to_string())
    );
    engine.stop().unwrap();
}

#[test]
fn test_stop_twice_sends_one_stop() {
    let (mut engine, mock) = handshake_engine();

    engine.run().unwrap();
    engine.stop().unwrap();
    engine.stop().unwrap();

    let stops = mock.sent().iter().filter(|c| *c == "stop\n").count();
    assert_eq!(stops, 1);
}

#[test]
fn test_set_position_restarts_running_search() {
    let (mut engine, mock) = handshake_engine();

    engine.run().unwrap();
    engine
        .set_position("8/8/8/8/8/8/8/K6k w - - 0 1")
        .unwrap();
    assert!(engine.is_running());
    engine.stop().unwrap();

    assert_eq!(
        mock.sent(),
        [
            "uci\n",
            "go\n",
            "stop\n",
            "position fen 8/8/8/8/8/8/8/K6k w - - 0 1\n",
            "go\n",
            "stop\n",
        ]
    );
}

#[test]
fn test_set_position_while_idle_does_not_search() {
    let (mut engine, mock) = handshake_engine();

    engine
        .set_position("8/8/8/8/8/8/8/K6k w - - 0 1")
        .unwrap();
    assert!(!engine.is_running());
    assert_eq!(
        mock.sent(),
        ["uci\n", "position fen 8/8/8/8/8/8/8/K6k w - - 0 1\n"]
    );
}

#[test]
fn test_option_declared_after_handshake_is_ignored() {
    let (mut engine, mock) = handshake_engine();
    engine.run().unwrap();

    mock.push_line("option name Late type check default true");
    mock.push_line("info depth 1 score cp 5 pv e2e4");
    wait_for(|| engine.best_continuation().depth == 1);
    engine.stop().unwrap();

    assert_eq!(engine.options().len(), 5);
    assert!(engine
        .options()
        .iter()
        .all(|o| !o.name.eq_ignore_ascii_case("Late")));
}

#[test]
fn test_pipe_failure_during_search_is_reported() {
    let (mut engine, mock) = handshake_engine();
    engine.run().unwrap();

    mock.fail_receives();

    let mut seen = None;
    wait_for(|| {
        seen = engine.take_pending_error();
        seen.is_some()
    });
    assert!(matches!(seen, Some(EngineError::Pipe(PipeError::Closed))));

    engine.stop().unwrap();
    assert!(engine.take_pending_error().is_none());
}

#[cfg(feature = "serde")]
#[test]
fn test_best_continuation_serde_round_trip() {
    let (mut engine, mock) = handshake_engine();
    engine.run().unwrap();
    mock.push_line("info depth 5 score mate 2 pv d2d4 d7d5");
    wait_for(|| engine.best_continuation().depth == 5);
    engine.stop().unwrap();

    let best = engine.best_continuation();
    let json = serde_json::to_string(&best).unwrap();
    let back: uci_client::BestContinuation = serde_json::from_str(&json).unwrap();
    assert_eq!(back, best);
}
