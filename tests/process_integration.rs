//! End-to-end tests against a real child process, using the scripted
//! `stub_engine` binary built alongside the library.

use std::sync::Mutex;
use std::time::Duration;

use uci_client::{Engine, EngineError, OptionValue};

fn stub_engine() -> Engine<uci_client::ProcessTransport> {
    Engine::create(env!("CARGO_BIN_EXE_stub_engine")).expect("stub engine should spawn")
}

#[test]
fn test_create_fails_for_missing_executable() {
    let err = Engine::create("/no/such/engine").unwrap_err();
    assert!(matches!(err, EngineError::Creation(_)));
}

#[test]
fn test_handshake_against_real_process() {
    let mut engine = stub_engine();
    engine.init().unwrap();

    assert_eq!(engine.name(), "Stub Engine 1.0");
    assert_eq!(engine.author(), "Stub Author");

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
    assert_eq!(options[3].name, "Clear Hash");
    assert_eq!(options[4].value, OptionValue::Text("stub.log".to_string()));

    let summary = engine.summary();
    assert!(summary.starts_with("Stub Engine 1.0 by Stub Author"));
    assert!(summary.contains("Hash"));
}

#[test]
fn test_search_updates_flow_from_real_process() {
    let mut engine = stub_engine();
    engine.init().unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let tx = Mutex::new(tx);
    engine.set_update_callback(move |best| {
        let _ = tx.lock().unwrap().send(best.clone());
    });

    engine
        .set_position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
        .unwrap();
    engine.run().unwrap();

    // the stub deepens to depth 3 and stays there
    let best = loop {
        let update = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("search update should arrive");
        if update.depth == 3 {
            break update;
        }
    };
    assert_eq!(best.score, 41);
    assert!(!best.mate);
    let pv: Vec<String> = best.continuation.iter().map(ToString::to_string).collect();
    assert_eq!(pv, ["d2d4", "d7d5", "g1f3"]);

    engine.stop().unwrap();
    assert!(!engine.is_running());
    assert!(engine.take_pending_error().is_none());
}
