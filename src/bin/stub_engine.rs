//! Minimal scripted UCI engine used by the integration tests.
//!
//! Speaks just enough of the protocol to exercise the client: a fixed
//! identity and option set, a canned deepening sequence on `go`, and a
//! `bestmove` on `stop`.

use std::io::{self, BufRead, Write};

fn main() -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let command = line.split_whitespace().next().unwrap_or("");

        match command {
            "uci" => {
                writeln!(out, "id name Stub Engine 1.0")?;
                writeln!(out, "id author Stub Author")?;
                writeln!(out, "option name Ponder type check default false")?;
                writeln!(out, "option name Hash type spin default 16 min 1 max 2048")?;
                writeln!(
                    out,
                    "option name Style type combo default Solid var Solid var Aggressive"
                )?;
                writeln!(out, "option name Clear Hash type button")?;
                writeln!(out, "option name Debug Log File type string default stub.log")?;
                writeln!(out, "uciok")?;
            }
            "isready" => writeln!(out, "readyok")?,
            "go" => {
                writeln!(out, "info depth 1 score cp 12 nodes 20 pv d2d4")?;
                writeln!(out, "info depth 2 score cp 30 nodes 400 pv d2d4 d7d5")?;
                writeln!(
                    out,
                    "info depth 3 score cp 41 nodes 2500 nps 125000 pv d2d4 d7d5 g1f3"
                )?;
            }
            "stop" => writeln!(out, "bestmove d2d4 ponder d7d5")?,
            "quit" => break,
            _ => {}
        }
        out.flush()?;
    }
    Ok(())
}
