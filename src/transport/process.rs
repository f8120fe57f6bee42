//! Child-process transport over anonymous pipes.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::Transport;
use crate::error::{EngineError, PipeError};

/// Read size for the pump threads
const READ_CHUNK_SIZE: usize = 4096;
/// How long to wait for the engine to honor `quit` before killing it
const QUIT_GRACE_MS: u64 = 500;

/// Transport over a spawned engine process's standard streams.
///
/// The child's stdout and stderr are both forwarded onto a single inbound
/// channel by two pump threads doing blocking chunk reads, so
/// [`Transport::try_receive`] never blocks the caller. The pipe handles and
/// the process handle are owned exclusively by this value; dropping it asks
/// the engine to `quit` and kills the process if it does not comply.
#[derive(Debug)]
pub struct ProcessTransport {
    child: Child,
    stdin: ChildStdin,
    chunks: Receiver<Vec<u8>>,
}

impl ProcessTransport {
    /// Spawn the engine executable at `path` with piped standard streams.
    pub fn spawn<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let mut child = Command::new(path.as_ref())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(EngineError::Creation)?;

        let stdin = child.stdin.take().expect("child stdin is piped");
        let stdout = child.stdout.take().expect("child stdout is piped");
        let stderr = child.stderr.take().expect("child stderr is piped");

        let (tx, rx) = mpsc::channel();
        spawn_pump(stdout, tx.clone(), "engine-stdout");
        spawn_pump(stderr, tx, "engine-stderr");

        debug!("spawned engine process {}", path.as_ref().display());

        Ok(ProcessTransport {
            child,
            stdin,
            chunks: rx,
        })
    }
}

/// Forward blocking reads from `reader` onto the chunk channel until EOF.
fn spawn_pump<R: Read + Send + 'static>(mut reader: R, tx: Sender<Vec<u8>>, name: &str) {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let mut buf = [0u8; READ_CHUNK_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("engine pipe read ended: {e}");
                        break;
                    }
                }
            }
        })
        .expect("failed to spawn pipe pump thread");
}

fn classify(e: io::Error) -> PipeError {
    match e.kind() {
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => PipeError::Closed,
        _ => PipeError::Io(e),
    }
}

impl Transport for ProcessTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), PipeError> {
        self.stdin.write_all(message).map_err(classify)?;
        self.stdin.flush().map_err(classify)
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, PipeError> {
        match self.chunks.try_recv() {
            Ok(bytes) => Ok(Some(bytes)),
            Err(TryRecvError::Empty) => Ok(None),
            // both pump threads have exited: the child closed its streams
            Err(TryRecvError::Disconnected) => Err(PipeError::Closed),
        }
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        let quit = self
            .stdin
            .write_all(b"quit\n")
            .and_then(|()| self.stdin.flush());
        if quit.is_err() {
            debug!("engine stdin already closed on teardown");
        }

        let deadline = Instant::now() + Duration::from_millis(QUIT_GRACE_MS);
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("engine exited with {status}");
                    return;
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    warn!("failed to poll engine process: {e}");
                    break;
                }
            }
        }

        warn!("engine ignored quit; terminating process");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
