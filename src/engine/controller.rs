//! Foreground façade over a running engine.
//!
//! [`Engine`] owns the transport, the shared protocol model, and the
//! background reader thread that keeps the model current while a search
//! runs. The foreground thread and the reader never feed the dispatcher
//! concurrently: outside `Running` only the caller polls, inside `Running`
//! only the reader does.

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::Mutex;

use super::dispatch::{dispatch_line, Model};
use super::{BestContinuation, UpdateCallback};
use crate::error::EngineError;
use crate::options::{setoption_command, EngineOption, OptionKind, OptionValue};
use crate::parser::LineBuffer;
use crate::sync::{Lifecycle, LifecycleCell};
use crate::transport::{ProcessTransport, Transport};

/// Sleep between empty polls, foreground and background alike
const POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Default deadline for the capability handshake
const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(10);

/// State shared between the foreground caller and the reader thread.
struct Shared<T: Transport> {
    transport: Mutex<T>,
    state: LifecycleCell,
    lines: Mutex<LineBuffer>,
    model: Mutex<Model>,
    callback: Mutex<Option<UpdateCallback>>,
    pending_error: Mutex<Option<EngineError>>,
}

/// Client-side handle to a UCI engine.
///
/// Generic over the byte transport so tests can script engine output; real
/// use goes through [`Engine::create`], which spawns the engine process.
pub struct Engine<T: Transport> {
    shared: Arc<Shared<T>>,
    reader: Option<JoinHandle<()>>,
}

impl<T: Transport> std::fmt::Debug for Engine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine<ProcessTransport> {
    /// Spawn the engine executable at `path` and wrap it in a controller.
    ///
    /// The engine is not usable until [`Engine::init`] completes the
    /// handshake.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        Ok(Engine::with_transport(ProcessTransport::spawn(path)?))
    }
}

impl<T: Transport> Engine<T> {
    /// Wrap an already-connected transport.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Engine {
            shared: Arc::new(Shared {
                transport: Mutex::new(transport),
                state: LifecycleCell::new(),
                lines: Mutex::new(LineBuffer::new()),
                model: Mutex::new(Model::default()),
                callback: Mutex::new(None),
                pending_error: Mutex::new(None),
            }),
            reader: None,
        }
    }

    /// Run the capability handshake with the default deadline.
    ///
    /// Sends `uci` and polls until the engine answers `uciok`, collecting
    /// its identity and option declarations along the way.
    pub fn init(&mut self) -> Result<(), EngineError> {
        self.init_timeout(DEFAULT_INIT_TIMEOUT)
    }

    /// Run the capability handshake, giving up after `timeout`.
    pub fn init_timeout(&mut self, timeout: Duration) -> Result<(), EngineError> {
        let started = Instant::now();
        self.shared.transport.lock().send(b"uci\n")?;

        while !self.shared.state.is(Lifecycle::Ready) {
            if started.elapsed() >= timeout {
                return Err(EngineError::HandshakeTimeout {
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            if !self.poll_once()? {
                thread::sleep(POLL_INTERVAL);
            }
        }
        Ok(())
    }

    /// Drain one pending receive chunk through the dispatcher.
    ///
    /// Returns whether a chunk was processed. Only called while the reader
    /// thread is not running.
    fn poll_once(&self) -> Result<bool, EngineError> {
        let chunk = self.shared.transport.lock().try_receive()?;
        match chunk {
            Some(bytes) => {
                feed(&self.shared, &bytes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Start an infinite search on the current position.
    ///
    /// Requires a completed handshake with no search already active; fails
    /// with [`EngineError::NotReady`] otherwise. While the search runs, a
    /// background reader thread keeps [`Engine::best_continuation`] current.
    pub fn run(&mut self) -> Result<(), EngineError>
    where
        T: 'static,
    {
        if !self.shared.state.is(Lifecycle::Ready) {
            return Err(EngineError::NotReady);
        }

        self.shared.transport.lock().send(b"go\n")?;
        self.shared.state.set(Lifecycle::Running);

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("uci-reader".to_string())
            .spawn(move || reader_loop(&shared))
            .expect("failed to spawn engine reader thread");
        self.reader = Some(handle);
        Ok(())
    }

    /// Stop the running search and wait for the reader thread to exit.
    ///
    /// After `stop` returns, the best continuation can no longer change
    /// until the next [`Engine::run`]. A no-op when no search is running.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        if !self.shared.state.is(Lifecycle::Running) {
            return Ok(());
        }

        // the reader exits on the state transition even if the send failed
        let sent = self.shared.transport.lock().send(b"stop\n");
        self.shared.state.set(Lifecycle::Ready);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                warn!("engine reader thread panicked");
            }
        }
        sent.map_err(EngineError::from)
    }

    /// Point the engine at a new position, given in FEN.
    ///
    /// If a search is running it is stopped first, buffered output from the
    /// old search is drained, and the search is restarted on the new
    /// position.
    pub fn set_position(&mut self, fen: &str) -> Result<(), EngineError>
    where
        T: 'static,
    {
        let was_running = self.shared.state.is(Lifecycle::Running);
        if was_running {
            self.stop()?;
            while self.poll_once()? {}
        }

        let command = format!("position fen {fen}\n");
        self.shared.transport.lock().send(command.as_bytes())?;

        if was_running {
            self.run()?;
        }
        Ok(())
    }

    /// Set a check option. Returns whether the option was known and sent.
    pub fn set_check(&self, name: &str, value: bool) -> Result<bool, EngineError> {
        let command = {
            let mut model = self.shared.model.lock();
            let Some(option) = model.options.find_mut(name, OptionKind::Check) else {
                return Ok(false);
            };
            option.value = OptionValue::Check(value);
            setoption_command(name, Some(if value { "true" } else { "false" }))
        };
        self.shared.transport.lock().send(command.as_bytes())?;
        Ok(true)
    }

    /// Set a spin option. Values outside the declared bounds are rejected
    /// without anything going out on the wire.
    pub fn set_spin(&self, name: &str, value: i32) -> Result<bool, EngineError> {
        let command = {
            let mut model = self.shared.model.lock();
            let Some(option) = model.options.find_mut(name, OptionKind::Spin) else {
                return Ok(false);
            };
            let OptionValue::Spin {
                value: current,
                min,
                max,
            } = &mut option.value
            else {
                return Ok(false);
            };
            if value < *min || value > *max {
                return Ok(false);
            }
            *current = value;
            setoption_command(name, Some(&value.to_string()))
        };
        self.shared.transport.lock().send(command.as_bytes())?;
        Ok(true)
    }

    /// Set a string option.
    pub fn set_string(&self, name: &str, value: &str) -> Result<bool, EngineError> {
        let command = {
            let mut model = self.shared.model.lock();
            let Some(option) = model.options.find_mut(name, OptionKind::Text) else {
                return Ok(false);
            };
            option.value = OptionValue::Text(value.to_string());
            setoption_command(name, Some(value))
        };
        self.shared.transport.lock().send(command.as_bytes())?;
        Ok(true)
    }

    /// Select a combo value by its exact (case-sensitive) text.
    pub fn set_combo(&self, name: &str, value: &str) -> Result<bool, EngineError> {
        let command = {
            let mut model = self.shared.model.lock();
            let Some(option) = model.options.find_mut(name, OptionKind::Combo) else {
                return Ok(false);
            };
            let OptionValue::Combo { values, selected } = &mut option.value else {
                return Ok(false);
            };
            let Some(index) = values.iter().position(|v| v == value) else {
                return Ok(false);
            };
            *selected = index;
            setoption_command(name, Some(value))
        };
        self.shared.transport.lock().send(command.as_bytes())?;
        Ok(true)
    }

    /// Select a combo value by index into its declared value list.
    pub fn set_combo_index(&self, name: &str, index: usize) -> Result<bool, EngineError> {
        let command = {
            let mut model = self.shared.model.lock();
            let Some(option) = model.options.find_mut(name, OptionKind::Combo) else {
                return Ok(false);
            };
            let OptionValue::Combo { values, selected } = &mut option.value else {
                return Ok(false);
            };
            let Some(value) = values.get(index) else {
                return Ok(false);
            };
            *selected = index;
            setoption_command(name, Some(value))
        };
        self.shared.transport.lock().send(command.as_bytes())?;
        Ok(true)
    }

    /// Press a button option.
    pub fn set_button(&self, name: &str) -> Result<bool, EngineError> {
        {
            let model = self.shared.model.lock();
            if model.options.find(name, OptionKind::Button).is_none() {
                return Ok(false);
            }
        }
        let command = setoption_command(name, None);
        self.shared.transport.lock().send(command.as_bytes())?;
        Ok(true)
    }

    /// Take the last error raised by the reader thread, if any.
    ///
    /// The slot holds one error; a newer failure overwrites an unread one.
    pub fn take_pending_error(&self) -> Option<EngineError> {
        self.shared.pending_error.lock().take()
    }

    /// Install a callback fired on every new best continuation.
    ///
    /// The callback runs on the reader thread; keep it short.
    pub fn set_update_callback<F>(&self, callback: F)
    where
        F: Fn(&BestContinuation) + Send + Sync + 'static,
    {
        *self.shared.callback.lock() = Some(Arc::new(callback));
    }

    /// Engine name from the `id name` handshake line.
    #[must_use]
    pub fn name(&self) -> String {
        self.shared.model.lock().name.clone()
    }

    /// Engine author from the `id author` handshake line.
    #[must_use]
    pub fn author(&self) -> String {
        self.shared.model.lock().author.clone()
    }

    /// Snapshot of the options declared during the handshake.
    #[must_use]
    pub fn options(&self) -> Vec<EngineOption> {
        self.shared.model.lock().options.as_slice().to_vec()
    }

    /// Snapshot of the engine's current best line.
    #[must_use]
    pub fn best_continuation(&self) -> BestContinuation {
        self.shared.model.lock().best.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.state.is(Lifecycle::Running)
    }

    /// Human-readable identity and option listing, for diagnostics.
    #[must_use]
    pub fn summary(&self) -> String {
        use std::fmt::Write;

        let model = self.shared.model.lock();
        let mut out = format!("{} by {}\n", model.name, model.author);
        for option in model.options.iter() {
            let _ = writeln!(out, "  {option}");
        }
        out
    }
}

/// Push a receive chunk into the line buffer and dispatch every complete
/// line it yields.
///
/// The update callback is invoked after the model lock is released, so a
/// callback is free to call back into the engine's accessors.
fn feed<T: Transport>(shared: &Shared<T>, chunk: &[u8]) {
    let mut lines = shared.lines.lock();
    lines.push(chunk);
    while let Some(line) = lines.next_line() {
        let update = {
            let mut model = shared.model.lock();
            dispatch_line(&mut model, &shared.state, &line)
        };
        if let Some(best) = update {
            let callback = shared.callback.lock().clone();
            if let Some(cb) = callback {
                cb(&best);
            }
        }
    }
}

/// Body of the background reader thread.
fn reader_loop<T: Transport>(shared: &Shared<T>) {
    while shared.state.is(Lifecycle::Running) {
        let chunk = shared.transport.lock().try_receive();
        match chunk {
            Ok(Some(bytes)) => feed(shared, &bytes),
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                warn!("engine pipe failed during search: {e}");
                *shared.pending_error.lock() = Some(EngineError::Pipe(e));
                break;
            }
        }
    }
}

impl<T: Transport> Drop for Engine<T> {
    fn drop(&mut self) {
        if self.shared.state.is(Lifecycle::Running) {
            if let Err(e) = self.shared.transport.lock().send(b"stop\n") {
                debug!("failed to stop engine on teardown: {e}");
            }
            self.shared.state.set(Lifecycle::Ready);
        }
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}
