//! One debugger session: subprocess handle, state machine (§4.B), and the
//! command I/O pipeline (§4.C) that drives a single round-trip with a
//! `gdb --interpreter=mi` subprocess.
//!
//! Grounded on `gdb-session.c` of the original implementation:
//! `gdb_session_start_async/finish`, `gdb_session_execute_async/finish`, and
//! `gdb_session_terminate`. The GLib cooperative-context machinery those
//! functions rely on has no tokio counterpart; see DESIGN.md for the
//! resolution.

use crate::enums::{SessionState, StopReason};
use crate::error::GdbError;
use crate::mi::{self, MiRecord, ResultClass, StreamKind};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{broadcast, mpsc, Mutex};

/// Default post-write settle delay, overridable via `GDB_MCP_POST_COMMAND_DELAY_MS`.
const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// Bounded interval between `quit` and a forced kill on terminate.
const TERMINATE_TIMEOUT_MS: u64 = 500;

/// Events published out-of-band for in-process embedding hosts (§6
/// "Observation hooks"). Optional for the gateway; not wired to any MCP
/// surface since tool replies are synchronous text.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged {
        old: SessionState,
        new: SessionState,
    },
    Ready,
    Stopped {
        reason: StopReason,
        payload: String,
    },
    ConsoleOutput(String),
    Terminated(i32),
}

/// Live handle to a spawned subprocess: its stdin writer and a channel
/// yielding lines merged from stdout and stderr in arrival order (the
/// async analogue of `GSubprocess`'s `STDERR_MERGE` flag).
struct ProcHandle {
    child: Child,
    stdin: ChildStdin,
    lines_rx: mpsc::UnboundedReceiver<String>,
}

/// A named debugger session driving one `gdb --interpreter=mi` subprocess.
///
/// Invariant: at most one command is in flight at a time, enforced by
/// serializing `execute`/`execute_mi` through `proc`'s mutex. Invariant:
/// while `state` is `Running`, command submission is rejected (in practice
/// the pipeline never leaves a command in flight while reporting `Running`
/// externally -- see `read_until_complete`).
pub struct GdbSession {
    id: String,
    gdb_path: String,
    working_dir: Option<String>,
    timeout_ms: u64,
    target_program: Mutex<Option<String>>,
    state: Mutex<SessionState>,
    proc: Mutex<Option<ProcHandle>>,
    events: broadcast::Sender<SessionEvent>,
}

impl GdbSession {
    /// Construct a session object in `Disconnected` state. The subprocess is
    /// not spawned until [`start`](Self::start) is called.
    #[must_use]
    pub fn new(id: String, gdb_path: String, working_dir: Option<String>, timeout_ms: u64) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            id,
            gdb_path,
            working_dir,
            timeout_ms,
            target_program: Mutex::new(None),
            state: Mutex::new(SessionState::Disconnected),
            proc: Mutex::new(None),
            events,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn gdb_path(&self) -> &str {
        &self.gdb_path
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    pub async fn target_program(&self) -> Option<String> {
        self.target_program.lock().await.clone()
    }

    pub async fn set_target_program(&self, program: impl Into<String>) {
        *self.target_program.lock().await = Some(program.into());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn set_state(&self, new: SessionState) {
        let mut guard = self.state.lock().await;
        let old = *guard;
        if old == new {
            return;
        }
        *guard = new;
        drop(guard);
        let _ = self.events.send(SessionEvent::StateChanged { old, new });
        if new == SessionState::Ready {
            let _ = self.events.send(SessionEvent::Ready);
        }
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    // -- Startup -----------------------------------------------------------

    /// `start requested -> Disconnected -> Starting -> {Ready, Error}`.
    pub async fn start(&self) -> Result<(), GdbError> {
        {
            let mut state = self.state.lock().await;
            if *state != SessionState::Disconnected {
                return Err(GdbError::AlreadyRunning);
            }
            *state = SessionState::Starting;
        }

        let mut proc = match self.spawn_process().await {
            Ok(proc) => proc,
            Err(e) => {
                self.set_state(SessionState::Error).await;
                return Err(e);
            }
        };

        let startup = tokio::time::timeout(
            Duration::from_millis(self.timeout_ms),
            Self::read_startup(&mut proc.lines_rx),
        )
        .await;

        match startup {
            Err(_elapsed) => {
                self.set_state(SessionState::Error).await;
                Err(GdbError::Timeout)
            }
            Ok(Err(e)) => {
                self.set_state(SessionState::Error).await;
                Err(e)
            }
            Ok(Ok(())) => {
                *self.proc.lock().await = Some(proc);
                self.set_state(SessionState::Ready).await;
                Ok(())
            }
        }
    }

    async fn spawn_process(&self) -> Result<ProcHandle, GdbError> {
        let mut cmd = tokio::process::Command::new(&self.gdb_path);
        cmd.arg("--interpreter=mi");
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| GdbError::SpawnFailed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GdbError::SpawnFailed("child has no stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GdbError::SpawnFailed("child has no stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GdbError::SpawnFailed("child has no stderr".into()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        spawn_line_forwarder(stdout, tx.clone());
        spawn_line_forwarder(stderr, tx);

        Ok(ProcHandle {
            child,
            stdin,
            lines_rx: rx,
        })
    }

    async fn read_startup(lines_rx: &mut mpsc::UnboundedReceiver<String>) -> Result<(), GdbError> {
        loop {
            match lines_rx.recv().await {
                None => {
                    return Err(GdbError::SpawnFailed(
                        "GDB process exited unexpectedly during startup".into(),
                    ))
                }
                Some(line) => {
                    if matches!(mi::parse_line(&line), Ok(MiRecord::Prompt)) {
                        return Ok(());
                    }
                    // Non-MI banner text, or a malformed line: keep draining.
                }
            }
        }
    }

    // -- Command execution (§4.C) -------------------------------------------

    /// Drive one command round-trip, returning the raw accumulated MI text.
    pub async fn execute(&self, command: &str) -> Result<String, GdbError> {
        self.admit().await?;

        let mut proc_guard = self.proc.lock().await;
        let proc = proc_guard.as_mut().ok_or(GdbError::SessionNotReady)?;

        Self::write_command(proc, command).await?;
        tokio::time::sleep(Duration::from_millis(settle_delay_ms())).await;

        let read = self.read_until_complete(&mut proc.lines_rx);
        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), read).await {
            Err(_elapsed) => Err(GdbError::Timeout),
            Ok(inner) => inner,
        }
    }

    /// Variant returning the parsed record sequence, completing on the first
    /// `Result` record or `Prompt`. Shares admission and write rules.
    pub async fn execute_mi(&self, command: &str) -> Result<Vec<MiRecord>, GdbError> {
        self.admit().await?;

        let mut proc_guard = self.proc.lock().await;
        let proc = proc_guard.as_mut().ok_or(GdbError::SessionNotReady)?;

        Self::write_command(proc, command).await?;
        tokio::time::sleep(Duration::from_millis(settle_delay_ms())).await;

        let read = Self::read_until_first_result(&mut proc.lines_rx);
        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), read).await {
            Err(_elapsed) => Err(GdbError::Timeout),
            Ok(inner) => inner,
        }
    }

    async fn admit(&self) -> Result<(), GdbError> {
        let state = self.state.lock().await;
        if !state.accepts_commands() {
            return Err(GdbError::SessionNotReady);
        }
        Ok(())
    }

    async fn write_command(proc: &mut ProcHandle, command: &str) -> Result<(), GdbError> {
        let line = format!("{command}\n");
        proc.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| GdbError::CommandFailed(format!("write failed: {e}")))?;
        proc.stdin
            .flush()
            .await
            .map_err(|e| GdbError::CommandFailed(format!("flush failed: {e}")))
    }

    /// Read lines until a termination condition (Prompt or `^exit`), coupling
    /// `^running`/`*running` to the following `*stopped` so a `continue`
    /// doesn't complete on the acknowledgement prompt.
    async fn read_until_complete(
        &self,
        lines_rx: &mut mpsc::UnboundedReceiver<String>,
    ) -> Result<String, GdbError> {
        let mut buffer = String::new();
        let mut saw_error = false;
        let mut saw_running = false;
        let mut saw_stopped = false;
        let mut error_message: Option<String> = None;

        loop {
            let line = match lines_rx.recv().await {
                Some(l) => l,
                None => {
                    self.set_state(SessionState::Terminated).await;
                    self.publish(SessionEvent::Terminated(-1));
                    return Err(GdbError::CommandFailed(
                        "GDB process exited unexpectedly".into(),
                    ));
                }
            };
            buffer.push_str(&line);
            buffer.push('\n');

            let record = match mi::parse_line(&line) {
                Ok(r) => r,
                Err(_) => continue,
            };

            let mut is_terminal = false;
            match &record {
                MiRecord::Stream {
                    kind: StreamKind::Console,
                    text,
                } => {
                    self.publish(SessionEvent::ConsoleOutput(text.clone()));
                }
                MiRecord::Result {
                    class: ResultClass::Error,
                    ..
                } => {
                    saw_error = true;
                    error_message = record.error_message().map(ToString::to_string);
                }
                MiRecord::Result {
                    class: ResultClass::Running,
                    ..
                } => {
                    saw_running = true;
                }
                MiRecord::Result {
                    class: ResultClass::Exit,
                    ..
                } => {
                    is_terminal = true;
                }
                MiRecord::ExecAsync { class, .. } if class == "running" => {
                    saw_running = true;
                }
                MiRecord::ExecAsync { class, .. } if class == "stopped" => {
                    saw_stopped = true;
                    let reason = record.reason().map(StopReason::from_mi).unwrap_or(StopReason::Unknown);
                    self.publish(SessionEvent::Stopped {
                        reason,
                        payload: format!("{record:?}"),
                    });
                }
                MiRecord::Prompt => {
                    is_terminal = true;
                }
                _ => {}
            }

            if is_terminal {
                if saw_running && !saw_stopped {
                    continue;
                }
                if saw_error {
                    self.set_state(SessionState::Ready).await;
                    return Err(GdbError::CommandFailed(
                        error_message.unwrap_or_else(|| "unknown error".into()),
                    ));
                }
                self.set_state(if saw_stopped {
                    SessionState::Stopped
                } else {
                    SessionState::Ready
                })
                .await;
                return Ok(buffer);
            }
        }
    }

    async fn read_until_first_result(
        lines_rx: &mut mpsc::UnboundedReceiver<String>,
    ) -> Result<Vec<MiRecord>, GdbError> {
        let mut records = Vec::new();
        loop {
            let line = lines_rx.recv().await.ok_or_else(|| {
                GdbError::CommandFailed("GDB process exited unexpectedly".into())
            })?;
            let record = match mi::parse_line(&line) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let is_terminal = matches!(record, MiRecord::Result { .. } | MiRecord::Prompt);
            records.push(record);
            if is_terminal {
                break;
            }
        }
        Ok(records)
    }

    // -- Termination ---------------------------------------------------------

    /// `quit` then a bounded forced exit. Idempotent.
    pub async fn terminate(&self) {
        {
            let state = self.state.lock().await;
            if *state == SessionState::Terminated {
                return;
            }
        }

        let mut proc_guard = self.proc.lock().await;
        let mut exit_code = -1;
        if let Some(mut proc) = proc_guard.take() {
            let _ = proc.stdin.write_all(b"quit\n").await;
            let _ = proc.stdin.flush().await;

            match tokio::time::timeout(
                Duration::from_millis(TERMINATE_TIMEOUT_MS),
                proc.child.wait(),
            )
            .await
            {
                Ok(Ok(status)) => exit_code = status.code().unwrap_or(-1),
                _ => {
                    let _ = proc.child.start_kill();
                    if let Ok(Ok(status)) = proc.child.wait().await.map(Ok::<_, ()>) {
                        exit_code = status.code().unwrap_or(-1);
                    }
                }
            }
        }

        self.set_state(SessionState::Terminated).await;
        self.publish(SessionEvent::Terminated(exit_code));
    }
}

fn spawn_line_forwarder<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                _ => break,
            }
        }
    });
}

/// `GDB_MCP_POST_COMMAND_DELAY_MS` overrides the default settle delay;
/// invalid or non-positive values fall back to the default.
fn settle_delay_ms() -> u64 {
    match std::env::var("GDB_MCP_POST_COMMAND_DELAY_MS") {
        Ok(val) => match val.parse::<i64>() {
            Ok(ms) if ms > 0 => ms as u64,
            _ => DEFAULT_SETTLE_DELAY_MS,
        },
        Err(_) => DEFAULT_SETTLE_DELAY_MS,
    }
}
