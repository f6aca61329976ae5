use std::io::{Read, Write};
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::escape::{ESCAPE_BYTE, EscapeFilter, InputAction};
use crate::shell;

/// Exit code reported when the child was killed by a signal.
pub const SIGNALED_EXIT_CODE: i32 = 128;

/// How long to keep forwarding output after the child has exited. A
/// grandchild holding the pty open could otherwise keep the relay alive
/// forever.
const EXIT_DRAIN: Duration = Duration::from_millis(250);

/// Configuration for a relay session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Command words, joined with shell quoting and run as `sh -c <script>`.
    pub command: Vec<String>,
    pub rows: u16,
    pub cols: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command: vec!["sh".to_string()],
            rows: 24,
            cols: 80,
        }
    }
}

/// How the child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Normal exit with this code.
    Code(i32),
    /// Killed by this signal number.
    Signaled(i32),
}

impl ChildExit {
    /// The exit code a relay should report for this termination.
    pub fn code(self) -> i32 {
        match self {
            ChildExit::Code(code) => code,
            ChildExit::Signaled(_) => SIGNALED_EXIT_CODE,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The child terminated on its own.
    ChildExited(ChildExit),
    /// The operator typed the exit sequence. The child is left running.
    EscapeExit,
    /// The embedding caller cancelled the session. The child is left running.
    Cancelled,
}

impl SessionOutcome {
    /// The exit code a relay should report for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            SessionOutcome::ChildExited(exit) => exit.code(),
            SessionOutcome::EscapeExit | SessionOutcome::Cancelled => 0,
        }
    }
}

enum Ended {
    Child(ChildExit),
    Escape,
    Cancelled,
}

/// A child process attached to a fresh pseudo-terminal, plus the machinery
/// to bridge it to an operator's terminal.
///
/// [`Session::spawn`] starts the child and two helper threads, one reading
/// pty output and one waiting on the child's exit status. [`Session::run`]
/// then drives everything until the child exits, the operator types the
/// exit sequence, or the cancellation token fires.
pub struct Session {
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
    pid: u32,
    output_rx: mpsc::Receiver<Vec<u8>>,
    exit_rx: oneshot::Receiver<ChildExit>,
    filter: EscapeFilter,
    cancel: CancellationToken,
    rows: u16,
    cols: u16,
}

impl Session {
    /// Spawn `sh -c <command>` inside a pseudo-terminal of the given size.
    pub fn spawn(config: SessionConfig) -> Result<Self, RelayError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| RelayError::OpenFailed(e.to_string()))?;

        let script = shell::join_for_sh(&config.command);
        debug!("Spawning PTY session: sh -c {}", script);
        let mut cmd = CommandBuilder::new("sh");
        cmd.arg("-c");
        cmd.arg(&script);

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| RelayError::SpawnFailed(e.to_string()))?;
        // Close our copy of the slave end so the reader sees EOF once the
        // child's side is gone.
        drop(pair.slave);

        let Some(pid) = child.process_id() else {
            return Err(RelayError::SpawnFailed("child has no pid".to_string()));
        };
        info!("PTY session started with PID: {}", pid);

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| RelayError::OpenFailed(e.to_string()))?;
        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| RelayError::OpenFailed(e.to_string()))?;

        let (output_tx, output_rx) = mpsc::channel::<Vec<u8>>(64);
        std::thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => {
                        debug!("PTY reader reached EOF");
                        break;
                    }
                    Ok(n) => {
                        if output_tx.blocking_send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        // The master read fails with EIO once the child side
                        // closes; treat it like EOF.
                        debug!("PTY read ended: {}", e);
                        break;
                    }
                }
            }
        });

        let (exit_tx, exit_rx) = oneshot::channel();
        std::thread::spawn(move || {
            if let Some(exit) = wait_for_exit(Pid::from_raw(pid as i32)) {
                let _ = exit_tx.send(exit);
            }
        });

        Ok(Self {
            master: pair.master,
            writer,
            child,
            pid,
            output_rx,
            exit_rx,
            filter: EscapeFilter::new(),
            cancel: CancellationToken::new(),
            rows: config.rows,
            cols: config.cols,
        })
    }

    /// Process id of the child.
    pub fn process_id(&self) -> u32 {
        self.pid
    }

    /// Current pseudo-terminal size as (rows, cols).
    pub fn size(&self) -> (u16, u16) {
        (self.rows, self.cols)
    }

    /// Token an embedding caller can use to end the session from outside.
    /// The child is left running, mirroring the operator exit sequence.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Apply a new size to the pseudo-terminal.
    ///
    /// Every call is forwarded to the pty, even when the size is unchanged.
    /// The kernel signals the child on each application, and the child may
    /// rely on that to re-probe its surroundings.
    pub fn resize(&mut self, rows: u16, cols: u16) -> Result<(), RelayError> {
        apply_size(self.master.as_ref(), rows, cols)?;
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Drive the session until it ends.
    ///
    /// `input` carries operator input chunks. Closing it means end of input,
    /// not end of session; the relay keeps forwarding output. `resize`
    /// carries new terminal sizes. Child output is written verbatim to
    /// `out`.
    pub async fn run<W: Write>(
        self,
        mut input: mpsc::Receiver<Vec<u8>>,
        mut resize: mpsc::Receiver<(u16, u16)>,
        mut out: W,
    ) -> Result<SessionOutcome, RelayError> {
        let Session {
            master,
            mut writer,
            child: _child,
            mut output_rx,
            mut exit_rx,
            mut filter,
            cancel,
            ..
        } = self;

        let mut output_open = true;
        let mut input_open = true;
        let mut resize_open = true;

        let ended = loop {
            tokio::select! {
                chunk = output_rx.recv(), if output_open => match chunk {
                    Some(chunk) => {
                        debug!("Read {} bytes from child", chunk.len());
                        forward(&mut out, &chunk)?;
                    }
                    // Reader hit EOF; the exit status arrives on its own arm.
                    None => output_open = false,
                },
                exit = &mut exit_rx => {
                    let exit = exit.map_err(|_| RelayError::ExitSignalLost)?;
                    break Ended::Child(exit);
                }
                chunk = input.recv(), if input_open => match chunk {
                    Some(chunk) => match filter.feed(&chunk) {
                        InputAction::Forward => {
                            debug!("Wrote {} bytes to child", chunk.len());
                            deliver(&mut writer, &chunk)?;
                        }
                        InputAction::Hold => debug!("Escape byte held"),
                        InputAction::Release => {
                            debug!("Escape byte released");
                            deliver(&mut writer, &[ESCAPE_BYTE])?;
                            deliver(&mut writer, &chunk)?;
                        }
                        InputAction::Exit => {
                            info!("Exit sequence received, ending session");
                            break Ended::Escape;
                        }
                    },
                    None => input_open = false,
                },
                size = resize.recv(), if resize_open => match size {
                    Some((rows, cols)) => {
                        debug!("Resizing PTY to {}x{}", cols, rows);
                        apply_size(master.as_ref(), rows, cols)?;
                    }
                    None => resize_open = false,
                },
                _ = cancel.cancelled() => {
                    info!("Session cancelled");
                    break Ended::Cancelled;
                }
            }
        };

        match ended {
            Ended::Child(exit) => {
                drain_remaining(&mut output_rx, &mut out).await?;
                Ok(SessionOutcome::ChildExited(exit))
            }
            Ended::Escape => Ok(SessionOutcome::EscapeExit),
            Ended::Cancelled => Ok(SessionOutcome::Cancelled),
        }
    }
}

/// Forward output the reader produced before the child exited, bounded so
/// a grandchild still holding the pty cannot keep the relay alive.
async fn drain_remaining<W: Write>(
    output_rx: &mut mpsc::Receiver<Vec<u8>>,
    out: &mut W,
) -> Result<(), RelayError> {
    let deadline = tokio::time::Instant::now() + EXIT_DRAIN;
    loop {
        match tokio::time::timeout_at(deadline, output_rx.recv()).await {
            Ok(Some(chunk)) => forward(out, &chunk)?,
            Ok(None) | Err(_) => return Ok(()),
        }
    }
}

/// Wait for the child to terminate, distinguishing a normal exit from death
/// by signal. Returns `None` only if waitpid itself fails.
fn wait_for_exit(pid: Pid) -> Option<ChildExit> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                info!("Child exited with code {}", code);
                return Some(ChildExit::Code(code));
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                info!("Child killed by signal {}", signal);
                return Some(ChildExit::Signaled(signal as i32));
            }
            Ok(status) => debug!("Ignoring wait status: {:?}", status),
            Err(Errno::EINTR) => {}
            Err(e) => {
                warn!("waitpid failed: {}", e);
                return None;
            }
        }
    }
}

fn apply_size(master: &dyn MasterPty, rows: u16, cols: u16) -> Result<(), RelayError> {
    master
        .resize(PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| RelayError::ResizeFailed(e.to_string()))
}

fn deliver<W: Write>(writer: &mut W, data: &[u8]) -> Result<(), RelayError> {
    writer
        .write_all(data)
        .and_then(|_| writer.flush())
        .map_err(|e| RelayError::WriteFailed(e.to_string()))
}

fn forward<W: Write>(out: &mut W, chunk: &[u8]) -> Result<(), RelayError> {
    out.write_all(chunk)
        .and_then(|_| out.flush())
        .map_err(|e| RelayError::OutputFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_exit_keeps_its_code() {
        assert_eq!(ChildExit::Code(0).code(), 0);
        assert_eq!(ChildExit::Code(127).code(), 127);
    }

    #[test]
    fn signal_death_maps_to_sentinel() {
        assert_eq!(ChildExit::Signaled(9).code(), SIGNALED_EXIT_CODE);
        assert_eq!(ChildExit::Signaled(15).code(), SIGNALED_EXIT_CODE);
    }

    #[test]
    fn local_outcomes_report_success() {
        assert_eq!(SessionOutcome::EscapeExit.exit_code(), 0);
        assert_eq!(SessionOutcome::Cancelled.exit_code(), 0);
        assert_eq!(
            SessionOutcome::ChildExited(ChildExit::Code(2)).exit_code(),
            2
        );
    }
}
