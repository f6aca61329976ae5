use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use pty_relay::{Session, SessionConfig};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::terminal::{TerminalGuard, get_terminal_size};

/// Size used when the controlling terminal cannot be probed.
const DEFAULT_SIZE: (u16, u16) = (24, 80);

/// Run `command` in a fresh pty wired to this terminal and return the exit
/// code to report: the child's own code, 128 if a signal killed it, or 0
/// when the operator ended the relay with `~.`.
pub async fn relay_command(command: Vec<String>) -> Result<i32> {
    let (rows, cols) = get_terminal_size().unwrap_or(DEFAULT_SIZE);
    let session = Session::spawn(SessionConfig { command, rows, cols })
        .context("failed to start pty session")?;

    let guard = TerminalGuard::new();
    if std::io::stdin().is_terminal() {
        if let Err(e) = guard.enter_raw_mode() {
            info!("Could not enter raw mode, continuing: {}", e);
        }
    } else {
        info!("stdin is not a tty, skipping raw mode");
    }

    // Read stdin on a thread. poll with a timeout so the thread notices the
    // shutdown flag instead of blocking in read forever.
    let (input_tx, input_rx) = mpsc::channel::<Vec<u8>>(64);
    let stdin_shutdown = Arc::new(AtomicBool::new(false));
    let stdin_shutdown_thread = stdin_shutdown.clone();
    std::thread::spawn(move || {
        use std::io::Read;
        use std::os::fd::AsRawFd;

        let stdin = std::io::stdin();
        let stdin_fd = stdin.as_raw_fd();
        let mut buf = [0u8; 4096];

        loop {
            if stdin_shutdown_thread.load(Ordering::Relaxed) {
                break;
            }

            let mut pfd = nix::libc::pollfd {
                fd: stdin_fd,
                events: nix::libc::POLLIN,
                revents: 0,
            };
            let ret = unsafe { nix::libc::poll(&mut pfd, 1, 100) };
            if ret <= 0 {
                continue;
            }

            let mut handle = stdin.lock();
            match handle.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    drop(handle);
                    if input_tx.blocking_send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    // Every SIGWINCH re-probes the terminal and forwards the fresh size.
    let (resize_tx, resize_rx) = mpsc::channel::<(u16, u16)>(8);
    let mut sigwinch =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::window_change())
            .context("failed to install SIGWINCH handler")?;
    tokio::spawn(async move {
        while sigwinch.recv().await.is_some() {
            if let Ok((rows, cols)) = get_terminal_size() {
                debug!("SIGWINCH -> {}x{}", cols, rows);
                if resize_tx.send((rows, cols)).await.is_err() {
                    break;
                }
            }
        }
    });

    let result = session.run(input_rx, resize_rx, std::io::stdout()).await;

    stdin_shutdown.store(true, Ordering::Relaxed);
    drop(guard);

    let outcome = result.context("relay session failed")?;
    info!("Session ended with code {}", outcome.exit_code());
    Ok(outcome.exit_code())
}
