//! # PTY Relay
//!
//! Runs a command inside a fresh pseudo-terminal and bridges it to the
//! terminal the relay itself runs in: operator input goes to the child,
//! child output comes back verbatim, and window size changes follow along.
//! Typing `~` then `.` as separate keystrokes ends the relay locally while
//! the child keeps running.
//!
//! ## Example
//!
//! ```no_run
//! use pty_relay::{Session, SessionConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pty_relay::RelayError> {
//!     let session = Session::spawn(SessionConfig {
//!         command: vec!["vi".to_string(), "notes.txt".to_string()],
//!         rows: 24,
//!         cols: 80,
//!     })?;
//!
//!     // Feed input and size changes through these channels.
//!     let (_input_tx, input_rx) = mpsc::channel(64);
//!     let (_resize_tx, resize_rx) = mpsc::channel(8);
//!
//!     let outcome = session.run(input_rx, resize_rx, std::io::stdout()).await?;
//!     std::process::exit(outcome.exit_code())
//! }
//! ```

mod error;
pub mod escape;
mod session;
pub mod shell;

pub use error::RelayError;
pub use escape::{ESCAPE_BYTE, EXIT_BYTE, EscapeFilter, InputAction};
pub use session::{
    ChildExit, SIGNALED_EXIT_CODE, Session, SessionConfig, SessionOutcome,
};
