//! Detection of the `~.` exit sequence in operator input.
//!
//! The detector works on whole input chunks, not individual bytes. Only a
//! chunk that is exactly the single escape byte arms it, so pasted text
//! containing `~` or even a literal `~.` flows through to the child
//! untouched. Typed at a real keyboard, `~` and `.` arrive as two one-byte
//! chunks and end the session.

/// Byte that arms the detector when it arrives as a lone chunk.
pub const ESCAPE_BYTE: u8 = b'~';

/// Byte that ends the session when it follows a held escape byte.
pub const EXIT_BYTE: u8 = b'.';

/// What to do with one chunk of operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Deliver the chunk to the child unchanged.
    Forward,
    /// Deliver nothing; the escape byte is held until the next chunk.
    Hold,
    /// Deliver the held escape byte, then the chunk.
    Release,
    /// End the session. Neither the held byte nor the chunk is delivered.
    Exit,
}

/// Chunk-at-a-time state machine for the exit sequence.
#[derive(Debug, Default)]
pub struct EscapeFilter {
    pending: bool,
}

impl EscapeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one input chunk and advance the detector.
    pub fn feed(&mut self, chunk: &[u8]) -> InputAction {
        if !self.pending {
            if chunk.len() == 1 && chunk[0] == ESCAPE_BYTE {
                self.pending = true;
                return InputAction::Hold;
            }
            return InputAction::Forward;
        }
        self.pending = false;
        if chunk.len() == 1 && chunk[0] == EXIT_BYTE {
            return InputAction::Exit;
        }
        InputAction::Release
    }
}
