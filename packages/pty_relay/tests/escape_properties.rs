use proptest::prelude::*;
use pty_relay::{ESCAPE_BYTE, EXIT_BYTE, EscapeFilter, InputAction};

// --- Strategies ---

fn arb_multi_byte_chunk() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 2..64)
}

fn arb_non_escape_byte() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("must not be the escape byte", |b| *b != ESCAPE_BYTE)
}

fn arb_non_exit_byte() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("must not be the exit byte", |b| *b != EXIT_BYTE)
}

fn arb_chunk_stream() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..8), 0..32)
}

/// Replay chunks, collecting what the child would receive. `None` means the
/// stream ended the session.
fn apply(chunks: &[Vec<u8>]) -> Option<Vec<u8>> {
    let mut filter = EscapeFilter::new();
    let mut delivered = Vec::new();
    for chunk in chunks {
        match filter.feed(chunk) {
            InputAction::Forward => delivered.extend_from_slice(chunk),
            InputAction::Hold => {}
            InputAction::Release => {
                delivered.push(ESCAPE_BYTE);
                delivered.extend_from_slice(chunk);
            }
            InputAction::Exit => return None,
        }
    }
    Some(delivered)
}

// --- Properties ---

proptest! {
    #[test]
    fn multi_byte_chunks_never_arm_the_detector(chunk in arb_multi_byte_chunk()) {
        let mut filter = EscapeFilter::new();
        prop_assert_eq!(filter.feed(&chunk), InputAction::Forward);
    }

    #[test]
    fn multi_byte_chunks_never_exit(chunk in arb_multi_byte_chunk()) {
        let mut filter = EscapeFilter::new();
        filter.feed(b"~");
        prop_assert_eq!(filter.feed(&chunk), InputAction::Release);
    }

    #[test]
    fn single_non_escape_bytes_forward(byte in arb_non_escape_byte()) {
        let mut filter = EscapeFilter::new();
        prop_assert_eq!(filter.feed(&[byte]), InputAction::Forward);
    }

    #[test]
    fn armed_detector_releases_on_any_non_exit_byte(byte in arb_non_exit_byte()) {
        let mut filter = EscapeFilter::new();
        filter.feed(b"~");
        prop_assert_eq!(filter.feed(&[byte]), InputAction::Release);
    }

    #[test]
    fn no_bytes_invented_or_reordered(chunks in arb_chunk_stream()) {
        if let Some(delivered) = apply(&chunks) {
            // Everything fed in comes out in order. The only byte the
            // filter may still owe the child is a trailing held escape.
            let mut joined: Vec<u8> = chunks.concat();
            if joined.last() == Some(&ESCAPE_BYTE) && delivered.len() + 1 == joined.len() {
                joined.pop();
            }
            prop_assert_eq!(delivered, joined);
        }
    }
}
