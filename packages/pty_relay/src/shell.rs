//! Shell quoting for handing an argv-style command to `sh -c`.

/// Join command words into a single `sh -c` script.
///
/// Each word is wrapped in single quotes, with embedded single quotes
/// rewritten as `'\''`. The result runs the words as one command line with
/// spacing and quoting preserved, while a word that is itself a full shell
/// snippet stays inert unless the caller re-invokes a shell inside it.
pub fn join_for_sh(words: &[String]) -> String {
    words
        .iter()
        .map(|word| quote(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 2);
    out.push('\'');
    for ch in word.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}
