use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;

/// Count down to zero on one line, a second at a time.
pub async fn countdown_command(duration: u64) -> Result<()> {
    let mut stdout = std::io::stdout();
    let printed = duration > 0;
    let mut remaining = duration;
    while remaining > 0 {
        if remaining == 1 {
            write!(stdout, "1")?;
        } else {
            write!(stdout, "{} ", remaining)?;
        }
        stdout.flush()?;
        remaining -= 1;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    if printed {
        writeln!(stdout)?;
    }
    Ok(())
}

/// Parse a countdown duration: bare seconds, or unit values in descending
/// order like "3hour 4min 5sec", "2 hours" or "1h30m".
pub fn parse_duration_secs(value: &str) -> Result<u64, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return value.parse::<u64>().map_err(|e| e.to_string());
    }

    let re = Regex::new(
        r"(?i)^\s*(?:(\d+)\s*(?:hours?|hrs?|h))?\s*(?:(\d+)\s*(?:minutes?|mins?|m))?\s*(?:(\d+)\s*(?:seconds?|secs?|s))?\s*$",
    )
    .unwrap();
    let caps = re
        .captures(value)
        .ok_or_else(|| format!("invalid duration: {value}"))?;
    if caps.get(1).is_none() && caps.get(2).is_none() && caps.get(3).is_none() {
        return Err(format!("invalid duration: {value}"));
    }

    let part = |i: usize| -> Result<u64, String> {
        match caps.get(i) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| format!("duration component too large: {}", m.as_str())),
            None => Ok(0),
        }
    };
    let hours = part(1)?;
    let minutes = part(2)?;
    let seconds = part(3)?;
    Ok(hours
        .saturating_mul(3600)
        .saturating_add(minutes.saturating_mul(60))
        .saturating_add(seconds))
}
