use std::io::Read;

use anyhow::{Result, bail};
use regex::Regex;

pub fn color_complement_command(color: Option<String>) -> Result<()> {
    transform(color, complement)
}

pub fn color_invert_command(color: Option<String>) -> Result<()> {
    transform(color, invert)
}

fn transform(color: Option<String>, f: fn([u8; 3]) -> [u8; 3]) -> Result<()> {
    let txt = match color {
        Some(color) => color,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let (hash, rgb) = parse_color(&txt)?;
    println!("{}", format_color(hash, f(rgb)));
    Ok(())
}

/// Parse `rrggbb` with an optional leading `#` and optional trailing
/// newline. Anything else, surrounding whitespace included, is rejected.
fn parse_color(txt: &str) -> Result<(bool, [u8; 3])> {
    let re = Regex::new(r"(?i)^(#?)([0-9a-f]{2})([0-9a-f]{2})([0-9a-f]{2})(\r?\n)?$").unwrap();
    let Some(caps) = re.captures(txt) else {
        bail!("invalid color code: {txt}");
    };
    let channel = |i: usize| u8::from_str_radix(&caps[i], 16);
    Ok((!caps[1].is_empty(), [channel(2)?, channel(3)?, channel(4)?]))
}

fn format_color(hash: bool, [r, g, b]: [u8; 3]) -> String {
    format!("{}{r:02x}{g:02x}{b:02x}", if hash { "#" } else { "" })
}

/// Complement each channel by reflecting it within the color's own range,
/// `c -> (max + min) - c`.
fn complement([r, g, b]: [u8; 3]) -> [u8; 3] {
    let sum = u16::from(r.max(g).max(b)) + u16::from(r.min(g).min(b));
    [
        (sum - u16::from(r)) as u8,
        (sum - u16::from(g)) as u8,
        (sum - u16::from(b)) as u8,
    ]
}

fn invert([r, g, b]: [u8; 3]) -> [u8; 3] {
    [255 - r, 255 - g, 255 - b]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_reflects_channels() {
        assert_eq!(complement([0x22, 0xaa, 0x66]), [0xaa, 0x22, 0x66]);
        assert_eq!(complement([0xff, 0x00, 0x00]), [0x00, 0xff, 0xff]);
        assert_eq!(complement([0x10, 0x10, 0x10]), [0x10, 0x10, 0x10]);
    }

    #[test]
    fn invert_flips_channels() {
        assert_eq!(invert([0x22, 0xaa, 0x66]), [0xdd, 0x55, 0x99]);
        assert_eq!(invert([0x00, 0x00, 0x00]), [0xff, 0xff, 0xff]);
        assert_eq!(invert([0xff, 0xff, 0xff]), [0x00, 0x00, 0x00]);
    }

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(parse_color("#22aa66").unwrap(), (true, [0x22, 0xaa, 0x66]));
        assert_eq!(parse_color("22aa66").unwrap(), (false, [0x22, 0xaa, 0x66]));
    }

    #[test]
    fn parses_uppercase_and_trailing_newline() {
        assert_eq!(parse_color("#22AA66").unwrap(), (true, [0x22, 0xaa, 0x66]));
        assert_eq!(parse_color("22aa66\n").unwrap(), (false, [0x22, 0xaa, 0x66]));
        assert_eq!(parse_color("22aa66\r\n").unwrap(), (false, [0x22, 0xaa, 0x66]));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_color("").is_err());
        assert!(parse_color("22aa6").is_err());
        assert!(parse_color("22aa667").is_err());
        assert!(parse_color(" 22aa66").is_err());
        assert!(parse_color("22aa66 ").is_err());
        assert!(parse_color("##22aa66").is_err());
        assert!(parse_color("gg0000").is_err());
    }

    #[test]
    fn output_is_lowercase_and_keeps_hash() {
        assert_eq!(format_color(true, [0xaa, 0x22, 0x66]), "#aa2266");
        assert_eq!(format_color(false, [0xdd, 0x55, 0x99]), "dd5599");
    }
}
