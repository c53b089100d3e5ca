//! Name color override parsing

use crate::error::MatchmakingError;

const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("lime", 0x00ff00),
    ("green", 0x008000),
    ("blue", 0x0000ff),
    ("yellow", 0xffff00),
    ("cyan", 0x00ffff),
    ("aqua", 0x00ffff),
    ("magenta", 0xff00ff),
    ("fuchsia", 0xff00ff),
    ("orange", 0xffa500),
    ("purple", 0x800080),
    ("pink", 0xffc0cb),
    ("gray", 0x808080),
    ("grey", 0x808080),
];

/// Parse a color override into its `0xRRGGBB` integer
///
/// Accepts `#rgb`, `#rrggbb`, the same without `#`, `0xrrggbb`,
/// `rgb(r, g, b)` and a handful of CSS color names.
pub fn parse_color(input: &str) -> Result<u32, MatchmakingError> {
    let malformed = || MatchmakingError::MalformedColorOverride {
        value: input.to_string(),
    };

    let value = input.trim().to_ascii_lowercase();
    if value.is_empty() {
        return Err(malformed());
    }

    if let Some((_, color)) = NAMED_COLORS.iter().find(|(name, _)| *name == value) {
        return Ok(*color);
    }

    if let Some(args) = value
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<&str> = args.split(',').map(str::trim).collect();
        if channels.len() != 3 {
            return Err(malformed());
        }
        let mut color = 0u32;
        for channel in channels {
            let channel: u8 = channel.parse().map_err(|_| malformed())?;
            color = (color << 8) | u32::from(channel);
        }
        return Ok(color);
    }

    let hex = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"))
        .unwrap_or(&value);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    match hex.len() {
        3 => {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            u32::from_str_radix(&expanded, 16).map_err(|_| malformed())
        }
        6 => u32::from_str_radix(hex, 16).map_err(|_| malformed()),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_color("#ff0000"), Ok(0xff0000));
        assert_eq!(parse_color("00FF7f"), Ok(0x00ff7f));
        assert_eq!(parse_color("0x123456"), Ok(0x123456));
        assert_eq!(parse_color("#abc"), Ok(0xaabbcc));
        assert_eq!(parse_color("  #FFF "), Ok(0xffffff));
    }

    #[test]
    fn test_rgb_and_names() {
        assert_eq!(parse_color("rgb(255, 128, 0)"), Ok(0xff8000));
        assert_eq!(parse_color("Orange"), Ok(0xffa500));
        assert_eq!(parse_color("grey"), Ok(0x808080));
    }

    #[test]
    fn test_malformed() {
        for input in ["", "#12", "#1234567", "zzzzzz", "rgb(1,2)", "rgb(256,0,0)", "chartreuse-ish"] {
            assert_eq!(
                parse_color(input),
                Err(MatchmakingError::MalformedColorOverride {
                    value: input.to_string()
                }),
                "input {:?}",
                input
            );
        }
    }
}
