//! Color normalization so `rgb(42, 106, 158)` and `#2A6A9E` compare equal.

/// Normalize a CSS color to lowercase `#rrggbb` where possible.
///
/// Hex values pass through lowercased. `rgb(r,g,b)` and opaque
/// `rgba(r,g,b,1)` become hex. Anything else is returned trimmed and
/// lowercased. Empty input yields `None`.
pub fn normalize_color(value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    if value.starts_with('#') {
        return Some(value);
    }
    Some(functional_to_hex(&value).unwrap_or(value))
}

/// True when both values normalize to the same color
pub fn colors_equal(a: &str, b: &str) -> bool {
    match (normalize_color(a), normalize_color(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn functional_to_hex(value: &str) -> Option<String> {
    let (args, with_alpha) = if let Some(rest) = value.strip_prefix("rgba(") {
        (rest.strip_suffix(')')?, true)
    } else if let Some(rest) = value.strip_prefix("rgb(") {
        (rest.strip_suffix(')')?, false)
    } else {
        return None;
    };

    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let channels = match (with_alpha, parts.len()) {
        (false, 3) => &parts[..],
        (true, 4) => {
            let alpha: f64 = parts[3].parse().ok()?;
            if (alpha - 1.0).abs() > f64::EPSILON {
                return None;
            }
            &parts[..3]
        }
        _ => return None,
    };

    let mut hex = String::from("#");
    for channel in channels {
        let n: u8 = channel.parse().ok()?;
        hex.push_str(&format!("{:02x}", n));
    }
    Some(hex)
}
