/// `0x` prefix plus a 40-character suffix, the usual EVM address length.
pub const ADDRESS_MAX_LEN: usize = 42;

/// Normalize free-form address input: force the `0x` prefix, cap the total
/// length, and uppercase the suffix. Performs no validity checking beyond
/// that; the backend decides what it accepts.
pub fn normalize_address(input: &str) -> String {
    let trimmed = input.trim();
    let suffix = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let mut normalized = String::with_capacity(ADDRESS_MAX_LEN);
    normalized.push_str("0x");
    // Cap by character count; byte length can overshoot on multibyte input.
    for ch in suffix.chars().take(ADDRESS_MAX_LEN - 2) {
        normalized.push(ch.to_ascii_uppercase());
    }
    normalized
}

pub fn short_address(id: &str) -> String {
    let chars = id.chars().collect::<Vec<_>>();
    if chars.len() <= 12 {
        return id.to_owned();
    }

    let head = chars[..6].iter().collect::<String>();
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{head}..{tail}")
}

pub fn format_usd(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("${:.1}K", value / 1e3)
    } else {
        format!("${value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_prefix_and_uppercases() {
        assert_eq!(normalize_address("abcdef"), "0xABCDEF");
        assert_eq!(normalize_address("0xabcDEF"), "0xABCDEF");
        assert_eq!(normalize_address("0Xabc"), "0xABC");
    }

    #[test]
    fn normalize_caps_length() {
        let long = "f".repeat(100);
        let normalized = normalize_address(&long);
        assert_eq!(normalized.len(), ADDRESS_MAX_LEN);
        assert!(normalized.starts_with("0x"));
        assert!(normalized[2..].chars().all(|ch| ch == 'F'));
    }

    #[test]
    fn normalize_caps_multibyte_input_by_characters() {
        let long = "é".repeat(100);
        let normalized = normalize_address(&long);
        assert_eq!(normalized.chars().count(), ADDRESS_MAX_LEN);
        assert!(normalized.starts_with("0x"));
    }

    #[test]
    fn normalize_empty_input_is_bare_prefix() {
        assert_eq!(normalize_address(""), "0x");
        assert_eq!(normalize_address("  "), "0x");
    }

    #[test]
    fn short_address_elides_middle() {
        assert_eq!(short_address("0xABCD"), "0xABCD");
        assert_eq!(
            short_address("0xABCDEF0123456789ABCDEF"),
            "0xABCD..CDEF"
        );
    }

}
