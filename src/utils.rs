// Display formatting helpers. Everything here is a pure function over its
// inputs; the only floating point allowed is final display rounding.

use chrono::Utc;
use ethers::types::U256;

// U256::exp10 panics past 10^77; no real token gets close.
const MAX_SUPPORTED_DECIMALS: u8 = 77;

/// Abbreviates a number with K/M/B suffixes and 2-decimal rounding.
/// `format_number(1_234_567.0) == "1.23M"`.
pub fn format_number(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    if magnitude >= 1e9 {
        format!("{}{:.2}B", sign, magnitude / 1e9)
    } else if magnitude >= 1e6 {
        format!("{}{:.2}M", sign, magnitude / 1e6)
    } else if magnitude >= 1e3 {
        format!("{}{:.2}K", sign, magnitude / 1e3)
    } else {
        format!("{}{:.2}", sign, magnitude)
    }
}

/// Shortens an address to `prefix...suffix`. Inputs no longer than
/// prefix + suffix are returned unchanged.
pub fn truncate_address(address: &str, prefix: usize, suffix: usize) -> String {
    if address.len() <= prefix + suffix {
        return address.to_string();
    }
    format!(
        "{}...{}",
        &address[..prefix],
        &address[address.len() - suffix..]
    )
}

/// Relative time in second/minute/hour/day buckets, no locale awareness.
pub fn relative_time(epoch_ms: i64) -> String {
    let elapsed_secs = (Utc::now().timestamp_millis() - epoch_ms) / 1000;
    if elapsed_secs < 60 {
        format!("{}s ago", elapsed_secs.max(0))
    } else if elapsed_secs < 3600 {
        format!("{}m ago", elapsed_secs / 60)
    } else if elapsed_secs < 86_400 {
        format!("{}h ago", elapsed_secs / 3600)
    } else {
        format!("{}d ago", elapsed_secs / 86_400)
    }
}

/// Parses a 0x-prefixed (or bare) hex amount into a U256.
pub fn parse_hex_u256(raw: &str) -> Option<U256> {
    let stripped = raw.trim().strip_prefix("0x").unwrap_or(raw.trim());
    if stripped.is_empty() {
        return None;
    }
    U256::from_str_radix(stripped, 16).ok()
}

/// Exact decimal rendering of an integer amount: big-integer division with
/// the fractional remainder zero-padded to `decimals` digits, trailing
/// zeros trimmed. The whole/fraction split never touches floating point.
pub fn format_units(value: U256, decimals: u8) -> String {
    let decimals = decimals.min(MAX_SUPPORTED_DECIMALS);
    if decimals == 0 {
        return value.to_string();
    }
    let divisor = U256::exp10(decimals as usize);
    let whole = value / divisor;
    let frac = value % divisor;
    if frac.is_zero() {
        return whole.to_string();
    }
    let padded = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    let trimmed = padded.trim_end_matches('0');
    format!("{}.{}", whole, trimmed)
}

/// Lossy f64 view of an integer amount, for derived value math only.
pub fn units_to_f64(value: U256, decimals: u8) -> f64 {
    let decimals = decimals.min(MAX_SUPPORTED_DECIMALS);
    let divisor = U256::exp10(decimals as usize);
    let whole = value / divisor;
    let frac = value % divisor;
    if whole.bits() > 128 {
        return f64::MAX;
    }
    let frac_part = if frac.bits() > 128 {
        0.0
    } else {
        frac.as_u128() as f64 / 10f64.powi(decimals as i32)
    };
    whole.as_u128() as f64 + frac_part
}

/// Converts a wei-scale hex gas price into gwei.
pub fn wei_hex_to_gwei(wei_hex: &str) -> Option<f64> {
    let wei = parse_hex_u256(wei_hex)?;
    if wei.bits() > 128 {
        return None;
    }
    Some(wei.as_u128() as f64 / 1e9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_abbreviates() {
        assert_eq!(format_number(1_234_567.0), "1.23M");
        assert_eq!(format_number(2_500_000_000.0), "2.50B");
        assert_eq!(format_number(1_500.0), "1.50K");
        assert_eq!(format_number(999.4), "999.40");
        assert_eq!(format_number(-1_234_567.0), "-1.23M");
    }

    #[test]
    fn truncate_address_keeps_short_inputs() {
        assert_eq!(
            truncate_address("0x1234567890abcdef1234567890abcdef12345678", 6, 4),
            "0x1234...5678"
        );
        assert_eq!(truncate_address("0x1234", 6, 4), "0x1234");
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc::now().timestamp_millis();
        assert_eq!(relative_time(now - 5_000), "5s ago");
        assert_eq!(relative_time(now - 5 * 60_000), "5m ago");
        assert_eq!(relative_time(now - 3 * 3_600_000), "3h ago");
        assert_eq!(relative_time(now - 2 * 86_400_000), "2d ago");
    }

    #[test]
    fn format_units_is_exact() {
        // 1.5 ETH in wei
        let wei = parse_hex_u256("0x14d1120d7b160000").unwrap();
        assert_eq!(format_units(wei, 18), "1.5");
        // 1 wei keeps full padding
        assert_eq!(format_units(U256::one(), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::from(123u64), 0), "123");
    }

    #[test]
    fn units_to_f64_matches_manual_conversion() {
        let wei = parse_hex_u256("0x0de0b6b3a7640000").unwrap(); // 10^18
        assert!((units_to_f64(wei, 18) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn wei_hex_to_gwei_converts() {
        // 30 gwei
        assert_eq!(wei_hex_to_gwei("0x6fc23ac00"), Some(30.0));
        assert_eq!(wei_hex_to_gwei("zz"), None);
    }
}
