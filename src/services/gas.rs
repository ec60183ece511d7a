use crate::{models::GasQuote, utils::wei_hex_to_gwei};

/// Derives the display quote from an `eth_gasPrice` response. Returns
/// `None` on malformed hex so the feed layer treats it as a failed fetch.
pub fn quote_from_wei_hex(wei_hex: &str) -> Option<GasQuote> {
    let gwei = wei_hex_to_gwei(wei_hex)?;
    Some(GasQuote {
        wei_hex: wei_hex.to_string(),
        gwei,
        formatted: format!("{:.1} Gwei", gwei),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_converts_and_formats() {
        let quote = quote_from_wei_hex("0x6fc23ac00").unwrap();
        assert_eq!(quote.gwei, 30.0);
        assert_eq!(quote.formatted, "30.0 Gwei");
        assert_eq!(quote.wei_hex, "0x6fc23ac00");
    }

    #[test]
    fn malformed_hex_is_a_failed_fetch() {
        assert!(quote_from_wei_hex("not-hex").is_none());
    }
}
