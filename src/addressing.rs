use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Chain;

// Legacy (1...), P2SH (3...) and bech32 (bc1...) mainnet forms. No
// checksum validation, format only.
static BTC_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(1|3)[a-km-zA-HJ-NP-Z1-9]{25,34}$|^bc1[a-z0-9]{39,59}$").unwrap()
});

static EVM_ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap());

/// Format-level address validation for the claimed chain.
pub fn is_valid_address(address: &str, chain: Chain) -> bool {
    match chain {
        Chain::Btc => BTC_ADDRESS.is_match(address),
        Chain::Eth | Chain::Bnb => EVM_ADDRESS.is_match(address),
        // Base58 alphabet, 32-44 chars. Solana pubkeys are not
        // checksummed, so a decode check is all there is.
        Chain::Sol => {
            (32..=44).contains(&address.len()) && bs58::decode(address).into_vec().is_ok()
        }
    }
}

/// First 6 + "..." + last 4 characters for display. Short inputs are
/// returned unchanged.
pub fn mask_address(address: &str) -> String {
    if address.len() < 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Whole-dollar display formatting with thousands separators.
pub fn format_usd(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let negative = rounded < 0;
    let digits = rounded.abs().to_string();

    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Public block-explorer page for an address.
pub fn explorer_link(address: &str, chain: Chain) -> String {
    match chain {
        Chain::Btc => format!("https://mempool.space/address/{}", address),
        Chain::Eth => format!("https://etherscan.io/address/{}", address),
        Chain::Bnb => format!("https://bscscan.com/address/{}", address),
        Chain::Sol => format!("https://solscan.io/account/{}", address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_btc_address_forms() {
        assert!(is_valid_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", Chain::Btc));
        assert!(is_valid_address("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy", Chain::Btc));
        assert!(is_valid_address(
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            Chain::Btc
        ));
        // Right length, wrong alphabet (0, O, I, l are not base58)
        assert!(!is_valid_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7D0vfNa", Chain::Btc));
        assert!(!is_valid_address("not-an-address", Chain::Btc));
        assert!(!is_valid_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e", Chain::Btc));
    }

    #[test]
    fn test_evm_address_forms() {
        assert!(is_valid_address(
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
            Chain::Eth
        ));
        assert!(is_valid_address(
            "0xABCDEF0123456789abcdef0123456789ABCDEF01",
            Chain::Bnb
        ));
        // Missing prefix
        assert!(!is_valid_address(
            "742d35Cc6634C0532925a3b844Bc454e4438f44e",
            Chain::Eth
        ));
        // Right length, non-hex characters
        assert!(!is_valid_address(
            "0xZZZZ35Cc6634C0532925a3b844Bc454e4438f44e",
            Chain::Eth
        ));
    }

    #[test]
    fn test_sol_address_forms() {
        assert!(is_valid_address(
            "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T",
            Chain::Sol
        ));
        // Contains '0', outside the base58 alphabet
        assert!(!is_valid_address(
            "0Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T",
            Chain::Sol
        ));
        assert!(!is_valid_address("tooshort", Chain::Sol));
    }

    #[test]
    fn test_mask_address() {
        assert_eq!(
            mask_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"),
            "0x742d...f44e"
        );
        assert_eq!(mask_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44e").len(), 13);
        assert_eq!(mask_address("short"), "short");
        assert_eq!(mask_address("123456789"), "123456789");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(1234.9), "$1,235");
        assert_eq!(format_usd(999.4), "$999");
        assert_eq!(format_usd(1_000_000.0), "$1,000,000");
        assert_eq!(format_usd(-1234.9), "-$1,235");
    }

    #[test]
    fn test_explorer_links() {
        assert_eq!(
            explorer_link("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", Chain::Btc),
            "https://mempool.space/address/1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"
        );
        assert!(explorer_link("abc", Chain::Eth).starts_with("https://etherscan.io/"));
        assert!(explorer_link("abc", Chain::Bnb).starts_with("https://bscscan.com/"));
        assert!(explorer_link("abc", Chain::Sol).starts_with("https://solscan.io/"));
    }
}
