use crate::error::{FundError, FundResult};

pub const MAX_WALLET_ADDRESS_LEN: usize = 128;
pub const EVM_ADDRESS_BYTES: usize = 20;

const _: [(); 256 - MAX_WALLET_ADDRESS_LEN] = [(); 256 - MAX_WALLET_ADDRESS_LEN];

/// Trims a wallet identifier and folds EVM hex addresses to lowercase so the
/// same wallet always maps to the same voter key.
pub fn sanitize_wallet_address(value: &str) -> FundResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FundError::invalid_input("wallet address cannot be empty"));
    }
    if trimmed.len() > MAX_WALLET_ADDRESS_LEN {
        return Err(FundError::invalid_input(format!(
            "wallet address exceeds {MAX_WALLET_ADDRESS_LEN} character limit"
        )));
    }
    if let Some(bytes) = decode_evm_address(trimmed) {
        return Ok(format!("0x{}", hex::encode(bytes)));
    }
    Ok(trimmed.to_string())
}

fn decode_evm_address(value: &str) -> Option<Vec<u8>> {
    let digits = strip_hex_prefix(value)?;
    let bytes = hex::decode(digits).ok()?;
    (bytes.len() == EVM_ADDRESS_BYTES).then_some(bytes)
}

fn strip_hex_prefix(value: &str) -> Option<&str> {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evm_addresses_are_lowercased() {
        let mixed = "  0xAbCdEf0123456789abcdef0123456789ABCDEF01 ";
        let canonical = sanitize_wallet_address(mixed).expect("valid address");
        assert_eq!(canonical, "0xabcdef0123456789abcdef0123456789abcdef01");

        let upper_prefix = "0XABCDEF0123456789ABCDEF0123456789ABCDEF01";
        assert_eq!(sanitize_wallet_address(upper_prefix).unwrap(), canonical);
    }

    #[test]
    fn other_identifiers_are_only_trimmed() {
        assert_eq!(sanitize_wallet_address(" 0x7fe3...4c21 ").unwrap(), "0x7fe3...4c21");
        assert_eq!(sanitize_wallet_address("0xABC").unwrap(), "0xABC");
    }

    #[test]
    fn empty_and_oversized_addresses_are_rejected() {
        assert!(sanitize_wallet_address("   ").is_err());
        let too_long = "a".repeat(MAX_WALLET_ADDRESS_LEN + 1);
        assert!(sanitize_wallet_address(&too_long).is_err());
    }
}
