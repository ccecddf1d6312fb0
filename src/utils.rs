use alloy_primitives::{Address, U256};

/// 10^18, the scaling factor between display units and base units.
pub fn unit_scale() -> U256 {
    U256::from(1_000_000_000_000_000_000u128)
}

/// Renders a base-unit amount with 18 decimals, trimming trailing zeros
/// but always keeping one fractional digit ("2.0", "3.2", "0.5").
pub fn format_units(value: U256) -> String {
    let scale = unit_scale();
    let whole = value / scale;
    let frac = value % scale;
    let digits = format!("{:0>18}", frac.to_string());
    let trimmed = digits.trim_end_matches('0');
    if trimmed.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{trimmed}")
    }
}

/// Reciprocal of a raw integer as a decimal string. `None` for zero, and
/// for values above 10^18 whose reciprocal truncates to zero at 18 decimals.
pub fn reciprocal(raw: U256) -> Option<String> {
    if raw.is_zero() {
        return None;
    }
    let quotient = unit_scale() / raw;
    if quotient.is_zero() {
        return None;
    }
    Some(format_units(quotient))
}

/// Parses a user-entered token quantity as a base-10 integer.
pub fn parse_token_quantity(input: &str) -> Option<U256> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(input, 10).ok()
}

pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
