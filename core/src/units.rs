use alloy::primitives::{utils::format_units, U256};

/// Formats a wei amount as a decimal ether string. Trailing zeros are
/// trimmed but at least one fractional digit is kept, so one full ether
/// renders as "1.0" and zero as "0.0".
pub fn format_wei(value: U256) -> crate::Result<String> {
    let formatted = format_units(value, "ether")?;
    Ok(trim_trailing_zeros(formatted))
}

fn trim_trailing_zeros(mut value: String) -> String {
    if let Some(dot) = value.find('.') {
        let min_len = dot + 2;
        while value.len() > min_len && value.ends_with('0') {
            value.pop();
        }
    }
    value
}
