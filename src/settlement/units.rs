//! Token base-unit arithmetic.

use crate::error::{Error, Result};

/// Decimals of the native currency (wei per ETH).
pub const NATIVE_DECIMALS: u8 = 18;

/// Convert a decimal price into integer token base units, truncating
/// fractional digits beyond `decimals`.
///
/// The price is scaled through its shortest decimal rendering rather
/// than by float multiplication: `1.2345 * 10f64.powi(6)` lands just
/// below `1_234_500.0` and would floor to the wrong unit count, while
/// digit folding yields exactly `1_234_500`.
///
/// # Errors
///
/// Returns a validation error for negative or non-finite prices, and
/// for amounts that overflow 128 bits.
pub fn token_units(price: f64, decimals: u8) -> Result<u128> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::Validation(
            "price must be a non-negative finite number".into(),
        ));
    }

    let text = format!("{price}");
    let (int_text, frac_text) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (text.as_str(), ""),
    };

    let mut units: u128 = int_text
        .parse()
        .map_err(|_| Error::Validation(format!("unsupported price value: {price}")))?;

    let mut frac_digits = frac_text.chars();
    for _ in 0..decimals {
        let digit = match frac_digits.next() {
            Some(c) => c
                .to_digit(10)
                .ok_or_else(|| Error::Validation(format!("unsupported price value: {price}")))?,
            None => 0,
        };
        units = units
            .checked_mul(10)
            .and_then(|v| v.checked_add(u128::from(digit)))
            .ok_or_else(|| Error::Validation("token amount overflows 128 bits".into()))?;
    }
    // Digits beyond the token's precision are truncated, not rounded.

    Ok(units)
}
