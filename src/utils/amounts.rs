use alloy_primitives::U256;

/// Fixed-point scale of slippage factors.
pub const SLIPPAGE_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Lossy conversion used wherever amounts enter rate arithmetic.
pub fn u256_to_f64(value: U256) -> f64 {
    f64::from(value)
}

/// Rounds toward zero; negative and NaN inputs become zero, values past U256 saturate.
pub fn f64_to_u256(value: f64) -> U256 {
    if value.is_nan() || value < 1.0 {
        return U256::ZERO;
    }
    if value.is_infinite() {
        return U256::MAX;
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i64 - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    if exponent >= 0 {
        if exponent > 203 {
            return U256::MAX;
        }
        U256::from(mantissa) << (exponent as usize)
    } else {
        U256::from(mantissa >> ((-exponent) as u32))
    }
}

/// Rounds half away from zero before converting.
pub fn f64_to_u256_rounded(value: f64) -> U256 {
    f64_to_u256(value.round())
}

/// `a * b / c` rounded down, without intermediate overflow for the amounts this crate handles.
pub fn mul_div(a: U256, b: U256, c: U256) -> U256 {
    if c.is_zero() {
        return U256::ZERO;
    }
    match a.checked_mul(b) {
        Some(product) => product / c,
        None => a / c * b,
    }
}

/// `a * b / c` rounded up.
pub fn mul_div_ceil(a: U256, b: U256, c: U256) -> U256 {
    if c.is_zero() {
        return U256::ZERO;
    }
    match a.checked_mul(b) {
        Some(product) => {
            let quotient = product / c;
            if (product % c).is_zero() { quotient } else { quotient + U256::from(1u64) }
        }
        None => a.div_ceil(c).saturating_mul(b),
    }
}

/// `amount` less `slippage`, rounded down. Exact for zero slippage.
pub fn apply_slippage_down(amount: U256, slippage: f64) -> U256 {
    let factor = f64_to_u256((1.0 - slippage).max(0.0) * 1e18).min(SLIPPAGE_SCALE);
    mul_div(amount, factor, SLIPPAGE_SCALE)
}

/// `amount` plus `slippage`, rounded up. Exact for zero slippage.
pub fn apply_slippage_up(amount: U256, slippage: f64) -> U256 {
    let factor = f64_to_u256(((1.0 + slippage.max(0.0)) * 1e18).ceil()).max(SLIPPAGE_SCALE);
    mul_div_ceil(amount, factor, SLIPPAGE_SCALE)
}
