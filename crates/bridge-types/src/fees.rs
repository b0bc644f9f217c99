use alloy_primitives::U256;

/// Parts per million; fee rates are integers `<= 10^6`
/// "Decimal fees"). Never compute a transaction value with floating point —
/// every fee path in this crate stays in integer PPM of token units.
pub const PPM_DENOMINATOR: u64 = 1_000_000;

/// Splits `amount` into `(lp_fee, protocol_fee, net_amount)` given rates
/// expressed in PPM. Rounds down, matching typical Solidity integer
/// division, so `lp_fee + protocol_fee + net_amount <= amount`.
pub fn split_fees(amount: U256, lp_fee_ppm: u64, protocol_fee_ppm: u64) -> (U256, U256, U256) {
    let denom = U256::from(PPM_DENOMINATOR);
    let lp_fee = amount * U256::from(lp_fee_ppm) / denom;
    let protocol_fee = amount * U256::from(protocol_fee_ppm) / denom;
    let net_amount = amount - lp_fee - protocol_fee;
    (lp_fee, protocol_fee, net_amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_without_floating_point() {
        let (lp, protocol, net) = split_fees(U256::from(1_000_000u64), 3_000, 1_000);
        assert_eq!(lp, U256::from(3_000u64));
        assert_eq!(protocol, U256::from(1_000u64));
        assert_eq!(net, U256::from(996_000u64));
        assert_eq!(lp + protocol + net, U256::from(1_000_000u64));
    }

    #[test]
    fn zero_rates_return_full_amount() {
        let (lp, protocol, net) = split_fees(U256::from(42u64), 0, 0);
        assert_eq!((lp, protocol, net), (U256::ZERO, U256::ZERO, U256::from(42u64)));
    }
}
