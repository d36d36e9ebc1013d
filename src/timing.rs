//! Pure unit conversions between VCSEL pulse clocks (PCLKs), sequence-step
//! macro clocks (MCLKs), microseconds, and the device's compact timeout
//! register format. Integer arithmetic throughout; fractional intermediate
//! values have no hardware meaning.

/// Decode VCSEL (vertical cavity surface emitting laser) pulse period in
/// PCLKs from a register value.
/// based on VL53L0X_decode_vcsel_period()
pub fn decode_vcsel_period(reg_val: u8) -> u8 {
    (reg_val + 1) << 1
}

/// Encode a VCSEL pulse period in PCLKs into its register value. Exact
/// inverse of [`decode_vcsel_period`] for even periods >= 2.
/// based on VL53L0X_encode_vcsel_period()
pub fn encode_vcsel_period(period_pclks: u8) -> u8 {
    (period_pclks >> 1) - 1
}

/// Macro period in nanoseconds for the given VCSEL period in PCLKs.
/// PLL_period_ps = 1655; macro_period_vclks = 2304
/// based on VL53L0X_calc_macro_period_ps()
pub fn calc_macro_period(vcsel_period_pclks: u16) -> u32 {
    ((2304 * u32::from(vcsel_period_pclks) * 1655) + 500) / 1000
}

/// Convert a sequence step timeout from MCLKs to microseconds with the given
/// VCSEL period in PCLKs.
/// based on VL53L0X_calc_timeout_us()
pub fn timeout_mclks_to_microseconds(timeout_period_mclks: u16, vcsel_period_pclks: u16) -> u32 {
    let macro_period_ns: u32 = calc_macro_period(vcsel_period_pclks);

    ((u32::from(timeout_period_mclks) * macro_period_ns) + (macro_period_ns / 2)) / 1000
}

/// Convert a sequence step timeout from microseconds to MCLKs with the given
/// VCSEL period in PCLKs.
/// based on VL53L0X_calc_timeout_mclks()
pub fn timeout_microseconds_to_mclks(timeout_period_us: u32, vcsel_period_pclks: u16) -> u32 {
    let macro_period_ns: u32 = calc_macro_period(vcsel_period_pclks);

    ((timeout_period_us * 1000) + (macro_period_ns / 2)) / macro_period_ns
}

/// Encode a sequence step timeout in MCLKs into the 16-bit register format
/// "(LSByte * 2^MSByte) + 1". Lossy above 255 MCLKs.
/// based on VL53L0X_encode_timeout()
pub fn encode_timeout(timeout_mclks: u32) -> u16 {
    let mut ls_byte: u32;
    let mut ms_byte: u16 = 0;

    if timeout_mclks > 0 {
        ls_byte = timeout_mclks - 1;

        while (ls_byte & 0xFFFF_FF00) > 0 {
            ls_byte >>= 1;
            ms_byte += 1;
        }

        (ms_byte << 8) | (ls_byte & 0xFF) as u16
    } else {
        0
    }
}

/// Decode a sequence step timeout register value into MCLKs. Exponents
/// beyond 15 cannot come from [`encode_timeout`]; they are clamped rather
/// than trusted, since the register contents arrive off the wire.
/// based on VL53L0X_decode_timeout()
pub fn decode_timeout(reg_val: u16) -> u16 {
    let exponent = (reg_val >> 8).min(15);
    ((reg_val & 0x00FF) << exponent) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vcsel_period_round_trips_for_valid_values() {
        // pre-range 12..=18, final-range 8..=14, even values only
        for pclks in (8..=18u8).step_by(2) {
            assert_eq!(decode_vcsel_period(encode_vcsel_period(pclks)), pclks);
        }
    }

    #[test]
    fn macro_period_matches_vendor_constants() {
        // hand-computed from (2304 * pclks * 1655 + 500) / 1000
        assert_eq!(calc_macro_period(14), 53_384);
        assert_eq!(calc_macro_period(10), 38_131);
    }

    #[test]
    fn timeout_round_trips_exactly_up_to_255() {
        for mclks in 1..=255u32 {
            let encoded = encode_timeout(mclks);
            assert_eq!(u32::from(decode_timeout(encoded)), mclks);
        }
    }

    #[test]
    fn timeout_zero_encodes_to_zero() {
        assert_eq!(encode_timeout(0), 0);
    }

    #[test]
    fn timeout_above_255_is_within_one_mantissa_step() {
        for mclks in [256u32, 257, 258, 300, 511, 512, 1000, 4095, 10_000] {
            let encoded = encode_timeout(mclks);
            let decoded = u32::from(decode_timeout(encoded));
            let step = 1u32 << (encoded >> 8);

            assert!(decoded <= mclks, "decode({mclks}) = {decoded} overshoots");
            assert!(
                mclks - decoded <= step,
                "decode({mclks}) = {decoded} off by more than {step}"
            );
        }
    }

    #[test]
    fn timeout_decode_tolerates_out_of_range_exponents() {
        // No encoded value carries an exponent above 8, but a misread
        // register can; the shift must not blow past the word width.
        assert_eq!(decode_timeout(0x1001), (1 << 15) + 1);
        assert_eq!(decode_timeout(0xFF01), (1 << 15) + 1);
        assert_eq!(decode_timeout(0xFF00), 1);
    }

    #[test]
    fn us_mclks_conversion_is_consistent() {
        for pclks in (8..=18u16).step_by(2) {
            for mclks in [15u16, 151, 300, 2000] {
                let us = timeout_mclks_to_microseconds(mclks, pclks);
                let back = timeout_microseconds_to_mclks(us, pclks);
                let diff = back.abs_diff(u32::from(mclks));
                assert!(diff <= 1, "{mclks} MCLKs @ {pclks} PCLKs came back as {back}");
            }
        }
    }
}
