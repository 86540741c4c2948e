//! Arbitrary-precision binary floating point element type
//!
//! A `BigFloat` is `(-1)^sign * mantissa * 2^exponent` with a 256-bit
//! unsigned mantissa and an `i64` exponent, plus NaN and the infinities.
//!
//! # Canonical Form
//!
//! Finite values keep the mantissa odd (trailing zero bits are folded into
//! the exponent), and zero always has exponent 0. Two finite values are
//! therefore equal exactly when their fields are equal, which lets the codec
//! use `BigFloat` as a lossless pivot between all element types: every
//! integer up to 128 bits and every IEEE-754 binary16/32/64 value embeds
//! exactly.
//!
//! Equality is structural: `NaN == NaN` and `-0 != +0`. This is the
//! identity the codec round-trip law needs, not IEEE comparison.

use std::fmt;

/// Width of an encoded `BigFloat` in bytes: flags + exponent + 256-bit mantissa
pub const BIGFLOAT_WIDTH: usize = 1 + 8 + 32;

/// Mantissa precision in bits
pub const BIGFLOAT_PRECISION: u32 = 256;

const FLAG_SIGN: u8 = 0b0000_0001;
const CLASS_SHIFT: u8 = 1;
const CLASS_MASK: u8 = 0b0000_0110;

/// Classification of a `BigFloat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatClass {
    /// Zero or a finite non-zero value
    Finite,
    /// Positive or negative infinity
    Infinite,
    /// Not a number
    Nan,
}

impl FloatClass {
    fn to_bits(self) -> u8 {
        match self {
            FloatClass::Finite => 0,
            FloatClass::Infinite => 1,
            FloatClass::Nan => 2,
        }
    }

    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(FloatClass::Finite),
            1 => Some(FloatClass::Infinite),
            2 => Some(FloatClass::Nan),
            _ => None,
        }
    }
}

/// 256-bit unsigned mantissa stored as two little-endian halves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct U256 {
    lo: u128,
    hi: u128,
}

impl U256 {
    const ZERO: U256 = U256 { lo: 0, hi: 0 };

    fn from_u128(v: u128) -> Self {
        U256 { lo: v, hi: 0 }
    }

    fn is_zero(&self) -> bool {
        self.lo == 0 && self.hi == 0
    }

    /// Number of significant bits (0 for zero)
    fn bits(&self) -> u32 {
        if self.hi != 0 {
            256 - self.hi.leading_zeros()
        } else {
            128 - self.lo.leading_zeros()
        }
    }

    fn trailing_zeros(&self) -> u32 {
        if self.lo != 0 {
            self.lo.trailing_zeros()
        } else if self.hi != 0 {
            128 + self.hi.trailing_zeros()
        } else {
            0
        }
    }

    fn shr(&self, n: u32) -> U256 {
        match n {
            0 => *self,
            1..=127 => U256 {
                lo: (self.lo >> n) | (self.hi << (128 - n)),
                hi: self.hi >> n,
            },
            128..=255 => U256 {
                lo: self.hi >> (n - 128),
                hi: 0,
            },
            _ => U256::ZERO,
        }
    }

    /// Test bit `n` (0 = least significant)
    fn bit(&self, n: u32) -> bool {
        match n {
            0..=127 => (self.lo >> n) & 1 == 1,
            128..=255 => (self.hi >> (n - 128)) & 1 == 1,
            _ => false,
        }
    }

    /// True if any bit strictly below position `n` is set
    fn any_below(&self, n: u32) -> bool {
        match n {
            0 => false,
            1..=127 => self.lo & ((1u128 << n) - 1) != 0,
            128 => self.lo != 0,
            129..=255 => self.lo != 0 || self.hi & ((1u128 << (n - 128)) - 1) != 0,
            _ => !self.is_zero(),
        }
    }

    /// Low 128 bits, only meaningful when `bits() <= 128`
    fn low_u128(&self) -> u128 {
        self.lo
    }
}

/// Arbitrary-precision binary float with a 256-bit mantissa
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BigFloat {
    negative: bool,
    class: FloatClass,
    exponent: i64,
    mantissa: U256,
}

impl BigFloat {
    /// Positive zero
    pub const ZERO: BigFloat = BigFloat {
        negative: false,
        class: FloatClass::Finite,
        exponent: 0,
        mantissa: U256::ZERO,
    };

    /// Not a number
    pub const NAN: BigFloat = BigFloat {
        negative: false,
        class: FloatClass::Nan,
        exponent: 0,
        mantissa: U256::ZERO,
    };

    /// Positive infinity
    pub const INFINITY: BigFloat = BigFloat {
        negative: false,
        class: FloatClass::Infinite,
        exponent: 0,
        mantissa: U256::ZERO,
    };

    /// Negative infinity
    pub const NEG_INFINITY: BigFloat = BigFloat {
        negative: true,
        class: FloatClass::Infinite,
        exponent: 0,
        mantissa: U256::ZERO,
    };

    fn infinity(negative: bool) -> Self {
        if negative {
            BigFloat::NEG_INFINITY
        } else {
            BigFloat::INFINITY
        }
    }

    /// Canonical finite value, or `None` if folding the trailing zeros would
    /// push the exponent past `i64::MAX`
    fn checked_finite(negative: bool, mantissa: U256, exponent: i64) -> Option<Self> {
        if mantissa.is_zero() {
            return Some(BigFloat {
                negative,
                class: FloatClass::Finite,
                exponent: 0,
                mantissa: U256::ZERO,
            });
        }
        let tz = mantissa.trailing_zeros();
        Some(BigFloat {
            negative,
            class: FloatClass::Finite,
            exponent: exponent.checked_add(tz as i64)?,
            mantissa: mantissa.shr(tz),
        })
    }

    fn finite(negative: bool, mantissa: U256, exponent: i64) -> Self {
        Self::checked_finite(negative, mantissa, exponent).unwrap_or(Self::infinity(negative))
    }

    /// Build a finite value from its parts: `(-1)^negative * (hi:lo) * 2^exponent`
    ///
    /// The mantissa is normalized, so any representation of the same value
    /// compares equal afterwards. A value whose canonical exponent would
    /// exceed `i64::MAX` is beyond the representable range and becomes the
    /// infinity of the same sign.
    pub fn from_parts(negative: bool, mantissa_hi: u128, mantissa_lo: u128, exponent: i64) -> Self {
        Self::finite(
            negative,
            U256 {
                lo: mantissa_lo,
                hi: mantissa_hi,
            },
            exponent,
        )
    }

    /// Exact conversion from a signed 128-bit integer
    pub fn from_i128(v: i128) -> Self {
        Self::finite(v < 0, U256::from_u128(v.unsigned_abs()), 0)
    }

    /// Exact conversion from an unsigned 128-bit integer
    pub fn from_u128(v: u128) -> Self {
        Self::finite(false, U256::from_u128(v), 0)
    }

    /// Exact conversion from an IEEE-754 binary64 value
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            return BigFloat::NAN;
        }
        if v.is_infinite() {
            return if v < 0.0 {
                BigFloat::NEG_INFINITY
            } else {
                BigFloat::INFINITY
            };
        }
        let bits = v.to_bits();
        let negative = bits >> 63 == 1;
        let biased = ((bits >> 52) & 0x7ff) as i64;
        let fraction = bits & ((1u64 << 52) - 1);
        let (mantissa, exponent) = if biased == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1u64 << 52), biased - 1075)
        };
        Self::finite(negative, U256::from_u128(mantissa as u128), exponent)
    }

    /// Is this value NaN
    pub fn is_nan(&self) -> bool {
        self.class == FloatClass::Nan
    }

    /// Is this value +/- infinity
    pub fn is_infinite(&self) -> bool {
        self.class == FloatClass::Infinite
    }

    /// Is this value finite
    pub fn is_finite(&self) -> bool {
        self.class == FloatClass::Finite
    }

    /// Is this value zero (either sign)
    pub fn is_zero(&self) -> bool {
        self.is_finite() && self.mantissa.is_zero()
    }

    /// Sign bit
    pub fn is_sign_negative(&self) -> bool {
        self.negative
    }

    /// Value class
    pub fn class(&self) -> FloatClass {
        self.class
    }

    /// Binary exponent of the canonical form
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Number of significant mantissa bits of the canonical form
    pub fn significant_bits(&self) -> u32 {
        self.mantissa.bits()
    }

    /// Integer value if finite, integral and within `i128`
    pub fn to_i128(&self) -> Option<i128> {
        let magnitude = self.integral_magnitude()?;
        if self.negative {
            if magnitude <= i128::MAX as u128 {
                Some(-(magnitude as i128))
            } else if magnitude == 1u128 << 127 {
                Some(i128::MIN)
            } else {
                None
            }
        } else {
            i128::try_from(magnitude).ok()
        }
    }

    /// Integer value if finite, integral, non-negative and within `u128`
    ///
    /// Negative zero converts to 0.
    pub fn to_u128(&self) -> Option<u128> {
        let magnitude = self.integral_magnitude()?;
        if self.negative && magnitude != 0 {
            return None;
        }
        Some(magnitude)
    }

    /// Absolute integer value if finite, integral and below 2^128
    fn integral_magnitude(&self) -> Option<u128> {
        if !self.is_finite() {
            return None;
        }
        if self.mantissa.is_zero() {
            return Some(0);
        }
        // Canonical mantissa is odd, so a negative exponent means a fraction
        if self.exponent < 0 {
            return None;
        }
        let bits = self.mantissa.bits() as i64;
        if self.exponent > 128 - bits {
            return None;
        }
        Some(self.mantissa.low_u128() << self.exponent as u32)
    }

    /// Nearest binary64 value (round half to even)
    ///
    /// Exact whenever the value is representable as `f64`.
    pub fn to_f64(&self) -> f64 {
        match self.class {
            FloatClass::Nan => return f64::NAN,
            FloatClass::Infinite => {
                return if self.negative {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            }
            FloatClass::Finite => {}
        }
        let sign = if self.negative { 1u64 << 63 } else { 0 };
        if self.mantissa.is_zero() {
            return f64::from_bits(sign);
        }
        // Odd mantissa >= 1, so the value is at least 2^exponent
        if self.exponent > 1024 {
            return f64::from_bits(sign | 0x7ff0_0000_0000_0000);
        }

        let len = self.mantissa.bits() as i64;
        // Keep at most 53 bits, and never go below the subnormal unit 2^-1074
        let shift = (len - 53).max((-1074i64).saturating_sub(self.exponent));
        let (q, exp) = if shift > 0 {
            if shift > 256 {
                return f64::from_bits(sign);
            }
            let s = shift as u32;
            let mut q = self.mantissa.shr(s).low_u128() as u64;
            let round = self.mantissa.bit(s - 1);
            let sticky = self.mantissa.any_below(s - 1);
            let mut exp = self.exponent.saturating_add(shift);
            if round && (sticky || q & 1 == 1) {
                q += 1;
                if q == 1u64 << 53 {
                    q >>= 1;
                    exp += 1;
                }
            }
            (q, exp)
        } else {
            (self.mantissa.low_u128() as u64, self.exponent)
        };
        if q == 0 {
            return f64::from_bits(sign);
        }

        let q_len = 64 - q.leading_zeros() as i64;
        let top = q_len - 1 + exp;
        if top > 1023 {
            return f64::from_bits(sign | 0x7ff0_0000_0000_0000);
        }
        if top >= -1022 {
            let fraction = (q << (53 - q_len)) & ((1u64 << 52) - 1);
            let biased = (top + 1023) as u64;
            f64::from_bits(sign | (biased << 52) | fraction)
        } else {
            // Subnormal: exp >= -1074 by construction of `shift`
            let fraction = q << (exp + 1074);
            f64::from_bits(sign | fraction)
        }
    }

    /// Little-endian fixed-width encoding
    pub fn to_le_bytes(&self) -> [u8; BIGFLOAT_WIDTH] {
        let mut out = [0u8; BIGFLOAT_WIDTH];
        let mut flags = self.class.to_bits() << CLASS_SHIFT;
        if self.negative {
            flags |= FLAG_SIGN;
        }
        out[0] = flags;
        out[1..9].copy_from_slice(&self.exponent.to_le_bytes());
        out[9..25].copy_from_slice(&self.mantissa.lo.to_le_bytes());
        out[25..41].copy_from_slice(&self.mantissa.hi.to_le_bytes());
        out
    }

    /// Decode the fixed-width encoding produced by [`BigFloat::to_le_bytes`]
    ///
    /// Returns `None` for an unknown value class, reserved flag bits, or a
    /// finite encoding whose exponent cannot be canonicalized.
    pub fn from_le_bytes(bytes: &[u8; BIGFLOAT_WIDTH]) -> Option<Self> {
        let flags = bytes[0];
        if flags & !(FLAG_SIGN | CLASS_MASK) != 0 {
            return None;
        }
        let class = FloatClass::from_bits((flags & CLASS_MASK) >> CLASS_SHIFT)?;
        let negative = flags & FLAG_SIGN != 0;
        match class {
            FloatClass::Nan => Some(BigFloat::NAN),
            FloatClass::Infinite => Some(Self::infinity(negative)),
            FloatClass::Finite => {
                let mut exp = [0u8; 8];
                exp.copy_from_slice(&bytes[1..9]);
                let mut lo = [0u8; 16];
                lo.copy_from_slice(&bytes[9..25]);
                let mut hi = [0u8; 16];
                hi.copy_from_slice(&bytes[25..41]);
                Self::checked_finite(
                    negative,
                    U256 {
                        lo: u128::from_le_bytes(lo),
                        hi: u128::from_le_bytes(hi),
                    },
                    i64::from_le_bytes(exp),
                )
            }
        }
    }
}

impl Default for BigFloat {
    fn default() -> Self {
        BigFloat::ZERO
    }
}

impl From<f64> for BigFloat {
    fn from(v: f64) -> Self {
        BigFloat::from_f64(v)
    }
}

impl From<i128> for BigFloat {
    fn from(v: i128) -> Self {
        BigFloat::from_i128(v)
    }
}

impl From<u128> for BigFloat {
    fn from(v: u128) -> Self {
        BigFloat::from_u128(v)
    }
}

impl fmt::Debug for BigFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            FloatClass::Nan => write!(f, "BigFloat(NaN)"),
            FloatClass::Infinite => {
                write!(f, "BigFloat({}inf)", if self.negative { "-" } else { "" })
            }
            FloatClass::Finite => write!(
                f,
                "BigFloat({}0x{:x}{:032x} * 2^{})",
                if self.negative { "-" } else { "" },
                self.mantissa.hi,
                self.mantissa.lo,
                self.exponent
            ),
        }
    }
}

impl fmt::Display for BigFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_form_folds_trailing_zeros() {
        let a = BigFloat::from_parts(false, 0, 8, 0);
        let b = BigFloat::from_parts(false, 0, 1, 3);
        assert_eq!(a, b);
        assert_eq!(a.exponent(), 3);
        assert_eq!(a.significant_bits(), 1);
    }

    #[test]
    fn test_integer_conversions() {
        assert_eq!(BigFloat::from_i128(i128::MIN).to_i128(), Some(i128::MIN));
        assert_eq!(BigFloat::from_i128(i128::MAX).to_i128(), Some(i128::MAX));
        assert_eq!(BigFloat::from_u128(u128::MAX).to_u128(), Some(u128::MAX));
        assert_eq!(BigFloat::from_u128(u128::MAX).to_i128(), None);
        assert_eq!(BigFloat::from_i128(-1).to_u128(), None);
        assert_eq!(BigFloat::from_f64(0.5).to_i128(), None);
        assert_eq!(BigFloat::from_f64(-0.0).to_u128(), Some(0));
        assert_eq!(BigFloat::from_f64(1e30).to_u128(), Some(1e30 as u128));
        assert_eq!(BigFloat::INFINITY.to_i128(), None);
        assert_eq!(BigFloat::NAN.to_u128(), None);
    }

    #[test]
    fn test_f64_special_values() {
        assert!(BigFloat::from_f64(f64::NAN).to_f64().is_nan());
        assert_eq!(BigFloat::from_f64(f64::INFINITY).to_f64(), f64::INFINITY);
        assert_eq!(
            BigFloat::from_f64(f64::NEG_INFINITY).to_f64(),
            f64::NEG_INFINITY
        );
        let neg_zero = BigFloat::from_f64(-0.0);
        assert!(neg_zero.is_zero());
        assert!(neg_zero.to_f64().is_sign_negative());
        assert_ne!(neg_zero, BigFloat::ZERO);
    }

    #[test]
    fn test_f64_subnormals_round_trip() {
        for v in [
            f64::from_bits(1),
            f64::MIN_POSITIVE,
            f64::MIN_POSITIVE / 3.0,
            -f64::from_bits(0x000f_ffff_ffff_ffff),
        ] {
            assert_eq!(BigFloat::from_f64(v).to_f64().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_to_f64_rounds_half_to_even() {
        // 2^53 + 1 is a tie between 2^53 and 2^53 + 2; even mantissa wins
        let tie = BigFloat::from_u128((1u128 << 53) + 1);
        assert_eq!(tie.to_f64(), 9_007_199_254_740_992.0);
        // 2^53 + 3 rounds up to 2^53 + 4
        let up = BigFloat::from_u128((1u128 << 53) + 3);
        assert_eq!(up.to_f64(), 9_007_199_254_740_996.0);
        // Values beyond f64 range overflow to infinity
        let huge = BigFloat::from_parts(false, 0, 1, 2000);
        assert_eq!(huge.to_f64(), f64::INFINITY);
        // Values below the subnormal range flush to zero
        let tiny = BigFloat::from_parts(true, 0, 1, -2000);
        assert_eq!(tiny.to_f64().to_bits(), (-0.0f64).to_bits());
    }

    #[test]
    fn test_wide_mantissa_to_f64() {
        let wide = BigFloat::from_parts(false, u128::MAX, u128::MAX, -256);
        // (2^256 - 1) * 2^-256 rounds to 1.0
        assert_eq!(wide.to_f64(), 1.0);
        assert_eq!(wide.significant_bits(), 256);
    }

    #[test]
    fn test_byte_encoding_rejects_unknown_class() {
        let mut bytes = BigFloat::from_f64(1.5).to_le_bytes();
        assert_eq!(BigFloat::from_le_bytes(&bytes), Some(BigFloat::from_f64(1.5)));
        bytes[0] = 0b0000_0110;
        assert_eq!(BigFloat::from_le_bytes(&bytes), None);
        bytes[0] = 0b1000_0000;
        assert_eq!(BigFloat::from_le_bytes(&bytes), None);
    }

    #[test]
    fn test_extreme_exponents_do_not_wrap() {
        let huge = BigFloat::from_parts(false, 0, u64::MAX as u128, i64::MAX);
        assert!(huge.is_finite());
        assert_eq!(huge.to_f64(), f64::INFINITY);
        assert_eq!(huge.to_u128(), None);
        assert_eq!(huge.to_i128(), None);
        let neg_huge = BigFloat::from_parts(true, 0, 3, i64::MAX - 1);
        assert_eq!(neg_huge.to_f64(), f64::NEG_INFINITY);

        let tiny = BigFloat::from_parts(false, 0, 1, i64::MIN + 1);
        assert_eq!(tiny.to_f64(), 0.0);
        assert_eq!(tiny.to_i128(), None);
        let wide_tiny = BigFloat::from_parts(true, u128::MAX, u128::MAX, i64::MIN + 5);
        assert_eq!(wide_tiny.to_f64().to_bits(), (-0.0f64).to_bits());

        // Just past the f64 range, and just inside u128
        assert_eq!(BigFloat::from_parts(false, 0, 1, 1024).to_f64(), f64::INFINITY);
        assert_eq!(BigFloat::from_parts(false, 0, 1, 1025).to_f64(), f64::INFINITY);
        assert_eq!(BigFloat::from_parts(false, 0, 1, 127).to_u128(), Some(1u128 << 127));
        assert_eq!(BigFloat::from_parts(false, 0, 3, 127).to_u128(), None);
    }

    #[test]
    fn test_exponent_overflow_while_canonicalizing() {
        let eight = BigFloat::from_parts(false, 0, 8, i64::MAX - 1);
        assert_eq!(eight, BigFloat::INFINITY);
        let neg = BigFloat::from_parts(true, 0, 4, i64::MAX - 1);
        assert_eq!(neg, BigFloat::NEG_INFINITY);
        // 2 * 2^(MAX-1) is exactly 2^MAX and stays finite
        let two = BigFloat::from_parts(false, 0, 2, i64::MAX - 1);
        assert_eq!(two, BigFloat::from_parts(false, 0, 1, i64::MAX));
        assert!(two.is_finite());
    }

    #[test]
    fn test_byte_encoding_rejects_uncanonicalizable_exponent() {
        let mut bytes = BigFloat::from_parts(false, 0, 1, i64::MAX).to_le_bytes();
        assert_eq!(
            BigFloat::from_le_bytes(&bytes),
            Some(BigFloat::from_parts(false, 0, 1, i64::MAX))
        );
        // Mantissa 8 at exponent MAX - 1 would need exponent MAX + 2
        bytes[1..9].copy_from_slice(&(i64::MAX - 1).to_le_bytes());
        bytes[9..25].copy_from_slice(&8u128.to_le_bytes());
        assert_eq!(BigFloat::from_le_bytes(&bytes), None);
    }

    proptest! {
        #[test]
        fn prop_f64_round_trip(bits in any::<u64>()) {
            let v = f64::from_bits(bits);
            let back = BigFloat::from_f64(v).to_f64();
            if v.is_nan() {
                prop_assert!(back.is_nan());
            } else {
                prop_assert_eq!(back.to_bits(), v.to_bits());
            }
        }

        #[test]
        fn prop_i128_round_trip(v in any::<i128>()) {
            prop_assert_eq!(BigFloat::from_i128(v).to_i128(), Some(v));
        }

        #[test]
        fn prop_bytes_round_trip(neg in any::<bool>(), hi in any::<u128>(), lo in any::<u128>(), exp in -100_000i64..100_000) {
            let v = BigFloat::from_parts(neg, hi, lo, exp);
            prop_assert_eq!(BigFloat::from_le_bytes(&v.to_le_bytes()), Some(v));
        }

        #[test]
        fn prop_to_f64_matches_native_for_u64(v in any::<u64>()) {
            prop_assert_eq!(BigFloat::from_u128(v as u128).to_f64(), v as f64);
        }
    }
}
