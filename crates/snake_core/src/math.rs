//! Fixed-point math utilities.
//!
//! The core is integer-only on the hot path. The few tunables that are
//! naturally fractional (the autopilot's space safety factor) are stored
//! as fixed-point numbers so decisions never depend on float rounding.

use fixed::types::I32F32;

/// Fixed-point number type used for fractional tunables.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Human-readable formats (RON, JSON) see a plain decimal such as `1.5`.
/// Binary formats (bincode) see the raw bit representation (i64) so the
/// value survives a round trip exactly.
pub mod fixed_serde {
    use super::Fixed;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            value.to_num::<f64>().serialize(serializer)
        } else {
            value.to_bits().serialize(serializer)
        }
    }

    /// Deserialize a fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let decimal = f64::deserialize(deserializer)?;
            Fixed::checked_from_num(decimal)
                .ok_or_else(|| D::Error::custom(format!("{decimal} is out of fixed-point range")))
        } else {
            let bits = i64::deserialize(deserializer)?;
            Ok(Fixed::from_bits(bits))
        }
    }
}

/// Build a fixed-point ratio `numerator / denominator` without floats.
#[must_use]
pub fn ratio(numerator: i32, denominator: i32) -> Fixed {
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "fixed_serde")]
        value: Fixed,
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(3, 2), Fixed::from_num(1.5));
        assert_eq!(ratio(4, 2), Fixed::from_num(2));
    }

    #[test]
    fn test_human_readable_is_decimal() {
        let text = ron::to_string(&Wrapper { value: ratio(3, 2) }).unwrap();
        assert!(text.contains("1.5"), "got {text}");
        let back: Wrapper = ron::from_str(&text).unwrap();
        assert_eq!(back.value, ratio(3, 2));
    }

    #[test]
    fn test_binary_keeps_exact_bits() {
        let original = Wrapper {
            value: Fixed::from_bits(0x1234_5678_9ABC),
        };
        let bytes = bincode::serialize(&original).unwrap();
        let back: Wrapper = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, original);
    }
}
