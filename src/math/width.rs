/// narrowest width that is ever assigned, a zero delta still needs room
/// for the escape pattern to stay distinct
pub const MIN_WIDTH: u32 = 2;

/// # Description
/// Minimum two's-complement width able to hold `value`, sign bit included
/// ## Comments
/// - zero and ±1 both map to `MIN_WIDTH`
/// - `|value|` always ends up strictly below `2^(width-1)`, so the bit pattern
///   `1 << (width-1)` is never a legal value at that width
pub fn min_bits_for(value: i32) -> u32 {
    if value == 0 {
        return MIN_WIDTH;
    }
    let magnitude = value.unsigned_abs();
    let highest_set_bit = 31 - magnitude.leading_zeros();
    (highest_set_bit + 2).max(MIN_WIDTH)
}

mod tests {
    #[allow(unused_imports)]
    use super::{min_bits_for, MIN_WIDTH};

    #[test]
    fn boundaries() {
        assert_eq!(MIN_WIDTH, min_bits_for(0));
        assert_eq!(2, min_bits_for(1));
        assert_eq!(2, min_bits_for(-1));
        assert_eq!(3, min_bits_for(2));
        assert_eq!(3, min_bits_for(-3));
        assert_eq!(4, min_bits_for(4));
        assert_eq!(4, min_bits_for(-7));
        assert_eq!(8, min_bits_for(127));
        assert_eq!(9, min_bits_for(128));
        assert_eq!(9, min_bits_for(-128));
        assert_eq!(9, min_bits_for(255));
        assert_eq!(9, min_bits_for(-255));
        assert_eq!(10, min_bits_for(256));
        assert_eq!(16, min_bits_for(0x7FFF));
        assert_eq!(33, min_bits_for(i32::MIN));
    }

    #[test]
    fn i8_deltas_fit_nine_bits() {
        for prev in i8::MIN..=i8::MAX {
            for cur in [i8::MIN, -1, 0, 1, i8::MAX] {
                let delta = prev as i32 - cur as i32;
                assert!(min_bits_for(delta) <= 9, "delta {}", delta);
            }
        }
    }

    #[test]
    fn escape_pattern_never_fits() {
        for value in -4096..=4096 {
            let width = min_bits_for(value);
            let escape = -(1i32 << (width - 1));
            assert_ne!(value, escape, "value {} collides at width {}", value, width);
            assert!(value.abs() < 1 << (width - 1));
        }
    }
}
