//! Fixed-point insulin helpers.
//!
//! Pump history stores insulin as big-endian integer stroke counts; the
//! model's strokes-per-unit turns them into units (1/40 U on larger-memory
//! pumps, 1/10 U on older ones).

/// Decode an unsigned big-endian integer of up to 4 bytes.
/// An empty slice decodes to 0.
#[inline]
pub fn be_uint(bytes: &[u8]) -> u32 {
    debug_assert!(bytes.len() <= 4, "be_uint: at most 4 bytes, got {}", bytes.len());
    bytes
        .iter()
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Convert a raw stroke count to units.
#[inline]
pub fn strokes_to_units(strokes: u32, strokes_per_unit: u32) -> f64 {
    f64::from(strokes) / f64::from(strokes_per_unit)
}

/// Shorthand: decode a big-endian stroke field straight to units.
#[inline]
pub fn insulin_from_be(bytes: &[u8], strokes_per_unit: u32) -> f64 {
    strokes_to_units(be_uint(bytes), strokes_per_unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn be_uint_orders_bytes_most_significant_first() {
        assert_eq!(be_uint(&[0x00, 0x28]), 40);
        assert_eq!(be_uint(&[0x01, 0x00]), 256);
        assert_eq!(be_uint(&[0xff]), 255);
        assert_eq!(be_uint(&[0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
        assert_eq!(be_uint(&[]), 0);
    }

    #[test]
    fn strokes_scale_to_units() {
        assert!((strokes_to_units(40, 40) - 1.0).abs() < 1e-12);
        assert!((strokes_to_units(1, 40) - 0.025).abs() < 1e-12);
        assert!((strokes_to_units(15, 10) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn insulin_from_be_combines_both_steps() {
        assert!((insulin_from_be(&[0x00, 0x64], 40) - 2.5).abs() < 1e-12);
    }
}
