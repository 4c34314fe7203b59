//! Fixed-point number formatting shared by TE and ATAR output.
//!
//! Downstream tables and exports display these strings verbatim, so exact binary
//! half-way values round away from zero (`0.25` -> `"0.3"`) instead of to even.

/// Formats `value` with exactly `digits` decimal places.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if is_exact_half(value, digits) {
        let scale = 10f64.powi(digits as i32);
        let rounded = (value * scale).round() / scale;
        return format!("{rounded:.digits$}");
    }
    format!("{value:.digits$}")
}

/// The number a consumer reads back from [`to_fixed`].
pub fn fixed_value(value: f64, digits: usize) -> f64 {
    to_fixed(value, digits).parse().unwrap_or(value)
}

fn is_exact_half(value: f64, digits: usize) -> bool {
    const PROBE: usize = 24;
    if !value.is_finite() {
        return false;
    }
    let probe = format!("{:.*}", digits + 1 + PROBE, value.abs());
    let bytes = probe.as_bytes();
    let tail_start = bytes.len() - PROBE;
    bytes[tail_start - 1] == b'5' && bytes[tail_start..].iter().all(|byte| *byte == b'0')
}
