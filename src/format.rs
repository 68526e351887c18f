use fixed::types::I64F64;

/// Number of fractional digits written for content-stream numbers.
pub const DECIMAL_PLACES: u32 = 5;

const SCALE: i64 = 100_000;

/// Formats a number the way it is written into content streams: at most five
/// fractional digits, trailing zeros trimmed, `.` as the decimal separator.
///
/// Non-finite values are written as `0` so the stream stays parseable.
pub fn fmt_num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    match scaled(value) {
        Some(units) => format_scaled(units),
        None => {
            let s = format!("{:.0}", value);
            if s == "-0" { "0".to_string() } else { s }
        }
    }
}

/// The value a reader recovers after `fmt_num`.
pub fn quantize(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    match scaled(value) {
        Some(units) => units as f64 / SCALE as f64,
        None => value.round(),
    }
}

/// Integer key identifying the formatted value, used to dedup resources.
pub(crate) fn quantize_key(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    scaled(value).unwrap_or_else(|| value.round() as i64)
}

fn scaled(value: f64) -> Option<i64> {
    let fixed = I64F64::checked_from_num(value)?;
    let units = fixed.checked_mul(I64F64::from_num(SCALE))?.checked_round()?;
    units.checked_to_num::<i64>()
}

fn format_scaled(units: i64) -> String {
    if units == 0 {
        return "0".to_string();
    }
    let sign = if units < 0 { "-" } else { "" };
    let abs = units.unsigned_abs();
    let int_part = abs / SCALE as u64;
    let frac_part = abs % SCALE as u64;
    if frac_part == 0 {
        format!("{}{}", sign, int_part)
    } else {
        let mut s = format!("{}{}.{:05}", sign, int_part, frac_part);
        while s.ends_with('0') {
            s.pop();
        }
        s
    }
}

/// Body of a `( )` string literal for already-encoded show-string bytes.
///
/// Delimiters and the backslash are escaped; bytes above 0x7F are written as
/// `\ddd` octal so the stream stays 7-bit.
pub fn escape_pdf_bytes(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    for &byte in input {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            0x80..=0xff => out.push_str(&format!("\\{:03o}", byte)),
            _ => out.push(byte as char),
        }
    }
    out
}

/// Body of a `< >` hex string.
pub fn hex_pdf_bytes(input: &[u8]) -> String {
    input.iter().map(|byte| format!("{:02X}", byte)).collect()
}

/// `[on off ...] phase` operand text for the `d` operator.
pub fn format_dash(array: &[f64], phase: f64) -> String {
    let parts: Vec<String> = array.iter().map(|v| fmt_num(*v)).collect();
    format!("[{}] {}", parts.join(" "), fmt_num(phase))
}
