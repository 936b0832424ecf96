//! Numeric utilities: safe coercion and before/after deltas.
//!
//! Absence is always representable and always propagates; nothing here
//! synthesizes a number from a missing operand.

use serde_json::Value;

/// Rendered by [`format_delta`] when either operand is absent.
pub const INSUFFICIENT_DATA: &str = "データ不足";

/// Coerce a loosely typed value to a finite real number.
///
/// Accepts JSON numbers and numeric-looking strings. Rejects booleans, empty
/// strings and non-finite values.
pub fn to_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Strict boolean coercion: only a JSON boolean yields a value.
pub fn to_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

/// A self-report score: an integer in `0..=10`.
pub fn to_score(value: &Value) -> Option<u8> {
    let n = to_number(value)?;
    if n.fract() != 0.0 || !(0.0..=10.0).contains(&n) {
        return None;
    }
    // range-checked above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = n as u8;
    Some(score)
}

/// Non-empty trimmed string.
pub fn to_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// `after - before`, absent unless both operands are present.
pub fn delta(before: Option<f64>, after: Option<f64>) -> Option<f64> {
    Some(after? - before?)
}

/// `round(100 * (after - before) / before)`, absent unless both are present and `before != 0`.
///
/// Halves round toward positive infinity.
pub fn percent_delta(before: Option<f64>, after: Option<f64>) -> Option<i64> {
    let (b, a) = (before?, after?);
    if b == 0.0 {
        return None;
    }
    let pct = ((a - b) / b * 100.0 + 0.5).floor();
    if !pct.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let pct = pct as i64;
    Some(pct)
}

/// Human-readable delta, e.g. `20 → 35（+15 / +75%）`.
pub fn format_delta(before: Option<f64>, after: Option<f64>) -> String {
    let (Some(b), Some(a)) = (before, after) else {
        return INSUFFICIENT_DATA.to_string();
    };
    let d = a - b;
    let sign = if d >= 0.0 { "+" } else { "" };
    let pct = percent_delta(before, after)
        .map(|p| format!(" / {sign}{p}%"))
        .unwrap_or_default();
    format!(
        "{} → {}（{sign}{}{pct}）",
        format_number(b),
        format_number(a),
        format_number(d)
    )
}

/// Integral values print without a fractional part.
pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        // integral and in range
        #[allow(clippy::cast_possible_truncation)]
        let i = x as i64;
        i.to_string()
    } else {
        x.to_string()
    }
}
