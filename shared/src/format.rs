use std::sync::Arc;

/// Host-supplied formatter for monetary values.
pub type ValueFormatter = Arc<dyn Fn(f64) -> String + Send + Sync>;

const CRORE: f64 = 1.0e7;
const LAKH: f64 = 1.0e5;

pub fn default_formatter() -> ValueFormatter {
    Arc::new(format_inr_compact)
}

/// Rupee amount in compact Indian units: `₹1.25 Cr`, `₹4.10 L`, `₹12,345`.
pub fn format_inr_compact(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs >= CRORE {
        format!("{sign}₹{:.2} Cr", abs / CRORE)
    } else if abs >= LAKH {
        format!("{sign}₹{:.2} L", abs / LAKH)
    } else {
        format!("{sign}₹{}", group_indian(abs.round() as u64))
    }
}

/// Indian digit grouping: last three digits, then pairs.
fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    let lead = head.len() % 2;
    for (i, ch) in head.chars().enumerate() {
        if i > 0 && (i + 2 - lead) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(',');
    out.push_str(tail);
    out
}

pub fn format_ratio(ratio: f64) -> String {
    format!("{ratio:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crore_and_lakh_units() {
        assert_eq!(format_inr_compact(12_500_000.0), "₹1.25 Cr");
        assert_eq!(format_inr_compact(410_000.0), "₹4.10 L");
        assert_eq!(format_inr_compact(100_000.0), "₹1.00 L");
        assert_eq!(format_inr_compact(-25_000_000.0), "-₹2.50 Cr");
    }

    #[test]
    fn small_amounts_use_indian_grouping() {
        assert_eq!(format_inr_compact(0.0), "₹0");
        assert_eq!(format_inr_compact(999.0), "₹999");
        assert_eq!(format_inr_compact(1_000.0), "₹1,000");
        assert_eq!(format_inr_compact(12_345.4), "₹12,345");
        assert_eq!(group_indian(1_234_567), "12,34,567");
        assert_eq!(group_indian(123_456_789), "12,34,56,789");
    }

    #[test]
    fn non_finite_is_not_a_number() {
        assert_eq!(format_inr_compact(f64::NAN), "n/a");
        assert_eq!(format_inr_compact(f64::INFINITY), "n/a");
    }

    #[test]
    fn ratio_has_two_decimals() {
        assert_eq!(format_ratio(0.62), "0.62");
        assert_eq!(format_ratio(0.955), format!("{:.2}", 0.955));
        assert_eq!(format_ratio(1.0), "1.00");
    }
}
