//! Human-readable price and percent strings for reports.

/// Format a price with precision that scales with its magnitude.
///
/// - `>= 1000`: two decimals with thousands separators (`64,250.50`)
/// - `>= 1`: two to four decimals (`2.5`, `27.1234`)
/// - below 1: four to six decimals (`0.000123`)
pub fn format_price(price: f64) -> String {
    if price >= 1000.0 {
        with_fraction(price, 2, 2)
    } else if price >= 1.0 {
        with_fraction(price, 2, 4)
    } else {
        with_fraction(price, 4, 6)
    }
}

/// Signed percentage with two decimals (`+1.25%`, `-0.40%`).
pub fn format_percent(percent: f64) -> String {
    let sign = if percent >= 0.0 { "+" } else { "" };
    format!("{sign}{percent:.2}%")
}

/// Round to `max` decimals, drop trailing zeros down to `min`, and group the
/// integer part in thousands.
fn with_fraction(value: f64, min: usize, max: usize) -> String {
    let fixed = format!("{:.*}", max, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut frac = frac_part.trim_end_matches('0').to_string();
    while frac.len() < min {
        frac.push('0');
    }

    let sign = if value < 0.0 { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{}", group_thousands(int_part))
    } else {
        format!("{sign}{}.{frac}", group_thousands(int_part))
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_prices_get_separators() {
        assert_eq!(format_price(64250.5), "64,250.50");
        assert_eq!(format_price(1000.0), "1,000.00");
        assert_eq!(format_price(1234567.891), "1,234,567.89");
    }

    #[test]
    fn mid_prices_keep_up_to_four_decimals() {
        assert_eq!(format_price(2.5), "2.50");
        assert_eq!(format_price(27.12346), "27.1235");
        assert_eq!(format_price(999.1), "999.10");
    }

    #[test]
    fn small_prices_keep_up_to_six_decimals() {
        assert_eq!(format_price(0.5), "0.5000");
        assert_eq!(format_price(0.000123), "0.000123");
    }

    #[test]
    fn percent_is_signed() {
        assert_eq!(format_percent(1.254), "+1.25%");
        assert_eq!(format_percent(0.0), "+0.00%");
        assert_eq!(format_percent(-0.4), "-0.40%");
    }
}
