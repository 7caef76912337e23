use crate::item::Item;

/// Integer prefix of `raw`: leading whitespace, an optional sign, then digits.
/// `"3.7"` reads as 3 and `"12abc"` as 12; no leading digit means no number.
/// A digit run outside the `i64` range also has no value, so its row totals zero.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<i64>().ok()
}

/// Decimal prefix of `raw`: sign, digits, fraction and exponent, stopping at
/// the first character that cannot continue the number (`"5.5kg"` is 5.5).
pub fn parse_price(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        end = frac_end;
    }

    if mantissa_digits == 0 {
        return None;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// `price × quantity`, or zero when either side does not parse or the
/// product is not finite.
pub fn line_amount(item: &Item) -> f64 {
    match (parse_quantity(&item.quantity), parse_price(&item.price)) {
        (Some(q), Some(p)) => {
            let v = p * q as f64;
            if v.is_finite() {
                v
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Live on-screen total. Rows that are half-typed or malformed count as zero.
pub fn compute_total(items: &[Item]) -> f64 {
    items.iter().map(line_amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: &str, price: &str) -> Item {
        Item {
            id: 0,
            name: name.into(),
            quantity: quantity.into(),
            price: price.into(),
        }
    }

    #[test]
    fn empty_list_totals_zero() {
        assert_eq!(compute_total(&[]), 0.0);
    }

    #[test]
    fn bulb_and_wire() {
        let items = [item("Bulb", "3", "20"), item("Wire", "2", "5.5")];
        assert_eq!(compute_total(&items), 71.0);
    }

    #[test]
    fn unparsable_rows_contribute_zero() {
        let items = [
            item("Bad qty", "abc", "10"),
            item("Bad price", "2", "ten"),
            item("Empty", "", ""),
            item("Good", "1", "4.25"),
        ];
        assert_eq!(compute_total(&items), 4.25);
    }

    #[test]
    fn name_does_not_matter_for_the_live_total() {
        assert_eq!(compute_total(&[item("", "2", "3")]), 6.0);
    }

    #[test]
    fn quantity_uses_integer_prefix() {
        assert_eq!(parse_quantity("3"), Some(3));
        assert_eq!(parse_quantity(" 3.7"), Some(3));
        assert_eq!(parse_quantity("12abc"), Some(12));
        assert_eq!(parse_quantity("-2"), Some(-2));
        assert_eq!(parse_quantity("+4"), Some(4));
        assert_eq!(parse_quantity(".5"), None);
        assert_eq!(parse_quantity("-"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn price_uses_decimal_prefix() {
        assert_eq!(parse_price("5.5"), Some(5.5));
        assert_eq!(parse_price(".5"), Some(0.5));
        assert_eq!(parse_price("2."), Some(2.0));
        assert_eq!(parse_price("2e3"), Some(2000.0));
        assert_eq!(parse_price("2e"), Some(2.0));
        assert_eq!(parse_price("5.5kg"), Some(5.5));
        assert_eq!(parse_price("  -1.25"), Some(-1.25));
        assert_eq!(parse_price("."), None);
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn fractional_quantity_is_truncated() {
        assert_eq!(line_amount(&item("Cable", "2.9", "10")), 20.0);
    }

    #[test]
    fn quantity_beyond_i64_counts_as_zero() {
        assert_eq!(parse_quantity("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_quantity("9223372036854775808"), None);
        assert_eq!(line_amount(&item("Bulk", "99999999999999999999", "10")), 0.0);
        assert_eq!(compute_total(&[item("Bulk", "99999999999999999999", "10"), item("Bulb", "3", "15")]), 45.0);
    }

    #[test]
    fn overflowing_product_counts_as_zero() {
        assert_eq!(line_amount(&item("Huge", "10", "1e308")), 0.0);
    }
}
