use rust_decimal::Decimal;

/// Parses an amount the way bank exports actually write them. Accepts a
/// decimal point ("-49.99") or a decimal comma ("-49,99"), thousands
/// grouping in either convention ("1.234,56", "1,234.56"), a leading
/// currency marker ("R$", "$") and accounting parentheses for negatives.
/// When both separators appear, the one further right is the decimal
/// separator. Returns None for anything that does not survive
/// normalization.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let (parenthesized, s) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, s),
    };

    let first_digit = s.find(|c: char| c.is_ascii_digit())?;
    let negative = parenthesized || s[..first_digit].contains('-');

    let mut digits = String::with_capacity(s.len());
    for c in s[first_digit..].chars() {
        match c {
            '0'..='9' | '.' | ',' => digits.push(c),
            c if c.is_whitespace() => {}
            _ => return None,
        }
    }

    let dots = digits.matches('.').count();
    let commas = digits.matches(',').count();
    let normalized = if dots > 0 && commas > 0 {
        let (decimal, grouping) = if digits.rfind('.') > digits.rfind(',') {
            ('.', ',')
        } else {
            (',', '.')
        };
        digits
            .chars()
            .filter(|&c| c != grouping)
            .collect::<String>()
            .replace(decimal, ".")
    } else if commas > 1 {
        digits.replace(',', "")
    } else if dots > 1 {
        digits.replace('.', "")
    } else if commas == 1 {
        digits.replace(',', ".")
    } else {
        digits
    };

    let value = normalized.parse::<Decimal>().ok()?;
    Some(if negative { -value } else { value })
}

/// Formats an amount for user-facing messages: "R$ 1.234,56", with the
/// sign ahead of the currency marker.
pub fn format_amount(value: Decimal) -> String {
    let negative = value.is_sign_negative() && !value.is_zero();
    let plain = format!("{:.2}", value.abs().round_dp(2));
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let int_grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-R$ {int_grouped},{frac_part}")
    } else {
        format!("R$ {int_grouped},{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn parses_decimal_point() {
        assert_eq!(parse_amount("150.00"), Some(dec("150.00")));
        assert_eq!(parse_amount("-49.99"), Some(dec("-49.99")));
        assert_eq!(parse_amount("+1500.00"), Some(dec("1500.00")));
    }

    #[test]
    fn parses_decimal_comma() {
        assert_eq!(parse_amount("-89,90"), Some(dec("-89.90")));
        assert_eq!(parse_amount("0,50"), Some(dec("0.50")));
    }

    #[test]
    fn parses_thousands_in_either_convention() {
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1,234,567.89"), Some(dec("1234567.89")));
        assert_eq!(parse_amount("1.234.567"), Some(dec("1234567")));
    }

    #[test]
    fn strips_currency_markers() {
        assert_eq!(parse_amount("R$ 1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("R$ -50,00"), Some(dec("-50.00")));
        assert_eq!(parse_amount("-R$ 50,00"), Some(dec("-50.00")));
        assert_eq!(parse_amount("$75.10"), Some(dec("75.10")));
    }

    #[test]
    fn parses_accounting_parentheses_as_negative() {
        assert_eq!(parse_amount("(75.00)"), Some(dec("-75.00")));
        assert_eq!(parse_amount("(R$ 12,30)"), Some(dec("-12.30")));
    }

    #[test]
    fn tolerates_surrounding_and_grouping_whitespace() {
        assert_eq!(parse_amount("  49.9  "), Some(dec("49.9")));
        assert_eq!(parse_amount("1 234,56"), Some(dec("1234.56")));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("12abc"), None);
        assert_eq!(parse_amount("R$"), None);
    }

    #[test]
    fn formats_with_grouping_and_comma() {
        assert_eq!(format_amount(dec("1234.56")), "R$ 1.234,56");
        assert_eq!(format_amount(dec("1234567.89")), "R$ 1.234.567,89");
        assert_eq!(format_amount(dec("0.01")), "R$ 0,01");
        assert_eq!(format_amount(dec("12")), "R$ 12,00");
    }

    #[test]
    fn formats_negatives_with_leading_sign() {
        assert_eq!(format_amount(dec("-89.90")), "-R$ 89,90");
        assert_eq!(format_amount(Decimal::ZERO), "R$ 0,00");
    }
}
