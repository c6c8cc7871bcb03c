/// Symbol for the currencies we print natively; anything else uses its code.
fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_uppercase().as_str() {
        "NGN" => Some("\u{20a6}"),
        "USD" => Some("$"),
        "EUR" => Some("\u{20ac}"),
        "GBP" => Some("\u{a3}"),
        _ => None,
    }
}

/// Format an amount with thousands separators: ₦1,234.56, -$500.00, KES 12.00
pub fn money(val: f64, currency: &str) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    let prefix = match currency_symbol(currency) {
        Some(symbol) => symbol.to_string(),
        None => format!("{} ", currency.to_uppercase()),
    };
    let sign = if negative { "-" } else { "" };
    format!("{sign}{prefix}{with_commas}.{dec_part}")
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56, "USD"), "$1,234.56");
        assert_eq!(money(-500.00, "USD"), "-$500.00");
        assert_eq!(money(0.0, "GBP"), "\u{a3}0.00");
        assert_eq!(money(1000000.99, "NGN"), "\u{20a6}1,000,000.99");
        assert_eq!(money(42.10, "eur"), "\u{20ac}42.10");
    }

    #[test]
    fn test_money_unknown_currency_uses_code() {
        assert_eq!(money(12.0, "KES"), "KES 12.00");
        assert_eq!(money(-3.5, "zar"), "-ZAR 3.50");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
