fn symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "EUR" => Some("€"),
        "USD" => Some("$"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

fn grouped(abs: f64) -> String {
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
    format!("{with_commas}.{dec_part}")
}

/// Format an amount in `currency` with thousands separators: €1,234.56, or
/// 1,234.56 SEK for codes without a known symbol.
pub fn money(val: f64, currency: &str) -> String {
    let sign = if val < 0.0 { "-" } else { "" };
    let body = grouped(val.abs());
    match symbol(currency) {
        Some(sym) => format!("{sign}{sym}{body}"),
        None => format!("{sign}{body} {currency}"),
    }
}

/// Signed variant for balances and deltas: always shows `+` or `-`.
pub fn signed_money(val: f64, currency: &str) -> String {
    if val > 0.0 {
        format!("+{}", money(val, currency))
    } else {
        money(val, currency)
    }
}
