/// US-dollar rendering with comma grouping, rounded half away from zero to
/// `fraction_digits` places.
pub fn format_currency(value: f64, fraction_digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-$∞" } else { "$∞" }.to_string();
    }

    let scale = 10f64.powi(fraction_digits as i32);
    let scaled = (value.abs() * scale).round();
    let whole = (scaled / scale).trunc();
    let fraction = scaled - whole * scale;

    let mut out = String::new();
    if value < 0.0 && scaled > 0.0 {
        out.push('-');
    }
    out.push('$');
    out.push_str(&group_thousands(&format!("{whole:.0}")));
    if fraction_digits > 0 {
        out.push('.');
        out.push_str(&format!("{:0width$.0}", fraction, width = fraction_digits));
    }
    out
}

/// Whole dollars, the default rendering for headline figures.
pub fn format_usd(value: f64) -> String {
    format_currency(value, 0)
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
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
