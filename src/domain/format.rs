use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};

use super::layout::DocumentKind;

/// Sign, integer digits and two cent digits of `amount` rounded half-up.
fn cents(amount: &BigDecimal) -> (bool, String, String) {
    let (units, _) = (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .into_bigint_and_exponent();
    let raw = units.to_string();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, raw.as_str()),
    };
    let padded = format!("{:0>3}", digits);
    let (int_part, frac_part) = padded.split_at(padded.len() - 2);
    (negative, int_part.to_string(), frac_part.to_string())
}

/// `R$ 1.234,56`, rounded half-up to cents.
pub fn format_brl(amount: &BigDecimal) -> String {
    let (negative, int_part, frac_part) = cents(amount);
    let grouped = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(".");

    format!(
        "{}R$ {},{}",
        if negative { "-" } else { "" },
        grouped,
        frac_part
    )
}

/// Machine-readable money: `1234.56`, always two decimals.
pub fn format_amount(amount: &BigDecimal) -> String {
    let (negative, int_part, frac_part) = cents(amount);
    format!("{}{}.{}", if negative { "-" } else { "" }, int_part, frac_part)
}

/// Positional notation without trailing fractional zeros, never exponent
/// form: `12.50` becomes `12,5` with a `,` separator.
pub fn plain_decimal(amount: &BigDecimal, separator: char) -> String {
    let (units, scale) = amount.as_bigint_and_exponent();
    let raw = units.to_string();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("", raw.as_str()),
    };
    if digits == "0" {
        return "0".to_string();
    }
    if scale <= 0 {
        return format!("{}{}{}", sign, digits, "0".repeat(scale.unsigned_abs() as usize));
    }
    let scale = scale as usize;
    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        format!("{}{}", sign, int_part)
    } else {
        format!("{}{}{}{}", sign, int_part, separator, frac_part)
    }
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y").to_string()
}

/// Lowercase, trim, and collapse each whitespace run to a single `-`.
pub fn slugify(input: &str) -> String {
    input
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

pub fn document_filename(kind: DocumentKind, name_or_id: &str, id: &str, epoch_millis: i64) -> String {
    let mut slug = slugify(name_or_id);
    if slug.is_empty() {
        slug = slugify(id);
    }
    format!("{}-{}-{}.pdf", kind.filename_prefix(), slug, epoch_millis)
}

/// Shorten `text` with a trailing `…` so it fits `max_width` at `font_size`,
/// using an average glyph width of half the font size.
pub fn truncate_to_width(text: &str, max_width: f64, font_size: f64) -> String {
    let max_chars = (max_width / (font_size * 0.5)).floor().max(1.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
