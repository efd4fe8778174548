use crate::eventlog::short_hash_hex;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const CENTS_PER_LYD: f64 = 1000.0;

static DEVICE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Maps Arabic-Indic and Extended Arabic-Indic digits to ASCII, leaving
/// everything else untouched.
pub fn normalize_digits(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            '\u{0660}'..='\u{0669}' => ascii_digit(ch as u32 - 0x0660),
            '\u{06F0}'..='\u{06F9}' => ascii_digit(ch as u32 - 0x06F0),
            _ => ch,
        })
        .collect()
}

fn ascii_digit(offset: u32) -> char {
    char::from_digit(offset, 10).unwrap_or('0')
}

pub fn clean_num_input(input: &str) -> String {
    normalize_digits(input)
        .chars()
        .filter(|ch| ch.is_ascii_digit())
        .collect()
}

/// Canonical local form of a Libyan mobile number (`09XXXXXXXX`).
pub fn format_phone_num(input: &str) -> String {
    let phone_num = clean_num_input(input);
    if phone_num.len() < 9 {
        return phone_num;
    }

    if let Some(rest) = phone_num.strip_prefix("218") {
        format!("0{}", rest)
    } else if let Some(rest) = phone_num.strip_prefix("00218") {
        format!("0{}", rest)
    } else if phone_num.starts_with('9') {
        format!("0{}", phone_num)
    } else {
        phone_num
    }
}

pub fn is_valid_phone_num(phone_num: &str) -> bool {
    phone_num.len() == 10
        && phone_num.starts_with("09")
        && phone_num.chars().all(|ch| ch.is_ascii_digit())
}

pub fn is_number(text: &str) -> bool {
    text.trim().parse::<f64>().is_ok()
}

pub fn append_unit(text: &str, unit: &str) -> String {
    if is_number(text) {
        format!("{} {}", text, unit)
    } else {
        text.to_string()
    }
}

/// `HH:MM:SS` to `HH:MM`; anything without seconds comes back as is.
pub fn remove_seconds_from_time(time: &str) -> String {
    time.split(':').take(2).collect::<Vec<_>>().join(":")
}

/// `YYYY-MM-DD HH:MM:SS` to `YYYY/MM/DD at HH:MM`. Input that is not a
/// single space-separated date and time is returned unchanged.
pub fn format_datetime(datetime: &str) -> String {
    let mut parts = datetime.split(' ');
    let (Some(date), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
        return datetime.to_string();
    };
    format!(
        "{} at {}",
        date.replace('-', "/"),
        remove_seconds_from_time(time)
    )
}

pub fn convert_cents_to_lyd(cents: &str) -> String {
    match cents.trim().parse::<i64>() {
        Ok(value) => append_unit(&float_text(round2(value as f64 / CENTS_PER_LYD)), "LYD"),
        Err(_) => cents.to_string(),
    }
}

/// Bytes to GiB, without a unit suffix.
pub fn convert_bytes_to_gib(bytes: &str) -> String {
    match bytes.trim().parse::<i64>() {
        Ok(value) => float_text(round2(value as f64 / BYTES_PER_GIB)),
        Err(_) => bytes.to_string(),
    }
}

/// Two decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Shortest decimal form that always keeps a fractional part (`1.0`, `0.25`).
pub fn float_text(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

pub fn generate_device_id() -> String {
    let counter = DEVICE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let now = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1_000);
    let seed = format!("device:{}:{}:{}", now, std::process::id(), counter);
    short_hash_hex(seed.as_bytes())
}
