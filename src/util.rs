use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}

pub fn format_age(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "just now".to_owned();
    }

    let whole = seconds as u64;
    if whole < 60 {
        format!("{whole}s ago")
    } else if whole < 3600 {
        format!("{}m {}s ago", whole / 60, whole % 60)
    } else {
        format!("{}h {}m ago", whole / 3600, (whole % 3600) / 60)
    }
}

pub fn short_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let mut short = label.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    short.push('…');
    short
}

/// Deterministic pair in `[-1, 1]` derived from an id, used for jitter.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("chunk-7");
        assert_eq!(first, stable_pair("chunk-7"));
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }

    #[test]
    fn short_label_truncates_on_char_boundary() {
        assert_eq!(short_label("rebloom", 10), "rebloom");
        assert_eq!(short_label("ünïcödé-label", 5), "ünïc…");
    }

    #[test]
    fn format_age_buckets() {
        assert_eq!(format_age(12.4), "12s ago");
        assert_eq!(format_age(125.0), "2m 5s ago");
        assert_eq!(format_age(7260.0), "2h 1m ago");
        assert_eq!(format_age(-3.0), "just now");
    }
}
