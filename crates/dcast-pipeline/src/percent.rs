//! Percent math for job progress records.
//!
//! All figures are whole percents over the rendition ladder: each rendition
//! owns an equal slice of the bar, and a slice fills in proportion to the
//! encoder's reported source position.

/// Percent for `done` completed renditions out of `total`.
pub fn ladder_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}

/// Mid-encode percent for rendition `index`, capped at 99 so a job never
/// reads fully complete while a rendition is still encoding.
pub fn encoding_percent(index: usize, total: usize, elapsed_secs: f64, duration_secs: f64) -> u8 {
    if total == 0 || duration_secs <= 0.0 {
        return 0;
    }
    let frac = (elapsed_secs / duration_secs).clamp(0.0, 1.0);
    let pct = (((index as f64 + frac) / total as f64) * 100.0).round();
    pct.clamp(0.0, 99.0) as u8
}

/// Percent reported while a finished rendition uploads. With an unknown
/// source duration the rendition counts as fully encoded, so the figure can
/// reach 100 while the last upload is still in flight.
pub fn uploading_percent(
    index: usize,
    total: usize,
    last_time_secs: f64,
    duration_secs: Option<f64>,
) -> u8 {
    if total == 0 {
        return 0;
    }
    let frac = match duration_secs {
        Some(duration) if duration > 0.0 => (last_time_secs / duration).min(1.0),
        _ => 1.0,
    };
    (((index as f64 + frac) / total as f64) * 100.0).round() as u8
}
