//! Time signature normalization.
//!
//! The pedal stores its metronome meter as a small integer code:
//!
//! | code | meter |
//! |------|-------|
//! | 1    | 2/4   |
//! | 2    | 3/4   |
//! | 3    | 4/4   |
//! | 4    | 6/8   |
//!
//! Planning Center stores free text. Anything outside the four exact matches
//! is classified by its numerator alone, so "6/4" lands on code 1.

use crate::models::DEFAULT_TIME_SIG;

/// Map time signature text to the pedal's meter code.
pub fn normalize_time_signature(text: Option<&str>) -> u8 {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return DEFAULT_TIME_SIG,
    };

    match text {
        "2/4" => return 1,
        "3/4" => return 2,
        "4/4" => return 3,
        "6/8" => return 4,
        _ => {}
    }

    let numerator = text.split('/').next().unwrap_or("").trim();
    match numerator.parse::<i64>() {
        Ok(4) => 3,
        Ok(3) => 2,
        Ok(6) => 1,
        _ => DEFAULT_TIME_SIG,
    }
}
