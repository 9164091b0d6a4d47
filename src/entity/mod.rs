pub mod lvm;
pub mod report;

use humanize_rs::bytes;

use crate::errors::AlbiusError;

pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn parse_human_bytes(s: &str) -> std::result::Result<bytes::Bytes, AlbiusError> {
    (s.to_lowercase())
        .parse::<bytes::Bytes>()
        .map_err(|err| AlbiusError::BadArgs(format!("bad byte unit string {s}: {err}")))
}

/// Parses a user-supplied size into GiB.
/// A bare number is taken as GiB, e.g. "10" or "7.5",
/// anything else must be a human byte string, e.g. "512MiB" or "20G".
pub fn parse_size_gib(s: &str) -> Result<f64, AlbiusError> {
    let s = s.trim();

    let gib = match s.parse::<f64>() {
        Ok(gib) => gib,
        Err(_) => parse_human_bytes(s)?.size() as f64 / GIB,
    };

    if !gib.is_finite() || gib <= 0.0 {
        return Err(AlbiusError::BadArgs(format!(
            "size {s} must be a positive number of GiB"
        )));
    }

    Ok(gib)
}

#[test]
#[rustfmt::skip]
fn test_parse_human_bytes() {
    let valids = vec![
        "1ki", "1KiB", "1mi", "1MiB", "1gi", "1GiB", "1Ti",
        "1k", "1KB", "1m", "1MB", "1g", "1GB", "1T",
        "0gib", "10 GiB", "1    G",
    ];

    for v in valids {
        if let Err(err) = parse_human_bytes(v) {
            panic!("{v} should be valid, but was invalid: {err}");
        };
    }

    let invalids = vec![
        // No sizes
        "gib", "G",
        // Minus sizes
        "-1 GiB",
        // Decimal sizes
        "10.29 G",
        // Bad units
        "zb", "gibibyte", "gigabytes",
        // Too large
        "2000EiB",
    ];

    for v in invalids {
        if let Ok(bytes) = parse_human_bytes(v) {
            panic!("{v} should be invalid, but got {bytes:?}");
        }
    }
}

#[test]
fn test_parse_size_gib() {
    let tests = [
        ("10", 10.0),
        ("7.5", 7.5),
        ("1GiB", 1.0),
        ("512MiB", 0.5),
        ("2 Gi", 2.0),
    ];

    for (s, expected) in tests {
        let gib = parse_size_gib(s).unwrap_or_else(|err| panic!("{s} should be valid: {err}"));
        assert!((gib - expected).abs() < 1e-9, "{s}: expected {expected}, got {gib}");
    }

    for s in ["0", "-3", "NaN", "inf", "0GiB", "ten"] {
        assert!(parse_size_gib(s).is_err(), "{s} should be invalid");
    }
}
