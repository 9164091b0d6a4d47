//! Pure parsers for `pvs` and `vgs` reports.
//!
//! Reports are expected from `--noheadings --units g --separator <SEP>`
//! with the field lists in [`crate::constants::lvm`]. Any malformed line
//! fails the whole report: callers must never see a partial inventory.

use crate::entity::lvm::{PhysicalVolume, VolumeGroup};
use crate::entity::GIB;
use crate::errors::AlbiusError;

const REPORT_PVS: &str = "pvs";
const REPORT_VGS: &str = "vgs";

const FIELDS_PVS: usize = 6;
const FIELDS_VGS: usize = 6;

const MISSING_PV: &str = "[unknown]";

pub fn parse_pvs(output: &str, separator: &str) -> Result<Vec<PhysicalVolume>, AlbiusError> {
    let mut pvs = Vec::new();

    for (n, fields) in report_rows(REPORT_PVS, output, separator, FIELDS_PVS)? {
        let path = fields[0];
        if path.is_empty() {
            return Err(parse_error(REPORT_PVS, n, "empty pv name"));
        }

        let vg = match fields[1] {
            "" => None,
            vg => Some(vg.to_string()),
        };

        pvs.push(PhysicalVolume {
            path: path.to_string(),
            vg,
            format: fields[2].to_string(),
            attr: fields[3].to_string(),
            size: parse_size(REPORT_PVS, n, fields[4])?,
            free: parse_size(REPORT_PVS, n, fields[5])?,
        });
    }

    Ok(pvs)
}

/// `vgs` prints one row per member PV when `pv_name` is selected.
/// Rows are folded into one VolumeGroup per name, keeping member order.
pub fn parse_vgs(output: &str, separator: &str) -> Result<Vec<VolumeGroup>, AlbiusError> {
    let mut vgs: Vec<VolumeGroup> = Vec::new();

    for (n, fields) in report_rows(REPORT_VGS, output, separator, FIELDS_VGS)? {
        let name = fields[0];
        if name.is_empty() {
            return Err(parse_error(REPORT_VGS, n, "empty vg name"));
        }

        let lv_count = fields[2].parse::<u32>().map_err(|err| {
            parse_error(REPORT_VGS, n, &format!("bad lv_count {}: {err}", fields[2]))
        })?;

        let row = VolumeGroup {
            name: name.to_string(),
            pvs: Vec::new(),
            lv_count,
            attr: fields[3].to_string(),
            size: parse_size(REPORT_VGS, n, fields[4])?,
            free: parse_size(REPORT_VGS, n, fields[5])?,
        };

        let pv = fields[1];
        let idx = match vgs.iter().position(|vg| vg.name == row.name) {
            Some(idx) => {
                let vg = &vgs[idx];
                if vg.lv_count != row.lv_count
                    || vg.attr != row.attr
                    || vg.size != row.size
                    || vg.free != row.free
                {
                    return Err(parse_error(
                        REPORT_VGS,
                        n,
                        &format!("rows for vg {name} disagree"),
                    ));
                }

                idx
            }
            None => {
                vgs.push(row);
                vgs.len() - 1
            }
        };

        // A VG with a missing PV reports it as "[unknown]" or leaves it empty
        if pv.is_empty() || pv == MISSING_PV {
            continue;
        }

        let vg = &mut vgs[idx];
        if vg.pvs.iter().any(|member| member == pv) {
            return Err(parse_error(
                REPORT_VGS,
                n,
                &format!("duplicate member {pv} in vg {name}"),
            ));
        }

        vg.pvs.push(pv.to_string());
    }

    Ok(vgs)
}

/// Parses an LVM size field into GiB.
///
/// Accepts an optional `<`/`>` rounding marker and an optional unit
/// suffix. Lower case units are powers of 1024, upper case powers of 1000,
/// `s`/`S` are 512-byte sectors. No suffix means GiB.
pub fn parse_size(report: &'static str, line: usize, s: &str) -> Result<f64, AlbiusError> {
    let bad_size = |msg: &str| parse_error(report, line, &format!("bad size {s:?}: {msg}"));

    let digits = s.trim_start_matches(['<', '>']);
    let (number, unit) = match digits.char_indices().last() {
        None => return Err(bad_size("empty")),
        Some((i, c)) if c.is_ascii_alphabetic() => (&digits[..i], Some(c)),
        Some(_) => (digits, None),
    };

    let bytes_per_unit = match unit {
        None => GIB,
        Some(unit) => unit_bytes(unit).ok_or_else(|| bad_size("unknown unit"))?,
    };

    // f64 parsing alone would also accept "inf" and "nan"
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(bad_size("not a number"));
    }

    let value = number
        .parse::<f64>()
        .map_err(|err| bad_size(&err.to_string()))?;

    Ok(value * bytes_per_unit / GIB)
}

fn unit_bytes(unit: char) -> Option<f64> {
    let power = |base: f64, exp: i32| base.powi(exp);

    let bytes = match unit {
        'b' | 'B' => 1.0,
        's' | 'S' => 512.0,
        'k' => power(1024.0, 1),
        'm' => power(1024.0, 2),
        'g' => power(1024.0, 3),
        't' => power(1024.0, 4),
        'p' => power(1024.0, 5),
        'e' => power(1024.0, 6),
        'K' => power(1000.0, 1),
        'M' => power(1000.0, 2),
        'G' => power(1000.0, 3),
        'T' => power(1000.0, 4),
        'P' => power(1000.0, 5),
        'E' => power(1000.0, 6),
        _ => return None,
    };

    Some(bytes)
}

// Splits non-blank lines into exactly `expected` trimmed fields,
// returning them with their 1-based line numbers
fn report_rows<'a>(
    report: &'static str,
    output: &'a str,
    separator: &str,
    expected: usize,
) -> Result<Vec<(usize, Vec<&'a str>)>, AlbiusError> {
    if separator.is_empty() {
        return Err(AlbiusError::AlbiusBug(format!(
            "empty separator for {report} report"
        )));
    }

    let mut rows = Vec::new();
    for (i, line) in output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(separator).map(str::trim).collect();
        if fields.len() != expected {
            return Err(parse_error(
                report,
                i + 1,
                &format!("expected {expected} fields, got {}: {line:?}", fields.len()),
            ));
        }

        rows.push((i + 1, fields));
    }

    Ok(rows)
}

fn parse_error(report: &'static str, line: usize, msg: &str) -> AlbiusError {
    AlbiusError::ParseError {
        report,
        msg: format!("line {line}: {msg}"),
    }
}
