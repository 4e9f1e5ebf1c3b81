use std::f64::consts::PI;

/// One millimeter, the internal length unit.
pub const MM: f64 = 1.0;
/// One micrometer.
pub const UM: f64 = 1e-3 * MM;
/// One nanometer.
pub const NM: f64 = 1e-6 * MM;
/// One centimeter.
pub const CM: f64 = 10.0 * MM;
/// One meter.
pub const M: f64 = 1e3 * MM;

/// One radian, the internal angle unit.
pub const RAD: f64 = 1.0;
/// One milliradian.
pub const MRAD: f64 = 1e-3 * RAD;
/// One degree.
pub const DEG: f64 = PI / 180.0 * RAD;

/// One tesla.
pub const T: f64 = 1e-3;
/// One millitesla.
pub const MT: f64 = 1e-3 * T;

/// Returns the internal-unit factor of a unit suffix.
#[must_use]
pub fn factor(unit: &str) -> Option<f64> {
    let factor = match unit {
        "nm" => NM,
        "um" => UM,
        "mm" => MM,
        "cm" => CM,
        "m" => M,
        "rad" => RAD,
        "mrad" => MRAD,
        "deg" => DEG,
        "T" => T,
        "mT" => MT,
        _ => return None,
    };
    Some(factor)
}

/// Parses a number with an optional unit suffix, e.g. `55um` or `-1.5e-2mm`.
///
/// # Errors
///
/// Returns a description of the problem if the number is malformed or the
/// unit is unknown.
pub fn parse_quantity(token: &str) -> Result<f64, String> {
    let split = unit_start(token);
    let (number, unit) = token.split_at(split);
    let value: f64 = number
        .parse()
        .map_err(|_| format!("'{number}' is not a number"))?;
    if unit.is_empty() {
        return Ok(value);
    }
    factor(unit)
        .map(|f| value * f)
        .ok_or_else(|| format!("unknown unit '{unit}'"))
}

/// Finds where the unit suffix of a quantity starts.
fn unit_start(token: &str) -> usize {
    let bytes = token.as_bytes();
    for (i, &c) in bytes.iter().enumerate() {
        if c.is_ascii_alphabetic() {
            // An exponent marker followed by a digit or sign belongs to the number
            let exponent = (c == b'e' || c == b'E')
                && i > 0
                && bytes
                    .get(i + 1)
                    .is_some_and(|n| n.is_ascii_digit() || *n == b'-' || *n == b'+');
            if !exponent {
                return i;
            }
        }
    }
    token.len()
}
