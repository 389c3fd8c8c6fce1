// ─────────────────────────────────────────────────────────────────────
// Absorber — Units
// ─────────────────────────────────────────────────────────────────────
//! Internal unit system and best-unit formatting.
//!
//! All lengths are stored in millimetres and all energies in MeV.
//! Multiplying a number by a unit constant converts it to internal
//! units; dividing converts back.

pub const NANOMETER: f64 = 1.0e-6;
pub const MICROMETER: f64 = 1.0e-3;
pub const MILLIMETER: f64 = 1.0;
pub const CENTIMETER: f64 = 10.0;
pub const METER: f64 = 1000.0;
pub const KILOMETER: f64 = 1.0e6;

pub const EV: f64 = 1.0e-6;
pub const KEV: f64 = 1.0e-3;
pub const MEV: f64 = 1.0;
pub const GEV: f64 = 1.0e3;
pub const TEV: f64 = 1.0e6;
pub const PEV: f64 = 1.0e9;

/// Length units accepted on the command surface, smallest first.
pub const LENGTH_UNITS: [(&str, f64); 6] = [
    ("nm", NANOMETER),
    ("um", MICROMETER),
    ("mm", MILLIMETER),
    ("cm", CENTIMETER),
    ("m", METER),
    ("km", KILOMETER),
];

/// Energy units, smallest first.
pub const ENERGY_UNITS: [(&str, f64); 6] = [
    ("eV", EV),
    ("keV", KEV),
    ("MeV", MEV),
    ("GeV", GEV),
    ("TeV", TEV),
    ("PeV", PEV),
];

/// Resolve a length unit symbol or long name.
pub fn length_unit(symbol: &str) -> Option<f64> {
    let canonical = match symbol {
        "nanometer" => "nm",
        "micrometer" | "micron" => "um",
        "millimeter" => "mm",
        "centimeter" => "cm",
        "meter" => "m",
        "kilometer" => "km",
        other => other,
    };
    lookup(&LENGTH_UNITS, canonical)
}

/// Resolve an energy unit symbol or long name.
pub fn energy_unit(symbol: &str) -> Option<f64> {
    let canonical = match symbol {
        "electronvolt" => "eV",
        "kiloelectronvolt" => "keV",
        "megaelectronvolt" => "MeV",
        "gigaelectronvolt" => "GeV",
        "teraelectronvolt" => "TeV",
        "petaelectronvolt" => "PeV",
        other => other,
    };
    lookup(&ENERGY_UNITS, canonical)
}

fn lookup(table: &[(&str, f64)], symbol: &str) -> Option<f64> {
    table
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|&(_, value)| value)
}

/// Format `value` with the largest unit of `table` that keeps the
/// magnitude at or above one.
///
/// Zero and values below the smallest unit use the smallest unit.
pub fn best_unit(value: f64, table: &[(&str, f64)]) -> String {
    let magnitude = value.abs();
    let (symbol, unit) = table
        .iter()
        .rev()
        .find(|(_, u)| magnitude >= *u)
        .copied()
        .unwrap_or(table[0]);
    format!("{} {}", format_significant(value / unit, 6), symbol)
}

/// Energy in internal units (MeV) rendered with its best-fit unit.
pub fn best_energy(value: f64) -> String {
    best_unit(value, &ENERGY_UNITS)
}

/// Length in internal units (mm) rendered with its best-fit unit.
pub fn best_length(value: f64) -> String {
    best_unit(value, &LENGTH_UNITS)
}

/// Print `x` with at most `digits` significant digits and no trailing zeros.
fn format_significant(x: f64, digits: usize) -> String {
    if x == 0.0 || !x.is_finite() {
        return format!("{x}");
    }
    let int_digits = x.abs().log10().floor() as i64 + 1;
    let decimals = (digits as i64 - int_digits).max(0) as usize;
    let s = format!("{x:.decimals$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
