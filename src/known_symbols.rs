//! Named mathematical constants accepted in formulas
//!
//! A declared variable always shadows a constant of the same name.

/// Check if a name is a known mathematical constant (pi, e, etc.)
/// Returns true for any case variation: "pi", "PI", "Pi", "e", "E"
#[inline]
pub fn is_known_constant(name: &str) -> bool {
    get_constant_value(name).is_some()
}

/// Get the numeric value of a known constant, if it matches.
#[inline]
pub fn get_constant_value(name: &str) -> Option<f64> {
    match name {
        "pi" | "PI" | "Pi" => Some(std::f64::consts::PI),
        "e" | "E" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// Check if a name denotes Euler's number
#[inline]
pub(crate) fn is_euler(name: &str) -> bool {
    matches!(name, "e" | "E")
}
