//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structural risk and failure models for grid assets."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Closed-form moment and stress approximations for a tapered wood pole.
//!
//! Moments are in ft·lb, diameters in inches, heights in feet and wind speed
//! in m/s. Wind pressure uses the NESC `0.00256·V²` rule with V converted to
//! mph.
//!
//! Two unit conventions coexist here and are kept as-is until the
//! configuration schema pins them down: [`pole_moment_nowind`] takes raw
//! inch diameters while [`wind_moment`] converts them to feet first, so the
//! no-wind baseline is twelve times the per-pressure wind moment.

use std::f64::consts::PI;

/// π³/384-derived section modulus constant for round wood poles.
pub const RESISTING_MOMENT_COEFFICIENT: f64 = 0.008186;
/// NESC wind pressure coefficient (psf per mph²).
pub const WIND_PRESSURE_COEFFICIENT: f64 = 0.00256;
/// Conversion factor applied to m/s wind speeds.
pub const MPH_PER_MPS: f64 = 2.24;
pub const INCHES_PER_FOOT: f64 = 12.0;

/// Height of the unsupported span: above-ground length less the guy attachment.
pub fn effective_height(pole_length: f64, pole_depth: f64, guy_height: f64) -> f64 {
    pole_length - pole_depth - guy_height
}

/// Linearly tapered diameter at `height` feet above the ground line.
pub fn tapered_diameter(
    ground_diameter: f64,
    top_diameter: f64,
    height: f64,
    above_ground_length: f64,
) -> f64 {
    if above_ground_length <= 0.0 {
        return ground_diameter;
    }
    ground_diameter - height / above_ground_length * (ground_diameter - top_diameter)
}

/// Hollow (decay) diameter after `age_years` at `rate` inches per year.
pub fn hollow_diameter(age_years: f64, rate: f64) -> f64 {
    2.0 * age_years * rate
}

/// Cube-law resisting moment of a (possibly hollow) round section.
///
/// Negative when the hollow exceeds the section; callers clamp before using
/// the value in a stress computation.
pub fn resisting_moment(
    strength_factor: f64,
    fiber_strength: f64,
    diameter: f64,
    hollow_diameter: f64,
) -> f64 {
    RESISTING_MOMENT_COEFFICIENT
        * strength_factor
        * fiber_strength
        * (diameter.powi(3) - hollow_diameter.powi(3))
}

pub fn wind_pressure(wind_speed: f64) -> f64 {
    WIND_PRESSURE_COEFFICIENT * MPH_PER_MPS * wind_speed * wind_speed
}

/// Pole moment per unit wind pressure.
pub fn pole_moment_nowind(
    height: f64,
    ground_diameter: f64,
    top_diameter: f64,
    overload_factor: f64,
) -> f64 {
    height * height * (ground_diameter + 2.0 * top_diameter) / 72.0 * overload_factor
}

/// Moment from wind acting on the pole shaft at `pressure`.
pub fn wind_moment(
    pressure: f64,
    height: f64,
    ground_diameter: f64,
    top_diameter: f64,
    overload_factor: f64,
) -> f64 {
    pressure
        * height
        * height
        * (ground_diameter / INCHES_PER_FOOT + 2.0 * top_diameter / INCHES_PER_FOOT)
        / 72.0
        * overload_factor
}

/// Self-weight moment of a pole leaning `tilt_angle` degrees from vertical.
pub fn tilt_moment(
    density: f64,
    height: f64,
    ground_diameter: f64,
    top_diameter: f64,
    tilt_angle: f64,
) -> f64 {
    let d0 = ground_diameter / INCHES_PER_FOOT;
    let d1 = top_diameter / INCHES_PER_FOOT;
    let dd = (d0 - d1) / 2.0;
    0.125 * density * PI * (height * height) * (d0 * d0 - dd * dd) * (tilt_angle.to_radians()).sin()
}

/// Resultant of a static moment and a wind moment `angle` degrees apart.
pub fn compose_moment(static_moment: f64, wind_moment: f64, angle: f64) -> f64 {
    let beta = angle.to_radians();
    let x = static_moment + wind_moment * beta.cos();
    let y = wind_moment * beta.sin();
    (x * x + y * y).sqrt()
}

/// Wind speed at which the no-wind loads reach the available resisting moment.
///
/// Infinite when nothing on the pole catches wind, zero when the pole cannot
/// even carry its static tension.
pub fn critical_wind_speed(resisting_moment: f64, wire_tension: f64, nowind_moment: f64) -> f64 {
    if nowind_moment <= 0.0 {
        return f64::INFINITY;
    }
    let failure_pressure = (resisting_moment - wire_tension) / nowind_moment;
    if failure_pressure <= 0.0 {
        return 0.0;
    }
    (failure_pressure / (WIND_PRESSURE_COEFFICIENT * MPH_PER_MPS)).sqrt()
}

/// Derivative of pole stress with respect to wind speed.
pub fn susceptibility(wind_loaded_moment: f64, resisting_moment: f64, wind_speed: f64) -> f64 {
    if wind_speed <= 0.0 {
        return 0.0;
    }
    if resisting_moment <= 0.0 {
        return f64::INFINITY;
    }
    2.0 * wind_loaded_moment
        / resisting_moment
        / wind_speed
        / WIND_PRESSURE_COEFFICIENT
        / MPH_PER_MPS
}

/// Ratio of applied to resisting moment; unbounded once the section has no strength left.
pub fn stress_ratio(total_moment: f64, resisting_moment: f64) -> f64 {
    if resisting_moment > 0.0 {
        total_moment / resisting_moment
    } else {
        f64::INFINITY
    }
}
