//! Conversions between basal area, trees per hectare and quadratic mean
//! diameter for a group of trees.

/// π / 4 / 10⁴: converts a diameter squared in cm² to an area in m².
pub const PI_40K: f32 = (std::f64::consts::PI / 40_000.0) as f32;

/// Trees per hectare from basal area (m²/ha) and quadratic mean diameter (cm).
///
/// Zero unless both inputs are positive.
pub fn trees_per_hectare(basal_area: f32, quad_mean_diameter: f32) -> f32 {
    if basal_area > 0.0 && quad_mean_diameter > 0.0 {
        basal_area / PI_40K / (quad_mean_diameter * quad_mean_diameter)
    } else {
        0.0
    }
}

/// Quadratic mean diameter from basal area and trees per hectare.
///
/// Zero for non-positive, NaN or implausibly large (over 10⁶) inputs.
pub fn quad_mean_diameter(basal_area: f32, trees_per_hectare: f32) -> f32 {
    if basal_area > 1e6 || trees_per_hectare > 1e6 || basal_area.is_nan() || trees_per_hectare.is_nan()
    {
        0.0
    } else if basal_area > 0.0 && trees_per_hectare > 0.0 {
        (basal_area / trees_per_hectare / PI_40K).sqrt()
    } else {
        0.0
    }
}

/// Basal area from quadratic mean diameter and trees per hectare. Zero if
/// either is NaN.
pub fn basal_area(quad_mean_diameter: f32, trees_per_hectare: f32) -> f32 {
    if quad_mean_diameter.is_nan() || trees_per_hectare.is_nan() {
        0.0
    } else {
        quad_mean_diameter * quad_mean_diameter * PI_40K * trees_per_hectare
    }
}
