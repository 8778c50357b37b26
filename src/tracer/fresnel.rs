//! Fresnel reflectance at a dielectric boundary.

/// Fraction of energy reflected at a boundary between media with refractive
/// indices `n_from` and `n_to`, for an incidence angle measured from the
/// surface normal.
///
/// Averages the s- and p-polarization reflectances. The radicand of the
/// transmitted cosine is clamped at zero, so total internal reflection
/// naturally yields 1. The result is clamped into [0, 1].
pub(crate) fn fresnel_reflectance(incidence_angle: f32, n_from: f32, n_to: f32) -> f32 {
    let cos_i = incidence_angle.cos();
    let sin_t = (n_from / n_to) * incidence_angle.sin();
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();

    let r_s = ((n_from * cos_i - n_to * cos_t) / (n_from * cos_i + n_to * cos_t)).powi(2);
    let r_p = ((n_from * cos_t - n_to * cos_i) / (n_from * cos_t + n_to * cos_i)).powi(2);
    (0.5 * (r_s + r_p)).clamp(0.0, 1.0)
}
