//! Sequential colour ramps sampled by linear interpolation between stops.

use plotters::style::RGBColor;

/// Yellow → green → blue, light to dark (heatmap cells).
pub const YL_GN_BU: &[[u8; 3]] = &[
    [255, 255, 217],
    [237, 248, 177],
    [199, 233, 180],
    [127, 205, 187],
    [65, 182, 196],
    [29, 145, 192],
    [34, 94, 168],
    [37, 52, 148],
    [8, 29, 88],
];

/// Purple → teal → yellow (bar fills).
pub const VIRIDIS: &[[u8; 3]] = &[
    [68, 1, 84],
    [72, 40, 120],
    [62, 74, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [109, 205, 89],
    [180, 222, 44],
    [253, 231, 37],
];

/// Sample `ramp` at `t` in [0, 1]; out-of-range values are clamped.
pub fn sample(ramp: &[[u8; 3]], t: f32) -> RGBColor {
    match ramp.len() {
        0 => RGBColor(0, 0, 0),
        1 => RGBColor(ramp[0][0], ramp[0][1], ramp[0][2]),
        n => {
            let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
            let pos = t * (n - 1) as f32;
            let lo = (pos.floor() as usize).min(n - 2);
            let frac = pos - lo as f32;
            let (a, b) = (ramp[lo], ramp[lo + 1]);
            let mix = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * frac).round() as u8;
            RGBColor(mix(0), mix(1), mix(2))
        }
    }
}
