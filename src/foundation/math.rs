use std::f64::consts::PI;

pub(crate) const DEG_TO_RAD: f64 = PI / 180.0;

pub(crate) fn deg_to_rad(deg: f64) -> f64 {
    deg * DEG_TO_RAD
}

/// Round half up to the nearest whole pixel.
pub(crate) fn snap_px(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Round half up to `digits` decimal places.
pub(crate) fn round_to_digits(v: f64, digits: i32) -> f64 {
    let mult = 10f64.powi(digits);
    ((v * mult) + 0.5).floor() / mult
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
