use image::{Rgba, RgbaImage};

pub fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Rgba<u8> {
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f32::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let mix = |d: u8, s: u8| (f32::from(d) * inv + f32::from(s) * a).round().clamp(0.0, 255.0) as u8;
    let out_a = (f32::from(dst[3]) + f32::from(src[3]) * inv)
        .round()
        .clamp(0.0, 255.0) as u8;
    Rgba([mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2]), out_a])
}

pub fn blend_at(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let dst = *img.get_pixel(x, y);
    img.put_pixel(x, y, blend_pixel(dst, color));
}

/// Blends `color` over the whole image.
pub fn fill_alpha(img: &mut RgbaImage, color: Rgba<u8>) {
    for pixel in img.pixels_mut() {
        *pixel = blend_pixel(*pixel, color);
    }
}

/// Blends `color` over the rectangle `[x0, x1) x [y0, y1)`, rounding the
/// corners by `radius`.
pub fn fill_rounded_rect(
    img: &mut RgbaImage,
    (x0, y0): (i64, i64),
    (x1, y1): (i64, i64),
    radius: i64,
    color: Rgba<u8>,
) {
    let radius = radius.max(0).min((x1 - x0) / 2).min((y1 - y0) / 2);
    for y in y0..y1 {
        for x in x0..x1 {
            if outside_corner(x, y, (x0, y0), (x1, y1), radius) {
                continue;
            }
            blend_at(img, x, y, color);
        }
    }
}

fn outside_corner(x: i64, y: i64, (x0, y0): (i64, i64), (x1, y1): (i64, i64), r: i64) -> bool {
    if r == 0 {
        return false;
    }
    let cx = if x < x0 + r {
        x0 + r
    } else if x >= x1 - r {
        x1 - r - 1
    } else {
        return false;
    };
    let cy = if y < y0 + r {
        y0 + r
    } else if y >= y1 - r {
        y1 - r - 1
    } else {
        return false;
    };
    let (dx, dy) = (x - cx, y - cy);
    dx * dx + dy * dy > r * r
}

/// A linear gradient between two points with sorted color stops.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub stops: Vec<(f32, [u8; 3])>,
}

impl LinearGradient {
    /// Gradient along a CSS angle (0deg points up, 90deg right) spanning a
    /// `width` x `height` box, matching `linear-gradient(<angle>, ...)`.
    pub fn css(angle_deg: f32, width: u32, height: u32, stops: &[(f32, [u8; 3])]) -> Self {
        let (w, h) = (width as f32, height as f32);
        let rad = angle_deg.to_radians();
        let (dx, dy) = (rad.sin(), -rad.cos());
        let half = (w * dx.abs() + h * dy.abs()) / 2.0;
        let (cx, cy) = (w / 2.0, h / 2.0);
        Self {
            from: (cx - dx * half, cy - dy * half),
            to: (cx + dx * half, cy + dy * half),
            stops: stops.to_vec(),
        }
    }

    /// Corner to corner, top-left to bottom-right.
    pub fn diagonal(width: u32, height: u32, stops: &[(f32, [u8; 3])]) -> Self {
        Self {
            from: (0.0, 0.0),
            to: (width as f32, height as f32),
            stops: stops.to_vec(),
        }
    }

    pub fn color_at(&self, x: f32, y: f32) -> [u8; 3] {
        let (vx, vy) = (self.to.0 - self.from.0, self.to.1 - self.from.1);
        let len2 = vx * vx + vy * vy;
        let t = if len2 <= f32::EPSILON {
            0.0
        } else {
            (((x - self.from.0) * vx + (y - self.from.1) * vy) / len2).clamp(0.0, 1.0)
        };
        self.sample(t)
    }

    fn sample(&self, t: f32) -> [u8; 3] {
        let Some(first) = self.stops.first() else {
            return [0, 0, 0];
        };
        if t <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let ((p0, c0), (p1, c1)) = (pair[0], pair[1]);
            if t <= p1 {
                let span = (p1 - p0).max(f32::EPSILON);
                let k = (t - p0) / span;
                let lerp = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * k).round() as u8;
                return [lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2])];
            }
        }
        self.stops.last().map(|s| s.1).unwrap_or(first.1)
    }

    /// Paints every pixel, sampling at pixel centers.
    pub fn paint(&self, img: &mut RgbaImage) {
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let [r, g, b] = self.color_at(x as f32 + 0.5, y as f32 + 0.5);
            *pixel = Rgba([r, g, b, 255]);
        }
    }
}
