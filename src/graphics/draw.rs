use super::{
    blend::{self, Argb},
    PixelBuffer,
};

/// Filled disc with an anti-aliased rim `feather` pixels wide.
///
/// Pixels are sampled at their centers. Everything is clipped to the
/// buffer, so circles partly or fully outside are fine.
pub fn draw_disc(
    pix: &mut PixelBuffer,
    cx: f32,
    cy: f32,
    radius: f32,
    feather: f32,
    color: Argb,
    alpha: u8,
) {
    if alpha == 0 || radius <= 0.0 || !(cx.is_finite() && cy.is_finite()) {
        return;
    }

    let (w, h) = pix.sizeu();
    let feather = feather.max(f32::EPSILON);
    let outer = radius + feather * 0.5;

    let xs = (cx - outer).floor().max(0.0) as usize;
    let ys = (cy - outer).floor().max(0.0) as usize;
    let xe = ((cx + outer).ceil().max(0.0) as usize).min(w);
    let ye = ((cy + outer).ceil().max(0.0) as usize).min(h);

    if xs >= xe || ys >= ye {
        return;
    }

    for y in ys..ye {
        let dy = y as f32 + 0.5 - cy;

        let Some(row) = pix.row_mut(y) else {
            return;
        };

        for (x, p) in row.iter_mut().enumerate().take(xe).skip(xs) {
            let dx = x as f32 + 0.5 - cx;
            let d = (dx * dx + dy * dy).sqrt();

            let coverage = ((outer - d) / feather).clamp(0.0, 1.0);

            if coverage <= 0.0 {
                continue;
            }

            let a = blend::u8_mul(alpha, (coverage * 255.0) as u8);
            *p = blend::over(*p, color, a);
        }
    }
}
