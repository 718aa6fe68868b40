pub type Argb = u32;

pub fn u8_mul(a: u8, b: u8) -> u8 {
    ((a as u16 * b as u16 + 127) / 255) as u8
}

pub fn decompose(c: Argb) -> [u8; 4] {
    c.to_be_bytes()
}

pub fn compose(array: [u8; 4]) -> Argb {
    Argb::from_be_bytes(array)
}

fn channel_over(dst: u8, src: u8, alpha: u8) -> u8 {
    let (d, s, a) = (dst as u16, src as u16, alpha as u16);
    ((s * a + d * (255 - a) + 127) / 255) as u8
}

/// Paints `src` over an opaque `dst` with the given opacity.
pub fn over(dst: Argb, src: Argb, alpha: u8) -> Argb {
    match alpha {
        0 => dst,
        255 => src | 0xFF_00_00_00,
        _ => {
            let [_, dr, dg, db] = decompose(dst);
            let [_, sr, sg, sb] = decompose(src);

            compose([
                0xFF,
                channel_over(dr, sr, alpha),
                channel_over(dg, sg, alpha),
                channel_over(db, sb, alpha),
            ])
        }
    }
}
