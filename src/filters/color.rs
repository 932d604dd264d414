use crate::foundation::core::ISize;
use crate::foundation::error::{FilterError, FilterResult};
use crate::foundation::math::mul_div255_u8;
use crate::renderer::texture::unpremultiply_rgba8_in_place;

/// Row-major 4x5 color matrix over straight-alpha `[r, g, b, a, 1]` in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorMatrix(pub [f32; 20]);

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorMatrix {
    /// Leaves colors unchanged.
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]);

    /// Luminance grayscale (Rec. 709 weights).
    pub fn grayscale() -> Self {
        let (r, g, b) = (0.2126, 0.7152, 0.0722);
        Self([
            r, g, b, 0.0, 0.0, //
            r, g, b, 0.0, 0.0, //
            r, g, b, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Scale alpha by `opacity`.
    pub fn opacity(opacity: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.0[18] = opacity;
        m
    }

    /// Return `true` when transparent pixels come out with non-zero alpha.
    pub fn adds_alpha(&self) -> bool {
        self.0[19] > 0.0
    }

    pub(crate) fn validate(&self) -> FilterResult<()> {
        if self.0.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(FilterError::validation("color matrix entries must be finite"))
        }
    }

    fn apply_straight(&self, px: [u8; 4]) -> [u8; 4] {
        let v = px.map(|c| f32::from(c) / 255.0);
        let m = &self.0;
        let mut out = [0u8; 4];
        for (row, o) in out.iter_mut().enumerate() {
            let r = &m[row * 5..row * 5 + 5];
            let x = r[0] * v[0] + r[1] * v[1] + r[2] * v[2] + r[3] * v[3] + r[4];
            *o = (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        out
    }
}

/// Apply `matrix` to premultiplied RGBA8 `src`, writing premultiplied RGBA8 into `dst`.
pub(crate) fn color_matrix_rgba8_premul(
    matrix: &ColorMatrix,
    src: &[u8],
    dst: &mut [u8],
    size: ISize,
) -> FilterResult<()> {
    let expected_len = size.rgba8_byte_len()?;
    if src.len() != expected_len || dst.len() != expected_len {
        return Err(FilterError::render(
            "color matrix expects buffers matching width*height*4",
        ));
    }
    dst.copy_from_slice(src);
    unpremultiply_rgba8_in_place(dst);
    for px in dst.chunks_exact_mut(4) {
        let [r, g, b, a] = matrix.apply_straight([px[0], px[1], px[2], px[3]]);
        let a16 = u16::from(a);
        px[0] = mul_div255_u8(u16::from(r), a16);
        px[1] = mul_div255_u8(u16::from(g), a16);
        px[2] = mul_div255_u8(u16::from(b), a16);
        px[3] = a;
    }
    Ok(())
}
