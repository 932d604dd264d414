use crate::foundation::core::ISize;
use crate::foundation::error::{FilterError, FilterResult};

/// Kernel half-width used for `sigma`: three standard deviations, rounded up.
pub(crate) fn blur_radius(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Separable Gaussian blur over premultiplied RGBA8, writing into `dst`.
///
/// Samples outside the buffer clamp to the nearest edge pixel; callers pad the source by
/// [`blur_radius`] transparent pixels so edges fade out.
pub(crate) fn gaussian_blur_rgba8_premul(
    src: &[u8],
    dst: &mut [u8],
    size: ISize,
    sigma: f32,
) -> FilterResult<()> {
    let expected_len = size.rgba8_byte_len()?;
    if src.len() != expected_len || dst.len() != expected_len {
        return Err(FilterError::render(
            "gaussian blur expects buffers matching width*height*4",
        ));
    }
    let radius = blur_radius(sigma);
    if radius == 0 || size.is_empty() {
        dst.copy_from_slice(src);
        return Ok(());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    horizontal_pass(src, &mut tmp, size, &kernel);
    vertical_pass(&tmp, dst, size, &kernel);
    Ok(())
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> FilterResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FilterError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(FilterError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Rounding drift goes to the center tap so the kernel sums to exactly 1.0 in Q16.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], size: ISize, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(size.width), i64::from(size.height));
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i64 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out + c] = q16_to_u8(*a);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], size: ISize, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(size.width), i64::from(size.height));
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i64 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out + c] = q16_to_u8(*a);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}
