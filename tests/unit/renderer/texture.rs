use super::*;

fn solid(size: ISize, px: [u8; 4]) -> Texture {
    let bytes = px.repeat(size.area() as usize);
    Texture::from_premul_rgba8("solid", size, &bytes).unwrap()
}

#[test]
fn max_mip_count_matches_log2() {
    assert_eq!(max_mip_count(ISize::new(1, 1)), 1);
    assert_eq!(max_mip_count(ISize::new(2, 1)), 2);
    assert_eq!(max_mip_count(ISize::new(256, 3)), 9);
    assert_eq!(max_mip_count(ISize::new(255, 255)), 8);
}

#[test]
fn mipmaps_halve_each_level() {
    let tex = solid(ISize::new(8, 4), [10, 20, 30, 255])
        .with_mipmaps()
        .unwrap();
    assert_eq!(tex.mip_count(), 4);
    let dims: Vec<(u16, u16)> = (0..4)
        .map(|i| {
            let p = tex.level(i).unwrap();
            (p.width(), p.height())
        })
        .collect();
    assert_eq!(dims, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
    assert!(tex.level(4).is_none());

    let last = tex.level(3).unwrap().data_as_u8_slice();
    assert_eq!(&last[..4], &[10, 20, 30, 255]);
}

#[test]
fn mip_count_out_of_range_is_rejected() {
    let tex = solid(ISize::new(4, 4), [0, 0, 0, 255]);
    assert!(matches!(
        tex.with_mip_count(4),
        Err(FilterError::Validation(_))
    ));
    let tex = solid(ISize::new(4, 4), [0, 0, 0, 255]);
    assert!(tex.with_mip_count(0).is_err());
}

#[test]
fn byte_length_mismatch_is_rejected() {
    let err = Texture::from_premul_rgba8("bad", ISize::new(2, 2), &[0u8; 12]).unwrap_err();
    assert!(err.to_string().contains("width*height*4"));
}

#[test]
fn empty_and_oversized_surfaces_fail_allocation() {
    assert!(matches!(
        new_pixmap(ISize::new(0, 0)),
        Err(FilterError::Allocation(_))
    ));
    assert!(matches!(
        new_pixmap(ISize::new(70_000, 1)),
        Err(FilterError::Allocation(_))
    ));
}

#[test]
fn image_roundtrip_premultiplies_and_restores() {
    let img = image::RgbaImage::from_pixel(2, 1, image::Rgba([200, 100, 50, 128]));
    let tex = Texture::from_image("img", &img).unwrap();
    let px = tex.pixel(0, 0).unwrap();
    assert_eq!(px[3], 128);
    assert!(px[0] < 200);

    let back = tex.to_rgba_image().unwrap();
    let p = back.get_pixel(1, 0).0;
    assert!((i32::from(p[0]) - 200).abs() <= 2);
    assert_eq!(p[3], 128);
}

#[test]
fn mip_selection_prefers_base_when_magnifying() {
    let tex = solid(ISize::new(16, 16), [1, 2, 3, 255])
        .with_mipmaps()
        .unwrap();
    assert_eq!(tex.select_mip_level(2.0, MipFilter::Linear), 0);
    assert_eq!(tex.select_mip_level(0.5, MipFilter::Linear), 1);
    assert_eq!(tex.select_mip_level(0.3, MipFilter::Linear), 1);
    assert_eq!(tex.select_mip_level(0.3, MipFilter::Nearest), 2);
    assert_eq!(tex.select_mip_level(1e-6, MipFilter::Nearest), 4);

    let single = solid(ISize::new(16, 16), [1, 2, 3, 255]);
    assert_eq!(single.select_mip_level(0.25, MipFilter::Linear), 0);
}
