use super::*;

#[test]
fn isize_from_rect_rounds_and_saturates() {
    assert_eq!(
        ISize::from_rect(Rect::new(2.0, 3.0, 12.0, 8.0)),
        ISize::new(10, 5)
    );
    assert_eq!(
        ISize::from_rect(Rect::new(5.0, 5.0, 1.0, 1.0)),
        ISize::new(0, 0)
    );
    assert!(ISize::new(0, 4).is_empty());
    assert!(!ISize::new(1, 1).is_empty());
}

#[test]
fn rgba8_byte_len_matches_area() {
    assert_eq!(ISize::new(3, 2).rgba8_byte_len().unwrap(), 24);
}

#[test]
fn transform_bounds_of_rotated_square() {
    let r = Rect::new(0.0, 0.0, 2.0, 2.0);
    let m = Affine::rotate(std::f64::consts::FRAC_PI_2);
    let b = transform_bounds(r, m);
    assert!((b.x0 + 2.0).abs() < 1e-9);
    assert!(b.y0.abs() < 1e-9);
    assert!(b.x1.abs() < 1e-9);
    assert!((b.y1 - 2.0).abs() < 1e-9);
}

#[test]
fn invert_rejects_singular_matrices() {
    assert!(invert(Affine::scale_non_uniform(1.0, 0.0)).is_none());
    assert!(invert(Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0])).is_none());

    let m = Affine::translate((3.0, -4.0)) * Affine::scale(2.0);
    let inv = invert(m).unwrap();
    let p = inv * (m * Point::new(1.5, 2.5));
    assert!((p.x - 1.5).abs() < 1e-9);
    assert!((p.y - 2.5).abs() < 1e-9);
}

#[test]
fn union_with_unbounded_is_unbounded() {
    let r = Some(Rect::new(0.0, 0.0, 1.0, 1.0));
    assert_eq!(union_coverage(r, None), None);
    assert_eq!(union_coverage(None, r), None);
    assert_eq!(
        union_coverage(r, Some(Rect::new(2.0, 2.0, 3.0, 3.0))),
        Some(Rect::new(0.0, 0.0, 3.0, 3.0))
    );
}

#[test]
fn union_ignores_empty_side_but_keeps_it_bounded() {
    let empty = Some(Rect::new(50.0, 50.0, 50.0, 50.0));
    let r = Some(Rect::new(0.0, 0.0, 1.0, 1.0));
    assert_eq!(union_coverage(empty, r), r);
    assert_eq!(union_coverage(empty, empty), empty);
}

#[test]
fn intersection_of_disjoint_rects_is_empty_not_unbounded() {
    let a = Some(Rect::new(0.0, 0.0, 1.0, 1.0));
    let b = Some(Rect::new(5.0, 5.0, 6.0, 6.0));
    let out = intersect_coverage(a, b).unwrap();
    assert!(is_empty_rect(out));
    assert_eq!(intersect_coverage(a, None), a);
    assert_eq!(intersect_coverage(None, None), None);
}
