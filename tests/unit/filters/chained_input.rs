use std::sync::Arc;

use super::*;
use crate::filters::color::ColorMatrix;
use crate::filters::contents_input::ContentsFilterInput;
use crate::filters::ops::CoverageMode;
use crate::filters::texture_input::TextureFilterInput;
use crate::foundation::core::Point;
use crate::foundation::error::FilterError;
use crate::renderer::texture::Texture;
use crate::scene::contents::{Contents, SolidColorContents};

fn close(px: Option<[u8; 4]>, want: [u8; 4]) -> bool {
    px.is_some_and(|px| {
        px.iter()
            .zip(want)
            .all(|(a, b)| (i32::from(*a) - i32::from(b)).abs() <= 2)
    })
}

fn solid(rect: Rect, rgba: [u8; 4]) -> (Rc<SolidColorContents>, FilterInputRef) {
    let contents = Rc::new(SolidColorContents::rect(rect, rgba));
    let input: FilterInputRef = Rc::new(ContentsFilterInput::new(
        contents.clone() as Rc<dyn Contents>,
        Affine::IDENTITY,
    ));
    (contents, input)
}

fn texture_input(local: Affine) -> FilterInputRef {
    let size = ISize::new(2, 2);
    let bytes = [255u8; 16];
    let tex = Texture::from_premul_rgba8("tex", size, &bytes).unwrap();
    Rc::new(TextureFilterInput::new(Arc::new(tex), local))
}

fn blend(coverage: CoverageMode) -> FilterOp {
    FilterOp::Blend {
        mode: BlendMode::SourceOver,
        coverage,
    }
}

#[derive(Debug)]
struct Unbounded;

impl FilterInput for Unbounded {
    fn snapshot(&self, _renderer: &mut ContentContext, _entity: &Entity) -> Option<Snapshot> {
        None
    }

    fn coverage(&self, _entity: &Entity) -> Option<Rect> {
        None
    }

    fn local_transform(&self, _entity: &Entity) -> Affine {
        Affine::IDENTITY
    }
}

#[test]
fn local_transform_composes_with_upstream() {
    let up = texture_input(Affine::scale(2.0));
    let chained =
        ChainedFilterInput::new(FilterOp::PassThrough, [up], Affine::translate((10.0, 0.0)))
            .unwrap();
    let e = Entity::new();

    let local = chained.local_transform(&e);
    assert_eq!(local * Point::new(1.0, 0.0), Point::new(12.0, 0.0));

    let moved = Entity::new().with_transform(Affine::translate((0.0, 5.0)));
    assert_eq!(
        chained.transform(&moved) * Point::new(1.0, 0.0),
        Point::new(12.0, 5.0)
    );
}

#[test]
fn pass_through_forwards_upstream_snapshot() {
    let up = texture_input(Affine::scale(2.0));
    let chained = ChainedFilterInput::new(
        FilterOp::PassThrough,
        [up.clone()],
        Affine::translate((10.0, 0.0)),
    )
    .unwrap();
    let e = Entity::new();
    let mut cx = ContentContext::default();

    let snap = chained.snapshot(&mut cx, &e).unwrap();
    assert_eq!(snap.transform, chained.transform(&e));
    assert_eq!(snap.coverage(), chained.coverage(&e));
    assert_eq!(chained.coverage(&e), Some(Rect::new(10.0, 0.0, 14.0, 4.0)));
    assert_eq!(cx.stats().render_passes, 0);
    assert_eq!(chained.upstream().len(), 1);
    assert!(Rc::ptr_eq(&chained.upstream()[0], &up));
}

#[test]
fn union_coverage_propagates_unbounded() {
    let (_, a) = solid(Rect::new(0.0, 0.0, 4.0, 4.0), [255, 0, 0, 255]);
    let (_, b) = solid(Rect::new(8.0, 0.0, 12.0, 4.0), [0, 0, 255, 255]);
    let e = Entity::new();

    let bounded =
        ChainedFilterInput::new(blend(CoverageMode::Union), [a.clone(), b], Affine::IDENTITY)
            .unwrap();
    assert_eq!(bounded.coverage(&e), Some(Rect::new(0.0, 0.0, 12.0, 4.0)));

    let unbounded: FilterInputRef = Rc::new(Unbounded);
    let union = ChainedFilterInput::new(
        blend(CoverageMode::Union),
        [a.clone(), unbounded.clone()],
        Affine::IDENTITY,
    )
    .unwrap();
    assert_eq!(union.coverage(&e), None);

    let intersection = ChainedFilterInput::new(
        blend(CoverageMode::Intersection),
        [a, unbounded],
        Affine::IDENTITY,
    )
    .unwrap();
    assert_eq!(
        intersection.coverage(&e),
        Some(Rect::new(0.0, 0.0, 4.0, 4.0))
    );
}

#[test]
fn blend_composites_inputs_in_order() {
    let (_, red) = solid(Rect::new(0.0, 0.0, 4.0, 4.0), [255, 0, 0, 255]);
    let (_, blue) = solid(Rect::new(2.0, 0.0, 8.0, 4.0), [0, 0, 255, 255]);
    let chained =
        ChainedFilterInput::new(blend(CoverageMode::Union), [red, blue], Affine::IDENTITY)
            .unwrap();
    let mut cx = ContentContext::default();

    let snap = chained.snapshot(&mut cx, &Entity::new()).unwrap();
    assert_eq!(snap.texture.size(), ISize::new(8, 4));
    assert_eq!(snap.transform, Affine::IDENTITY);
    assert!(close(snap.texture.pixel(1, 1), [255, 0, 0, 255]));
    assert!(close(snap.texture.pixel(3, 1), [0, 0, 255, 255]));
    assert!(close(snap.texture.pixel(6, 1), [0, 0, 255, 255]));
}

#[test]
fn blend_skips_absent_inputs() {
    let (_, hidden) = solid(Rect::new(0.0, 0.0, 4.0, 4.0), [255, 0, 0, 0]);
    let (_, shown) = solid(Rect::new(4.0, 4.0, 6.0, 6.0), [0, 255, 0, 255]);
    let mut cx = ContentContext::default();

    let chained = ChainedFilterInput::new(
        blend(CoverageMode::Union),
        [hidden.clone(), shown],
        Affine::IDENTITY,
    )
    .unwrap();
    let snap = chained.snapshot(&mut cx, &Entity::new()).unwrap();
    assert_eq!(snap.texture.size(), ISize::new(2, 2));
    assert_eq!(snap.transform, Affine::translate((4.0, 4.0)));

    let nothing =
        ChainedFilterInput::new(blend(CoverageMode::Union), [hidden], Affine::IDENTITY).unwrap();
    assert!(nothing.snapshot(&mut cx, &Entity::new()).is_none());
}

#[test]
fn blur_spreads_into_inflated_target() {
    let (_, src) = solid(Rect::new(10.0, 10.0, 14.0, 14.0), [255, 255, 255, 255]);
    let chained = ChainedFilterInput::new(
        FilterOp::GaussianBlur { sigma: 1.0 },
        [src],
        Affine::IDENTITY,
    )
    .unwrap();
    let e = Entity::new();
    let mut cx = ContentContext::default();

    assert_eq!(chained.coverage(&e), Some(Rect::new(7.0, 7.0, 17.0, 17.0)));
    let snap = chained.snapshot(&mut cx, &e).unwrap();
    assert_eq!(snap.texture.size(), ISize::new(10, 10));
    assert_eq!(snap.transform, Affine::translate((7.0, 7.0)));
    assert_eq!(snap.coverage(), chained.coverage(&e));

    let alpha = |x, y| snap.texture.pixel(x, y).map(|p| p[3]).unwrap_or(0);
    assert!(alpha(5, 5) > 200);
    assert!(alpha(2, 5) > 0);
    assert!(alpha(2, 5) < alpha(5, 5));
    assert_eq!(alpha(0, 0), 0);
}

#[test]
fn color_matrix_filters_pixels() {
    let (_, src) = solid(Rect::new(0.0, 0.0, 2.0, 2.0), [255, 0, 0, 255]);
    let chained = ChainedFilterInput::new(
        FilterOp::ColorMatrix {
            matrix: ColorMatrix::grayscale(),
        },
        [src],
        Affine::IDENTITY,
    )
    .unwrap();
    let snap = chained
        .snapshot(&mut ContentContext::default(), &Entity::new())
        .unwrap();
    let px = snap.texture.pixel(1, 1).unwrap();
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
    assert!(px[3] > 250);
}

#[test]
fn alpha_adding_color_matrix_needs_a_clip() {
    let (_, src) = solid(Rect::new(0.0, 0.0, 2.0, 2.0), [255, 0, 0, 255]);
    let mut matrix = ColorMatrix::IDENTITY;
    matrix.0[19] = 1.0;
    let chained =
        ChainedFilterInput::new(FilterOp::ColorMatrix { matrix }, [src], Affine::IDENTITY)
            .unwrap();
    let mut cx = ContentContext::default();

    assert_eq!(chained.coverage(&Entity::new()), None);
    assert!(chained.snapshot(&mut cx, &Entity::new()).is_none());

    let clipped = Entity::new().with_clip(Some(Rect::new(0.0, 0.0, 6.0, 3.0)));
    let snap = chained.snapshot(&mut cx, &clipped).unwrap();
    assert_eq!(snap.texture.size(), ISize::new(6, 3));
    assert!(close(snap.texture.pixel(5, 2), [0, 0, 0, 255]));
}

#[test]
fn snapshots_are_cached_until_upstream_changes() {
    let (contents, src) = solid(Rect::new(0.0, 0.0, 4.0, 4.0), [255, 0, 0, 255]);
    let chained = ChainedFilterInput::new(
        blend(CoverageMode::Union),
        [src.clone()],
        Affine::IDENTITY,
    )
    .unwrap();
    let mut cx = ContentContext::default();
    let e = Entity::new();

    let a = chained.snapshot(&mut cx, &e).unwrap();
    let passes = cx.stats().render_passes;
    let b = chained.snapshot(&mut cx, &e).unwrap();
    assert_eq!(a, b);
    assert_eq!(cx.stats().render_passes, passes);
    assert_eq!(chained.cache_stats().hits, 1);

    let before = chained.generation();
    contents.set_color([0, 255, 0, 255]);
    assert_ne!(chained.generation(), before);
    let c = chained.snapshot(&mut cx, &e).unwrap();
    assert!(!a.shares_texture_with(&c));
    assert!(close(c.texture.pixel(1, 1), [0, 255, 0, 255]));

    chained.clear_cache();
    assert_eq!(chained.cache_stats().entries, 0);
}

#[test]
fn construction_checks_arity_and_parameters() {
    let up = texture_input(Affine::IDENTITY);
    let err = ChainedFilterInput::new(
        FilterOp::PassThrough,
        [up.clone(), up.clone()],
        Affine::IDENTITY,
    )
    .unwrap_err();
    assert!(matches!(err, FilterError::Graph(_)));

    let err = ChainedFilterInput::new(
        blend(CoverageMode::Union),
        Vec::<FilterInputRef>::new(),
        Affine::IDENTITY,
    )
    .unwrap_err();
    assert!(matches!(err, FilterError::Graph(_)));

    let err = ChainedFilterInput::new(
        FilterOp::GaussianBlur { sigma: f32::NAN },
        [up],
        Affine::IDENTITY,
    )
    .unwrap_err();
    assert!(matches!(err, FilterError::Validation(_)));
}

#[test]
fn nested_chains_accumulate_local_transforms() {
    let leaf = texture_input(Affine::scale(2.0));
    let inner: FilterInputRef =
        ChainedFilterInput::new(FilterOp::PassThrough, [leaf], Affine::translate((1.0, 0.0)))
            .unwrap();
    let outer =
        ChainedFilterInput::new(FilterOp::PassThrough, [inner], Affine::translate((0.0, 3.0)))
            .unwrap();
    let e = Entity::new();
    assert_eq!(
        outer.local_transform(&e) * Point::new(1.0, 1.0),
        Point::new(3.0, 5.0)
    );
    let snap = outer
        .snapshot(&mut ContentContext::default(), &e)
        .unwrap();
    assert_eq!(snap.transform, outer.transform(&e));
}

#[test]
fn blur_coverage_contains_fractional_source_output() {
    let (_, src) = solid(Rect::new(0.5, 0.5, 10.5, 10.5), [255, 255, 255, 255]);
    let chained = ChainedFilterInput::new(
        FilterOp::GaussianBlur { sigma: 1.0 },
        [src],
        Affine::IDENTITY,
    )
    .unwrap();
    let e = Entity::new();
    let coverage = chained.coverage(&e).unwrap();
    let snap = chained
        .snapshot(&mut ContentContext::default(), &e)
        .unwrap();
    let produced = snap.coverage().unwrap();
    assert_eq!(coverage.union(produced), coverage);

    let size = snap.texture.size();
    for y in 0..size.height {
        for x in 0..size.width {
            let alpha = snap.texture.pixel(x, y).map(|p| p[3]).unwrap_or(0);
            if alpha > 0 {
                let center = snap.transform * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                assert!(coverage.contains(center), "pixel ({x}, {y}) outside {coverage:?}");
            }
        }
    }
}
