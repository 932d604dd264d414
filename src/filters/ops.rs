use crate::filters::blur::blur_radius;
use crate::filters::color::ColorMatrix;
use crate::foundation::core::{Rect, intersect_coverage, union_coverage};
use crate::foundation::error::{FilterError, FilterResult};
use crate::scene::entity::BlendMode;

/// How a multi-input filter combines the coverage of its inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    /// Union of all inputs; any unbounded input makes the result unbounded.
    #[default]
    Union,
    /// Intersection of all inputs; unbounded inputs do not constrain the result.
    Intersection,
}

impl CoverageMode {
    pub(crate) fn combine(self, a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
        match self {
            Self::Union => union_coverage(a, b),
            Self::Intersection => intersect_coverage(a, b),
        }
    }
}

/// Operation performed by a chained filter input on its upstream snapshots.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterOp {
    /// Forward the single upstream input unchanged.
    PassThrough,
    /// Composite every input in order; inputs after the first use `mode`.
    Blend {
        /// Blend mode for inputs after the first.
        #[serde(default)]
        mode: BlendMode,
        /// How input coverage is combined.
        #[serde(default)]
        coverage: CoverageMode,
    },
    /// Gaussian blur of the single upstream input.
    GaussianBlur {
        /// Standard deviation in device pixels.
        sigma: f32,
    },
    /// Color matrix applied to the single upstream input.
    ColorMatrix {
        /// Matrix applied in straight-alpha space.
        matrix: ColorMatrix,
    },
}

impl FilterOp {
    /// Short name used in labels and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PassThrough => "PassThrough",
            Self::Blend { .. } => "Blend",
            Self::GaussianBlur { .. } => "GaussianBlur",
            Self::ColorMatrix { .. } => "ColorMatrix",
        }
    }

    /// Check the operation's parameters and that it accepts `inputs` upstream inputs.
    pub fn validate(&self, inputs: usize) -> FilterResult<()> {
        match self {
            Self::Blend { .. } => {
                if inputs == 0 {
                    return Err(FilterError::graph("Blend needs at least one input"));
                }
            }
            _ => {
                if inputs != 1 {
                    return Err(FilterError::graph(format!(
                        "{} takes exactly one input, got {inputs}",
                        self.name()
                    )));
                }
            }
        }
        match self {
            Self::GaussianBlur { sigma } if !sigma.is_finite() || *sigma < 0.0 => Err(
                FilterError::validation(format!("blur sigma must be finite and >= 0, got {sigma}")),
            ),
            Self::ColorMatrix { matrix } => matrix.validate(),
            _ => Ok(()),
        }
    }

    /// Coverage after this operation, given the coverage of each input in order.
    pub(crate) fn output_coverage(&self, inputs: &[Option<Rect>]) -> Option<Rect> {
        let first = inputs.first().copied().flatten();
        match self {
            Self::PassThrough => first,
            Self::Blend { coverage, .. } => {
                let mut iter = inputs.iter().copied();
                let init = iter.next()?;
                iter.fold(init, |acc, c| coverage.combine(acc, c))
            }
            // Blurred targets start from the pixel-aligned source target.
            Self::GaussianBlur { sigma } => {
                let r = f64::from(blur_radius(*sigma));
                inputs.first().copied()?.map(|rect| {
                    if r > 0.0 && rect.area() > 0.0 {
                        rect.expand().inflate(r, r)
                    } else {
                        rect
                    }
                })
            }
            Self::ColorMatrix { matrix } if matrix.adds_alpha() => None,
            Self::ColorMatrix { .. } => inputs.first().copied().flatten(),
        }
    }
}
