//! Reconstruction filter seam.
//!
//! The accumulation core only ever asks a filter for its support radius and
//! for a weight at a 2D offset from the sample position. Integer coordinates
//! sit at pixel centers: a sample at `(2.0, 2.0)` is centered on pixel
//! `(2, 2)`.

pub trait ReconstructionFilter: Send + Sync {
    /// Support radius in pixels. Contributions vanish beyond this distance
    /// on either axis.
    fn radius(&self) -> f32;
    /// Weight at `offset` = (pixel center − sample position).
    fn weight(&self, offset: (f32, f32)) -> f32;
}

/// Constant weight over the support square. A radius of 0 degenerates to
/// nearest-pixel deposition (the support test is inclusive).
#[derive(Copy, Clone, Debug)]
pub struct BoxFilter {
    pub radius: f32,
}

impl BoxFilter {
    pub const fn new(radius: f32) -> Self {
        BoxFilter { radius }
    }
}

impl ReconstructionFilter for BoxFilter {
    fn radius(&self) -> f32 {
        self.radius
    }
    fn weight(&self, offset: (f32, f32)) -> f32 {
        if offset.0.abs() <= self.radius && offset.1.abs() <= self.radius {
            1.0
        } else {
            0.0
        }
    }
}

/// Separable triangle kernel, `max(0, r - |dx|) * max(0, r - |dy|)`.
#[derive(Copy, Clone, Debug)]
pub struct TentFilter {
    pub radius: f32,
}

impl TentFilter {
    pub const fn new(radius: f32) -> Self {
        TentFilter { radius }
    }
}

impl ReconstructionFilter for TentFilter {
    fn radius(&self) -> f32 {
        self.radius
    }
    fn weight(&self, offset: (f32, f32)) -> f32 {
        (self.radius - offset.0.abs()).max(0.0) * (self.radius - offset.1.abs()).max(0.0)
    }
}

/// Truncated gaussian, rescaled so the weight reaches exactly zero at the
/// support boundary.
#[derive(Copy, Clone, Debug)]
pub struct GaussianFilter {
    radius: f32,
    alpha: f32,
    edge: f32,
}

impl GaussianFilter {
    pub fn new(radius: f32, alpha: f32) -> Self {
        GaussianFilter {
            radius,
            alpha,
            edge: (-alpha * radius * radius).exp(),
        }
    }
}

impl ReconstructionFilter for GaussianFilter {
    fn radius(&self) -> f32 {
        self.radius
    }
    fn weight(&self, offset: (f32, f32)) -> f32 {
        let g = |d: f32| ((-self.alpha * d * d).exp() - self.edge).max(0.0);
        g(offset.0) * g(offset.1)
    }
}

pub enum FilterEnum {
    Box(BoxFilter),
    Tent(TentFilter),
    Gaussian(GaussianFilter),
}

impl ReconstructionFilter for FilterEnum {
    fn radius(&self) -> f32 {
        match self {
            FilterEnum::Box(inner) => inner.radius(),
            FilterEnum::Tent(inner) => inner.radius(),
            FilterEnum::Gaussian(inner) => inner.radius(),
        }
    }
    fn weight(&self, offset: (f32, f32)) -> f32 {
        match self {
            FilterEnum::Box(inner) => inner.weight(offset),
            FilterEnum::Tent(inner) => inner.weight(offset),
            FilterEnum::Gaussian(inner) => inner.weight(offset),
        }
    }
}

impl From<BoxFilter> for FilterEnum {
    fn from(value: BoxFilter) -> Self {
        FilterEnum::Box(value)
    }
}

impl From<TentFilter> for FilterEnum {
    fn from(value: TentFilter) -> Self {
        FilterEnum::Tent(value)
    }
}

impl From<GaussianFilter> for FilterEnum {
    fn from(value: GaussianFilter) -> Self {
        FilterEnum::Gaussian(value)
    }
}
