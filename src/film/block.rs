use std::sync::Arc;

use tracing::{debug, warn};

use crate::film::layout::ChannelLayout;
use crate::filter::ReconstructionFilter;
use crate::math::{Extent2, Point2};

/// A bordered accumulation tile, owned by exactly one producer.
///
/// The buffer covers the tile interior plus a `border`-wide ring on every
/// side so that filter support reaching past the tile edge still lands in
/// owned memory. Storage is dense: per pixel, `layout.width()` accumulated
/// channel values followed by one shared accumulated filter weight.
///
/// The owning worker is the only writer by contract, so `put` needs no
/// locking; a completed block is merged into the film and consumed.
pub struct ImageBlock {
    origin: Point2,
    size: Extent2,
    border: usize,
    layout: Arc<ChannelLayout>,
    buffer: Vec<f32>,
    warn_negative: bool,
    rejected: u64,
    warned_negative: bool,
}

impl ImageBlock {
    pub fn new(
        origin: Point2,
        size: Extent2,
        border: usize,
        layout: Arc<ChannelLayout>,
        warn_negative: bool,
    ) -> Self {
        let bordered = Extent2::new(size.width + 2 * border, size.height + 2 * border);
        let stride = layout.width() + 1;
        ImageBlock {
            origin,
            size,
            border,
            layout,
            buffer: vec![0.0; bordered.area() * stride],
            warn_negative,
            rejected: 0,
            warned_negative: false,
        }
    }

    pub fn origin(&self) -> Point2 {
        self.origin
    }

    pub fn size(&self) -> Extent2 {
        self.size
    }

    pub fn border(&self) -> usize {
        self.border
    }

    pub fn layout(&self) -> &Arc<ChannelLayout> {
        &self.layout
    }

    pub fn bordered_extent(&self) -> Extent2 {
        Extent2::new(
            self.size.width + 2 * self.border,
            self.size.height + 2 * self.border,
        )
    }

    /// Channel values + trailing weight slot.
    pub fn pixel_stride(&self) -> usize {
        self.layout.width() + 1
    }

    /// Raw accumulator storage, bordered, row-major.
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Accumulator slice for an interior-coordinate pixel; `(0, 0)` is the
    /// tile's top-left interior pixel, negative coordinates reach into the
    /// border ring.
    pub fn pixel(&self, x: i32, y: i32) -> &[f32] {
        let bordered = self.bordered_extent();
        let bx = (x + self.border as i32) as usize;
        let by = (y + self.border as i32) as usize;
        debug_assert!(bx < bordered.width && by < bordered.height);
        let stride = self.pixel_stride();
        let start = (by * bordered.width + bx) * stride;
        &self.buffer[start..start + stride]
    }

    /// Count of samples dropped by the range check.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Splat one sample at a block-local position (interior spans
    /// `[0, size)`, integer coordinates at pixel centers).
    ///
    /// Positions outside `[-border, size + border)` on either axis are
    /// dropped without touching the buffer; the filter footprint of an
    /// accepted sample is clamped to the bordered buffer. Negative channel
    /// values are accumulated unchanged (a Monte-Carlo estimator may be
    /// legitimately negative); with `warn_negative` set they are diagnosed
    /// once per block.
    ///
    /// Panics if `values.len()` does not equal the layout width.
    pub fn put<F: ReconstructionFilter + ?Sized>(
        &mut self,
        position: (f32, f32),
        values: &[f32],
        filter: &F,
    ) {
        // a short slice would deposit the filter weight into a channel slot,
        // silently corrupting the layout; fail loudly instead
        assert_eq!(
            values.len(),
            self.layout.width(),
            "sample value count does not match the channel layout"
        );

        let border = self.border as f32;
        let (px, py) = position;
        if !px.is_finite()
            || !py.is_finite()
            || px < -border
            || px >= self.size.width as f32 + border
            || py < -border
            || py >= self.size.height as f32 + border
        {
            self.rejected += 1;
            debug!(
                "dropped out-of-range sample at ({}, {}) for block at {:?}",
                px, py, self.origin
            );
            return;
        }

        if self.warn_negative && !self.warned_negative {
            if let Some(index) = values.iter().position(|v| *v < 0.0) {
                self.warned_negative = true;
                warn!(
                    "negative value {} in channel {} splatted at ({}, {}); keeping it unclamped",
                    values[index], index, px, py
                );
            }
        }

        let bordered = self.bordered_extent();
        let stride = self.pixel_stride();
        let radius = filter.radius();
        // bordered buffer coordinates; the shift cancels out of the filter
        // offsets
        let bx = px + border;
        let by = py + border;
        let x0 = ((bx - radius).ceil() as i64).max(0) as usize;
        let x1 = ((bx + radius).floor() as i64).min(bordered.width as i64 - 1) as usize;
        let y0 = ((by - radius).ceil() as i64).max(0) as usize;
        let y1 = ((by + radius).floor() as i64).min(bordered.height as i64 - 1) as usize;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let weight = filter.weight((x as f32 - bx, y as f32 - by));
                if weight == 0.0 {
                    continue;
                }
                let start = (y * bordered.width + x) * stride;
                let pixel = &mut self.buffer[start..start + stride];
                for (slot, value) in pixel[..values.len()].iter_mut().zip(values) {
                    *slot += weight * value;
                }
                pixel[values.len()] += weight;
            }
        }
    }

    /// Zero the buffer in place for reuse across progressive frames.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.rejected = 0;
        self.warned_negative = false;
    }
}
