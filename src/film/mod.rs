//! Film: the full-image accumulation target.
//!
//! Worker threads obtain bordered [`ImageBlock`]s, splat samples into them,
//! and hand completed blocks back through [`Film::put_block`]. The master
//! grid stores the same (channel values, filter weight) accumulators as the
//! blocks and is striped with one mutex per row, so a merge only contends
//! with another merge on the filter-overlap rows at tile boundaries. Merges
//! are plain additions, hence commutative: the developed image does not
//! depend on completion order, and an aborted render develops into a valid
//! partial image.

mod block;
mod layout;

pub use block::ImageBlock;
pub use layout::{ChannelDescriptor, ChannelLayout, FilmFlags};

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::info;

use crate::error::FilmError;
use crate::filter::{FilterEnum, ReconstructionFilter};
use crate::math::{Bounds2, Extent2, Point2};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Lifecycle {
    Unprepared,
    Prepared,
    Accumulating,
    Developed,
}

impl Lifecycle {
    fn name(self) -> &'static str {
        match self {
            Lifecycle::Unprepared => "Unprepared",
            Lifecycle::Prepared => "Prepared",
            Lifecycle::Accumulating => "Accumulating",
            Lifecycle::Developed => "Developed",
        }
    }
}

struct Grid {
    layout: Arc<ChannelLayout>,
    filter: Arc<FilterEnum>,
    resolution: Extent2,
    crop: Bounds2,
    // block borders always cover the filter support; the grid itself only
    // carries a border ring when high-quality edges are on
    block_border: usize,
    grid_border: usize,
    extent: Extent2,
    stride: usize,
    rows: Vec<Mutex<Box<[f32]>>>,
}

/// Developed output: a dense row-major buffer with one f32 per requested
/// component per pixel, plus the descriptors describing its layout. This is
/// the sole handoff to image encoders.
#[derive(Clone, Debug, PartialEq)]
pub struct DevelopedImage {
    pub width: usize,
    pub height: usize,
    pub channels: Vec<ChannelDescriptor>,
    pub data: Vec<f32>,
}

impl DevelopedImage {
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let stride = self.channels.len();
        let start = (y * self.width + x) * stride;
        &self.data[start..start + stride]
    }
}

pub struct Film {
    high_quality_edges: bool,
    warn_negative: bool,
    state: Mutex<Lifecycle>,
    grid: Option<Grid>,
}

impl Default for Film {
    fn default() -> Self {
        Film::new()
    }
}

impl Film {
    pub fn new() -> Self {
        Film {
            high_quality_edges: false,
            warn_negative: false,
            state: Mutex::new(Lifecycle::Unprepared),
            grid: None,
        }
    }

    /// Extend the master grid by a filter-radius ring so that crop-edge
    /// pixels normalize with their full filter support. Only valid before
    /// `prepare` fixes the allocation.
    pub fn set_high_quality_edges(&mut self, enabled: bool) -> Result<(), FilmError> {
        let state = *self.state.lock();
        if state != Lifecycle::Unprepared {
            return Err(FilmError::State {
                operation: "set_high_quality_edges",
                state: state.name(),
            });
        }
        self.high_quality_edges = enabled;
        Ok(())
    }

    /// Diagnostic policy for negative sample values in blocks created by
    /// this film; values are kept either way.
    pub fn set_warn_negative(&mut self, enabled: bool) {
        self.warn_negative = enabled;
    }

    /// Fix the channel layout and allocate the master grid.
    ///
    /// `crop` is in image coordinates and defaults to the full resolution;
    /// the grid covers exactly the crop window. All later block origins are
    /// crop-local.
    pub fn prepare(
        &mut self,
        flags: FilmFlags,
        resolution: Extent2,
        crop: Option<Bounds2>,
        filter: Arc<FilterEnum>,
        spectral_bins: usize,
        special_names: &[String],
    ) -> Result<(), FilmError> {
        let state = *self.state.lock();
        if state != Lifecycle::Unprepared {
            return Err(FilmError::State {
                operation: "prepare",
                state: state.name(),
            });
        }
        if resolution.area() == 0 {
            return Err(FilmError::Configuration(format!(
                "zero-area film resolution {}x{}",
                resolution.width, resolution.height
            )));
        }
        let full = Bounds2::from_origin_extent(Point2::ORIGIN, resolution);
        let crop = crop.unwrap_or(full);
        if crop.is_empty() || !full.encloses(&crop) {
            return Err(FilmError::Configuration(format!(
                "crop window {:?} exceeds film resolution {}x{}",
                crop, resolution.width, resolution.height
            )));
        }
        let radius = filter.radius();
        if !radius.is_finite() || radius < 0.0 {
            return Err(FilmError::Configuration(format!(
                "reconstruction filter has invalid support radius {}",
                radius
            )));
        }

        let layout = Arc::new(ChannelLayout::new(flags, spectral_bins, special_names)?);
        let block_border = radius.ceil() as usize;
        let grid_border = if self.high_quality_edges {
            block_border
        } else {
            0
        };
        let crop_extent = crop.extent();
        let extent = Extent2::new(
            crop_extent.width + 2 * grid_border,
            crop_extent.height + 2 * grid_border,
        );
        let stride = layout.width() + 1;
        let rows = (0..extent.height)
            .map(|_| Mutex::new(vec![0.0f32; extent.width * stride].into_boxed_slice()))
            .collect();

        info!(
            "prepared film: crop {}x{} of {}x{}, {} channels + weight, block border {}",
            crop_extent.width,
            crop_extent.height,
            resolution.width,
            resolution.height,
            layout.width(),
            block_border
        );

        self.grid = Some(Grid {
            layout,
            filter,
            resolution,
            crop,
            block_border,
            grid_border,
            extent,
            stride,
            rows,
        });
        *self.state.lock() = Lifecycle::Prepared;
        Ok(())
    }

    pub fn layout(&self) -> Option<&Arc<ChannelLayout>> {
        self.grid.as_ref().map(|grid| &grid.layout)
    }

    /// The shared reconstruction filter every block splats with.
    pub fn filter(&self) -> Option<&Arc<FilterEnum>> {
        self.grid.as_ref().map(|grid| &grid.filter)
    }

    pub fn resolution(&self) -> Option<Extent2> {
        self.grid.as_ref().map(|grid| grid.resolution)
    }

    pub fn crop_window(&self) -> Option<Bounds2> {
        self.grid.as_ref().map(|grid| grid.crop)
    }

    /// Border every block is created with, `filter.radius().ceil()`.
    pub fn block_border(&self) -> Option<usize> {
        self.grid.as_ref().map(|grid| grid.block_border)
    }

    fn prepared_grid(&self, operation: &'static str) -> Result<&Grid, FilmError> {
        self.grid.as_ref().ok_or_else(|| FilmError::State {
            operation,
            state: self.state.lock().name(),
        })
    }

    /// Create a fresh accumulation block for a crop-local tile.
    ///
    /// This is the only place the block border is computed, so every block
    /// is sized for this film's filter.
    pub fn create_block(&self, origin: Point2, size: Extent2) -> Result<ImageBlock, FilmError> {
        let grid = self.prepared_grid("create_block")?;
        let crop_extent = grid.crop.extent();
        let tile = Bounds2::from_origin_extent(origin, size);
        let crop_local = Bounds2::from_origin_extent(Point2::ORIGIN, crop_extent);
        if size.area() == 0 || !crop_local.encloses(&tile) {
            return Err(FilmError::Configuration(format!(
                "block {:?} + {}x{} outside crop window {}x{}",
                origin, size.width, size.height, crop_extent.width, crop_extent.height
            )));
        }
        Ok(ImageBlock::new(
            origin,
            size,
            grid.block_border,
            grid.layout.clone(),
            self.warn_negative,
        ))
    }

    /// Merge a completed block into the master grid, consuming it.
    ///
    /// Safe to call concurrently from many workers; each destination row is
    /// locked independently for the duration of its update, so contention
    /// only occurs where filter borders of neighboring tiles overlap.
    /// Block pixels that map outside the grid (and outside the high-quality
    /// edge ring, when present) are discarded.
    pub fn put_block(&self, block: ImageBlock) -> Result<(), FilmError> {
        let grid = self.prepared_grid("put_block")?;
        if **block.layout() != *grid.layout || block.border() != grid.block_border {
            return Err(FilmError::Configuration(
                "block layout/border does not match this film".to_string(),
            ));
        }
        {
            let mut state = self.state.lock();
            *state = Lifecycle::Accumulating;
        }

        let bordered = block.bordered_extent();
        let stride = grid.stride;
        let source = block.buffer();
        // grid x of the block's leftmost bordered column
        let base_x = block.origin().x - block.border() as i32 + grid.grid_border as i32;
        let base_y = block.origin().y - block.border() as i32 + grid.grid_border as i32;

        let src_x0 = (-base_x).max(0) as usize;
        let src_x1 = bordered
            .width
            .min((grid.extent.width as i32 - base_x).max(0) as usize);
        if src_x0 >= src_x1 {
            return Ok(());
        }

        for src_y in 0..bordered.height {
            let grid_y = base_y + src_y as i32;
            if grid_y < 0 || grid_y >= grid.extent.height as i32 {
                continue;
            }
            let mut row = grid.rows[grid_y as usize].lock();
            let source_row = &source[(src_y * bordered.width + src_x0) * stride
                ..(src_y * bordered.width + src_x1) * stride];
            let dest_start = (base_x + src_x0 as i32) as usize * stride;
            let dest_row = &mut row[dest_start..dest_start + source_row.len()];
            for (dest, src) in dest_row.iter_mut().zip(source_row) {
                *dest += src;
            }
        }
        Ok(())
    }

    /// Normalize the accumulated grid into a dense image over the crop
    /// window, in the requested component order (`R`, `G`, `B`, `A`,
    /// `S00`.., or special channel names). Pixels with zero accumulated
    /// weight develop to zero. Idempotent: with no intervening merges,
    /// repeated calls return identical output.
    pub fn develop<S: AsRef<str>>(&self, subset: &[S]) -> Result<DevelopedImage, FilmError> {
        self.develop_region(subset, false)
    }

    /// Like [`Film::develop`], but the output additionally covers the
    /// high-quality edge ring: the overscan band of filter-radius width
    /// around the crop window that accumulated contributions from samples
    /// outside it. Useful for stitching crops or feeding encoders that want
    /// overscan. Without high-quality edges there is no ring and the output
    /// equals `develop`.
    pub fn develop_bordered<S: AsRef<str>>(
        &self,
        subset: &[S],
    ) -> Result<DevelopedImage, FilmError> {
        self.develop_region(subset, true)
    }

    fn develop_region<S: AsRef<str>>(
        &self,
        subset: &[S],
        include_edge_ring: bool,
    ) -> Result<DevelopedImage, FilmError> {
        let grid = self.prepared_grid("develop")?;
        {
            let state = *self.state.lock();
            if !matches!(state, Lifecycle::Accumulating | Lifecycle::Developed) {
                return Err(FilmError::State {
                    operation: "develop",
                    state: state.name(),
                });
            }
        }
        if subset.is_empty() {
            return Err(FilmError::Configuration(
                "empty channel subset requested".to_string(),
            ));
        }

        let mut offsets: SmallVec<[usize; 8]> = SmallVec::with_capacity(subset.len());
        let mut channels = Vec::with_capacity(subset.len());
        for (index, name) in subset.iter().enumerate() {
            let name = name.as_ref();
            let offset = grid.layout.component_offset(name).ok_or_else(|| {
                FilmError::Configuration(format!(
                    "unknown channel {:?}; film has {:?}",
                    name,
                    grid.layout.component_names()
                ))
            })?;
            offsets.push(offset);
            channels.push(ChannelDescriptor {
                name: name.to_string(),
                offset: index,
                width: 1,
            });
        }
        *self.state.lock() = Lifecycle::Developed;

        let crop_extent = grid.crop.extent();
        let (margin, width, height) = if include_edge_ring {
            (0, grid.extent.width, grid.extent.height)
        } else {
            (grid.grid_border, crop_extent.width, crop_extent.height)
        };
        let weight_offset = grid.layout.width();
        let mut data = Vec::with_capacity(width * height * offsets.len());
        for y in 0..height {
            let row = grid.rows[y + margin].lock();
            for x in 0..width {
                let start = (x + margin) * grid.stride;
                let pixel = &row[start..start + grid.stride];
                let weight = pixel[weight_offset];
                if weight == 0.0 {
                    data.extend(std::iter::repeat(0.0).take(offsets.len()));
                } else {
                    data.extend(offsets.iter().map(|offset| pixel[*offset] / weight));
                }
            }
        }

        Ok(DevelopedImage {
            width,
            height,
            channels,
            data,
        })
    }

    /// Develop every component in layout order.
    pub fn develop_all(&self) -> Result<DevelopedImage, FilmError> {
        let grid = self.prepared_grid("develop")?;
        let names = grid.layout.component_names().to_vec();
        self.develop(&names)
    }

    /// Zero the master grid for the next progressive pass and return to the
    /// prepared state.
    pub fn clear(&mut self) -> Result<(), FilmError> {
        let grid = self.prepared_grid("clear")?;
        for row in &grid.rows {
            row.lock().fill(0.0);
        }
        *self.state.lock() = Lifecycle::Prepared;
        Ok(())
    }

    /// Partition the crop window into crop-local tiles, including right and
    /// bottom remnant tiles when the tile size does not divide the crop
    /// evenly.
    pub fn tile_origins(&self, tile_size: Extent2) -> Result<Vec<(Point2, Extent2)>, FilmError> {
        let grid = self.prepared_grid("tile_origins")?;
        if tile_size.area() == 0 {
            return Err(FilmError::Configuration(format!(
                "zero-area tile size {}x{}",
                tile_size.width, tile_size.height
            )));
        }
        let crop_extent = grid.crop.extent();
        let full_count = (
            crop_extent.width / tile_size.width,
            crop_extent.height / tile_size.height,
        );
        let remnant = (
            crop_extent.width % tile_size.width,
            crop_extent.height % tile_size.height,
        );

        let mut tiles = Vec::new();
        let mut push = |x_idx: usize, y_idx: usize, w: usize, h: usize| {
            tiles.push((
                Point2::new(
                    (x_idx * tile_size.width) as i32,
                    (y_idx * tile_size.height) as i32,
                ),
                Extent2::new(w, h),
            ));
        };
        for y_idx in 0..full_count.1 {
            for x_idx in 0..full_count.0 {
                push(x_idx, y_idx, tile_size.width, tile_size.height);
            }
        }
        if remnant.0 > 0 {
            for y_idx in 0..full_count.1 {
                push(full_count.0, y_idx, remnant.0, tile_size.height);
            }
        }
        if remnant.1 > 0 {
            for x_idx in 0..full_count.0 {
                push(x_idx, full_count.1, tile_size.width, remnant.1);
            }
            if remnant.0 > 0 {
                push(full_count.0, full_count.1, remnant.0, remnant.1);
            }
        }
        Ok(tiles)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::filter::{BoxFilter, TentFilter};
    use rayon::prelude::*;

    fn tent_film(width: usize, height: usize, flags: FilmFlags) -> Film {
        let mut film = Film::new();
        film.prepare(
            flags,
            Extent2::new(width, height),
            None,
            Arc::new(TentFilter::new(1.0).into()),
            0,
            &[],
        )
        .unwrap();
        film
    }

    #[test]
    fn test_single_sample_normalizes_to_raw_values() {
        // one sample at the center of pixel (2, 2), one whole-image tile
        let film = tent_film(4, 4, FilmFlags::ALPHA);
        let mut block = film
            .create_block(Point2::ORIGIN, Extent2::new(4, 4))
            .unwrap();
        block.put(
            (2.0, 2.0),
            &[1.0, 0.0, 0.0, 1.0],
            &TentFilter::new(1.0),
        );
        film.put_block(block).unwrap();

        let image = film.develop(&["R", "G", "B", "A"]).unwrap();
        assert_eq!((image.width, image.height), (4, 4));
        assert_eq!(image.pixel(2, 2), &[1.0, 0.0, 0.0, 1.0]);
        for y in 0..4 {
            for x in 0..4 {
                if (x, y) != (2, 2) {
                    assert_eq!(image.pixel(x, y), &[0.0, 0.0, 0.0, 0.0]);
                }
            }
        }
    }

    #[test]
    fn test_prepare_rejects_bad_crop() {
        let mut film = Film::new();
        let result = film.prepare(
            FilmFlags::EMPTY,
            Extent2::new(8, 8),
            Some(Bounds2::from_origin_extent(
                Point2::new(4, 4),
                Extent2::new(8, 8),
            )),
            Arc::new(BoxFilter::new(1.0).into()),
            0,
            &[],
        );
        assert!(matches!(result, Err(FilmError::Configuration(_))));
        // film stayed unprepared
        assert!(matches!(
            film.create_block(Point2::ORIGIN, Extent2::new(2, 2)),
            Err(FilmError::State { .. })
        ));
    }

    #[test]
    fn test_state_machine() {
        let mut film = tent_film(4, 4, FilmFlags::EMPTY);
        // develop before any merge is a state fault
        assert!(matches!(
            film.develop(&["R"]),
            Err(FilmError::State { .. })
        ));
        let block = film
            .create_block(Point2::ORIGIN, Extent2::new(4, 4))
            .unwrap();
        film.put_block(block).unwrap();
        film.develop(&["R"]).unwrap();
        // developed films keep accepting blocks
        let block = film
            .create_block(Point2::ORIGIN, Extent2::new(4, 4))
            .unwrap();
        film.put_block(block).unwrap();
        film.clear().unwrap();
        assert!(matches!(
            film.develop(&["R"]),
            Err(FilmError::State { .. })
        ));
        // prepare twice is a state fault
        assert!(matches!(
            film.prepare(
                FilmFlags::EMPTY,
                Extent2::new(4, 4),
                None,
                Arc::new(BoxFilter::new(1.0).into()),
                0,
                &[]
            ),
            Err(FilmError::State { .. })
        ));
    }

    #[test]
    fn test_merge_order_independent() {
        // two tiles whose filter borders overlap, merged in both orders,
        // against the union splatted through a single whole-image tile
        let samples = [
            ((1.5, 1.5), [1.0, 0.5, 0.25]),
            ((3.5, 2.0), [0.0, 2.0, 0.0]),
            ((4.5, 1.0), [0.5, 0.5, 4.0]),
            ((6.0, 3.0), [1.0, 1.0, 1.0]),
        ];
        let filter = TentFilter::new(1.0);

        let develop_split = |flip: bool| {
            let film = tent_film(8, 4, FilmFlags::EMPTY);
            let mut left = film
                .create_block(Point2::ORIGIN, Extent2::new(4, 4))
                .unwrap();
            let mut right = film
                .create_block(Point2::new(4, 0), Extent2::new(4, 4))
                .unwrap();
            for (position, values) in samples {
                if position.0 < 4.0 {
                    left.put(position, &values, &filter);
                } else {
                    right.put((position.0 - 4.0, position.1), &values, &filter);
                }
            }
            if flip {
                film.put_block(right).unwrap();
                film.put_block(left).unwrap();
            } else {
                film.put_block(left).unwrap();
                film.put_block(right).unwrap();
            }
            film.develop_all().unwrap()
        };

        let film = tent_film(8, 4, FilmFlags::EMPTY);
        let mut whole = film
            .create_block(Point2::ORIGIN, Extent2::new(8, 4))
            .unwrap();
        for (position, values) in samples {
            whole.put(position, &values, &filter);
        }
        film.put_block(whole).unwrap();
        let reference = film.develop_all().unwrap();

        let a = develop_split(false);
        let b = develop_split(true);
        assert_eq!(a.width, reference.width);
        for (lhs, rhs) in a.data.iter().zip(reference.data.iter()) {
            assert!((lhs - rhs).abs() < 1e-5, "{} != {}", lhs, rhs);
        }
        for (lhs, rhs) in a.data.iter().zip(b.data.iter()) {
            assert!((lhs - rhs).abs() < 1e-6);
        }
    }

    #[test]
    fn test_develop_idempotent() {
        let film = tent_film(6, 6, FilmFlags::ALPHA);
        let mut block = film
            .create_block(Point2::ORIGIN, Extent2::new(6, 6))
            .unwrap();
        let filter = TentFilter::new(1.0);
        block.put((2.25, 3.75), &[0.3, 0.6, 0.9, 1.0], &filter);
        block.put((4.0, 1.0), &[1.0, 0.0, 0.5, 0.5], &filter);
        film.put_block(block).unwrap();

        let first = film.develop(&["R", "G", "B", "A"]).unwrap();
        let second = film.develop(&["R", "G", "B", "A"]).unwrap();
        assert_eq!(
            first.data.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            second.data.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_develop_subset_and_unknown_channel() {
        let film = tent_film(4, 4, FilmFlags::ALPHA);
        let mut block = film
            .create_block(Point2::ORIGIN, Extent2::new(4, 4))
            .unwrap();
        block.put((1.0, 1.0), &[0.2, 0.4, 0.8, 1.0], &TentFilter::new(1.0));
        film.put_block(block).unwrap();

        let alpha_only = film.develop(&["A"]).unwrap();
        assert_eq!(alpha_only.channels.len(), 1);
        assert_eq!(alpha_only.pixel(1, 1), &[1.0]);
        assert_eq!(alpha_only.pixel(0, 0), &[0.0]); // zero weight fallback

        assert!(matches!(
            film.develop(&["Z"]),
            Err(FilmError::Configuration(_))
        ));
    }

    #[test]
    fn test_concurrent_tiled_merge_matches_serial() {
        let pattern = |x: f32, y: f32| {
            let d2 = (x - 16.0).powi(2) + (y - 8.0).powi(2);
            [
                (d2 / 7.0).cos().powi(2),
                (d2 / 13.0).sin().powi(2),
                1.0 / (1.0 + d2),
            ]
        };
        let filter = TentFilter::new(1.0);

        let render = |film: &Film, parallel: bool| {
            let tiles = film.tile_origins(Extent2::new(5, 5)).unwrap();
            let splat = |(origin, size): &(Point2, Extent2)| {
                let mut block = film.create_block(*origin, *size).unwrap();
                for y in 0..size.height {
                    for x in 0..size.width {
                        let image_x = origin.x as f32 + x as f32;
                        let image_y = origin.y as f32 + y as f32;
                        block.put(
                            (x as f32 + 0.25, y as f32 - 0.25),
                            &pattern(image_x, image_y),
                            &filter,
                        );
                    }
                }
                film.put_block(block).unwrap();
            };
            if parallel {
                tiles.par_iter().for_each(splat);
            } else {
                tiles.iter().for_each(splat);
            }
            film.develop_all().unwrap()
        };

        let serial_film = tent_film(32, 16, FilmFlags::EMPTY);
        let serial = render(&serial_film, false);
        let parallel_film = tent_film(32, 16, FilmFlags::EMPTY);
        let parallel = render(&parallel_film, true);

        assert_eq!(serial.data.len(), parallel.data.len());
        for (lhs, rhs) in serial.data.iter().zip(parallel.data.iter()) {
            assert!((lhs - rhs).abs() < 1e-5);
        }
        // interior pixels away from the crop edge saw full filter support
        assert!(serial.pixel(16, 8).iter().any(|v| *v != 0.0));
    }

    #[test]
    fn test_tile_partition_covers_crop() {
        let film = tent_film(19, 11, FilmFlags::EMPTY);
        let tiles = film.tile_origins(Extent2::new(8, 4)).unwrap();
        let mut covered = vec![0u8; 19 * 11];
        for (origin, size) in &tiles {
            for y in 0..size.height {
                for x in 0..size.width {
                    covered[(origin.y as usize + y) * 19 + origin.x as usize + x] += 1;
                }
            }
        }
        assert!(covered.iter().all(|count| *count == 1));
    }

    #[test]
    fn test_high_quality_edges_exposes_border_ring() {
        let filter = TentFilter::new(1.0);
        let splat_edge = |hq: bool| {
            let mut film = Film::new();
            film.set_high_quality_edges(hq).unwrap();
            film.prepare(
                FilmFlags::EMPTY,
                Extent2::new(4, 4),
                None,
                Arc::new(TentFilter::new(1.0).into()),
                0,
                &[],
            )
            .unwrap();
            let mut block = film
                .create_block(Point2::ORIGIN, Extent2::new(4, 4))
                .unwrap();
            // half a pixel outside the crop; its footprint straddles the edge
            block.put((-0.5, 1.0), &[1.0, 1.0, 1.0], &filter);
            film.put_block(block).unwrap();
            film
        };
        let plain = splat_edge(false);
        let hq = splat_edge(true);

        // the crop interior develops bit-identically either way: weight
        // normalization divides the per-pixel accumulation, which the ring
        // does not enter
        let plain_interior = plain.develop_all().unwrap();
        let hq_interior = hq.develop_all().unwrap();
        assert!(plain_interior.pixel(0, 1)[0] > 0.0);
        assert_eq!(plain_interior.data, hq_interior.data);

        // the ring itself is only reachable through the bordered develop:
        // without high-quality edges the out-of-crop half of the footprint
        // was discarded at merge, with them it is retained as overscan
        let plain_bordered = plain.develop_bordered(&["R"]).unwrap();
        assert_eq!(
            (plain_bordered.width, plain_bordered.height),
            (4, 4)
        );
        let hq_bordered = hq.develop_bordered(&["R"]).unwrap();
        assert_eq!((hq_bordered.width, hq_bordered.height), (6, 6));
        // ring pixel (-1, 1) in crop coordinates
        assert_eq!(hq_bordered.pixel(0, 2), &[1.0]);
        // interior pixel (0, 1) sits at bordered (1, 2) and matches develop
        assert_eq!(hq_bordered.pixel(1, 2)[0], hq_interior.pixel(0, 1)[0]);
    }

    #[test]
    fn test_spectral_film_develops_bins() {
        let mut film = Film::new();
        film.prepare(
            FilmFlags::SPECTRAL | FilmFlags::ALPHA,
            Extent2::new(2, 2),
            None,
            Arc::new(BoxFilter::new(0.0).into()),
            4,
            &[],
        )
        .unwrap();
        let mut block = film
            .create_block(Point2::ORIGIN, Extent2::new(2, 2))
            .unwrap();
        block.put(
            (1.0, 0.0),
            &[0.1, 0.2, 0.3, 0.4, 1.0],
            &BoxFilter::new(0.0),
        );
        film.put_block(block).unwrap();
        let image = film.develop(&["S02", "A"]).unwrap();
        assert_eq!(image.pixel(1, 0), &[0.3, 1.0]);
        // rgb components don't exist on a spectral film
        assert!(film.develop(&["R"]).is_err());
    }

    #[test]
    fn test_put_block_rejects_foreign_layout() {
        let film = tent_film(4, 4, FilmFlags::EMPTY);
        let other = tent_film(4, 4, FilmFlags::ALPHA);
        let block = other
            .create_block(Point2::ORIGIN, Extent2::new(4, 4))
            .unwrap();
        assert!(matches!(
            film.put_block(block),
            Err(FilmError::Configuration(_))
        ));
    }

    #[test]
    fn test_crop_window_offsets_grid() {
        let mut film = Film::new();
        film.prepare(
            FilmFlags::EMPTY,
            Extent2::new(16, 16),
            Some(Bounds2::from_origin_extent(
                Point2::new(4, 4),
                Extent2::new(8, 8),
            )),
            Arc::new(BoxFilter::new(0.0).into()),
            0,
            &[],
        )
        .unwrap();
        // block origins are crop-local: this tile is pixels (4..8)^2 of the
        // full image
        let mut block = film
            .create_block(Point2::ORIGIN, Extent2::new(4, 4))
            .unwrap();
        block.put((0.0, 0.0), &[1.0, 0.0, 0.0], &BoxFilter::new(0.0));
        film.put_block(block).unwrap();
        let image = film.develop_all().unwrap();
        assert_eq!((image.width, image.height), (8, 8));
        assert_eq!(image.pixel(0, 0), &[1.0, 0.0, 0.0]);
        // out-of-crop block placement is rejected
        assert!(film
            .create_block(Point2::new(6, 6), Extent2::new(4, 4))
            .is_err());
    }
}
