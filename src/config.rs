use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use crate::error::FilmError;
use crate::film::{Film, FilmFlags};
use crate::filter::{BoxFilter, FilterEnum, GaussianFilter, TentFilter};
use crate::math::{Bounds2, Extent2, Point2};

#[derive(Deserialize, Copy, Clone)]
pub struct Resolution {
    pub width: usize,
    pub height: usize,
}

#[derive(Deserialize, Copy, Clone)]
pub struct CropWindow {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
}

#[derive(Deserialize, Copy, Clone)]
#[serde(tag = "type")]
pub enum FilterSettings {
    Box { radius: f32 },
    Tent { radius: f32 },
    Gaussian { radius: f32, alpha: Option<f32> },
}

pub fn parse_filter(settings: FilterSettings) -> FilterEnum {
    match settings {
        FilterSettings::Box { radius } => BoxFilter::new(radius).into(),
        FilterSettings::Tent { radius } => TentFilter::new(radius).into(),
        FilterSettings::Gaussian { radius, alpha } => {
            GaussianFilter::new(radius, alpha.unwrap_or(2.0)).into()
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct TOMLFilmSettings {
    pub filename: Option<String>,
    pub resolution: Resolution,
    pub crop: Option<CropWindow>,
    pub flags: Option<Vec<String>>,
    pub spectral_bins: Option<usize>,
    pub special_channels: Option<Vec<String>>,
    pub filter: FilterSettings,
    pub high_quality_edges: Option<bool>,
    pub warn_negative: Option<bool>,
    pub tile_size: Option<(usize, usize)>,
    pub threads: Option<u16>,
}

#[derive(Clone)]
pub struct FilmSettings {
    pub filename: Option<String>,
    pub resolution: Extent2,
    pub crop: Option<Bounds2>,
    pub flags: FilmFlags,
    pub spectral_bins: usize,
    pub special_channels: Vec<String>,
    pub filter: FilterSettings,
    pub high_quality_edges: bool,
    pub warn_negative: bool,
    pub tile_size: Extent2,
    pub threads: u16,
}

impl TryFrom<TOMLFilmSettings> for FilmSettings {
    type Error = FilmError;

    fn try_from(data: TOMLFilmSettings) -> Result<Self, FilmError> {
        let mut flags = FilmFlags::EMPTY;
        for name in data.flags.unwrap_or_default() {
            flags |= match name.to_lowercase().as_str() {
                "alpha" => FilmFlags::ALPHA,
                "spectral" => FilmFlags::SPECTRAL,
                "special" => FilmFlags::SPECIAL,
                other => {
                    return Err(FilmError::Configuration(format!(
                        "unknown film flag {:?}",
                        other
                    )));
                }
            };
        }
        let tile_size = data.tile_size.unwrap_or((64, 64));
        Ok(FilmSettings {
            filename: data.filename,
            resolution: Extent2::new(data.resolution.width, data.resolution.height),
            crop: data.crop.map(|c| {
                Bounds2::from_origin_extent(Point2::new(c.x, c.y), Extent2::new(c.width, c.height))
            }),
            flags,
            spectral_bins: data.spectral_bins.unwrap_or(0),
            special_channels: data.special_channels.unwrap_or_default(),
            filter: data.filter,
            high_quality_edges: data.high_quality_edges.unwrap_or(false),
            warn_negative: data.warn_negative.unwrap_or(false),
            tile_size: Extent2::new(tile_size.0, tile_size.1),
            threads: data.threads.unwrap_or(num_cpus::get() as u16),
        })
    }
}

impl FilmSettings {
    /// Construct a prepared film from these settings.
    pub fn build_film(&self) -> Result<Film, FilmError> {
        let mut film = Film::new();
        film.set_high_quality_edges(self.high_quality_edges)?;
        film.set_warn_negative(self.warn_negative);
        film.prepare(
            self.flags,
            self.resolution,
            self.crop,
            Arc::new(parse_filter(self.filter)),
            self.spectral_bins,
            &self.special_channels,
        )?;
        Ok(film)
    }
}

pub fn get_settings<P: AsRef<Path>>(filepath: P) -> anyhow::Result<FilmSettings> {
    let mut input = String::new();
    File::open(filepath.as_ref())
        .and_then(|mut f| f.read_to_string(&mut input))
        .with_context(|| format!("couldn't read {}", filepath.as_ref().display()))?;
    let settings: TOMLFilmSettings = toml::from_str(&input)?;
    Ok(FilmSettings::try_from(settings)?)
}
