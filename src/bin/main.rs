extern crate rust_film as root;

use root::prelude::*;

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use structopt::StructOpt;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, StructOpt)]
#[structopt(rename_all = "kebab-case")]
struct Opt {
    #[structopt(long, default_value = "data/film.toml")]
    pub config_file: String,
    #[structopt(short, long, default_value = "output/pattern.png")]
    pub output: PathBuf,
    #[structopt(short, long, default_value = "16")]
    pub samples: u32,
    #[structopt(short = "ll", long, default_value = "warn")]
    pub log_level: String,
}

fn parse_log_level(level: &str, default: LevelFilter) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => default,
    }
}

// synthetic diffraction-ring test pattern; enough structure to make filter
// and tile-seam bugs visible in the output
fn sample_values(layout: &ChannelLayout, x: f32, y: f32, center: (f32, f32)) -> Vec<f32> {
    let d2 = (x - center.0).powi(2) + (y - center.1).powi(2);
    let falloff = 1.0 / (1.0 + 0.002 * d2);
    layout
        .component_names()
        .iter()
        .map(|name| match name.as_str() {
            "R" => falloff * (d2 / 610.0).cos().powi(2),
            "G" => falloff * (d2 / 540.0).cos().powi(2),
            "B" => falloff * (d2 / 470.0).cos().powi(2),
            "A" => 1.0,
            name if name.starts_with('S') => {
                let bin: u32 = name[1..].parse().unwrap_or(0);
                falloff * (d2 / (400.0 + 20.0 * bin as f32)).cos().powi(2)
            }
            _ => d2.sqrt(),
        })
        .collect()
}

fn render(film: &Film, settings: &FilmSettings, samples_per_pixel: u32) {
    let filter = film.filter().unwrap().clone();
    let layout = film.layout().unwrap().clone();
    let crop_extent = film.crop_window().unwrap().extent();
    let center = (
        crop_extent.width as f32 / 2.0,
        crop_extent.height as f32 / 2.0,
    );

    let tiles = film.tile_origins(settings.tile_size).unwrap();
    info!("rendering {} tiles", tiles.len());
    tiles.par_iter().for_each(|(origin, size)| {
        let mut block = film
            .create_block(*origin, *size)
            .expect("tile_origins produced an out-of-crop tile");
        for y in 0..size.height {
            for x in 0..size.width {
                for _ in 0..samples_per_pixel {
                    let jitter_x = rand::random::<f32>() - 0.5;
                    let jitter_y = rand::random::<f32>() - 0.5;
                    let local = (x as f32 + jitter_x, y as f32 + jitter_y);
                    let image_x = origin.x as f32 + local.0;
                    let image_y = origin.y as f32 + local.1;
                    let values = sample_values(&layout, image_x, image_y, center);
                    block.put(local, &values, filter.as_ref());
                }
            }
        }
        if block.rejected() > 0 {
            warn!("tile at {:?} dropped {} samples", origin, block.rejected());
        }
        film.put_block(block)
            .expect("film rejected one of its own blocks");
    });
}

fn write_png(image: &DevelopedImage, path: &PathBuf) -> anyhow::Result<()> {
    // map the first three developed components to rgb; a single-bin
    // spectral film comes out greyscale
    let mut img: image::RgbImage = image::ImageBuffer::new(image.width as u32, image.height as u32);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let source = image.pixel(x as usize, y as usize);
        let channel = |i: usize| {
            let v = source.get(i).or_else(|| source.first()).copied().unwrap_or(0.0);
            (v.clamp(0.0, 1.0) * 255.0) as u8
        };
        *pixel = image::Rgb([channel(0), channel(1), channel(2)]);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path)?;
    Ok(())
}

fn main() {
    let opts = Opt::from_args();
    tracing_subscriber::fmt()
        .with_max_level(parse_log_level(&opts.log_level, LevelFilter::WARN))
        .init();

    let settings = match get_settings(&opts.config_file) {
        Ok(settings) => settings,
        Err(v) => {
            error!("couldn't read {}, {:?}", opts.config_file, v);
            return;
        }
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(settings.threads as usize)
        .build_global()
        .unwrap();

    let film = match settings.build_film() {
        Ok(film) => film,
        Err(v) => {
            error!("invalid film configuration: {}", v);
            return;
        }
    };
    let crop_extent = film.crop_window().unwrap().extent();
    println!(
        "rendering test pattern at {}x{}, {} samples per pixel, {} threads",
        crop_extent.width, crop_extent.height, opts.samples, settings.threads
    );

    let now = Instant::now();
    render(&film, &settings, opts.samples);
    let elapsed = (now.elapsed().as_millis() as f32) / 1000.0;
    println!("took {}s", elapsed);

    let image = match film.develop_all() {
        Ok(image) => image,
        Err(v) => {
            error!("develop failed: {}", v);
            return;
        }
    };
    if let Err(v) = write_png(&image, &opts.output) {
        error!("failed to write {}: {:?}", opts.output.display(), v);
        return;
    }
    println!("saved {}", opts.output.display());
}
