pub use crate::config::{get_settings, FilmSettings, FilterSettings};
pub use crate::error::FilmError;
pub use crate::film::{
    ChannelDescriptor, ChannelLayout, DevelopedImage, Film, FilmFlags, ImageBlock,
};
pub use crate::filter::{
    BoxFilter, FilterEnum, GaussianFilter, ReconstructionFilter, TentFilter,
};
pub use crate::math::{Bounds2, Extent2, Point2};
