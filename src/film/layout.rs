use std::ops::{BitOr, BitOrAssign};

use crate::error::FilmError;

/// Capability set governing which channels a film stores.
///
/// Combinations are meaningful, so this is a bitmask rather than a
/// discriminated variant: `ALPHA | SPECIAL` is a tri-chromatic film with an
/// alpha channel and named auxiliary channels. `SPECTRAL` swaps the rgb
/// color channels for per-wavelength bins; a film is either wavelength
/// resolved or rgb, never both.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilmFlags(u32);

impl FilmFlags {
    pub const EMPTY: FilmFlags = FilmFlags(0);
    pub const ALPHA: FilmFlags = FilmFlags(1 << 0);
    pub const SPECTRAL: FilmFlags = FilmFlags(1 << 1);
    pub const SPECIAL: FilmFlags = FilmFlags(1 << 2);

    pub fn has(self, flag: FilmFlags) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl BitOr for FilmFlags {
    type Output = FilmFlags;
    fn bitor(self, rhs: FilmFlags) -> FilmFlags {
        FilmFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FilmFlags {
    fn bitor_assign(&mut self, rhs: FilmFlags) {
        self.0 |= rhs.0;
    }
}

/// One named slice of a pixel's storage. `width` is 1 for scalar channels,
/// 3 for rgb, and the bin count for a spectrum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub name: String,
    pub offset: usize,
    pub width: usize,
}

/// The ordered per-pixel channel set derived from a flag combination.
///
/// Construction is pure: the same flags, bin count, and special names always
/// yield the same layout. The layout is fixed for the lifetime of the film
/// that owns it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelLayout {
    flags: FilmFlags,
    descriptors: Vec<ChannelDescriptor>,
    // one entry per storage slot, in offset order; develop subsets resolve
    // component names against this
    components: Vec<String>,
}

impl ChannelLayout {
    pub fn new(
        flags: FilmFlags,
        spectral_bins: usize,
        special_names: &[String],
    ) -> Result<Self, FilmError> {
        let mut descriptors = Vec::new();
        let mut components: Vec<String> = Vec::new();

        if flags.has(FilmFlags::SPECTRAL) {
            if spectral_bins < 1 {
                return Err(FilmError::Configuration(format!(
                    "spectral film requires at least 1 wavelength bin, got {}",
                    spectral_bins
                )));
            }
            descriptors.push(ChannelDescriptor {
                name: "spectrum".to_string(),
                offset: 0,
                width: spectral_bins,
            });
            for bin in 0..spectral_bins {
                components.push(format!("S{:02}", bin));
            }
        } else {
            if spectral_bins != 0 {
                return Err(FilmError::Configuration(format!(
                    "{} spectral bins requested without the Spectral flag",
                    spectral_bins
                )));
            }
            descriptors.push(ChannelDescriptor {
                name: "rgb".to_string(),
                offset: 0,
                width: 3,
            });
            components.extend(["R", "G", "B"].map(String::from));
        }

        if flags.has(FilmFlags::ALPHA) {
            descriptors.push(ChannelDescriptor {
                name: "alpha".to_string(),
                offset: components.len(),
                width: 1,
            });
            components.push("A".to_string());
        }

        if flags.has(FilmFlags::SPECIAL) {
            if special_names.is_empty() {
                return Err(FilmError::Configuration(
                    "Special flag set but no channel names given".to_string(),
                ));
            }
            for name in special_names {
                if name.is_empty() {
                    return Err(FilmError::Configuration(
                        "special channel with empty name".to_string(),
                    ));
                }
                if components.iter().any(|c| c == name) {
                    return Err(FilmError::Configuration(format!(
                        "duplicate channel name {:?}",
                        name
                    )));
                }
                descriptors.push(ChannelDescriptor {
                    name: name.clone(),
                    offset: components.len(),
                    width: 1,
                });
                components.push(name.clone());
            }
        } else if !special_names.is_empty() {
            return Err(FilmError::Configuration(format!(
                "{} special channel names given without the Special flag",
                special_names.len()
            )));
        }

        Ok(ChannelLayout {
            flags,
            descriptors,
            components,
        })
    }

    pub fn flags(&self) -> FilmFlags {
        self.flags
    }

    /// Total per-pixel storage width, excluding the shared weight slot.
    pub fn width(&self) -> usize {
        self.components.len()
    }

    pub fn descriptors(&self) -> &[ChannelDescriptor] {
        &self.descriptors
    }

    /// Component names in storage order (`R G B`, `S00..`, `A`, specials).
    pub fn component_names(&self) -> &[String] {
        &self.components
    }

    pub fn component_offset(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c == name)
    }
}
