//! AI provenance detection for images: an ordered cascade of independent rules, the first
//! one that fires wins.

mod detector;

pub use detector::{
    detect, filename_signal, split_sd_parameters, Detection, SdParameters, GENERATOR_DALLE,
    GENERATOR_FILENAME, GENERATOR_GENERIC, GENERATOR_MIDJOURNEY, GENERATOR_STABLE_DIFFUSION,
};
