//! Media normalization.
//!
//! Turns whatever a sticker source provides (stills, animated WebP/GIF,
//! videos, gzipped vector animations) into a still PNG or an animated GIF no
//! larger than 256 px on either side.

pub mod alpha;
pub mod diagnostics;
pub mod error;
pub mod frames;
pub mod normalizer;
pub mod raster;
pub mod resize;
pub mod sniff;

pub use diagnostics::{capture_failed_input, DiagnosticArtifact};
pub use error::NormalizeError;
pub use frames::{AnimationMeta, Disposal, FrameMeta, LoopCount};
pub use normalizer::{NormalizeFailure, NormalizedMedia, Normalizer};
pub use raster::{ANIMATED_MIMETYPE, STILL_MIMETYPE};
pub use resize::{fit_within, MAX_STICKER_SIZE};
pub use sniff::{sniff_mimetype, MediaCategory};
