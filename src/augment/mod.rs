//! # Augmentation Pipeline Module
//!
//! Two-phase augmentation protocol: spec negotiation before sampling,
//! stochastic application after sampling.
//!
//! ## Key Components
//!
//! - [`Augment`]: Stage trait (`prepare` / `apply`)
//! - [`Compose`]: Ordered stage pipeline folding both phases
//!
//! ## Available Stages
//!
//! - [`Brightness`]: Additive intensity shift (image layers)
//! - [`GaussianBlur`]: Separable 3D blur with random per-axis sigma
//! - [`SliceDrop`]: Missing-section artifact (margin-requesting)
//! - [`Duplicate`]: Repeated-section artifact (image layers)
//! - [`Occlude`]: Gaussian-bump occlusion over a foreground voxel
//! - [`Stitch`]: Discontinuous stitching seam (margin-requesting)
//! - [`Crop`]: Random translation jitter (margin-requesting, gate-free)
//!
//! ## Example
//!
//! ```ignore
//! use rustyvox::augment::{Brightness, Compose, SliceDrop};
//!
//! let pipeline = Compose::new()
//!     .add(Brightness::new(vec!["raw".into()]))
//!     .add(SliceDrop::new().max_drop(8));
//!
//! let inflated = pipeline.prepare(&base_spec)?;
//! // ... sample at the inflated spec, then:
//! let sample = pipeline.apply(sample, &mut rng)?;
//! ```

pub mod blur;
pub mod brightness;
pub mod compose;
pub mod crop;
pub mod drop;
pub mod duplicate;
pub mod occlude;
pub mod stage;
pub mod stitch;

pub use blur::GaussianBlur;
pub use brightness::Brightness;
pub use compose::Compose;
pub use crop::Crop;
pub use drop::SliceDrop;
pub use duplicate::Duplicate;
pub use occlude::Occlude;
pub use stage::{Augment, AugmentError, AugmentResult};
pub use stitch::Stitch;
