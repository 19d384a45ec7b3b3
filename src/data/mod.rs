//! # Data Provider Module
//!
//! Sample provider core: registry of co-registered volumetric layers,
//! per-layer FOV specification and center-aligned sample extraction.
//!
//! ## Key Components
//!
//! - [`SampleSpec`]: Layer name → required FOV, lexicographically ordered
//! - [`Sample`]: One training example (center-aligned patch per layer)
//! - [`VolumeDataset`]: Valid-range bookkeeping and sample extraction
//! - [`DataProvider`]: Dataset + augmentation pipeline + seeded RNG
//!
//! ## Example
//!
//! ```ignore
//! use rustyvox::data::{DataProvider, SampleSpec, VolumeDatasetBuilder};
//!
//! let dataset = VolumeDatasetBuilder::new()
//!     .image("raw", raw_volume)
//!     .label("soma_label", label_volume)
//!     .build()?;
//!
//! let spec = SampleSpec::new()
//!     .with("raw", (10, 128, 128))
//!     .with("soma_label", (10, 128, 128));
//!
//! let mut provider = DataProvider::with_seed(dataset, pipeline, spec, 42)?;
//! let (sample, transforms) = provider.random_sample()?;
//! ```

pub mod dataset;
pub mod feeder;
pub mod sample;
pub mod spec;

pub use dataset::{DatasetError, DatasetResult, LayerRole, VolumeDataset, VolumeDatasetBuilder};
pub use feeder::{DataProvider, ProviderError, ProviderResult};
pub use sample::{Sample, TransformMap};
pub use spec::SampleSpec;
