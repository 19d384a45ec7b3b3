//! # RustyVox: Volumetric Data Provider for 3D Deep Learning in Rust
//!
//! **RustyVox** feeds fixed-size 3D (and derived 4D) training samples to a
//! machine-learning training loop, drawn from co-registered volumetric
//! layers (EM image stacks, label stacks, masks), and stochastically
//! perturbs them to increase training-set diversity.
//!
//! The crate is built around two cooperating pieces:
//!
//! - the **sample provider** ([`data::VolumeDataset`]): given a per-layer
//!   FOV specification, it intersects the valid center-coordinate ranges of
//!   all layers and extracts center-aligned samples at explicit or random
//!   positions;
//! - the **augmentation pipeline** ([`augment::Compose`]): an ordered chain
//!   of stages, each negotiating extra FOV margin before sampling and
//!   stochastically transforming the extracted sample afterwards.
//!
//! ## Usage Example
//!
//! ```no_run
//! use ndarray::Array3;
//! use rustyvox::augment::{Brightness, Compose, SliceDrop};
//! use rustyvox::data::{DataProvider, SampleSpec, VolumeDatasetBuilder};
//! use rustyvox::geometry::Vec3i;
//! use rustyvox::volume::TensorVolume;
//!
//! let raw = Array3::<f32>::zeros((50, 512, 512));
//! let label = Array3::<f32>::zeros((50, 512, 512));
//!
//! let dataset = VolumeDatasetBuilder::new()
//!     .image("raw", TensorVolume::from_3d(raw, Vec3i::ZERO))
//!     .label("soma_label", TensorVolume::from_3d(label, Vec3i::ZERO))
//!     .build()
//!     .unwrap();
//!
//! let pipeline = Compose::new()
//!     .add(Brightness::new(vec!["raw".into()]))
//!     .add(SliceDrop::new().max_drop(8));
//!
//! let spec = SampleSpec::new()
//!     .with("raw", (10, 128, 128))
//!     .with("soma_label", (10, 128, 128));
//!
//! let mut provider = DataProvider::with_seed(dataset, pipeline, spec, 42).unwrap();
//! let (sample, _transforms) = provider.random_sample().unwrap();
//! assert_eq!(sample.shape("raw"), Some([1, 10, 128, 128]));
//! ```

// Declare public modules that constitute the core library API.
pub mod augment;
pub mod config;
pub mod data;
pub mod geometry;
pub mod volume;
