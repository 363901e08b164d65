//! # ts-observing
//!
//! Validated data model for observing blocks: ordered sequences of
//! observing scripts paired with the scheduling constraints (airmass, sky
//! and Moon brightness, Moon distance, cloud extinction, seeing) under which
//! they may run.
//!
//! This crate only describes and validates blocks. Scheduling, script
//! execution and persistence belong to the consumers of the serialized form.
//!
//! ## Architecture
//!
//! - [`models`]: constraint variants, the [`SchedulingConstraint`] union,
//!   [`ObservingScript`] and [`ObservingBlock`]
//! - [`config`]: validation settings from `observing.toml` or the environment
//! - [`error`]: [`ValidationError`] and the crate-wide [`ObservingError`]
//!
//! ## Wire format
//!
//! Blocks serialize to JSON with constraints tagged by `kind`:
//!
//! ```json
//! {
//!   "name": "OBS-123",
//!   "id": "6f1a1c2e-8d4b-4a53-9a57-3f8f2b9c1d10",
//!   "program": "SITCOM-456",
//!   "constraints": [{"kind": "airmass", "max": 1.5}],
//!   "scripts": [{"name": "slew", "standard": true, "parameters": {"target": "W48"}}]
//! }
//! ```
//!
//! Decoding dispatches on `kind` and runs the same validation as the
//! constructors, so a decoded block never holds an out-of-range value.

pub mod config;
pub mod error;
pub mod models;

pub use config::{ExtraFieldPolicy, ObservingConfig, ValidationSettings};
pub use error::{ObservingError, Result, ValidationError};
pub use models::{
    AirmassConstraint, Band, Bound, CloudExtinctionConstraint, ConstraintKind,
    MoonBrightnessConstraint, MoonDistanceConstraint, ObservingBlock, ObservingBlockBuilder,
    ObservingScript, SchedulingConstraint, SeeingConstraint, SkyBrightnessConstraint,
};
