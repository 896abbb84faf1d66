//! # mf-pipeline
//!
//! The batch conversion pipeline.
//!
//! This crate provides:
//!
//! - **[`Worklist`]** -- ordered, deduplicated pending jobs with the
//!   "first file decides the kind" policy and change notifications.
//! - **[`ProgressReporter`]** -- thread-safe completed/total counter that
//!   emits monotonic percentages to subscribers.
//! - **[`Converter`]** trait and **[`ConverterRegistry`]** -- one pluggable
//!   converter per media kind.
//! - **[`Dispatcher`]** -- runs a batch with bounded concurrency and
//!   aggregates per-job failures into a [`BatchResult`].
//! - **[`default_registry`]** -- factory binding the mf-av backends to their
//!   media kinds.

pub mod converter;
pub mod converters;
pub mod dispatcher;
pub mod observer;
pub mod progress;
pub mod worklist;

// Re-export key types at the crate root.
pub use converter::{Converter, ConverterRegistry};
pub use converters::{default_registry, AudioConverter, ImageConverter, VideoConverter};
pub use dispatcher::{
    check_output_folder, output_path_for, BatchResult, ConversionOutcome, Dispatcher, JobFailure,
};
pub use observer::SubscriptionId;
pub use progress::{ProgressReporter, ProgressUpdate};
pub use worklist::{identity_key, AddOutcome, AddReport, ConfirmClear, Job, KindSelection, Worklist};
