// src/drivers/mod.rs
// acquisition-side data path: sources, downsampling, activity aggregation
pub mod activity;
pub mod downsample;
pub mod error;
pub mod pipeline;
pub mod source;
// re-exports for the GUI and engine
pub use activity::{ActivityAggregator, ActivityConfig, ActivityReader, ActivitySnapshot, MAX_CHANNELS};
pub use downsample::{Downsampler, DEFAULT_TARGET_RATE_HZ};
pub use error::{DimensionError, GridViewerError};
pub use pipeline::{make_batch, ActivityPipeline, PumpedBlock};
pub use source::{ManualSource, SignalBatch, SignalSource, SimulatedSource};
