use std::sync::Arc;
use arc_swap::ArcSwap;
use crate::drivers::GridViewerError;
use crate::types::StreamInfo;
/// Hard cap on the number of channels tracked per stream.
pub const MAX_CHANNELS: usize = 4096;
/// Shape of one aggregator. Built once per stream; a new stream means a new aggregator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivityConfig {
    num_channels: usize,
    update_interval: usize,
}
impl ActivityConfig {
    /// `requested_channels` above [`MAX_CHANNELS`] is clamped; the excess is not tracked.
    pub fn new(requested_channels: usize, update_interval: usize) -> Result<Self, GridViewerError> {
        if update_interval == 0 {
            return Err(GridViewerError::InvalidUpdateInterval);
        }
        let num_channels = requested_channels.min(MAX_CHANNELS);
        if num_channels < requested_channels {
            log::debug!(
                "clamping {requested_channels} channels to the {MAX_CHANNELS} channel limit"
            );
        }
        Ok(Self {
            num_channels,
            update_interval,
        })
    }
    pub fn for_stream(stream: &StreamInfo, update_interval: usize) -> Result<Self, GridViewerError> {
        Self::new(stream.channel_count, update_interval)
    }
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }
    pub fn update_interval(&self) -> usize {
        self.update_interval
    }
}
/// Peak-to-peak values of one completed window. Never mutated once published.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivitySnapshot {
    sequence: u64,
    settled: bool,
    peak_to_peak: Vec<f32>,
}
impl ActivitySnapshot {
    fn neutral(num_channels: usize) -> Self {
        Self {
            sequence: 0,
            settled: false,
            peak_to_peak: vec![0.0; num_channels],
        }
    }
    /// Increases by one with every publish (settle or reset) of the owning aggregator.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
    /// False for the all-zero snapshot shown before the first window completes.
    pub fn is_settled(&self) -> bool {
        self.settled
    }
    pub fn values(&self) -> &[f32] {
        &self.peak_to_peak
    }
    pub fn get(&self, channel: usize) -> Option<f32> {
        self.peak_to_peak.get(channel).copied()
    }
    pub fn len(&self) -> usize {
        self.peak_to_peak.len()
    }
    pub fn is_empty(&self) -> bool {
        self.peak_to_peak.is_empty()
    }
}
/// Read side handed to the render tick. Cloning is cheap and loads never block the producer.
#[derive(Clone)]
pub struct ActivityReader {
    shared: Arc<ArcSwap<ActivitySnapshot>>,
}
impl ActivityReader {
    pub fn latest_values(&self) -> Arc<ActivitySnapshot> {
        self.shared.load_full()
    }
}
impl std::fmt::Debug for ActivityReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.shared.load();
        f.debug_struct("ActivityReader")
            .field("sequence", &current.sequence)
            .field("channels", &current.len())
            .finish()
    }
}
/// Reduces a per-channel sample stream to one peak-to-peak value per channel and window.
///
/// Owned by the acquisition thread. `add_sample` only touches the extrema arrays;
/// the settle step writes a fresh snapshot and publishes it with a single atomic swap,
/// so readers see either the previous window or the new one, never a mix.
pub struct ActivityAggregator {
    config: ActivityConfig,
    min_values: Vec<f32>,
    max_values: Vec<f32>,
    counter: usize,
    sequence: u64,
    dropped_samples: u64,
    published: Arc<ArcSwap<ActivitySnapshot>>,
    spare: Option<Arc<ActivitySnapshot>>,
}
impl ActivityAggregator {
    pub fn new(config: ActivityConfig) -> Self {
        let channels = config.num_channels();
        Self {
            config,
            min_values: vec![f32::INFINITY; channels],
            max_values: vec![f32::NEG_INFINITY; channels],
            counter: 0,
            sequence: 0,
            dropped_samples: 0,
            published: Arc::new(ArcSwap::from_pointee(ActivitySnapshot::neutral(channels))),
            spare: None,
        }
    }
    pub fn config(&self) -> ActivityConfig {
        self.config
    }
    pub fn reader(&self) -> ActivityReader {
        ActivityReader {
            shared: Arc::clone(&self.published),
        }
    }
    /// Time steps accumulated in the current window.
    pub fn window_progress(&self) -> usize {
        self.counter
    }
    /// Folds one sample into the running extrema of `channel`.
    ///
    /// The caller guarantees `channel < num_channels`. Debug builds assert it; release
    /// builds drop the sample and report the count at the next settle.
    #[inline]
    pub fn add_sample(&mut self, sample: f32, channel: usize) {
        debug_assert!(
            channel < self.config.num_channels,
            "channel {channel} out of range for {} channels",
            self.config.num_channels
        );
        match (
            self.min_values.get_mut(channel),
            self.max_values.get_mut(channel),
        ) {
            (Some(min), Some(max)) => {
                // f32::min/max ignore NaN, so non-finite garbage never poisons a window.
                *min = min.min(sample);
                *max = max.max(sample);
            }
            _ => self.dropped_samples += 1,
        }
    }
    /// Closes one time step across all channels. Returns true if this step settled a window.
    pub fn end_time_step(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.config.update_interval {
            self.settle();
            true
        } else {
            false
        }
    }
    /// One sample per channel for a single time step. Values past the tracked channel count are ignored.
    pub fn add_frame(&mut self, frame: &[f32]) -> bool {
        for (channel, &sample) in frame.iter().take(self.config.num_channels).enumerate() {
            self.add_sample(sample, channel);
        }
        self.end_time_step()
    }
    /// Most recently settled window, or all zeros if none completed since construction or reset.
    pub fn peak_to_peak_values(&self) -> Arc<ActivitySnapshot> {
        self.published.load_full()
    }
    /// Re-arms all extrema and publishes the neutral snapshot. Configuration is untouched.
    pub fn reset(&mut self) {
        self.clear_window();
        self.dropped_samples = 0;
        self.publish(false);
    }
    fn settle(&mut self) {
        if self.dropped_samples > 0 {
            log::warn!(
                "dropped {} samples addressed past channel {}",
                self.dropped_samples,
                self.config.num_channels
            );
            self.dropped_samples = 0;
        }
        self.publish(true);
        self.clear_window();
    }
    fn clear_window(&mut self) {
        self.min_values.fill(f32::INFINITY);
        self.max_values.fill(f32::NEG_INFINITY);
        self.counter = 0;
    }
    fn publish(&mut self, settled: bool) {
        self.sequence += 1;
        let channels = self.config.num_channels;
        let mut next = self
            .spare
            .take()
            .unwrap_or_else(|| Arc::new(ActivitySnapshot::neutral(channels)));
        if Arc::get_mut(&mut next).is_none() {
            // A reader still holds the snapshot from two windows ago.
            next = Arc::new(ActivitySnapshot::neutral(channels));
        }
        if let Some(snapshot) = Arc::get_mut(&mut next) {
            snapshot.sequence = self.sequence;
            snapshot.settled = settled;
            if settled {
                let extrema = self.min_values.iter().zip(&self.max_values);
                for (out, (min, max)) in snapshot.peak_to_peak.iter_mut().zip(extrema) {
                    // Channels without samples this window still hold the sentinels.
                    *out = if max >= min { max - min } else { 0.0 };
                }
            } else {
                snapshot.peak_to_peak.fill(0.0);
            }
        }
        self.spare = Some(self.published.swap(next));
    }
}
