use std::time::Duration;
use crate::drivers::activity::{ActivityAggregator, ActivityConfig, ActivityReader, ActivitySnapshot};
use crate::drivers::downsample::Downsampler;
use crate::drivers::error::GridViewerError;
use crate::drivers::source::{SignalBatch, SignalSource};
use crate::types::StreamInfo;
use std::sync::Arc;
/// Outcome of one pulled block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PumpedBlock {
    pub settled: usize,
    pub duration: Duration,
}
/// Acquisition-side data path for one stream: source -> downsampler -> aggregator.
pub struct ActivityPipeline<S: SignalSource> {
    source: S,
    stream: StreamInfo,
    downsampler: Downsampler,
    aggregator: ActivityAggregator,
}
impl<S: SignalSource> ActivityPipeline<S> {
    pub fn new(
        source: S,
        stream: StreamInfo,
        update_interval: usize,
        target_rate_hz: f32,
    ) -> Result<Self, GridViewerError> {
        let config = ActivityConfig::for_stream(&stream, update_interval)?;
        let downsampler = Downsampler::for_rates(stream.sample_rate_hz, target_rate_hz)?;
        log::debug!(
            "pipeline for '{}': {} of {} channels, skip {}",
            stream.name,
            config.num_channels(),
            stream.channel_count,
            downsampler.skip()
        );
        Ok(Self {
            source,
            stream,
            downsampler,
            aggregator: ActivityAggregator::new(config),
        })
    }
    pub fn stream(&self) -> &StreamInfo {
        &self.stream
    }
    pub fn num_channels(&self) -> usize {
        self.aggregator.config().num_channels()
    }
    pub fn skip(&self) -> usize {
        self.downsampler.skip()
    }
    pub fn reader(&self) -> ActivityReader {
        self.aggregator.reader()
    }
    /// Pulls one batch from the source, or None if the source was empty.
    pub fn pump_once(&mut self) -> Result<Option<PumpedBlock>, GridViewerError> {
        let Some(batch) = self.source.next_batch()? else {
            return Ok(None);
        };
        let settled = self.push_batch(&batch)?;
        Ok(Some(PumpedBlock {
            settled,
            duration: batch.duration(),
        }))
    }
    /// Native-rate samples per second reaching the aggregator after the skip.
    pub fn effective_rate_hz(&self) -> f32 {
        self.downsampler.effective_rate_hz(self.stream.sample_rate_hz)
    }
    pub fn push_batch(&mut self, batch: &SignalBatch) -> Result<usize, GridViewerError> {
        batch.validate()?;
        if batch.num_channels() != self.stream.channel_count {
            return Err(GridViewerError::ChannelMismatch {
                expected: self.stream.channel_count,
                actual: batch.num_channels(),
            });
        }
        let tracked = &batch.samples[..batch.num_channels().min(self.num_channels())];
        let mut settled = 0;
        for step in 0..batch.time_steps() {
            if !self.downsampler.keep() {
                continue;
            }
            for (channel, samples) in tracked.iter().enumerate() {
                if let Some(&sample) = samples.get(step) {
                    self.aggregator.add_sample(sample, channel);
                }
            }
            if self.aggregator.end_time_step() {
                settled += 1;
            }
        }
        Ok(settled)
    }
    pub fn latest_values(&self) -> Arc<ActivitySnapshot> {
        self.aggregator.peak_to_peak_values()
    }
    /// Clears the aggregator and realigns the skip phase; used on acquisition start/stop.
    pub fn reset(&mut self) {
        self.downsampler.reset();
        self.aggregator.reset();
    }
}
/// Lightweight helper to produce a batch from owned sample data.
pub fn make_batch(sample_rate_hz: f32, samples: Vec<Vec<f32>>) -> SignalBatch {
    SignalBatch {
        sample_rate_hz,
        samples,
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::activity::MAX_CHANNELS;
    use crate::drivers::source::{ManualSource, SimulatedSource};
    fn stream(rate: f32, channels: usize) -> StreamInfo {
        StreamInfo::new(0, "test", rate, channels)
    }
    #[test]
    fn pipeline_settles_peak_to_peak() {
        let batch = make_batch(500.0, vec![vec![1.0, 5.0, 1.0, 5.0], vec![2.0; 4]]);
        let source = ManualSource::new(vec![batch]);
        let mut pipeline = ActivityPipeline::new(source, stream(500.0, 2), 4, 500.0).unwrap();
        let block = pipeline.pump_once().unwrap().unwrap();
        assert_eq!(block.settled, 1);
        assert_eq!(block.duration, Duration::from_secs_f32(4.0 / 500.0));
        assert_eq!(pipeline.latest_values().values(), &[4.0, 0.0]);
        assert_eq!(pipeline.pump_once().unwrap(), None);
    }
    #[test]
    fn downsampling_drops_skipped_steps() {
        // skip = 2: steps 0, 2, 4 reach the aggregator.
        let batch = make_batch(1000.0, vec![vec![0.0, 100.0, 1.0, 100.0, 3.0, 100.0]]);
        let mut pipeline =
            ActivityPipeline::new(ManualSource::new(vec![]), stream(1000.0, 1), 3, 500.0).unwrap();
        assert_eq!(pipeline.skip(), 2);
        assert_eq!(pipeline.effective_rate_hz(), 500.0);
        assert_eq!(pipeline.push_batch(&batch).unwrap(), 1);
        assert_eq!(pipeline.latest_values().values(), &[3.0]);
    }
    #[test]
    fn window_spans_batches() {
        let mut pipeline =
            ActivityPipeline::new(ManualSource::new(vec![]), stream(500.0, 1), 4, 500.0).unwrap();
        assert_eq!(pipeline.push_batch(&make_batch(500.0, vec![vec![-1.0, 0.0]])).unwrap(), 0);
        assert_eq!(pipeline.push_batch(&make_batch(500.0, vec![vec![0.0, 6.0]])).unwrap(), 1);
        assert_eq!(pipeline.latest_values().values(), &[7.0]);
    }
    #[test]
    fn rejects_wrong_channel_count() {
        let mut pipeline =
            ActivityPipeline::new(ManualSource::new(vec![]), stream(500.0, 3), 4, 500.0).unwrap();
        let err = pipeline.push_batch(&make_batch(500.0, vec![vec![0.0]])).unwrap_err();
        assert!(matches!(
            err,
            GridViewerError::ChannelMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }
    #[test]
    fn oversized_stream_tracks_only_the_cap() {
        let info = stream(500.0, 5000);
        let source = SimulatedSource::seeded(info.clone(), 10, 3);
        let mut pipeline = ActivityPipeline::new(source, info, 10, 500.0).unwrap();
        assert_eq!(pipeline.num_channels(), MAX_CHANNELS);
        assert_eq!(pipeline.pump_once().unwrap().map(|b| b.settled), Some(1));
        assert_eq!(pipeline.latest_values().len(), MAX_CHANNELS);
    }
    #[test]
    fn reset_clears_published_values() {
        let batch = make_batch(500.0, vec![vec![0.0, 9.0]]);
        let mut pipeline =
            ActivityPipeline::new(ManualSource::new(vec![]), stream(500.0, 1), 2, 500.0).unwrap();
        pipeline.push_batch(&batch).unwrap();
        assert_eq!(pipeline.latest_values().values(), &[9.0]);
        pipeline.reset();
        assert_eq!(pipeline.latest_values().values(), &[0.0]);
        assert!(!pipeline.latest_values().is_settled());
    }
}
