use std::collections::VecDeque;
use std::time::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::drivers::GridViewerError;
use crate::types::StreamInfo;
/// Single block of multi-channel samples from one stream.
#[derive(Clone, Debug)]
pub struct SignalBatch {
    pub sample_rate_hz: f32,
    pub samples: Vec<Vec<f32>>, // channels x samples
}
impl SignalBatch {
    pub fn validate(&self) -> Result<(), GridViewerError> {
        if self.sample_rate_hz <= 0.0 {
            return Err(GridViewerError::InvalidSampleRate);
        }
        Ok(())
    }
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }
    /// Longest channel in the block; shorter channels simply have no sample for the tail steps.
    pub fn time_steps(&self) -> usize {
        self.samples.iter().map(|c| c.len()).max().unwrap_or(0)
    }
    /// Wall-clock time the block covers at its sample rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.time_steps() as f32 / self.sample_rate_hz)
    }
}
/// Trait representing something that can yield signal batches on demand.
pub trait SignalSource {
    fn next_batch(&mut self) -> Result<Option<SignalBatch>, GridViewerError>;
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<SignalBatch>,
}
impl ManualSource {
    pub fn new(batches: impl IntoIterator<Item = SignalBatch>) -> Self {
        Self {
            queue: batches.into_iter().collect(),
        }
    }
}
impl SignalSource for ManualSource {
    fn next_batch(&mut self) -> Result<Option<SignalBatch>, GridViewerError> {
        Ok(self.queue.pop_front())
    }
}
/// Stand-in for acquisition hardware: broadband noise whose per-channel amplitude wanders.
pub struct SimulatedSource {
    stream: StreamInfo,
    block_size: usize,
    amplitudes: Vec<f32>,
    rng: StdRng,
}
impl SimulatedSource {
    const MAX_AMPLITUDE_UV: f32 = 120.0;
    pub fn new(stream: StreamInfo, block_size: usize) -> Self {
        Self::with_rng(stream, block_size, StdRng::from_entropy())
    }
    pub fn seeded(stream: StreamInfo, block_size: usize, seed: u64) -> Self {
        Self::with_rng(stream, block_size, StdRng::seed_from_u64(seed))
    }
    fn with_rng(stream: StreamInfo, block_size: usize, mut rng: StdRng) -> Self {
        let amplitudes = (0..stream.channel_count)
            .map(|_| rng.gen_range(0.0..Self::MAX_AMPLITUDE_UV))
            .collect();
        Self {
            stream,
            block_size: block_size.max(1),
            amplitudes,
            rng,
        }
    }
}
impl SignalSource for SimulatedSource {
    fn next_batch(&mut self) -> Result<Option<SignalBatch>, GridViewerError> {
        if self.stream.sample_rate_hz <= 0.0 {
            return Err(GridViewerError::InvalidSampleRate);
        }
        let mut samples = Vec::with_capacity(self.amplitudes.len());
        for amplitude in &mut self.amplitudes {
            *amplitude = (*amplitude + self.rng.gen_range(-4.0..4.0)).clamp(0.0, Self::MAX_AMPLITUDE_UV);
            let amp = *amplitude;
            let channel: Vec<f32> = (0..self.block_size)
                .map(|_| self.rng.gen_range(-1.0f32..=1.0) * amp)
                .collect();
            samples.push(channel);
        }
        Ok(Some(SignalBatch {
            sample_rate_hz: self.stream.sample_rate_hz,
            samples,
        }))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn simulated_batches_match_stream_shape() {
        let stream = StreamInfo::new(1, "sim", 1000.0, 5);
        let mut source = SimulatedSource::seeded(stream, 32, 7);
        let batch = source.next_batch().unwrap().unwrap();
        batch.validate().unwrap();
        assert_eq!(batch.num_channels(), 5);
        assert_eq!(batch.time_steps(), 32);
        let bound = SimulatedSource::MAX_AMPLITUDE_UV;
        assert!(batch.samples.iter().flatten().all(|v| v.abs() <= bound));
    }
    #[test]
    fn ragged_batch_reports_longest_channel() {
        let batch = SignalBatch {
            sample_rate_hz: 100.0,
            samples: vec![vec![0.0; 10], vec![0.0; 4]],
        };
        assert_eq!(batch.time_steps(), 10);
        assert_eq!(batch.duration(), Duration::from_secs_f32(0.1));
    }
    #[test]
    fn manual_source_drains_in_order() {
        let make = |rate| SignalBatch {
            sample_rate_hz: rate,
            samples: vec![],
        };
        let mut source = ManualSource::new(vec![make(1.0), make(2.0)]);
        assert_eq!(source.next_batch().unwrap().unwrap().sample_rate_hz, 1.0);
        assert_eq!(source.next_batch().unwrap().unwrap().sample_rate_hz, 2.0);
        assert!(source.next_batch().unwrap().is_none());
    }
}
