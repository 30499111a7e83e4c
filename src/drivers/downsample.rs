use crate::drivers::GridViewerError;
/// Effective rate the activity display is fed at, regardless of the native rate.
pub const DEFAULT_TARGET_RATE_HZ: f32 = 500.0;
/// Keeps every `skip`-th time step. The phase carries across blocks.
#[derive(Clone, Debug)]
pub struct Downsampler {
    skip: usize,
    counter: usize,
}
impl Downsampler {
    pub fn with_skip(skip: usize) -> Self {
        Self {
            skip: skip.max(1),
            counter: 0,
        }
    }
    /// `skip = max(1, floor(native / target))`.
    pub fn for_rates(native_rate_hz: f32, target_rate_hz: f32) -> Result<Self, GridViewerError> {
        if native_rate_hz <= 0.0 || target_rate_hz <= 0.0 {
            return Err(GridViewerError::InvalidSampleRate);
        }
        let skip = (native_rate_hz / target_rate_hz).floor() as usize;
        Ok(Self::with_skip(skip))
    }
    pub fn skip(&self) -> usize {
        self.skip
    }
    pub fn effective_rate_hz(&self, native_rate_hz: f32) -> f32 {
        native_rate_hz / self.skip as f32
    }
    #[inline]
    pub fn keep(&mut self) -> bool {
        let keep = self.counter == 0;
        self.counter += 1;
        if self.counter == self.skip {
            self.counter = 0;
        }
        keep
    }
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn skip_targets_five_hundred_hz() {
        let d = Downsampler::for_rates(30_000.0, DEFAULT_TARGET_RATE_HZ).unwrap();
        assert_eq!(d.skip(), 60);
        assert_eq!(d.effective_rate_hz(30_000.0), 500.0);
    }
    #[test]
    fn slow_streams_are_not_skipped() {
        let d = Downsampler::for_rates(250.0, DEFAULT_TARGET_RATE_HZ).unwrap();
        assert_eq!(d.skip(), 1);
    }
    #[test]
    fn keeps_every_nth_across_calls() {
        let mut d = Downsampler::with_skip(3);
        let kept: Vec<bool> = (0..7).map(|_| d.keep()).collect();
        assert_eq!(kept, [true, false, false, true, false, false, true]);
        d.reset();
        assert!(d.keep());
    }
    #[test]
    fn rejects_non_positive_rates() {
        assert!(Downsampler::for_rates(0.0, 500.0).is_err());
        assert!(Downsampler::for_rates(1000.0, -1.0).is_err());
    }
}
