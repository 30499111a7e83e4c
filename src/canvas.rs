// src/canvas.rs
use std::time::{Duration, Instant};
use eframe::egui::Color32;
use crate::colour::{ColourScheme, IDLE_COLOUR, INACTIVE_COLOUR};
use crate::drivers::{ActivityReader, MAX_CHANNELS};
use crate::grid::{Axis, CellRect, GridDimension, GridLayout};

/// Fixed-rate tick for the render side. Stopping it only deregisters the tick.
#[derive(Clone, Debug)]
pub struct RefreshTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl RefreshTimer {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / rate_hz.max(1) as f64),
            next_due: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// True at most once per interval. Missed ticks are dropped, not replayed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let next = due + self.interval;
                self.next_due = Some(if next <= now { now + self.interval } else { next });
                true
            }
            _ => false,
        }
    }

    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

/// Render-side consumer of the activity snapshot: one colour per grid cell.
///
/// Never computes activity itself. Cells past the live channel count stay inactive.
pub struct GridCanvas {
    layout: GridLayout,
    colours: Vec<Color32>,
    dirty: Vec<bool>,
    num_channels: usize,
    reader: Option<ActivityReader>,
    activity_scale: f32,
    timer: RefreshTimer,
}

impl GridCanvas {
    pub fn new(layout: GridLayout, refresh_rate_hz: u32, activity_scale: f32) -> Self {
        let mut canvas = Self {
            layout,
            colours: Vec::new(),
            dirty: Vec::new(),
            num_channels: 0,
            reader: None,
            activity_scale,
            timer: RefreshTimer::new(refresh_rate_hz),
        };
        canvas.recolour_for_stream();
        canvas
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn colours(&self) -> &[Color32] {
        &self.colours
    }

    pub fn cells(&self) -> impl Iterator<Item = (&CellRect, Color32)> + '_ {
        self.layout.cells().iter().zip(self.colours.iter().copied())
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    pub fn update_data_stream(&mut self, num_channels: usize, reader: ActivityReader) {
        self.num_channels = num_channels.min(MAX_CHANNELS);
        self.reader = Some(reader);
        log::info!("Canvas updating stream to {} channels", self.num_channels);
        self.recolour_for_stream();
    }

    /// Relayout discards every cell; live cells go back to idle until the next refresh.
    pub fn set_dimension(&mut self, axis: Axis, value: GridDimension) -> bool {
        if !self.layout.set_dimension(axis, value) {
            return false;
        }
        self.recolour_for_stream();
        true
    }

    pub fn begin_animation(&mut self, now: Instant) {
        log::info!("Beginning animation.");
        self.timer.start(now);
    }

    pub fn end_animation(&mut self) {
        log::info!("Ending animation.");
        self.timer.stop();
    }

    /// Refreshes if a tick is due. Returns true if a refresh happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.timer.poll(now) {
            return false;
        }
        self.refresh();
        true
    }

    /// Pulls the latest snapshot and recolours `min(cells, channels)` cells. Returns how many changed.
    pub fn refresh(&mut self) -> usize {
        let Some(reader) = &self.reader else {
            return 0;
        };
        let snapshot = reader.latest_values();
        let live = self.colours.len().min(self.num_channels).min(snapshot.len());
        let mut changed = 0;
        for (i, &value) in snapshot.values()[..live].iter().enumerate() {
            let colour = ColourScheme::colour_for_activity(value, self.activity_scale);
            if self.colours[i] != colour {
                self.colours[i] = colour;
                self.dirty[i] = true;
                changed += 1;
            }
        }
        changed
    }

    /// Latest settled value behind a live cell; None for inactive cells.
    pub fn value_at(&self, cell: usize) -> Option<f32> {
        if cell >= self.num_channels || cell >= self.colours.len() {
            return None;
        }
        self.reader.as_ref()?.latest_values().get(cell)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.iter().any(|d| *d)
    }

    pub fn dirty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.dirty.iter().enumerate().filter(|(_, d)| **d).map(|(i, _)| i)
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.fill(false);
    }

    fn recolour_for_stream(&mut self) {
        let count = self.layout.cell_count();
        self.colours = (0..count)
            .map(|i| if i < self.num_channels { IDLE_COLOUR } else { INACTIVE_COLOUR })
            .collect();
        self.dirty = vec![true; count];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::ACTIVITY_SCALE;
    use crate::drivers::{ActivityAggregator, ActivityConfig};

    fn dim(v: i64) -> GridDimension {
        GridDimension::new(v).unwrap()
    }

    fn canvas(x: i64, y: i64) -> GridCanvas {
        GridCanvas::new(GridLayout::new(dim(x), dim(y)), 30, ACTIVITY_SCALE)
    }

    fn settled(values: &[f32]) -> ActivityAggregator {
        let mut agg = ActivityAggregator::new(ActivityConfig::new(values.len(), 2).unwrap());
        agg.add_frame(&vec![0.0; values.len()]);
        agg.add_frame(values);
        agg
    }

    #[test]
    fn stream_update_marks_live_and_inactive_cells() {
        let mut canvas = canvas(2, 2);
        assert!(canvas.colours().iter().all(|c| *c == INACTIVE_COLOUR));
        let agg = settled(&[0.0; 3]);
        canvas.update_data_stream(3, agg.reader());
        assert_eq!(canvas.colours(), &[IDLE_COLOUR, IDLE_COLOUR, IDLE_COLOUR, INACTIVE_COLOUR]);
    }

    #[test]
    fn refresh_normalizes_by_activity_scale() {
        let mut canvas = canvas(2, 2);
        let agg = settled(&[0.0, 100.0, 400.0]);
        canvas.update_data_stream(3, agg.reader());
        canvas.clear_dirty();
        assert_eq!(canvas.refresh(), 3);
        let colours = canvas.colours();
        assert_eq!(colours[0], ColourScheme::colour_for_normalized_value(0.0));
        assert_eq!(colours[1], ColourScheme::colour_for_normalized_value(0.5));
        assert_eq!(colours[2], ColourScheme::colour_for_normalized_value(1.0));
        assert_eq!(colours[3], INACTIVE_COLOUR);
        assert_eq!(canvas.dirty_cells().collect::<Vec<_>>(), vec![0, 1, 2]);
        // unchanged snapshot leaves nothing dirty
        canvas.clear_dirty();
        assert_eq!(canvas.refresh(), 0);
        assert!(!canvas.is_dirty());
    }

    #[test]
    fn smaller_grid_shows_only_leading_channels() {
        let mut canvas = canvas(1, 2);
        let agg = settled(&[200.0; 5]);
        canvas.update_data_stream(5, agg.reader());
        canvas.refresh();
        assert_eq!(canvas.colours().len(), 2);
        assert!(canvas.colours().iter().all(|c| *c == ColourScheme::colour_for_normalized_value(1.0)));
    }

    #[test]
    fn channels_past_the_cap_never_get_colour() {
        let mut canvas = canvas(64, 64);
        let agg = settled(&vec![200.0; MAX_CHANNELS]);
        canvas.update_data_stream(5000, agg.reader());
        assert_eq!(canvas.num_channels(), MAX_CHANNELS);
        canvas.refresh();
        assert!(canvas.colours().iter().all(|c| *c != INACTIVE_COLOUR));
    }

    #[test]
    fn relayout_rebuilds_colours() {
        let mut canvas = canvas(2, 2);
        let agg = settled(&[200.0; 4]);
        canvas.update_data_stream(4, agg.reader());
        canvas.refresh();
        assert!(canvas.set_dimension(Axis::X, dim(3)));
        assert_eq!(canvas.colours().len(), 6);
        assert_eq!(&canvas.colours()[..4], &[IDLE_COLOUR; 4]);
        assert_eq!(&canvas.colours()[4..], &[INACTIVE_COLOUR; 2]);
        assert!(!canvas.set_dimension(Axis::X, dim(3)));
    }

    #[test]
    fn ending_animation_leaves_aggregator_alone() {
        let mut canvas = canvas(2, 1);
        let mut agg = settled(&[50.0, 50.0]);
        canvas.update_data_stream(2, agg.reader());
        let start = Instant::now();
        canvas.begin_animation(start);
        assert!(canvas.tick(start));
        canvas.end_animation();
        assert!(!canvas.tick(start + Duration::from_secs(1)));
        agg.add_frame(&[0.0, 0.0]);
        agg.add_frame(&[10.0, 10.0]);
        assert_eq!(agg.peak_to_peak_values().values(), &[10.0, 10.0]);
    }

    #[test]
    fn timer_fires_at_fixed_rate() {
        let mut timer = RefreshTimer::new(30);
        let t0 = Instant::now();
        assert!(!timer.poll(t0));
        timer.start(t0);
        assert!(timer.poll(t0));
        assert!(!timer.poll(t0 + Duration::from_millis(10)));
        assert!(timer.poll(t0 + Duration::from_millis(34)));
        // a long stall yields one tick, not a burst
        assert!(timer.poll(t0 + Duration::from_secs(2)));
        assert!(!timer.poll(t0 + Duration::from_secs(2) + Duration::from_millis(1)));
        timer.stop();
        assert!(!timer.is_running());
        assert!(!timer.poll(t0 + Duration::from_secs(5)));
    }
}
