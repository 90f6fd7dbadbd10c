// Rolling time-series buffer with a transient latest-point marker
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Hard upper bound on retained points, independent of the display window.
pub const HISTORY_CAP: usize = 900;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
    pub is_latest: bool,
}

/// Fixed-capacity FIFO of points for one widget+series pair. Oldest points
/// are evicted from the front; `is_latest` is true on the newest point only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesBuffer {
    window: usize,
    points: VecDeque<SeriesPoint>,
}

impl SeriesBuffer {
    pub fn new(window: usize) -> Self {
        let window = window.clamp(1, HISTORY_CAP);
        Self {
            window,
            points: VecDeque::with_capacity(window),
        }
    }

    pub fn push(&mut self, time: DateTime<Utc>, value: f64) {
        if let Some(last) = self.points.back_mut() {
            last.is_latest = false;
        }
        self.points.push_back(SeriesPoint {
            time,
            value,
            is_latest: true,
        });
        while self.points.len() > self.window {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn points(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    #[test]
    fn test_push_evicts_from_front_past_window() {
        let mut buffer = SeriesBuffer::new(3);
        for i in 0..5 {
            buffer.push(ts(i), i as f64);
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.values(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_exactly_one_latest_marker() {
        let mut buffer = SeriesBuffer::new(10);
        for i in 0..4 {
            buffer.push(ts(i), i as f64);
        }

        let latest_count = buffer.points().filter(|p| p.is_latest).count();
        assert_eq!(latest_count, 1);
        assert!(buffer.latest().unwrap().is_latest);
        assert_eq!(buffer.latest().unwrap().value, 3.0);
    }

    #[test]
    fn test_window_is_capped_at_history_limit() {
        let buffer = SeriesBuffer::new(100_000);
        assert_eq!(buffer.window(), HISTORY_CAP);
    }

    #[test]
    fn test_zero_window_is_raised_to_one() {
        let mut buffer = SeriesBuffer::new(0);
        buffer.push(ts(0), 1.0);
        buffer.push(ts(1), 2.0);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.values(), vec![2.0]);
    }
}
