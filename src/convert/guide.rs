//! Four-beat guide windows spanning the track

use crate::simfile::timing::Timing;

/// Beats per guide window
pub const GUIDE_BEATS: u32 = 4;

/// Iterator over `[t(b), t(b+1), t(b+2), t(b+3)]` for b = 0, 4, 8, ...
///
/// Ends at the first window whose first beat falls after `duration`.
pub struct Guide<'a, T: ?Sized> {
    timing: &'a T,
    duration: i64,
    beat: u32,
    done: bool,
}

impl<'a, T: Timing + ?Sized> Guide<'a, T> {
    pub fn new(timing: &'a T, duration: i64) -> Self {
        Self {
            timing,
            duration,
            beat: 0,
            done: false,
        }
    }
}

impl<T: Timing + ?Sized> Iterator for Guide<'_, T> {
    type Item = [i64; 4];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.beat as f64;
        if self.timing.time_at(start) > self.duration {
            self.done = true;
            return None;
        }

        self.beat += GUIDE_BEATS;
        Some(std::array::from_fn(|i| self.timing.time_at(start + i as f64)))
    }
}

/// Materialize the guide for a track of `duration` ms
pub fn build<T: Timing + ?Sized>(timing: &T, duration: i64) -> Vec<[i64; 4]> {
    Guide::new(timing, duration).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 120 BPM starting at `start` ms
    struct Linear {
        start: i64,
    }

    impl Timing for Linear {
        fn time_at(&self, beat: f64) -> i64 {
            self.start + (beat * 500.0) as i64
        }

        fn is_hittable(&self, _beat: f64) -> bool {
            true
        }
    }

    #[test]
    fn test_windows_cover_duration() {
        let guide = build(&Linear { start: 0 }, 4000);
        // Windows start at 0, 2000 and 4000 ms (4000 is not past the end)
        assert_eq!(
            guide,
            vec![
                [0, 500, 1000, 1500],
                [2000, 2500, 3000, 3500],
                [4000, 4500, 5000, 5500],
            ]
        );
    }

    #[test]
    fn test_negative_start_is_kept() {
        let guide = build(&Linear { start: -300 }, 1000);
        assert_eq!(guide[0][0], -300);
        assert_eq!(guide.len(), 1);
    }

    #[test]
    fn test_empty_when_first_beat_is_late() {
        assert!(build(&Linear { start: 5000 }, 1000).is_empty());
    }

    #[test]
    fn test_iterator_is_fused_after_end() {
        let timing = Linear { start: 0 };
        let mut guide = Guide::new(&timing, 0);
        assert!(guide.next().is_some());
        assert!(guide.next().is_none());
        assert!(guide.next().is_none());
    }
}
