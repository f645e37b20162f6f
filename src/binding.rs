use std::time::Duration;

/// `MM:SS`, zero padded; minutes are not wrapped into hours.
pub fn format_time(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "00:00".to_string();
    }
    let whole = secs.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Seek slider plus the elapsed/duration labels next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekBar {
    pub value: f64,
    pub max: f64,
    pub current_label: String,
    pub duration_label: String,
}

impl Default for SeekBar {
    fn default() -> Self {
        SeekBar {
            value: 0.0,
            max: 0.0,
            current_label: format_time(0.0),
            duration_label: format_time(0.0),
        }
    }
}

impl SeekBar {
    pub fn reset(&mut self) {
        *self = SeekBar::default();
    }

    pub fn ratio(&self) -> f64 {
        if self.max > 0.0 {
            (self.value / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Sync slider and labels with playback. Skipped while the duration is
    /// still unknown.
    pub fn on_time_update(&mut self, current: Duration, duration: Option<Duration>) {
        let Some(total) = duration else {
            return;
        };
        self.value = current.as_secs_f64();
        self.max = total.as_secs_f64();
        self.current_label = format_time(self.value);
        self.duration_label = format_time(self.max);
    }

    pub fn on_loaded_metadata(&mut self, duration: Option<Duration>) {
        let Some(total) = duration else {
            return;
        };
        self.max = total.as_secs_f64();
        self.duration_label = format_time(self.max);
    }
}

/// Map a slider position onto the track: `value / max * duration`.
pub fn seek_target(value: f64, max: f64, duration: Option<Duration>) -> Option<Duration> {
    let total = duration?;
    if max.is_nan() || max <= 0.0 || !value.is_finite() {
        return None;
    }
    let fraction = (value / max).clamp(0.0, 1.0);
    Some(total.mul_f64(fraction))
}
