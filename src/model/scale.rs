use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Affine conversion between pixel offsets and calendar dates over the
/// rendered range `[min_date, max_date] ↔ [0, timeline_width]`.
///
/// Out-of-range inputs clamp on both axes; there are no error conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateScale {
    /// The leftmost rendered date.
    pub min_date: NaiveDate,
    /// The rightmost rendered date.
    pub max_date: NaiveDate,
    /// Total width of the timeline area in pixels.
    pub timeline_width: f32,
    /// Pixels per day.
    pub day_width: f32,
}

impl DateScale {
    pub fn new(min_date: NaiveDate, max_date: NaiveDate, timeline_width: f32) -> Self {
        let total_days = (max_date - min_date).num_days().max(1);
        Self {
            min_date,
            max_date,
            timeline_width,
            day_width: timeline_width / total_days as f32,
        }
    }

    pub fn total_days(&self) -> i64 {
        (self.max_date - self.min_date).num_days().max(1)
    }

    /// Convert a date to an x-pixel offset from the timeline origin.
    pub fn date_to_x(&self, date: NaiveDate) -> f32 {
        let date = date.clamp(self.min_date, self.max_date);
        let days = (date - self.min_date).num_days() as f32;
        days * self.day_width
    }

    /// Convert an x-pixel offset back to a date.
    pub fn x_to_date(&self, x: f32) -> NaiveDate {
        let x = x.clamp(0.0, self.timeline_width);
        let days = (x / self.day_width).round() as i64;
        self.min_date + Duration::days(days)
    }

    /// Pixel offset of a due-date bar edge. A bar with due date `d`
    /// visually ends at the start of the following day.
    pub fn due_to_x(&self, due: NaiveDate) -> f32 {
        self.date_to_x(due) + self.day_width
    }

    /// Due date for a bar's right edge: subtract one day-width before
    /// mapping, the inverse of [`Self::due_to_x`].
    pub fn x_to_due(&self, x: f32) -> NaiveDate {
        self.x_to_date(x - self.day_width)
    }

    /// Round an x offset to the nearest day boundary. Idempotent.
    pub fn snap_to_day(&self, x: f32) -> f32 {
        let snapped = (x / self.day_width).round() * self.day_width;
        snapped.clamp(0.0, self.timeline_width)
    }
}
