use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single sextant sighting: the time it was taken and the observed
/// altitude in decimal degrees.
///
/// The timestamp orders and labels the sight; altitude arithmetic never
/// touches it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub time: NaiveTime,
    pub angle_deg: f64,
}

impl Measurement {
    pub fn new(time: NaiveTime, angle_deg: f64) -> Self {
        Self { time, angle_deg }
    }

    /// Builds a measurement from the raw degree and decimal arc-minute pair.
    pub fn from_arc(time: NaiveTime, degrees: u32, minutes: f64) -> Self {
        Self {
            time,
            angle_deg: f64::from(degrees) + minutes / 60.0,
        }
    }

    /// Formats the altitude back into `DD°MM.M'` arc notation, rounding the
    /// minutes to one decimal digit.
    pub fn arc_notation(&self) -> String {
        let mut degrees = self.angle_deg.trunc() as i64;
        let mut minutes = (self.angle_deg - degrees as f64) * 60.0;
        minutes = (minutes * 10.0).round() / 10.0;
        if minutes >= 60.0 {
            degrees += 1;
            minutes = 0.0;
        }
        format!("{:02}°{:04.1}'", degrees, minutes)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.time.format("%H:%M:%S"), self.arc_notation())
    }
}
