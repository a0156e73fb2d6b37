// Timeline - Musical time representation
// Handles conversion between seconds, beats and quantized grid steps

use std::fmt;

/// Tempo used when a passage carries no tempo marker at all
pub const DEFAULT_QPM: f64 = 120.0;

/// Errors raised by time-grid conversions
///
/// Both variants are configuration errors: they indicate a programming
/// mistake upstream, never bad user data, so they are not clamped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeGridError {
    #[error("Invalid configuration: tempo must be a positive, finite QPM (got {0})")]
    InvalidTempo(f64),

    #[error("Invalid configuration: grid resolution must be at least 1 step per quarter (got {0})")]
    InvalidResolution(u32),
}

impl TimeGridError {
    /// Every time-grid error is an invalid-configuration error
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            TimeGridError::InvalidTempo(_) | TimeGridError::InvalidResolution(_)
        )
    }
}

/// Tempo in QPM (quarter notes per minute)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    qpm: f64,
}

impl Tempo {
    /// Creates a new tempo, rejecting non-positive or non-finite values
    pub fn new(qpm: f64) -> Result<Self, TimeGridError> {
        if !qpm.is_finite() || qpm <= 0.0 {
            return Err(TimeGridError::InvalidTempo(qpm));
        }
        Ok(Self { qpm })
    }

    /// Get QPM value
    pub fn qpm(&self) -> f64 {
        self.qpm
    }

    /// Duration of one quarter note in seconds
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.qpm
    }

    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * self.seconds_per_beat()
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds / self.seconds_per_beat()
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { qpm: DEFAULT_QPM }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} QPM", self.qpm)
    }
}

/// Grid resolution in steps per quarter note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridResolution {
    steps_per_quarter: u32,
}

impl GridResolution {
    pub fn new(steps_per_quarter: u32) -> Result<Self, TimeGridError> {
        if steps_per_quarter == 0 {
            return Err(TimeGridError::InvalidResolution(steps_per_quarter));
        }
        Ok(Self { steps_per_quarter })
    }

    pub fn steps_per_quarter(&self) -> u32 {
        self.steps_per_quarter
    }

    /// Snap a beat position to the nearest step.
    ///
    /// Rounding (not truncation) is the single time->step policy of the crate.
    /// Positions before zero snap to step 0.
    pub fn beats_to_step(&self, beats: f64) -> u32 {
        let step = (beats * self.steps_per_quarter as f64).round();
        if step <= 0.0 { 0 } else { step as u32 }
    }

    pub fn step_to_beats(&self, step: u32) -> f64 {
        step as f64 / self.steps_per_quarter as f64
    }
}

impl fmt::Display for GridResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} steps/quarter", self.steps_per_quarter)
    }
}

/// A tempo together with a grid resolution.
///
/// The pair fully determines the duration of one step in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    pub tempo: Tempo,
    pub resolution: GridResolution,
}

impl TimeGrid {
    pub fn new(qpm: f64, steps_per_quarter: u32) -> Result<Self, TimeGridError> {
        Ok(Self {
            tempo: Tempo::new(qpm)?,
            resolution: GridResolution::new(steps_per_quarter)?,
        })
    }

    /// Duration of one grid step in seconds
    pub fn seconds_per_step(&self) -> f64 {
        self.tempo.seconds_per_beat() / self.resolution.steps_per_quarter() as f64
    }

    pub fn seconds_to_step(&self, seconds: f64) -> u32 {
        self.resolution.beats_to_step(self.tempo.seconds_to_beats(seconds))
    }

    /// Like `seconds_to_step`, but `None` when the step would leave no room
    /// for a following step in `u32`
    pub fn checked_seconds_to_step(&self, seconds: f64) -> Option<u32> {
        let beats = self.tempo.seconds_to_beats(seconds);
        let step = (beats * self.resolution.steps_per_quarter() as f64).round();
        (step < u32::MAX as f64).then(|| self.resolution.beats_to_step(beats))
    }

    pub fn step_to_seconds(&self, step: u32) -> f64 {
        self.tempo.beats_to_seconds(self.resolution.step_to_beats(step))
    }
}

/// Convert beats to seconds at the given tempo
pub fn beats_to_seconds(beats: f64, qpm: f64) -> Result<f64, TimeGridError> {
    Ok(Tempo::new(qpm)?.beats_to_seconds(beats))
}

/// Convert seconds to beats at the given tempo
pub fn seconds_to_beats(seconds: f64, qpm: f64) -> Result<f64, TimeGridError> {
    Ok(Tempo::new(qpm)?.seconds_to_beats(seconds))
}

/// Snap beats to the nearest step of a grid with `steps_per_quarter` resolution
pub fn beats_to_step(beats: f64, steps_per_quarter: u32) -> Result<u32, TimeGridError> {
    Ok(GridResolution::new(steps_per_quarter)?.beats_to_step(beats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo() {
        let tempo = Tempo::new(120.0).unwrap();
        assert_eq!(tempo.qpm(), 120.0);
        assert_eq!(tempo.seconds_per_beat(), 0.5);
        assert_eq!(tempo.beats_to_seconds(4.0), 2.0);
        assert_eq!(tempo.to_string(), "120.0 QPM");
    }

    #[test]
    fn test_invalid_tempo_fails_fast() {
        for qpm in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let err = Tempo::new(qpm).unwrap_err();
            assert!(err.is_invalid_configuration());
        }
        assert!(beats_to_seconds(1.0, 0.0).is_err());
        assert!(seconds_to_beats(1.0, -1.0).is_err());
    }

    #[test]
    fn test_invalid_resolution_fails_fast() {
        assert_eq!(
            GridResolution::new(0).unwrap_err(),
            TimeGridError::InvalidResolution(0)
        );
        assert!(beats_to_step(1.0, 0).is_err());
        assert!(TimeGrid::new(90.0, 0).is_err());
    }

    #[test]
    fn test_beats_to_step_rounds() {
        // 0.3 beats at 4 spq = 1.2 steps -> 1
        assert_eq!(beats_to_step(0.3, 4).unwrap(), 1);
        // 0.4 beats at 4 spq = 1.6 steps -> 2 (truncation would give 1)
        assert_eq!(beats_to_step(0.4, 4).unwrap(), 2);
        assert_eq!(beats_to_step(-0.5, 4).unwrap(), 0);
    }

    #[test]
    fn test_seconds_per_step() {
        // 1 step = 60 / (QPM * SPQ)
        let grid = TimeGrid::new(90.0, 6).unwrap();
        assert!((grid.seconds_per_step() - 60.0 / (90.0 * 6.0)).abs() < 1e-12);

        let grid = TimeGrid::new(120.0, 4).unwrap();
        assert_eq!(grid.seconds_per_step(), 0.125);
        assert_eq!(grid.seconds_to_step(1.0), 8);
        assert_eq!(grid.step_to_seconds(8), 1.0);
    }

    #[test]
    fn test_beats_seconds_round_trip() {
        for qpm in [40.0, 90.0, 120.0, 187.5] {
            for beats in [0.0, 0.25, 1.0, 3.333, 17.5] {
                let seconds = beats_to_seconds(beats, qpm).unwrap();
                let back = seconds_to_beats(seconds, qpm).unwrap();
                assert!((back - beats).abs() < 1e-9, "qpm {} beats {}", qpm, beats);
            }
        }
    }

    #[test]
    fn test_step_snap_within_one_grid_unit() {
        for spq in [1, 2, 4, 6, 12] {
            let resolution = GridResolution::new(spq).unwrap();
            for beats in [0.1, 0.26, 1.0, 2.71, 9.99] {
                let step = resolution.beats_to_step(beats);
                let snapped = resolution.step_to_beats(step);
                assert!((snapped - beats).abs() <= 1.0 / spq as f64);
            }
        }
    }

    #[test]
    fn test_checked_step_at_u32_limit() {
        let grid = TimeGrid::new(120.0, 4).unwrap();
        assert_eq!(grid.checked_seconds_to_step(1.0), Some(8));
        assert_eq!(grid.checked_seconds_to_step(-1.0), Some(0));
        assert_eq!(grid.checked_seconds_to_step(1e10), None);
        assert_eq!(grid.seconds_to_step(1e10), u32::MAX);
    }
}
