// Raw note sequences - Validated boundary for externally produced passages
//
// Model output and track files carry loosely typed note-sequence JSON: any
// field may be missing, integers may arrive as floats or strings. Nothing in
// here is trusted until `into_passage` has validated it.

use crate::sequencer::note::{DEFAULT_VELOCITY, MIDI_MAX, Note};
use crate::sequencer::passage::{Passage, TempoMarker};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("Invalid tempo in note sequence: {0} QPM")]
    InvalidTempo(f64),

    #[error("Invalid steps per quarter in note sequence: {0}")]
    InvalidResolution(String),

    #[error("Invalid note sequence JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A number as it may appear in loosely typed JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Numeric::Integer(i) => Some(*i as f64),
            Numeric::Float(f) => Some(*f),
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Whole number in `0..=max`, if this is one
    fn as_bounded(&self, max: u32) -> Option<u32> {
        let value = self.as_f64()?;
        (value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value <= max as f64)
            .then_some(value as u32)
    }

    fn display(&self) -> String {
        match self {
            Numeric::Integer(i) => i.to_string(),
            Numeric::Float(f) => f.to_string(),
            Numeric::Text(s) => s.clone(),
        }
    }
}

impl From<u32> for Numeric {
    fn from(value: u32) -> Self {
        Numeric::Integer(i64::from(value))
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_drum: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantized_start_step: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantized_end_step: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Numeric>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTempo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qpm: Option<Numeric>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuantizationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_per_quarter: Option<Numeric>,
}

/// Note-sequence JSON as exchanged with models and track files
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNoteSequence {
    #[serde(default)]
    pub notes: Vec<RawNote>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tempos: Vec<RawTempo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization_info: Option<RawQuantizationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quantized_steps: Option<Numeric>,
}

impl RawNoteSequence {
    pub fn from_json(json: &str) -> Result<Self, InterchangeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, InterchangeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Validate into a passage.
    ///
    /// Unusable notes are dropped; a bad tempo or grid resolution is an
    /// error. The result still needs to be normalized.
    pub fn into_passage(self) -> Result<Passage, InterchangeError> {
        let tempos = match self.tempos.first().and_then(|t| t.qpm.as_ref()) {
            Some(qpm) => {
                let value = qpm.as_f64().unwrap_or(f64::NAN);
                if !value.is_finite() || value <= 0.0 {
                    return Err(InterchangeError::InvalidTempo(value));
                }
                vec![TempoMarker::at_start(value)]
            }
            None => Vec::new(),
        };

        let steps_per_quarter = match self
            .quantization_info
            .as_ref()
            .and_then(|q| q.steps_per_quarter.as_ref())
        {
            Some(spq) => match spq.as_bounded(u32::MAX) {
                Some(value) if value > 0 => Some(value),
                _ => return Err(InterchangeError::InvalidResolution(spq.display())),
            },
            None => None,
        };

        let total = self.notes.len();
        let notes: Vec<Note> = self.notes.iter().filter_map(convert_note).collect();
        if notes.len() < total {
            log::debug!(
                "Dropped {} note(s) without a valid pitch at the boundary",
                total - notes.len()
            );
        }

        let total_time = self
            .total_time
            .as_ref()
            .and_then(Numeric::as_f64)
            .filter(|t| t.is_finite() && *t > 0.0)
            .unwrap_or(0.0);
        let total_steps = self
            .total_quantized_steps
            .as_ref()
            .and_then(|s| s.as_bounded(u32::MAX));

        Ok(Passage {
            notes,
            tempos,
            steps_per_quarter,
            total_time,
            total_steps: steps_per_quarter.and(total_steps),
        })
    }
}

fn convert_note(raw: &RawNote) -> Option<Note> {
    let pitch = raw.pitch.as_ref()?.as_bounded(u32::from(MIDI_MAX))? as u8;

    // Missing times leave a step-only note for the normalizer to resolve
    let time = |value: &Option<Numeric>| value.as_ref().and_then(Numeric::as_f64).unwrap_or(0.0);
    let clamp_midi = |value: &Option<Numeric>, default: u8| {
        value
            .as_ref()
            .and_then(Numeric::as_f64)
            .filter(|v| v.is_finite())
            .map(|v| v.round().clamp(0.0, f64::from(MIDI_MAX)) as u8)
            .unwrap_or(default)
    };
    let step = |value: &Option<Numeric>| value.as_ref().and_then(|s| s.as_bounded(u32::MAX));

    Some(Note {
        pitch,
        start_time: time(&raw.start_time),
        end_time: time(&raw.end_time),
        velocity: clamp_midi(&raw.velocity, DEFAULT_VELOCITY),
        program: clamp_midi(&raw.program, 0),
        is_drum: raw.is_drum.unwrap_or(false),
        quantized_start_step: step(&raw.quantized_start_step),
        quantized_end_step: step(&raw.quantized_end_step),
        instrument: step(&raw.instrument),
    })
}

impl From<&Note> for RawNote {
    fn from(note: &Note) -> Self {
        Self {
            pitch: Some(u32::from(note.pitch).into()),
            start_time: Some(note.start_time.into()),
            end_time: Some(note.end_time.into()),
            velocity: Some(u32::from(note.velocity).into()),
            program: Some(u32::from(note.program).into()),
            is_drum: Some(note.is_drum),
            quantized_start_step: note.quantized_start_step.map(Numeric::from),
            quantized_end_step: note.quantized_end_step.map(Numeric::from),
            instrument: note.instrument.map(Numeric::from),
        }
    }
}

impl From<&Passage> for RawNoteSequence {
    fn from(passage: &Passage) -> Self {
        Self {
            notes: passage.notes.iter().map(RawNote::from).collect(),
            tempos: passage
                .tempos
                .iter()
                .map(|t| RawTempo {
                    time: Some(t.time.into()),
                    qpm: Some(t.qpm.into()),
                })
                .collect(),
            quantization_info: passage.steps_per_quarter.map(|spq| RawQuantizationInfo {
                steps_per_quarter: Some(spq.into()),
            }),
            total_time: Some(passage.total_time.into()),
            total_quantized_steps: passage.total_steps.map(Numeric::from),
        }
    }
}
