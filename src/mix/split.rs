// Split - Break a multi-part passage into one part per instrument
// Used for trio-style model output (drums, bass, melody in one passage)

use crate::sequencer::normalize::normalize;
use crate::sequencer::note::Note;
use crate::sequencer::passage::Passage;
use crate::sequencer::timeline::TimeGridError;

/// Average pitch below which a pitched part is named "Bass"
const BASS_PITCH_THRESHOLD: f64 = 52.0;

/// One part extracted by `split_into_parts`
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPart {
    pub name: String,
    pub program: u8,
    pub is_drum: bool,
    pub passage: Passage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKey {
    Instrument(u32),
    Drums,
    Program(u8),
}

fn group_key(note: &Note) -> GroupKey {
    match note.instrument {
        Some(instrument) => GroupKey::Instrument(instrument),
        None if note.is_drum => GroupKey::Drums,
        None => GroupKey::Program(note.program),
    }
}

/// Split by instrument tag, else drums, else program.
///
/// Parts keep the source tempo and grid and are ordered drums, bass,
/// melody, then anything else (first appearance within each rank).
pub fn split_into_parts(passage: &Passage) -> Result<Vec<TrackPart>, TimeGridError> {
    let source = normalize(passage)?;

    let mut groups: Vec<(GroupKey, Vec<Note>)> = Vec::new();
    for note in &source.notes {
        let key = group_key(note);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, notes)) => notes.push(note.clone()),
            None => groups.push((key, vec![note.clone()])),
        }
    }

    let mut parts = Vec::with_capacity(groups.len());
    for (key, notes) in groups {
        let first = &notes[0];
        let is_drum = key == GroupKey::Drums || first.is_drum;
        let program = first.program;
        let name = match key {
            _ if is_drum => "Drums".to_string(),
            GroupKey::Instrument(instrument) => format!("Part {}", instrument),
            _ => {
                let average =
                    notes.iter().map(|n| f64::from(n.pitch)).sum::<f64>() / notes.len() as f64;
                if average < BASS_PITCH_THRESHOLD {
                    "Bass".to_string()
                } else {
                    "Melody".to_string()
                }
            }
        };

        let part = Passage {
            notes,
            tempos: source.tempos.clone(),
            steps_per_quarter: source.steps_per_quarter,
            total_time: 0.0,
            total_steps: None,
        };
        parts.push(TrackPart {
            name,
            program,
            is_drum,
            passage: normalize(&part)?,
        });
    }

    parts.sort_by_key(rank);
    Ok(parts)
}

fn rank(part: &TrackPart) -> u8 {
    match part.name.as_str() {
        _ if part.is_drum => 0,
        "Bass" => 1,
        "Melody" => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trio() -> Passage {
        Passage::from_notes(
            vec![
                Note::new(72, 0.0, 0.5).with_program(0),
                Note::new(40, 0.0, 1.0).with_program(33),
                Note::new(36, 0.0, 0.25).with_drum(true),
                Note::new(76, 0.5, 1.0).with_program(0),
                Note::new(38, 0.5, 0.75).with_drum(true),
            ],
            90.0,
        )
        .with_steps_per_quarter(4)
    }

    #[test]
    fn test_split_trio() {
        let parts = split_into_parts(&trio()).unwrap();
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Drums", "Bass", "Melody"]);

        assert!(parts[0].is_drum);
        assert_eq!(parts[0].passage.note_count(), 2);
        assert_eq!(parts[1].program, 33);
        assert_eq!(parts[2].passage.note_count(), 2);

        for part in &parts {
            assert_eq!(part.passage.qpm(), Some(90.0));
            assert_eq!(part.passage.steps_per_quarter, Some(4));
        }
    }

    #[test]
    fn test_split_by_instrument_tag() {
        let passage = Passage::from_notes(
            vec![
                Note::new(67, 0.0, 1.0).with_instrument(0),
                Note::new(60, 0.0, 1.0).with_instrument(1),
                Note::new(69, 1.0, 2.0).with_instrument(0),
            ],
            120.0,
        );
        let parts = split_into_parts(&passage).unwrap();
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        // Same rank keeps first appearance (pitch 60 sorts first at time 0)
        assert_eq!(names, vec!["Part 1", "Part 0"]);
        assert_eq!(parts[1].passage.note_count(), 2);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_into_parts(&Passage::new()).unwrap().is_empty());
    }
}
