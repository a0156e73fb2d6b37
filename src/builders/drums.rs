// Drums - General MIDI rock pattern generator
// Verse and chorus sections in 4/4, built on top of absolute_sequence

use crate::builders::melody::{AbsoluteParams, TimedEvent, absolute_sequence};
use crate::sequencer::normalize::normalize;
use crate::sequencer::passage::Passage;
use crate::sequencer::timeline::{GridResolution, TimeGridError};

/// General MIDI percussion keys
pub mod gm {
    pub const KICK: i32 = 36;
    pub const SNARE: i32 = 38;
    pub const HAT_CLOSED: i32 = 42;
    pub const HAT_OPEN: i32 = 46;
    pub const CRASH: i32 = 49;
    pub const RIDE: i32 = 51;
    pub const TOM_HIGH: i32 = 50;
    pub const TOM_MID: i32 = 47;
    pub const TOM_LOW: i32 = 45;
}

const BEATS_PER_BAR: f64 = 4.0;
const EIGHTHS: [f64; 8] = [0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumSection {
    /// Closed hi-hat eighths, kick on 1 and 3 with alternating pickups
    Verse,
    /// Ride eighths with a busier kick
    Chorus,
}

/// Rock drum track for a song structure of `(section, bars)` pairs.
///
/// Hits last one grid step (cymbals two) so none collapses on the grid.
/// Every note is a drum note and the passage is declared on the
/// `steps_per_quarter` grid.
pub fn rock_drums(
    structure: &[(DrumSection, u32)],
    qpm: f64,
    steps_per_quarter: u32,
) -> Result<Passage, TimeGridError> {
    let step = 1.0 / GridResolution::new(steps_per_quarter)?.steps_per_quarter() as f64;

    let mut events = Vec::new();
    let mut start_bar = 0;
    for &(section, bars) in structure {
        section_events(&mut events, section, start_bar, bars, step);
        start_bar += bars;
    }

    let mut passage =
        absolute_sequence(&AbsoluteParams::new(events, qpm))?.with_instrument(0, true);
    passage.steps_per_quarter = Some(steps_per_quarter);
    normalize(&passage)
}

fn hits(
    events: &mut Vec<TimedEvent>,
    pitch: i32,
    bar_start: f64,
    offsets: &[f64],
    beats: f64,
    velocity: u8,
) {
    events.extend(
        offsets
            .iter()
            .map(|off| TimedEvent::at_beats(pitch, bar_start + off, beats).with_velocity(velocity)),
    );
}

fn section_events(
    events: &mut Vec<TimedEvent>,
    section: DrumSection,
    start_bar: u32,
    bars: u32,
    step: f64,
) {
    if bars == 0 {
        return;
    }
    let short = step;
    let cymbal = step * 2.0;

    for bar in 0..bars {
        let bar_start = (start_bar + bar) as f64 * BEATS_PER_BAR;

        match section {
            DrumSection::Verse => {
                hits(events, gm::HAT_CLOSED, bar_start, &EIGHTHS, short, 85);
                let pickup = if bar % 2 == 1 { 2.5 } else { 1.5 };
                hits(events, gm::KICK, bar_start, &[0.0, 2.0, pickup], short, 120);
                hits(events, gm::HAT_OPEN, bar_start, &[3.5], cymbal, 105);
            }
            DrumSection::Chorus => {
                hits(events, gm::RIDE, bar_start, &EIGHTHS, short, 100);
                hits(events, gm::KICK, bar_start, &[0.0, 1.5, 2.0, 3.5], short, 122);
            }
        }
        // Backbeat
        hits(events, gm::SNARE, bar_start, &[1.0, 3.0], short, 115);

        if bar == 0 {
            hits(events, gm::CRASH, bar_start, &[0.0], cymbal, 127);
        }
    }

    let last_bar = (start_bar + bars - 1) as f64 * BEATS_PER_BAR;
    hits(events, gm::TOM_HIGH, last_bar, &[3.0], short, 116);
    hits(events, gm::TOM_MID, last_bar, &[3.25], short, 116);
    hits(events, gm::TOM_LOW, last_bar, &[3.5], short, 116);
}
