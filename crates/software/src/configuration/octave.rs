use crate::tables::{NOTE_FREQ_OCT1, NOTE_FREQ_OCT2};
use embassy_time::Duration;
use num_derive::{FromPrimitive, ToPrimitive};
use wmidi::Note;

/// How often the octave switch is read. The switch is a level, so nothing is lost between reads; this only bounds how stale
/// the octave can be when a note is voiced.
pub const OCTAVE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Determines which of the two frequency bands is used when a note is voiced.
///
/// The octave is a level rather than an event: changing it never alters a sounding note, it only takes effect the next time
/// the gate opens.
#[derive(Debug, Default, Copy, Clone, ToPrimitive, FromPrimitive, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Octave {
    /// C0 through C5.
    #[default]
    Low,
    /// C5 through B9.
    High,
}

impl From<bool> for Octave {
    /// Maps the state of the octave switch (closed is `true`) to an [`Octave`].
    fn from(switch_closed: bool) -> Self {
        if switch_closed { Self::High } else { Self::Low }
    }
}

impl Octave {
    /// Returns the frequencies (Hz) of this band, lowest first.
    pub fn frequencies(&self) -> &'static [f32] {
        match self {
            Self::Low => &NOTE_FREQ_OCT1,
            Self::High => &NOTE_FREQ_OCT2,
        }
    }

    /// Returns the [`Note`] at the bottom of this band.
    pub fn lowest_note(&self) -> Note {
        match self {
            Self::Low => Note::C0,
            Self::High => Note::C5,
        }
    }

    /// Returns the states of the octave 1 and octave 2 indicators, in that order. Exactly one is lit.
    pub fn indicators(&self) -> (bool, bool) {
        (*self == Self::Low, *self == Self::High)
    }
}
