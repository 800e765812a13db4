//! Resolves a sampled control voltage to a discrete note.

use crate::{
    configuration::{LogicLevel, Octave},
    tables::{NOTE_COUNT, THRESHOLD_COUNT, Thresholds},
};
use core::fmt;
use measurements::Voltage;
use wmidi::Note;

/// Position of a semitone within a frequency band, counted from the band's lowest note.
///
/// Only a [`Quantizer`] or [`NoteIndex::new`] can produce one, so the index is always within [`NOTE_COUNT`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoteIndex(u8);

impl NoteIndex {
    /// The highest note a [`Quantizer`] can resolve.
    pub const MAX: Self = Self(NOTE_COUNT as u8 - 1);

    /// Constructs a [`NoteIndex`], or returns `None` if `index` lies beyond [`NoteIndex::MAX`].
    pub fn new(index: u8) -> Option<Self> {
        (index <= Self::MAX.0).then_some(Self(index))
    }

    /// Returns the index for use with a frequency table.
    pub fn get(self) -> usize {
        usize::from(self.0)
    }

    /// Returns the MIDI [`Note`] this index represents within the given band, if MIDI can name it.
    ///
    /// The upper band runs past G9, the highest MIDI note.
    pub fn note(self, octave: Octave) -> Option<Note> {
        Note::try_from(u8::from(octave.lowest_note()) + self.0).ok()
    }
}

/// Raised when a sample lies at or above the top of the supported range, where no note can be resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoltageOutOfRange {
    /// The offending sample.
    pub sample: Voltage,
    /// The lowest voltage that is out of range.
    pub ceiling: Voltage,
}

impl fmt::Display for VoltageOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "control voltage {:.4} V is out of range; only voltages below {:.4} V map to notes",
            self.sample.as_volts(),
            self.ceiling.as_volts()
        )
    }
}

impl core::error::Error for VoltageOutOfRange {}

#[cfg(feature = "defmt")]
impl defmt::Format for VoltageOutOfRange {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "VoltageOutOfRange {{ sample: {} V, ceiling: {} V }}",
            self.sample.as_volts(),
            self.ceiling.as_volts()
        );
    }
}

/// Maps voltages onto notes using a fixed table of ascending boundaries.
#[derive(Clone, Copy, Debug)]
pub struct Quantizer {
    thresholds: &'static Thresholds,
}

impl Quantizer {
    /// Constructs a [`Quantizer`] over the given boundaries, which must never descend.
    pub const fn new(thresholds: &'static Thresholds) -> Self {
        Self { thresholds }
    }

    /// Constructs a [`Quantizer`] for CV scaled to the given [`LogicLevel`].
    pub fn for_logic_level(logic_level: LogicLevel) -> Self {
        Self::new(logic_level.thresholds())
    }

    /// Returns the lowest voltage that cannot be resolved to a note.
    pub fn ceiling(&self) -> Voltage {
        Voltage::from_volts(f64::from(self.thresholds[THRESHOLD_COUNT - 1]))
    }

    /// Resolves `sample` to the highest note whose boundary it meets.
    ///
    /// Samples below the lowest boundary resolve to the lowest note. Samples at or above the topmost boundary, along with
    /// `NaN`, cannot be resolved and produce [`VoltageOutOfRange`].
    pub fn quantize(&self, sample: Voltage) -> Result<NoteIndex, VoltageOutOfRange> {
        let ceiling = self.ceiling();
        let volts = sample.as_volts();

        // negated so that NaN is rejected too
        if !(volts < ceiling.as_volts()) {
            return Err(VoltageOutOfRange { sample, ceiling });
        }

        // the count of boundaries at or below the sample is the index of the first boundary above it
        let boundaries_met = self
            .thresholds
            .partition_point(|&boundary| f64::from(boundary) <= volts);

        // the ceiling check above guarantees fewer than THRESHOLD_COUNT boundaries were met, so this fits NOTE_COUNT
        Ok(NoteIndex(boundaries_met.saturating_sub(1) as u8))
    }
}
