//! Programs the square-wave output: which frequency it runs at and whether it sounds at all.
//!
//! Only the period of the wave varies with the note; the duty cycle is fixed at 50% while sounding and 0% while silent.
//! Hardware is reached through the [`Oscillator`] trait, which receives period and duty together in a single
//! [`OscillatorState`] so that an implementation can update both at once rather than emitting a cycle with a stale
//! combination.

use crate::{configuration::Octave, quantizer::NoteIndex};
use core::time::Duration;
use measurements::Frequency;

/// Duty cycle of the output while a note sounds.
pub const SOUNDING_DUTY: f32 = 0.5;

/// Duty cycle of the output while silent.
pub const SILENT_DUTY: f32 = 0.0;

/// Returns the frequency of `note` within the band selected by `octave`.
pub fn frequency(octave: Octave, note: NoteIndex) -> Frequency {
    Frequency::from_hertz(f64::from(octave.frequencies()[note.get()]))
}

/// The most recently commanded frequency and duty cycle of the output.
///
/// Silencing the output only zeroes the duty cycle; the frequency of the last voiced note is retained, as it would be in
/// the period register of a hardware timer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillatorState {
    frequency: Option<Frequency>,
    duty: f32,
}

impl OscillatorState {
    /// The state of an output that has never voiced a note.
    pub const SILENT: Self = Self {
        frequency: None,
        duty: SILENT_DUTY,
    };

    /// Returns the fraction of each period the output spends high.
    pub fn duty(&self) -> f32 {
        self.duty
    }

    /// Returns the frequency last programmed, if any note has been voiced.
    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    /// Returns the period last programmed, if any note has been voiced.
    pub fn period(&self) -> Option<Duration> {
        self.frequency.map(|frequency| frequency.as_period())
    }

    /// Returns true if the output is producing a wave.
    pub fn is_sounding(&self) -> bool {
        self.duty > SILENT_DUTY
    }
}

impl Default for OscillatorState {
    fn default() -> Self {
        Self::SILENT
    }
}

/// A trait for hardware (or a stand-in for it) capable of producing a pulse wave with a programmable period and duty cycle.
pub trait Oscillator {
    /// Programs the output to match `state`.
    ///
    /// Implementations should apply period and duty as a unit, e.g., by writing buffered registers that take effect together.
    fn apply(&mut self, state: OscillatorState);
}

/// Owns an [`Oscillator`] and the record of what it was last told to do.
pub struct Driver<O> {
    output: O,
    state: OscillatorState,
}

impl<O: Oscillator> Driver<O> {
    /// Constructs a [`Driver`], silencing the output.
    pub fn new(mut output: O) -> Self {
        output.apply(OscillatorState::SILENT);
        Self {
            output,
            state: OscillatorState::SILENT,
        }
    }

    /// Sounds `note` from the band selected by `octave` and returns the frequency programmed.
    pub fn sound(&mut self, note: NoteIndex, octave: Octave) -> Frequency {
        let frequency = frequency(octave, note);
        self.program(OscillatorState {
            frequency: Some(frequency),
            duty: SOUNDING_DUTY,
        });
        frequency
    }

    /// Silences the output, leaving the programmed frequency in place.
    pub fn silence(&mut self) {
        self.program(OscillatorState {
            duty: SILENT_DUTY,
            ..self.state
        });
    }

    /// Returns what the output was last told to do.
    pub fn state(&self) -> OscillatorState {
        self.state
    }

    /// Provides access to the underlying [`Oscillator`].
    pub fn output(&self) -> &O {
        &self.output
    }

    fn program(&mut self, state: OscillatorState) {
        self.state = state;
        self.output.apply(state);
    }
}

/// Register values which realize a frequency and duty cycle on a timer with a 16-bit prescaler and counter.
///
/// The counter runs at `timer_clock / (prescaler + 1)`, wraps after `auto_reload + 1` ticks, and holds the output high
/// for the first `compare` ticks of each period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmTiming {
    /// Clock divider, less one.
    pub prescaler: u16,
    /// Counter ticks per period, less one.
    pub auto_reload: u16,
    /// Counter ticks per period spent high.
    pub compare: u16,
}

/// Number of values a 16-bit register can hold.
const REGISTER_SPAN: u64 = 1 << 16;

impl PwmTiming {
    /// Computes the timing closest to `frequency` at the given `duty`, or returns `None` if a 16-bit timer running from
    /// `timer_clock` cannot produce it (i.e., it would need fewer than two ticks or more than 2^32 ticks per period).
    ///
    /// The smallest prescaler that lets the period fit in the counter is chosen, as it leaves the most ticks per period and
    /// therefore the finest pitch resolution.
    pub fn new(timer_clock: Frequency, frequency: Frequency, duty: f32) -> Option<Self> {
        let exact_ticks = timer_clock.as_hertz() / frequency.as_hertz();
        if !(2.0..=(REGISTER_SPAN * REGISTER_SPAN) as f64).contains(&exact_ticks) {
            return None;
        }

        // casting truncates, so add a half to round
        let ticks = (exact_ticks + 0.5) as u64;
        let divider = ticks.div_ceil(REGISTER_SPAN);
        let period = ((ticks + divider / 2) / divider).min(REGISTER_SPAN);
        let high = (period as f32 * duty.clamp(0.0, 1.0) + 0.5) as u64;

        Some(Self {
            prescaler: (divider - 1) as u16,
            auto_reload: (period - 1) as u16,
            compare: high.min(period) as u16,
        })
    }

    /// Computes the timing for `state`, or returns `None` if no frequency has been programmed or it cannot be produced.
    pub fn for_state(timer_clock: Frequency, state: &OscillatorState) -> Option<Self> {
        Self::new(timer_clock, state.frequency()?, state.duty())
    }

    /// Returns the frequency this timing actually produces.
    pub fn frequency(&self, timer_clock: Frequency) -> Frequency {
        let ticks = (u64::from(self.prescaler) + 1) * (u64::from(self.auto_reload) + 1);
        Frequency::from_hertz(timer_clock.as_hertz() / ticks as f64)
    }
}
