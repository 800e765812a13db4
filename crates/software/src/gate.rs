//! Turns gate transitions into note-on and note-off actions.
//!
//! A rising edge samples the control voltage, resolves it to a note and voices it; a falling edge silences the output.
//! Each transition is an ordinary method call which runs to completion, so whatever reports edges (an interrupt, a task
//! awaiting a pin, a test) only has to avoid calling into the same [`Voice`] from two places at once.

use crate::{
    configuration::{LogicLevel, Octave},
    oscillator::{Driver, Oscillator},
    quantizer::{NoteIndex, Quantizer, VoltageOutOfRange},
};
#[cfg(feature = "defmt")]
use defmt::info;

/// Level of the gate signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateState {
    /// When the gate is high, the instrument will sound.
    High,
    /// When the gate is low, the instrument will rest.
    Low,
}

impl From<bool> for GateState {
    fn from(is_high: bool) -> Self {
        if is_high { Self::High } else { Self::Low }
    }
}

/// A change in the level of the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low to high: note on.
    Rising,
    /// High to low: note off.
    Falling,
}

/// Derives [`Edge`]s from successive readings of the gate level.
///
/// Useful both for polling and for interrupt sources that report "something changed" without saying what; repeated
/// readings of the same level produce nothing.
#[derive(Clone, Copy, Debug)]
pub struct EdgeDetector {
    last: GateState,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeDetector {
    /// Constructs an [`EdgeDetector`] which assumes the gate starts low, so a gate that is already high on the first reading
    /// produces a rising edge.
    pub const fn new() -> Self {
        Self::starting_at(GateState::Low)
    }

    /// Constructs an [`EdgeDetector`] which assumes the gate was last seen at `level`.
    pub const fn starting_at(level: GateState) -> Self {
        Self { last: level }
    }

    /// Records the latest reading and returns the edge it represents, if any.
    pub fn update(&mut self, level: GateState) -> Option<Edge> {
        let edge = match (self.last, level) {
            (GateState::Low, GateState::High) => Some(Edge::Rising),
            (GateState::High, GateState::Low) => Some(Edge::Falling),
            _ => None,
        };
        self.last = level;
        edge
    }
}

/// A trait for reading the control voltage input on demand.
pub trait ControlVoltage {
    /// Returns the current reading as a fraction of full scale, from `0.0` to `1.0`.
    fn read(&mut self) -> f32;
}

/// A trait for reading the octave selection.
pub trait OctaveSelector {
    /// Returns the octave currently selected.
    fn octave(&mut self) -> Octave;
}

impl OctaveSelector for Octave {
    fn octave(&mut self) -> Octave {
        *self
    }
}

/// Whether the gate has most recently opened or closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VoiceState {
    /// The gate is closed and the output is silent.
    #[default]
    Silent,
    /// The gate is open. The output is sounding unless the control voltage could not be resolved.
    Sounding,
}

impl From<VoiceState> for GateState {
    /// The gate level a voice in this state has last responded to.
    fn from(state: VoiceState) -> Self {
        match state {
            VoiceState::Silent => Self::Low,
            VoiceState::Sounding => Self::High,
        }
    }
}

/// Status which an implementation may mirror to indicators (e.g., LEDs).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Indicators {
    /// Lit while the gate is open.
    pub gate: bool,
    /// Lit from a rising edge with out-of-range control voltage until the next falling edge.
    pub error: bool,
}

/// The gate state machine: reacts to edges by quantizing the control voltage and driving the oscillator.
pub struct Voice<O> {
    driver: Driver<O>,
    state: VoiceState,
    error: bool,
}

impl<O: Oscillator> Voice<O> {
    /// Constructs a silent [`Voice`] which drives `output`.
    pub fn new(output: O) -> Self {
        Self {
            driver: Driver::new(output),
            state: VoiceState::Silent,
            error: false,
        }
    }

    /// Handles a note-on: samples `cv`, resolves it using the thresholds for `logic_level`, and voices the note from the
    /// band `octave` selects at that moment.
    ///
    /// When the voltage is out of range the error indicator is raised and the oscillator is left exactly as it was. An error
    /// raised earlier stays raised even if this edge resolves a note; only [`Voice::falling_edge`] clears it.
    pub fn rising_edge(
        &mut self,
        cv: &mut impl ControlVoltage,
        octave: &mut impl OctaveSelector,
        logic_level: LogicLevel,
    ) -> Result<NoteIndex, VoltageOutOfRange> {
        self.state = VoiceState::Sounding;

        let sample = logic_level.normalize(cv.read());
        let note = match Quantizer::for_logic_level(logic_level).quantize(sample) {
            Ok(note) => note,
            Err(err) => {
                self.error = true;
                return Err(err);
            }
        };

        let octave = octave.octave();
        let _frequency = self.driver.sound(note, octave);
        #[cfg(feature = "defmt")]
        info!(
            "Sounding {} ({}) at {} Hz",
            note.note(octave).map(|n| n.to_str()).unwrap_or("note beyond MIDI range"),
            note,
            _frequency.as_hertz()
        );
        Ok(note)
    }

    /// Handles a note-off: clears the error indicator and silences the output, whatever state the voice was in.
    pub fn falling_edge(&mut self) {
        self.state = VoiceState::Silent;
        self.error = false;
        self.driver.silence();
        #[cfg(feature = "defmt")]
        info!("Gate closed");
    }

    /// Dispatches `edge` to [`Voice::rising_edge`] or [`Voice::falling_edge`]. Returns the note voiced, if any.
    pub fn handle(
        &mut self,
        edge: Edge,
        cv: &mut impl ControlVoltage,
        octave: &mut impl OctaveSelector,
        logic_level: LogicLevel,
    ) -> Result<Option<NoteIndex>, VoltageOutOfRange> {
        match edge {
            Edge::Rising => self.rising_edge(cv, octave, logic_level).map(Some),
            Edge::Falling => {
                self.falling_edge();
                Ok(None)
            }
        }
    }

    /// Returns the edge the voice responds to next: [`Edge::Rising`] while silent, [`Edge::Falling`] while sounding.
    ///
    /// An edge source can wait for exactly this edge and report it as soon as it occurs, without re-reading the gate
    /// level. A trigger pulse that has already ended by the time it is reported still voices its note.
    pub fn awaited_edge(&self) -> Edge {
        match self.state {
            VoiceState::Silent => Edge::Rising,
            VoiceState::Sounding => Edge::Falling,
        }
    }

    /// Compares the current gate `level` with the level the voice last responded to, returning the edge that was missed
    /// in between, if any.
    pub fn catch_up(&self, level: GateState) -> Option<Edge> {
        EdgeDetector::starting_at(self.state.into()).update(level)
    }

    /// Returns whether the gate last opened or closed.
    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Returns the status to mirror on the gate and error indicators.
    pub fn indicators(&self) -> Indicators {
        Indicators {
            gate: self.state == VoiceState::Sounding,
            error: self.error,
        }
    }

    /// Provides access to the [`Driver`], e.g., to inspect what the oscillator was last told to do.
    pub fn driver(&self) -> &Driver<O> {
        &self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oscillator::{OscillatorState, SILENT_DUTY, SOUNDING_DUTY};

    #[derive(Default)]
    struct Probe {
        applied: Option<OscillatorState>,
        writes: usize,
    }

    impl Oscillator for Probe {
        fn apply(&mut self, state: OscillatorState) {
            self.applied = Some(state);
            self.writes += 1;
        }
    }

    /// Control voltage fixed at a fraction of full scale.
    struct Cv(f32);

    impl ControlVoltage for Cv {
        fn read(&mut self) -> f32 {
            self.0
        }
    }

    /// Reading which lands at `volts` on a 3.3 V full scale.
    fn cv(volts: f32) -> Cv {
        Cv(volts / 3.3)
    }

    /// Counts how often the octave is consulted.
    struct CountingSelector {
        octave: Octave,
        reads: usize,
    }

    impl OctaveSelector for CountingSelector {
        fn octave(&mut self) -> Octave {
            self.reads += 1;
            self.octave
        }
    }

    fn voice() -> Voice<Probe> {
        Voice::new(Probe::default())
    }

    fn hertz(voice: &Voice<Probe>) -> Option<f64> {
        voice.driver().state().frequency().map(|f| f.as_hertz())
    }

    #[test]
    fn edge_detector() {
        let mut detector = EdgeDetector::new();
        assert_eq!(None, detector.update(GateState::Low), "Expected left but got right");
        assert_eq!(
            Some(Edge::Rising),
            detector.update(GateState::High),
            "Expected left but got right"
        );
        assert_eq!(None, detector.update(GateState::High), "Expected left but got right");
        assert_eq!(
            Some(Edge::Falling),
            detector.update(GateState::Low),
            "Expected left but got right"
        );
    }

    #[test]
    fn gate_high_at_start_is_rising_edge() {
        let mut detector = EdgeDetector::default();
        assert_eq!(
            Some(Edge::Rising),
            detector.update(GateState::from(true)),
            "Expected left but got right"
        );
    }

    #[test]
    fn starts_silent() {
        let voice = voice();
        assert_eq!(VoiceState::Silent, voice.state(), "Expected left but got right");
        assert_eq!(Indicators::default(), voice.indicators(), "Expected left but got right");
        assert_eq!(
            Some(OscillatorState::SILENT),
            voice.driver().output().applied,
            "Expected left but got right"
        );
    }

    #[test]
    fn round_trip() {
        let mut voice = voice();

        let note = voice.rising_edge(&mut cv(0.33), &mut Octave::Low, LogicLevel::ThreeVoltThree);
        assert_eq!(NoteIndex::new(6), note.ok(), "Expected left but got right");
        assert_eq!(Some(f64::from(23.12_f32)), hertz(&voice), "Expected left but got right");
        assert_eq!(
            SOUNDING_DUTY,
            voice.driver().state().duty(),
            "Expected left but got right"
        );
        assert_eq!(
            Indicators {
                gate: true,
                error: false
            },
            voice.indicators(),
            "Expected left but got right"
        );

        voice.falling_edge();
        assert_eq!(SILENT_DUTY, voice.driver().state().duty(), "Expected left but got right");
        assert_eq!(VoiceState::Silent, voice.state(), "Expected left but got right");
        assert_eq!(Indicators::default(), voice.indicators(), "Expected left but got right");
    }

    #[test]
    fn octave_is_read_when_programming() {
        let mut voice = voice();
        let mut selector = CountingSelector {
            octave: Octave::High,
            reads: 0,
        };

        voice
            .rising_edge(&mut Cv(0.0), &mut selector, LogicLevel::ThreeVoltThree)
            .expect("should be in range");
        assert_eq!(1, selector.reads, "Expected left but got right");
        assert_eq!(Some(f64::from(523.25_f32)), hertz(&voice), "Expected left but got right");

        selector.octave = Octave::Low;
        assert_eq!(
            Some(f64::from(523.25_f32)),
            hertz(&voice),
            "Changing the octave should not affect a sounding note"
        );

        voice
            .rising_edge(&mut Cv(0.0), &mut selector, LogicLevel::ThreeVoltThree)
            .expect("should be in range");
        assert_eq!(Some(f64::from(16.35_f32)), hertz(&voice), "Expected left but got right");
    }

    #[test]
    fn out_of_range_leaves_oscillator_untouched() {
        let mut voice = voice();
        voice
            .rising_edge(&mut cv(1.0), &mut Octave::Low, LogicLevel::ThreeVoltThree)
            .expect("should be in range");
        let before = voice.driver().state();
        let writes = voice.driver().output().writes;

        let mut selector = CountingSelector {
            octave: Octave::High,
            reads: 0,
        };
        let err = voice
            .rising_edge(&mut cv(3.3), &mut selector, LogicLevel::ThreeVoltThree)
            .expect_err("should be out of range");

        assert!(err.sample.as_volts() >= err.ceiling.as_volts(), "Sample should be above ceiling");
        assert_eq!(before, voice.driver().state(), "Expected left but got right");
        assert_eq!(writes, voice.driver().output().writes, "Oscillator should not be written");
        assert_eq!(0, selector.reads, "Octave should not be consulted without a note");
        assert_eq!(
            Indicators {
                gate: true,
                error: true
            },
            voice.indicators(),
            "Expected left but got right"
        );
    }

    #[test]
    fn out_of_range_from_silence_stays_silent() {
        let mut voice = voice();
        assert!(
            voice
                .rising_edge(&mut Cv(1.0), &mut Octave::Low, LogicLevel::ThreeVoltThree)
                .is_err(),
            "Full scale should be out of range"
        );
        assert_eq!(
            OscillatorState::SILENT,
            voice.driver().state(),
            "Expected left but got right"
        );
        assert_eq!(VoiceState::Sounding, voice.state(), "Gate is open nonetheless");
    }

    #[test]
    fn error_persists_until_falling_edge() {
        let mut voice = voice();
        let _ = voice.rising_edge(&mut cv(3.3), &mut Octave::Low, LogicLevel::ThreeVoltThree);
        assert!(voice.indicators().error, "Error should be raised");

        voice
            .rising_edge(&mut cv(1.0), &mut Octave::Low, LogicLevel::ThreeVoltThree)
            .expect("should be in range");
        assert!(
            voice.indicators().error,
            "A valid note should not clear an earlier error"
        );
        assert!(voice.driver().state().is_sounding(), "Valid note should still sound");

        voice.falling_edge();
        assert!(!voice.indicators().error, "Falling edge should clear the error");
    }

    #[test]
    fn falling_edge_always_silences() {
        let mut voice = voice();
        voice.falling_edge();
        assert_eq!(SILENT_DUTY, voice.driver().state().duty(), "Expected left but got right");

        voice
            .rising_edge(&mut cv(2.0), &mut Octave::High, LogicLevel::ThreeVoltThree)
            .expect("should be in range");
        voice.falling_edge();
        voice.falling_edge();
        assert_eq!(SILENT_DUTY, voice.driver().state().duty(), "Expected left but got right");
        assert_eq!(
            Some(SILENT_DUTY),
            voice.driver().output().applied.map(|state| state.duty()),
            "Expected left but got right"
        );
    }

    #[test]
    fn repeated_rising_edges_requantize() {
        let mut voice = voice();
        voice
            .rising_edge(&mut cv(0.33), &mut Octave::Low, LogicLevel::ThreeVoltThree)
            .expect("should be in range");
        let second = voice
            .rising_edge(&mut cv(0.66), &mut Octave::Low, LogicLevel::ThreeVoltThree)
            .expect("should be in range");
        assert_eq!(NoteIndex::new(12), Some(second), "Expected left but got right");
        assert_eq!(Some(f64::from(32.7_f32)), hertz(&voice), "Expected left but got right");
    }

    #[test]
    fn awaited_edge_alternates() {
        let mut voice = voice();
        assert_eq!(Edge::Rising, voice.awaited_edge(), "Expected left but got right");

        voice
            .rising_edge(&mut cv(0.33), &mut Octave::Low, LogicLevel::ThreeVoltThree)
            .expect("should be in range");
        assert_eq!(Edge::Falling, voice.awaited_edge(), "Expected left but got right");

        let _ = voice.rising_edge(&mut cv(3.3), &mut Octave::Low, LogicLevel::ThreeVoltThree);
        assert_eq!(
            Edge::Falling,
            voice.awaited_edge(),
            "An open gate awaits its close even with bad CV"
        );

        voice.falling_edge();
        assert_eq!(Edge::Rising, voice.awaited_edge(), "Expected left but got right");
    }

    #[test]
    fn trigger_shorter_than_response_still_voices_note() {
        let mut voice = voice();

        // the rising edge is reported after the gate has already dropped again
        let note = voice
            .handle(
                voice.awaited_edge(),
                &mut cv(0.33),
                &mut Octave::Low,
                LogicLevel::ThreeVoltThree,
            )
            .expect("should be in range");
        assert_eq!(NoteIndex::new(6), note, "Expected left but got right");
        assert_eq!(Some(f64::from(23.12_f32)), hertz(&voice), "Expected left but got right");

        let missed = voice.catch_up(GateState::Low);
        assert_eq!(Some(Edge::Falling), missed, "The end of the pulse should be caught up on");

        voice
            .handle(Edge::Falling, &mut cv(0.33), &mut Octave::Low, LogicLevel::ThreeVoltThree)
            .expect("falling edges never fail");
        assert!(!voice.driver().state().is_sounding(), "Should be silent");
        assert_eq!(
            Some(f64::from(23.12_f32)),
            hertz(&voice),
            "The pitch of the pulse should be retained"
        );
        assert_eq!(None, voice.catch_up(GateState::Low), "Nothing left to catch up on");
    }

    #[test]
    fn catch_up_finds_missed_edges() {
        let mut voice = voice();
        assert_eq!(
            Some(Edge::Rising),
            voice.catch_up(GateState::High),
            "A gate already high at boot should be caught up on"
        );
        assert_eq!(None, voice.catch_up(GateState::Low), "Expected left but got right");

        voice
            .rising_edge(&mut cv(0.33), &mut Octave::Low, LogicLevel::ThreeVoltThree)
            .expect("should be in range");
        assert_eq!(None, voice.catch_up(GateState::High), "Expected left but got right");
        assert_eq!(
            Some(Edge::Falling),
            voice.catch_up(GateState::Low),
            "Expected left but got right"
        );
    }

    #[test]
    fn edge_detector_starting_high() {
        let mut detector = EdgeDetector::starting_at(GateState::High);
        assert_eq!(None, detector.update(GateState::High), "Expected left but got right");
        assert_eq!(
            Some(Edge::Falling),
            detector.update(GateState::Low),
            "Expected left but got right"
        );
    }

    #[test]
    fn handle_dispatches() {
        let mut voice = voice();
        let note = voice
            .handle(Edge::Rising, &mut Cv(0.2), &mut Octave::Low, LogicLevel::Five)
            .expect("should be in range");
        // a fifth of 5 V is one octave up
        assert_eq!(NoteIndex::new(12), note, "Expected left but got right");

        let note = voice
            .handle(Edge::Falling, &mut Cv(0.2), &mut Octave::Low, LogicLevel::Five)
            .expect("falling edges never fail");
        assert_eq!(None, note, "Expected left but got right");
        assert!(!voice.driver().state().is_sounding(), "Should be silent");
    }
}
