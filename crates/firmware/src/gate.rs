//! Controls the response to the gate input: sampling CV, voicing notes and mirroring status to LEDs.

use crate::{logic_level::LogicLevelSpy, octave::OctaveReader, oscillator::SquareOutput};
use cvgate_square_lib::gate::{ControlVoltage, Edge, GateState, Voice};
use defmt::warn;
use embassy_futures::select::{Either, select};
use embassy_stm32::{
    adc::{Adc, AnyAdcChannel},
    exti::ExtiInput,
    gpio::Output,
    peripherals::ADC1,
};
use embassy_time::Timer;

/// Largest value the 12-bit ADC reports.
const ADC_MAX: f32 = 4095.0;

/// How long to wait for an edge before comparing the gate level with the voice anyway.
///
/// An edge is latched by EXTI from the moment the wait for it begins. One landing between reading the level and that
/// moment is caught up on after at most this long; a pulse which both starts and ends in that window (a few microseconds)
/// goes unnoticed.
const GATE_RESYNC_MS: u64 = 5;

/// The control voltage input.
pub struct CvInput {
    adc: Adc<'static, ADC1>,
    channel: AnyAdcChannel<ADC1>,
}

impl CvInput {
    pub fn new(adc: Adc<'static, ADC1>, channel: AnyAdcChannel<ADC1>) -> Self {
        Self { adc, channel }
    }
}

impl ControlVoltage for CvInput {
    fn read(&mut self) -> f32 {
        f32::from(self.adc.blocking_read(&mut self.channel)) / ADC_MAX
    }
}

/// Task responsible for the gate: each edge is handled to completion before the next is awaited, so a note-off can never
/// cut into a note-on that is still being voiced.
///
/// The task waits for the specific edge the voice responds to next and acts on the edge itself rather than on the level
/// that follows it, so trigger pulses shorter than the time it takes to respond still voice a note.
#[embassy_executor::task]
pub async fn gate(
    mut gate: ExtiInput<'static>,
    mut cv: CvInput,
    output: SquareOutput,
    mut gate_led: Output<'static>,
    mut error_led: Output<'static>,
    mut octave: OctaveReader,
    mut logic_level: LogicLevelSpy<'static>,
) -> ! {
    let mut voice = Voice::new(output);

    loop {
        let edge = match voice.catch_up(GateState::from(gate.is_high())) {
            Some(missed) => missed,
            None => {
                let awaited = voice.awaited_edge();
                let woke = match awaited {
                    Edge::Rising => {
                        select(
                            gate.wait_for_rising_edge(),
                            Timer::after_millis(GATE_RESYNC_MS),
                        )
                        .await
                    }
                    Edge::Falling => {
                        select(
                            gate.wait_for_falling_edge(),
                            Timer::after_millis(GATE_RESYNC_MS),
                        )
                        .await
                    }
                };
                match woke {
                    Either::First(()) => awaited,
                    Either::Second(()) => continue,
                }
            }
        };

        let logic_level = logic_level.try_get().unwrap_or_default();
        if let Err(err) = voice.handle(edge, &mut cv, &mut octave, logic_level) {
            warn!(
                "Gate opened with unusable control voltage, keeping previous pitch: {}",
                err
            );
        }

        let indicators = voice.indicators();
        gate_led.set_level(indicators.gate.into());
        error_led.set_level(indicators.error.into());
    }
}
