//! Drives the square-wave output from TIM3 channel 1.

use cvgate_square_lib::oscillator::{Oscillator, OscillatorState, PwmTiming};
use defmt::warn;
use embassy_stm32::{pac, peripherals::TIM3, timer::simple_pwm::SimplePwm};
use measurements::Frequency;

/// Frequency of the clock feeding TIM3.
///
/// TIM3 hangs off APB1, which `main` runs at a quarter of the 216 MHz system clock. Whenever the APB prescaler is not 1,
/// timers are clocked at twice their bus frequency, hence 108 MHz.
const TIMER_CLOCK_HZ: f64 = 108_000_000.0;

/// The square-wave output.
///
/// [`SimplePwm`] takes care of pin and channel setup, but it only accepts whole-hertz frequencies, which would put low
/// notes audibly out of tune. Prescaler, period and compare registers are therefore written directly.
pub struct SquareOutput {
    // held so the pin stays configured for the timer
    _pwm: SimplePwm<'static, TIM3>,
}

impl SquareOutput {
    /// Takes over a [`SimplePwm`] with channel 1 configured, leaving the output silent.
    pub fn new(mut pwm: SimplePwm<'static, TIM3>) -> Self {
        // buffer the period so it changes together with the compare value, which SimplePwm already buffers
        pac::TIM3.cr1().modify(|w| w.set_arpe(true));

        let mut channel = pwm.ch1();
        channel.set_duty_cycle_fully_off();
        channel.enable();

        Self { _pwm: pwm }
    }

    fn write(&mut self, timing: PwmTiming) {
        let regs = pac::TIM3;
        regs.psc().write_value(timing.prescaler);
        regs.arr().write(|w| w.set_arr(timing.auto_reload));
        regs.ccr(0).write(|w| w.set_ccr(timing.compare));
        // load all three buffered values at once and restart the period
        regs.egr().write(|w| w.set_ug(true));
    }
}

impl Oscillator for SquareOutput {
    fn apply(&mut self, state: OscillatorState) {
        match PwmTiming::for_state(Frequency::from_hertz(TIMER_CLOCK_HZ), &state) {
            Some(timing) => self.write(timing),
            None => {
                // every table frequency fits TIM3 at this clock, so only the silent state before the first note gets
                // here; otherwise the output would fall silent while the voice still reports it as sounding
                defmt::debug_assert!(
                    !state.is_sounding(),
                    "TIM3 cannot produce a note the voice believes is sounding"
                );
                if state.is_sounding() {
                    warn!("Requested frequency is beyond what TIM3 can produce; silencing output");
                }
                pac::TIM3.ccr(0).write(|w| w.set_ccr(0));
            }
        }
    }
}
