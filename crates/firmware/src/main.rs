//! [Embassy](https://embassy.dev)-based firmware for a [CV/gate](https://en.wikipedia.org/wiki/CV/gate) controlled square
//! oscillator. The firmware runs on the [Nucleo-F767ZI development
//! board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html), which is powered by an F7-series STM32
//! microcontroller.
//!
//! Whenever the gate input goes high, the control voltage is sampled, quantized to one of 60 semitones, and sounded as a
//! square wave from the band chosen by the octave switch. The wave stops when the gate goes low. Control voltage which
//! lies above the supported range lights the error LED and leaves the pitch alone until the gate closes.
//!
//! Connections:
//!
//! | Signal               | Pin               |
//! |----------------------|-------------------|
//! | CV in                | PA3 (ADC1 IN3)    |
//! | Gate in              | PD0               |
//! | Octave switch        | PF14 (to 3.3 V)   |
//! | Square out           | PB4 (TIM3 CH1)    |
//! | Octave 1 / 2 LEDs    | PE2 / PE4         |
//!
//! The on-board LEDs show the gate (green), the CV error (red) and the
//! [logic level](cvgate_square_lib::configuration::LogicLevel) (blue), which the user button cycles.

#![no_std]
#![no_main]

mod gate;
mod logic_level;
mod octave;
mod oscillator;

use crate::{
    gate::CvInput,
    logic_level::LOGIC_LEVEL_SYNC,
    octave::{OCTAVE_SYNC, OctaveReader},
    oscillator::SquareOutput,
};
use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::{
    Config,
    adc::{Adc, AdcChannel, SampleTime},
    exti::ExtiInput,
    gpio::{Input, Level, Output, OutputType, Pull, Speed},
    time::Hertz,
    timer::{
        low_level::CountingMode,
        simple_pwm::{PwmPin, SimplePwm},
    },
};

#[cfg(feature = "defmt-rtt")]
use defmt_rtt as _;
#[cfg(not(feature = "panic-probe"))]
use panic_halt as _;
#[cfg(feature = "panic-probe")]
use panic_probe as _;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Initializing CV/gate square oscillator");

    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        // hse: high-speed external clock
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Bypass,
        });

        // pll: phase-locked loop, crucial for dividing clock
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL216,
            divp: Some(PllPDiv::DIV2), // 8mhz / 4 * 216 / 2 = 216Mhz
            divq: None,
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        // APB1 at 54Mhz puts its timers (TIM3 included) at 108Mhz; see oscillator::TIMER_CLOCK_HZ
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
    }
    let p = embassy_stm32::init(config);

    let octave_switch = Input::new(p.PF14, Pull::Down);
    let octave_1_led = Output::new(p.PE2, Level::Low, Speed::Low);
    let octave_2_led = Output::new(p.PE4, Level::Low, Speed::Low);
    unwrap!(spawner.spawn(octave::poll_octave_switch(
        octave_switch,
        octave_1_led,
        octave_2_led,
        OCTAVE_SYNC.sender()
    )));

    let button = ExtiInput::new(p.PC13, p.EXTI13, Pull::None);
    let blue_led = Output::new(p.PB7, Level::Low, Speed::Low);
    unwrap!(spawner.spawn(logic_level::logic_level_config(
        button,
        blue_led,
        LOGIC_LEVEL_SYNC.sender()
    )));

    // the starting frequency is irrelevant; SquareOutput reprograms the timer for every note
    let pwm = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new(p.PB4, OutputType::PushPull)),
        None,
        None,
        None,
        Hertz(1_000),
        CountingMode::EdgeAlignedUp,
    );
    let output = SquareOutput::new(pwm);

    let mut adc = Adc::new(p.ADC1);
    // the longest sample time gives the CV source, which may sit behind a voltage divider, the most time to settle
    adc.set_sample_time(SampleTime::CYCLES480);
    let cv = CvInput::new(adc, p.PA3.degrade_adc());

    let gate_input = ExtiInput::new(p.PD0, p.EXTI0, Pull::None);
    let green_led = Output::new(p.PB0, Level::Low, Speed::Low);
    let red_led = Output::new(p.PB14, Level::Low, Speed::Low);
    unwrap!(spawner.spawn(gate::gate(
        gate_input,
        cv,
        output,
        green_led,
        red_led,
        OctaveReader::new(OCTAVE_SYNC.anon_receiver()),
        LOGIC_LEVEL_SYNC.anon_receiver()
    )));
}
