//! Tasks and types related to the octave switch.

use cvgate_square_lib::{
    configuration::{OCTAVE_POLL_INTERVAL, Octave},
    gate::OctaveSelector,
};
use defmt::info;
use embassy_stm32::gpio::{Input, Output};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    watch::{AnonReceiver, Sender, Watch},
};
use embassy_time::Ticker;

const OCTAVE_RECEIVER_CNT: usize = 0;
/// Syncs the [`Octave`] selection across tasks.
pub static OCTAVE_SYNC: Watch<CriticalSectionRawMutex, Octave, OCTAVE_RECEIVER_CNT> =
    Watch::new_with(Octave::Low);
pub type OctaveSender<'a> = Sender<'a, CriticalSectionRawMutex, Octave, OCTAVE_RECEIVER_CNT>;
pub type OctaveSpy<'a> = AnonReceiver<'a, CriticalSectionRawMutex, Octave, OCTAVE_RECEIVER_CNT>;

/// Read side of the octave selection, for use by the gate task.
pub struct OctaveReader(OctaveSpy<'static>);

impl OctaveReader {
    pub fn new(spy: OctaveSpy<'static>) -> Self {
        Self(spy)
    }
}

impl OctaveSelector for OctaveReader {
    fn octave(&mut self) -> Octave {
        self.0.try_get().unwrap_or_default()
    }
}

/// Polls the octave DIP switch, publishing changes and keeping the octave 1 and octave 2 LEDs in step with it.
///
/// The switch is treated as a level; the selection only matters at the moment a note is voiced, so there is no need to
/// debounce it or react to its edges.
#[embassy_executor::task]
pub async fn poll_octave_switch(
    switch: Input<'static>,
    mut octave_1_led: Output<'static>,
    mut octave_2_led: Output<'static>,
    octave: OctaveSender<'static>,
) -> ! {
    let mut ticker = Ticker::every(OCTAVE_POLL_INTERVAL);
    loop {
        let selected = Octave::from(switch.is_high());
        if octave.try_get() != Some(selected) {
            info!("Octave switched to {}", selected);
            octave.send(selected);
        }

        let (octave_1, octave_2) = selected.indicators();
        octave_1_led.set_level(octave_1.into());
        octave_2_led.set_level(octave_2.into());

        ticker.next().await;
    }
}
