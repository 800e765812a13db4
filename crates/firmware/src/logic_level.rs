//! Tasks and types related to the [logic level](`LogicLevel`) configuration.

use cvgate_square_lib::configuration::{CycleConfig, LogicLevel};
use defmt::info;
use embassy_stm32::{exti::ExtiInput, gpio::Output};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    watch::{AnonReceiver, Sender, Watch},
};

const LOGIC_LEVEL_RECEIVER_CNT: usize = 0;
/// Syncs [logic level](`LogicLevel`) config across tasks.
pub static LOGIC_LEVEL_SYNC: Watch<CriticalSectionRawMutex, LogicLevel, LOGIC_LEVEL_RECEIVER_CNT> =
    Watch::new_with(LogicLevel::ThreeVoltThree);
pub type LogicLevelSender<'a> =
    Sender<'a, CriticalSectionRawMutex, LogicLevel, LOGIC_LEVEL_RECEIVER_CNT>;
pub type LogicLevelSpy<'a> =
    AnonReceiver<'a, CriticalSectionRawMutex, LogicLevel, LOGIC_LEVEL_RECEIVER_CNT>;

/// Input and status indicator for the [logic level](`LogicLevel`) configuration.
///
/// Each press of the button advances to the next logic level. The LED is dark for 3.3 V and lit for 5 V. A toggle switch
/// would suit a two-way choice better, but the user button is all the board offers without extra wiring.
#[embassy_executor::task]
pub async fn logic_level_config(
    mut button: ExtiInput<'static>,
    mut led: Output<'static>,
    logic_level: LogicLevelSender<'static>,
) -> ! {
    loop {
        button.wait_for_rising_edge().await;

        let new_state = logic_level.try_get().unwrap_or_default().cycle();
        logic_level.send(new_state);
        info!("Logic level set to {}", new_state);

        match new_state {
            LogicLevel::ThreeVoltThree => {
                led.set_low();
            }
            LogicLevel::Five => {
                led.set_high();
            }
        }
    }
}
