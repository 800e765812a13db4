use crate::tables::{THRESHOLDS_3V3, THRESHOLDS_5V, Thresholds};
use measurements::Voltage;
use num_derive::{FromPrimitive, ToPrimitive};

/// Describes how incoming control voltage has been scaled by the time it reaches the ADC, which determines both the voltage
/// that a full-scale reading represents and the boundaries used to resolve notes.
///
/// Most CV keyboards and sequencers built around 5 V logic need their output divided down to protect a 3.3 V ADC; with
/// that divider in place, use [`LogicLevel::ThreeVoltThree`]. [`LogicLevel::Five`] is for sources which are scaled
/// externally so that a full-scale reading means 5 V.
#[derive(Debug, Default, Copy, Clone, ToPrimitive, FromPrimitive, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogicLevel {
    /// A full-scale reading represents 3.3 V.
    #[default]
    ThreeVoltThree,
    /// A full-scale reading represents 5 V.
    Five,
}

impl LogicLevel {
    /// Returns the voltage represented by a full-scale ADC reading.
    pub fn full_scale(&self) -> Voltage {
        match self {
            Self::ThreeVoltThree => Voltage::from_volts(3.3),
            Self::Five => Voltage::from_volts(5.0),
        }
    }

    /// Returns the note boundaries for CV at this logic level.
    pub fn thresholds(&self) -> &'static Thresholds {
        match self {
            Self::ThreeVoltThree => &THRESHOLDS_3V3,
            Self::Five => &THRESHOLDS_5V,
        }
    }

    /// Converts a raw reading, expressed as a fraction of full scale, into a [`Voltage`].
    ///
    /// Readings outside `0.0..=1.0` are clamped. `NaN` passes through untouched so that it can be rejected downstream.
    pub fn normalize(&self, reading: f32) -> Voltage {
        let fraction = f64::from(reading.clamp(0.0, 1.0));
        Voltage::from_volts(fraction * self.full_scale().as_volts())
    }
}

impl super::CycleConfig for LogicLevel {}
