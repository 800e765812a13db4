//! Fixed lookup tables relating control voltage to notes and notes to frequencies.
//!
//! Frequencies follow twelve-tone equal temperament tuned to A4 = 440 Hz, rounded to the hundredth of a hertz.
//! Both bands start on a C; the lower band spans C0 to C5 and the upper band C5 to B9, so the two overlap at C5.

/// Number of boundaries in a [`Thresholds`] table.
pub const THRESHOLD_COUNT: usize = 61;

/// Number of notes a [`Thresholds`] table can resolve. The topmost boundary marks the ceiling of the
/// supported range rather than the start of another note.
pub const NOTE_COUNT: usize = THRESHOLD_COUNT - 1;

/// Ascending voltage boundaries, one per semitone; a voltage at or above boundary `i` maps to note `i` or higher.
pub type Thresholds = [f32; THRESHOLD_COUNT];

/// Boundaries for CV divided down from 0-5 V to the 0-3.3 V range of the ADC.
///
/// The divider compresses the upper end of the range; B4 and C5 cannot be reached with it in place.
pub static THRESHOLDS_3V3: Thresholds = [
    0.0, 0.054, 0.104, 0.165, 0.2, 0.2704, 0.325, 0.381, 0.39, 0.4875, 0.5395, 0.5954,
    0.65, 0.7039, 0.754, 0.82, 0.86, 0.9204, 0.975, 1.04, 1.055, 1.1375, 1.1895, 1.2454,
    1.3, 1.354, 1.404, 1.47, 1.5, 1.5704, 1.625, 1.689, 1.72, 1.7875, 1.8395, 1.905,
    1.96, 2.004, 2.054, 2.12, 2.17, 2.2204, 2.275, 2.35, 2.39, 2.4375, 2.4895, 2.5454,
    2.61, 2.654, 2.704, 2.78, 2.839, 2.89, 2.925, 2.99, 3.05, 3.0875, 3.1395, 3.1954,
    3.204,
];

/// Boundaries for CV from 5 V logic devices, 1 V per octave.
pub static THRESHOLDS_5V: Thresholds = [
    0.0, 0.083, 0.16, 0.25, 0.3, 0.416, 0.5, 0.583, 0.6, 0.75, 0.83, 0.916,
    1.0, 1.083, 1.16, 1.25, 1.3, 1.416, 1.5, 1.583, 1.6, 1.75, 1.83, 1.916,
    2.0, 2.083, 2.16, 2.25, 2.3, 2.416, 2.5, 2.583, 2.6, 2.75, 2.83, 2.916,
    3.0, 3.083, 3.16, 3.25, 3.3, 3.416, 3.5, 3.583, 3.6, 3.75, 3.83, 3.916,
    4.0, 4.083, 4.16, 4.25, 4.3, 4.416, 4.5, 4.583, 4.6, 4.75, 4.83, 4.916,
    5.0,
];

/// Frequencies (Hz) of the lower band, C0 through C5.
pub static NOTE_FREQ_OCT1: [f32; 61] = [
    16.35, 17.32, 18.35, 19.45, 20.6, 21.83, 23.12, 24.5, 25.96, 27.5, 29.14, 30.87,
    32.7, 34.65, 36.71, 38.89, 41.2, 43.65, 46.25, 49.0, 51.91, 55.0, 58.27, 61.74,
    65.41, 69.3, 73.42, 77.78, 82.41, 87.31, 92.5, 98.0, 103.83, 110.0, 116.54, 123.47,
    130.81, 138.59, 146.83, 155.56, 164.81, 174.61, 185.0, 196.0, 207.65, 220.0, 233.08, 246.94,
    261.63, 277.18, 293.66, 311.13, 329.63, 349.23, 369.99, 392.0, 415.3, 440.0, 466.16, 493.88,
    523.25,
];

/// Frequencies (Hz) of the upper band, C5 through B9.
pub static NOTE_FREQ_OCT2: [f32; 60] = [
    523.25, 554.37, 587.33, 622.25, 659.25, 698.46, 739.99, 783.99, 830.61, 880.0,
    932.33, 987.77, 1046.5, 1108.73, 1174.66, 1244.51, 1318.51, 1396.91, 1479.98, 1567.98,
    1661.22, 1760.0, 1864.66, 1975.53, 2093.0, 2217.46, 2349.32, 2489.02, 2637.02, 2793.83,
    2959.96, 3135.96, 3322.44, 3520.0, 3729.31, 3951.07, 4186.01, 4434.92, 4698.63, 4978.03,
    5274.04, 5587.65, 5919.91, 6271.93, 6644.88, 7040.0, 7458.62, 7902.13, 8372.02, 8869.84,
    9397.27, 9956.06, 10548.08, 11175.3, 11839.82, 12543.86, 13289.75, 14080.0, 14917.24, 15804.26,
];
