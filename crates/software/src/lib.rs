//! This crate contains architecture-agnostic logic for a [CV/gate](https://en.wikipedia.org/wiki/CV/gate) controlled square
//! oscillator: a module which samples a control voltage whenever its gate opens, quantizes it to the nearest semitone,
//! and sounds that note as a 50% duty cycle square wave until the gate closes.
//!
//! Two bands of 60 notes are available, C0 to C5 and C5 to B9, selected by an octave switch.

#![deny(missing_docs)]
#![no_std]

pub mod configuration;
pub mod gate;
pub mod oscillator;
pub mod quantizer;
pub mod tables;
