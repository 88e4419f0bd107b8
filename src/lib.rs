//! Audioscope library - audio player with a real-time visualizer
//!
//! A decoded file plays through source → low-shelf → gain → analyser →
//! output; every display frame samples the analyser and draws frequency
//! bars or a waveform, plus loudness and pitch readouts.

pub mod audio;
pub mod cli;
pub mod controller;
pub mod error;
pub mod media;
pub mod offline;
pub mod params;
pub mod player;
pub mod rendering;
pub mod visualizer;
