//! Core pipeline for the CME Explorer viewer: CDF container parsing, channel
//! reduction, date filtering, spike detection, and CSV export. The binary in
//! `src/main.rs` layers the egui presentation on top of this crate.

pub mod data;
