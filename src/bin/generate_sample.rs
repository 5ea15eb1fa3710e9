use chrono::{Duration, TimeZone, Utc};

use cme_explorer::data::cdf::{datetime_to_epoch, CdfBuilder};
use cme_explorer::data::loader::{VAR_ENERGY, VAR_EPOCH, VAR_FLUX, VAR_UNCERTAINTY};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Smooth enhancement factor for a CME-like interval: fast rise, slow decay.
fn spike_profile(minute: usize, onset: usize, duration: usize, amplitude: f64) -> f64 {
    if minute < onset || minute >= onset + duration {
        return 0.0;
    }
    let phase = (minute - onset) as f64 / duration as f64;
    amplitude * (1.0 - phase).powi(2) * (phase * 12.0).min(1.0)
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // One day of minute-cadence measurements.
    let n_minutes = 1440;
    let start = Utc.with_ymd_and_hms(2025, 5, 27, 0, 0, 0).unwrap();
    let epochs: Vec<f64> = (0..n_minutes)
        .map(|i| datetime_to_epoch(start + Duration::minutes(i as i64)))
        .collect();

    // Fixed energy-channel centers (eV), roughly log-spaced.
    let energy: [f64; 8] = [110.0, 160.0, 230.0, 340.0, 500.0, 730.0, 1070.0, 1570.0];
    let n_channels = energy.len();

    // Three CME-like enhancements: (onset minute, duration, amplitude).
    let events = [(310, 90, 6.0), (820, 45, 12.0), (1255, 120, 4.0)];

    let mut flux = Vec::with_capacity(n_minutes * n_channels);
    let mut uncertainty = Vec::with_capacity(n_minutes * n_channels);
    for minute in 0..n_minutes {
        let enhancement: f64 = events
            .iter()
            .map(|&(onset, duration, amp)| spike_profile(minute, onset, duration, amp))
            .sum();
        for (ch, &e_center) in energy.iter().enumerate() {
            // Quiet solar-wind baseline falls off with channel energy.
            let baseline = 8.0 * (-(ch as f64) * 0.35).exp() + 0.4;
            let enhanced = baseline * (1.0 + enhancement * (-(e_center / 900.0)).exp());
            let value = (enhanced + rng.gauss(0.0, 0.05 * baseline)).max(0.0);
            flux.push(value);
            uncertainty.push(value * (0.05 + 0.03 * rng.next_f64()));
        }
    }

    let output_path = "sample_swis_l2.cdf";
    let result = CdfBuilder::new()
        .epoch(VAR_EPOCH, &epochs)
        .channels(VAR_FLUX, n_minutes, n_channels, &flux)
        .channels(VAR_UNCERTAINTY, n_minutes, n_channels, &uncertainty)
        .fixed(VAR_ENERGY, &energy)
        .write_to(output_path);

    match result {
        Ok(()) => println!(
            "Wrote {n_minutes} records x {n_channels} channels ({} events) to {output_path}",
            events.len()
        ),
        Err(e) => {
            eprintln!("Failed to write {output_path}: {e}");
            std::process::exit(1);
        }
    }
}
