//! # Pin pipeline
//!
//! Input path of every pin, sampled once per tick:
//!
//! ```text
//!  raw ──► [stage 1] ──► [stage 2] ──► debounce filter ──► IN / interrupt logic
//! ```
//!
//! The two synchronizer stages protect downstream logic from metastable values
//! coming from the asynchronous outside world, at the cost of 2 ticks of latency.
//!
//! The debounce filter holds the accepted level and counts how many consecutive
//! ticks the synchronized level has disagreed with it. Once the count reaches
//! the threshold the held level flips. Any agreement in between restarts the
//! count, so pulses shorter than the threshold never get through.
//!
//! The output path has no pipeline: output enable and driven value come straight
//! from `DIR` and `OUT`.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

use super::registers::RegisterBank;
use super::{HardwareComponent, PIN_COUNT};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinChannel {
    sync_stage1: bool,
    sync_stage2: bool,
    debounce_counter: u16,
    debounced_value: bool,
}

impl PinChannel {
    /// Synchronized level, i.e. the output of the second stage.
    #[must_use]
    pub const fn synchronized(&self) -> bool {
        self.sync_stage2
    }

    #[must_use]
    pub const fn debounce_counter(&self) -> u16 {
        self.debounce_counter
    }

    /// Level accepted by the filter with `threshold`.
    /// A zero threshold passes the synchronized level through.
    #[must_use]
    pub const fn debounced(&self, threshold: u16) -> bool {
        if threshold == 0 {
            self.sync_stage2
        } else {
            self.debounced_value
        }
    }

    /// Returns true when the held level flipped.
    fn step(&mut self, raw: bool, threshold: u16) -> bool {
        let synchronized = self.sync_stage2;
        let mut flipped = false;

        if synchronized == self.debounced_value {
            self.debounce_counter = 0;
        } else {
            let count = self.debounce_counter.saturating_add(1);
            if count >= threshold {
                self.debounced_value = synchronized;
                self.debounce_counter = 0;
                flipped = true;
            } else {
                self.debounce_counter = count;
            }
        }

        self.sync_stage2 = self.sync_stage1;
        self.sync_stage1 = raw;

        flipped
    }
}

/// Inputs sampled by the pipeline on a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PinSample {
    /// Raw pad levels, bit n is pin n.
    pub raw: u32,
    pub threshold: u16,
}

/// Signals driven to the pads.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadOutputs {
    pub value: u32,
    pub enable: u32,
}

impl PadOutputs {
    #[must_use]
    pub const fn from_bank(bank: &RegisterBank) -> Self {
        Self {
            value: bank.output_value,
            enable: bank.direction,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PinPipeline {
    channels: [PinChannel; PIN_COUNT],
}

impl PinPipeline {
    #[must_use]
    pub fn channel(&self, pin: usize) -> Option<&PinChannel> {
        self.channels.get(pin)
    }

    /// Debounced input of every pin, bit n is pin n.
    #[must_use]
    pub fn debounced(&self, threshold: u16) -> u32 {
        u32::from_lanes(
            self.channels
                .iter()
                .map(|channel| channel.debounced(threshold)),
        )
    }

    #[must_use]
    pub fn synchronized(&self) -> u32 {
        u32::from_lanes(self.channels.iter().map(PinChannel::synchronized))
    }
}

impl HardwareComponent for PinPipeline {
    type Input = PinSample;

    fn step(&mut self, sample: Self::Input) {
        let lanes = sample.raw.lanes();
        for (pin, (channel, raw)) in self.channels.iter_mut().zip(lanes).enumerate() {
            if channel.step(raw, sample.threshold) {
                tracing::trace!(
                    "pin {pin} debounced level is now {}",
                    u8::from(channel.debounced_value)
                );
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Steps the pipeline with a constant raw value, returning the debounced
    /// value seen after each tick.
    fn run(pipeline: &mut PinPipeline, raw: u32, threshold: u16, ticks: usize) -> Vec<u32> {
        (0..ticks)
            .map(|_| {
                pipeline.step(PinSample { raw, threshold });
                pipeline.debounced(threshold)
            })
            .collect()
    }

    #[test]
    fn synchronizer_has_two_ticks_of_latency() {
        let mut pipeline = PinPipeline::default();

        pipeline.step(PinSample {
            raw: 0x1,
            threshold: 0,
        });
        assert_eq!(pipeline.synchronized(), 0);

        pipeline.step(PinSample {
            raw: 0x1,
            threshold: 0,
        });
        assert_eq!(pipeline.synchronized(), 0x1);
    }

    #[test]
    fn zero_threshold_is_pass_through() {
        let mut pipeline = PinPipeline::default();

        assert_eq!(
            run(&mut pipeline, 0x8000_0001, 0, 3),
            vec![0_u32, 0x8000_0001, 0x8000_0001]
        );
        assert_eq!(run(&mut pipeline, 0, 0, 2), vec![0x8000_0001_u32, 0]);
    }

    #[test]
    fn short_pulses_are_rejected() {
        let mut pipeline = PinPipeline::default();
        let threshold = 4;

        for raw in [1, 0, 1, 0, 1, 0, 0, 0, 0, 0] {
            pipeline.step(PinSample { raw, threshold });
            assert_eq!(pipeline.debounced(threshold), 0);
        }
    }

    #[test]
    fn pulse_one_tick_short_is_rejected() {
        let mut pipeline = PinPipeline::default();
        let threshold = 4;

        run(&mut pipeline, 1, threshold, 3);
        let trace = run(&mut pipeline, 0, threshold, 8);

        assert!(trace.iter().all(|&value| value == 0));
    }

    #[test]
    fn stable_level_is_accepted_once() {
        let mut pipeline = PinPipeline::default();
        let threshold = 4;

        let trace = run(&mut pipeline, 1, threshold, 12);

        // 2 ticks to synchronize, then 4 ticks of disagreement.
        assert_eq!(trace[..5], [0_u32; 5]);
        assert_eq!(trace[5..], [1_u32; 7]);

        let flips = trace.windows(2).filter(|pair| pair[0] != pair[1]).count();
        assert_eq!(flips, 1);
    }

    #[test]
    fn flicker_restarts_the_count() {
        let mut pipeline = PinPipeline::default();
        let threshold = 3;

        // Bounces a few times before settling high.
        for raw in [1, 1, 0, 1, 1, 0, 1] {
            pipeline.step(PinSample { raw, threshold });
        }
        assert_eq!(pipeline.debounced(threshold), 0);

        let trace = run(&mut pipeline, 1, threshold, 6);
        assert_eq!(trace.last(), Some(&1));
    }

    #[test]
    fn counter_stays_below_threshold() {
        let mut pipeline = PinPipeline::default();
        let threshold = 5;

        for _ in 0..20 {
            pipeline.step(PinSample { raw: 1, threshold });
            let channel = pipeline.channel(0).unwrap();
            assert!(channel.debounce_counter() < threshold);
        }
    }

    #[test]
    fn pins_are_independent() {
        let mut pipeline = PinPipeline::default();
        let threshold = 2;

        run(&mut pipeline, 0b01, threshold, 10);
        assert_eq!(pipeline.debounced(threshold), 0b01);

        // Pin 1 bounces while pin 0 stays high.
        for raw in [0b11, 0b01, 0b11, 0b01] {
            pipeline.step(PinSample { raw, threshold });
            assert_eq!(pipeline.debounced(threshold), 0b01);
        }
    }

    #[test]
    fn pads_come_from_the_bank() {
        let bank = RegisterBank {
            direction: 0x0F,
            output_value: 0xA5,
            ..RegisterBank::default()
        };

        assert_eq!(
            PadOutputs::from_bank(&bank),
            PadOutputs {
                value: 0xA5,
                enable: 0x0F,
            }
        );
    }

    #[test]
    fn reset_clears_all_channels() {
        let mut pipeline = PinPipeline::default();
        run(&mut pipeline, u32::MAX, 1, 5);
        pipeline.reset();

        assert_eq!(pipeline.synchronized(), 0);
        assert_eq!(pipeline.debounced(1), 0);
        assert_eq!(pipeline.channel(31), Some(&PinChannel::default()));
        assert_eq!(pipeline.channel(32), None);
    }
}
