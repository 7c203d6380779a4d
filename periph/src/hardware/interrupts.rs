//! # Interrupt controller
//!
//! Every pin owns one sticky bit in `INT_STATUS`. A bit is raised by:
//!
//! - **Edge** sources (`INT_TYPE` = 1): a transition of the debounced input in
//!   the direction selected by `INT_POLARITY` (1 = rising, 0 = falling).
//! - **Level** sources (`INT_TYPE` = 0): every tick the debounced input sits at
//!   the level selected by `INT_POLARITY` (1 = high, 0 = low).
//!
//! Only pins enabled in `INT_MASK` raise their bit. Writing 1s to `INT_STATUS`
//! clears the matching bits one tick later, but a level source that is still
//! active wins over the clear: the bit never drops and neither does the IRQ line.
//!
//! The IRQ line is the OR of all status bits.

use serde::{Deserialize, Serialize};

use super::HardwareComponent;
use super::registers::InterruptConfig;

/// Values sampled by the controller on a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptInput {
    pub debounced: u32,
    pub config: InterruptConfig,
    /// W1C pulse from the register file.
    pub clear: u32,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InterruptController {
    /// Debounced input as seen on the previous tick, for edge detection.
    prev_debounced: u32,
    status: u32,
}

impl InterruptController {
    #[must_use]
    pub const fn status(&self) -> u32 {
        self.status
    }

    #[must_use]
    pub const fn irq(&self) -> bool {
        self.status != 0
    }

    /// Bits to raise this tick given the current debounced input.
    #[must_use]
    pub const fn set_events(&self, debounced: u32, config: InterruptConfig) -> u32 {
        let rising = debounced & !self.prev_debounced;
        let falling = !debounced & self.prev_debounced;

        let edge_enabled = config.mask & config.edge_type;
        let level_enabled = config.mask & !config.edge_type;

        let edges = (rising & config.polarity) | (falling & !config.polarity);
        let edge_events = edge_enabled & edges;
        let level_events = level_enabled & !(debounced ^ config.polarity);

        edge_events | level_events
    }
}

impl HardwareComponent for InterruptController {
    type Input = InterruptInput;

    fn step(&mut self, input: Self::Input) {
        let set = self.set_events(input.debounced, input.config);

        // Raising wins over clearing, so an active level keeps its bit.
        let next = (self.status & !input.clear) | set;

        if input.clear != 0 {
            let kept = input.clear & self.status & set;
            tracing::debug!(
                "clearing INT_STATUS bits 0x{:08X}, 0x{kept:08X} kept by active sources",
                input.clear
            );
        }

        match (self.status != 0, next != 0) {
            (false, true) => tracing::debug!("irq asserted, status 0x{next:08X}"),
            (true, false) => tracing::debug!("irq deasserted"),
            _ => {}
        }

        self.prev_debounced = input.debounced;
        self.status = next;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
