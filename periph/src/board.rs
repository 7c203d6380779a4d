//! A [`Gpio`] seen from the outside: pad levels driven by the environment and a
//! bus master issuing complete two-tick transactions.

use crate::bitwise::Bits;
use crate::bus::BusSignals;
use crate::gpio::{Gpio, TickInput, TickOutput};
use crate::hardware::PIN_COUNT;

#[derive(Debug, Default, Clone)]
pub struct Board {
    gpio: Gpio,
    /// Levels currently driven on the pads.
    gpio_in: u32,
    last_output: TickOutput,
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn gpio(&self) -> &Gpio {
        &self.gpio
    }

    pub const fn gpio_mut(&mut self) -> &mut Gpio {
        &mut self.gpio
    }

    #[must_use]
    pub const fn pad_levels(&self) -> u32 {
        self.gpio_in
    }

    /// Outputs sampled on the last tick.
    #[must_use]
    pub const fn last_output(&self) -> TickOutput {
        self.last_output
    }

    /// Drives every pad at once, bit n is pin n. Takes effect on the next tick.
    pub const fn set_pads(&mut self, levels: u32) {
        self.gpio_in = levels;
    }

    /// Drives a single pad. Pins past [`PIN_COUNT`] don't exist and are ignored.
    pub fn set_pad(&mut self, pin: u8, level: bool) {
        if usize::from(pin) >= PIN_COUNT {
            tracing::warn!("ignoring level for nonexistent pin {pin}");
            return;
        }
        self.gpio_in.set_bit(pin, level);
    }

    /// Holds reset for `ticks` ticks (at least one), then releases it.
    pub fn reset(&mut self, ticks: usize) {
        for _ in 0..ticks.max(1) {
            self.tick(false, BusSignals::idle());
        }
    }

    /// Runs `ticks` ticks with the bus idle.
    pub fn idle(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick(true, BusSignals::idle());
        }
    }

    /// SETUP then ACCESS. The value lands at the end of the ACCESS tick.
    pub fn write(&mut self, address: u32, value: u32) {
        let setup = BusSignals::setup_write(address, value);
        self.tick(true, setup);
        self.tick(true, setup.into_access());
    }

    /// SETUP then ACCESS, returning the data sampled on the ACCESS tick.
    pub fn read(&mut self, address: u32) -> u32 {
        let setup = BusSignals::setup_read(address);
        self.tick(true, setup);
        self.tick(true, setup.into_access()).bus.read_data
    }

    fn tick(&mut self, reset_n: bool, bus: BusSignals) -> TickOutput {
        self.last_output = self.gpio.tick(&TickInput {
            reset_n,
            bus,
            gpio_in: self.gpio_in,
        });
        self.last_output
    }
}
