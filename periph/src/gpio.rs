//! # GPIO controller
//!
//! [`Gpio`] wires the bus interface, register file, pin pipeline and interrupt
//! controller together and advances them in lock-step with [`Gpio::tick`].
//!
//! Each tick works like a rising clock edge:
//!
//! 1. Combinational outputs (read data, pads, IRQ) are computed from the current
//!    state.
//! 2. Every component computes its next state from values sampled in step 1,
//!    in dependency order: pins, interrupts, registers, bus.
//!
//! No component ever sees another's update from the same tick, so a register
//! write becomes visible on the tick after its ACCESS phase.

use serde::{Deserialize, Serialize};

use crate::bus::{BusInterface, BusPhase, BusResponse, BusSignals};
use crate::hardware::HardwareComponent;
use crate::hardware::interrupts::{InterruptController, InterruptInput};
use crate::hardware::pins::{PadOutputs, PinChannel, PinPipeline, PinSample};
use crate::hardware::registers::{ReadOnlyValues, RegisterBank, RegisterFile};

/// Everything driven into the peripheral on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInput {
    /// Active low, released synchronously.
    pub reset_n: bool,
    pub bus: BusSignals,
    /// Raw pad levels, bit n is pin n.
    pub gpio_in: u32,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            reset_n: true,
            bus: BusSignals::idle(),
            gpio_in: 0,
        }
    }
}

/// Everything the peripheral drives during a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickOutput {
    pub bus: BusResponse,
    pub pads: PadOutputs,
    pub irq: bool,
}

/// Complete state of the peripheral, as saved by [`Gpio::snapshot`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    bus: BusInterface,
    registers: RegisterFile,
    pins: PinPipeline,
    interrupts: InterruptController,
    ticks: u64,
}

#[derive(Debug, Default, Clone)]
pub struct Gpio {
    bus: BusInterface,
    registers: RegisterFile,
    pins: PinPipeline,
    interrupts: InterruptController,

    /// Ticks since the last reset.
    ticks: u64,
    reset_asserted: bool,
}

impl Gpio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, input: &TickInput) -> TickOutput {
        let threshold = self.registers.debounce_threshold();
        let debounced = self.pins.debounced(threshold);
        let interrupt_config = self.registers.interrupt_config();
        let clear = self.registers.clear_pulse();

        let access = self.bus.decode(&input.bus);
        let read_data = match access {
            Some(transaction) if !transaction.is_write() => {
                self.registers.read(transaction.address, self.read_only_values())
            }
            _ => 0,
        };

        let output = TickOutput {
            bus: BusInterface::respond(read_data),
            pads: self.pads(),
            irq: self.irq(),
        };

        if !input.reset_n {
            if !self.reset_asserted {
                tracing::debug!("reset asserted after {} ticks", self.ticks);
            }
            self.reset();
            return output;
        }

        if self.reset_asserted {
            tracing::debug!("reset released");
            self.reset_asserted = false;
        }

        self.pins.step(PinSample {
            raw: input.gpio_in,
            threshold,
        });
        self.interrupts.step(InterruptInput {
            debounced,
            config: interrupt_config,
            clear,
        });
        self.registers.step(access);
        self.bus.step(&input.bus);

        self.ticks += 1;

        output
    }

    /// Forces every state element to zero, as a tick with reset asserted does.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.registers.reset();
        self.pins.reset();
        self.interrupts.reset();
        self.ticks = 0;
        self.reset_asserted = true;
    }

    #[must_use]
    pub const fn irq(&self) -> bool {
        self.interrupts.irq()
    }

    #[must_use]
    pub const fn pads(&self) -> PadOutputs {
        PadOutputs::from_bank(self.registers.bank())
    }

    #[must_use]
    pub const fn int_status(&self) -> u32 {
        self.interrupts.status()
    }

    /// Value of the `IN` register.
    #[must_use]
    pub fn input(&self) -> u32 {
        self.pins.debounced(self.registers.debounce_threshold())
    }

    #[must_use]
    pub const fn registers(&self) -> &RegisterBank {
        self.registers.bank()
    }

    #[must_use]
    pub fn pin(&self, pin: usize) -> Option<&PinChannel> {
        self.pins.channel(pin)
    }

    #[must_use]
    pub const fn bus_phase(&self) -> BusPhase {
        self.bus.phase()
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Register value a read of `offset` would return on this tick.
    #[must_use]
    pub fn peek(&self, offset: u32) -> u32 {
        self.registers.read(offset, self.read_only_values())
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bus: self.bus.clone(),
            registers: self.registers.clone(),
            pins: self.pins.clone(),
            interrupts: self.interrupts.clone(),
            ticks: self.ticks,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        tracing::debug!("restoring snapshot taken at tick {}", snapshot.ticks);

        self.bus = snapshot.bus;
        self.registers = snapshot.registers;
        self.pins = snapshot.pins;
        self.interrupts = snapshot.interrupts;
        self.ticks = snapshot.ticks;
        self.reset_asserted = false;
    }

    fn read_only_values(&self) -> ReadOnlyValues {
        ReadOnlyValues {
            input: self.input(),
            int_status: self.interrupts.status(),
        }
    }
}
