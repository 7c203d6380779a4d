//! # GPIO register file
//!
//! | Offset | Name          | Access | Description                                     |
//! |--------|---------------|--------|-------------------------------------------------|
//! | 0x00   | DIR           | R/W    | 1 = output, 0 = input                           |
//! | 0x04   | OUT           | R/W    | Driven value for output pins                    |
//! | 0x08   | IN            | R      | Debounced, synchronized input                   |
//! | 0x0C   | `INT_MASK`    | R/W    | 1 = interrupt enabled                           |
//! | 0x10   | `INT_STATUS`  | R/W1C  | Sticky interrupt flags, write 1s to clear       |
//! | 0x14   | `INT_TYPE`    | R/W    | 0 = level, 1 = edge                             |
//! | 0x18   | `INT_POLARITY`| R/W    | Edge: 1 rising / 0 falling. Level: 1 high / 0 low |
//! | 0x1C   | `DEBOUNCE_CFG`| R/W    | Bits 0-15: debounce threshold in ticks          |
//!
//! Any other offset reads as zero and ignores writes.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::bus::{BusTransaction, TransactionKind};

use super::HardwareComponent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Register {
    Dir,
    Out,
    In,
    IntMask,
    IntStatus,
    IntType,
    IntPolarity,
    DebounceCfg,
}

impl Register {
    pub const ALL: [Self; 8] = [
        Self::Dir,
        Self::Out,
        Self::In,
        Self::IntMask,
        Self::IntStatus,
        Self::IntType,
        Self::IntPolarity,
        Self::DebounceCfg,
    ];

    #[must_use]
    pub const fn offset(self) -> u32 {
        match self {
            Self::Dir => 0x00,
            Self::Out => 0x04,
            Self::In => 0x08,
            Self::IntMask => 0x0C,
            Self::IntStatus => 0x10,
            Self::IntType => 0x14,
            Self::IntPolarity => 0x18,
            Self::DebounceCfg => 0x1C,
        }
    }
}

impl TryFrom<u32> for Register {
    type Error = u32;

    fn try_from(offset: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|register| register.offset() == offset)
            .ok_or(offset)
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Dir => "DIR",
            Self::Out => "OUT",
            Self::In => "IN",
            Self::IntMask => "INT_MASK",
            Self::IntStatus => "INT_STATUS",
            Self::IntType => "INT_TYPE",
            Self::IntPolarity => "INT_POLARITY",
            Self::DebounceCfg => "DEBOUNCE_CFG",
        };
        write!(f, "{name}")
    }
}

/// Configuration storage. Only [`RegisterFile`] writes it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBank {
    pub direction: u32,
    pub output_value: u32,
    pub int_mask: u32,
    /// 0 = level, 1 = edge
    pub int_type: u32,
    /// Edge: 1 = rising, 0 = falling. Level: 1 = active high, 0 = active low
    pub int_polarity: u32,
    pub debounce_threshold: u16,
}

/// Interrupt configuration as seen by the interrupt controller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptConfig {
    pub mask: u32,
    pub edge_type: u32,
    pub polarity: u32,
}

/// Values the register file forwards on reads but doesn't own.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadOnlyValues {
    pub input: u32,
    pub int_status: u32,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterFile {
    bank: RegisterBank,

    /// W1C pulse for `INT_STATUS`, valid only for the tick after the write.
    clear_pulse: u32,
}

impl RegisterFile {
    #[must_use]
    pub const fn bank(&self) -> &RegisterBank {
        &self.bank
    }

    #[must_use]
    pub const fn clear_pulse(&self) -> u32 {
        self.clear_pulse
    }

    #[must_use]
    pub const fn debounce_threshold(&self) -> u16 {
        self.bank.debounce_threshold
    }

    #[must_use]
    pub const fn interrupt_config(&self) -> InterruptConfig {
        InterruptConfig {
            mask: self.bank.int_mask,
            edge_type: self.bank.int_type,
            polarity: self.bank.int_polarity,
        }
    }

    /// Combinational read. Unmapped offsets read as zero.
    #[must_use]
    pub fn read(&self, offset: u32, read_only: ReadOnlyValues) -> u32 {
        let Ok(register) = Register::try_from(offset) else {
            return 0;
        };

        match register {
            Register::Dir => self.bank.direction,
            Register::Out => self.bank.output_value,
            Register::In => read_only.input,
            Register::IntMask => self.bank.int_mask,
            Register::IntStatus => read_only.int_status,
            Register::IntType => self.bank.int_type,
            Register::IntPolarity => self.bank.int_polarity,
            Register::DebounceCfg => u32::from(self.bank.debounce_threshold),
        }
    }

    fn write(&mut self, offset: u32, value: u32) {
        let Ok(register) = Register::try_from(offset) else {
            tracing::debug!("ignoring write of 0x{value:08X} to unmapped offset 0x{offset:02X}");
            return;
        };

        tracing::debug!("{register} <- 0x{value:08X}");

        match register {
            Register::Dir => self.bank.direction = value,
            Register::Out => self.bank.output_value = value,
            Register::In => tracing::warn!("write to read-only register IN ignored"),
            Register::IntMask => self.bank.int_mask = value,
            Register::IntStatus => self.clear_pulse = value,
            Register::IntType => self.bank.int_type = value,
            Register::IntPolarity => self.bank.int_polarity = value,
            Register::DebounceCfg => {
                self.bank.debounce_threshold =
                    u16::try_from(value.get_bits(0..=15)).unwrap_or(u16::MAX);
            }
        }
    }
}

impl HardwareComponent for RegisterFile {
    /// Transaction in its ACCESS tick, if any.
    type Input = Option<BusTransaction>;

    fn step(&mut self, access: Self::Input) {
        // The pulse lasts one tick unless a new status write renews it.
        self.clear_pulse = 0;

        if let Some(BusTransaction {
            address,
            kind: TransactionKind::Write(value),
        }) = access
        {
            self.write(address, value);
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
