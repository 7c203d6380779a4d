//! # Register bus interface
//!
//! The peripheral is reached through a 3-phase handshake driven by the bus
//! master:
//!
//! ```text
//!            ┌──────┐  select, !enable   ┌───────┐  select, enable   ┌────────┐
//!     ──────►│ Idle │───────────────────►│ Setup │──────────────────►│ Access │
//!            └──────┘                    └───────┘                   └────────┘
//!               ▲                            ▲                           │
//!               │         !select            │   select, !enable         │
//!               └────────────────────────────┴───────────────────────────┘
//! ```
//!
//! - **Setup**: address, direction and write data are latched, nothing is applied.
//! - **Access**: exactly one register read or write happens.
//!
//! The peripheral is always ready (no wait states) and never reports an error,
//! so a transaction always takes exactly two ticks.

use serde::{Deserialize, Serialize};

/// Signals driven by the bus master during one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusSignals {
    pub select: bool,
    pub enable: bool,
    pub write: bool,
    pub address: u32,
    pub write_data: u32,
}

impl BusSignals {
    /// Nothing selected.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            select: false,
            enable: false,
            write: false,
            address: 0,
            write_data: 0,
        }
    }

    #[must_use]
    pub const fn setup_write(address: u32, value: u32) -> Self {
        Self {
            select: true,
            enable: false,
            write: true,
            address,
            write_data: value,
        }
    }

    #[must_use]
    pub const fn setup_read(address: u32) -> Self {
        Self {
            select: true,
            enable: false,
            write: false,
            address,
            write_data: 0,
        }
    }

    /// Same transfer, with `enable` raised.
    #[must_use]
    pub const fn into_access(self) -> Self {
        Self {
            enable: true,
            ..self
        }
    }
}

/// Completer side of the handshake, valid at the end of the tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BusResponse {
    pub read_data: u32,
    pub ready: bool,
    pub error: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusPhase {
    #[default]
    Idle,
    Setup,
    Access,
}

impl BusPhase {
    /// Phase the bus is in during a tick carrying `signals`.
    #[must_use]
    pub const fn from_signals(signals: &BusSignals) -> Self {
        match (signals.select, signals.enable) {
            (false, _) => Self::Idle,
            (true, false) => Self::Setup,
            (true, true) => Self::Access,
        }
    }

    /// Whether moving from `self` (previous tick) to `next` follows the handshake.
    #[must_use]
    pub const fn can_move_to(self, next: Self) -> bool {
        match next {
            Self::Idle | Self::Setup => true,
            Self::Access => matches!(self, Self::Setup),
        }
    }
}

/// One register access, as seen on its ACCESS tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusTransaction {
    pub address: u32,
    pub kind: TransactionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Read,
    Write(u32),
}

impl BusTransaction {
    const fn from_signals(signals: &BusSignals) -> Self {
        Self {
            address: signals.address,
            kind: if signals.write {
                TransactionKind::Write(signals.write_data)
            } else {
                TransactionKind::Read
            },
        }
    }

    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self.kind, TransactionKind::Write(_))
    }
}

/// Observer of the handshake. It tracks the phase and the transfer latched
/// during SETUP so that protocol anomalies can be reported.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BusInterface {
    phase: BusPhase,
    latched: Option<BusTransaction>,
}

impl BusInterface {
    #[must_use]
    pub const fn phase(&self) -> BusPhase {
        self.phase
    }

    /// Transaction to perform on this tick, if any. Pure: the phase is only
    /// advanced by [`Self::step`].
    ///
    /// Like the hardware, the access is carried out whenever `select` and
    /// `enable` are both high, using the signals of the ACCESS tick.
    #[must_use]
    pub fn decode(&self, signals: &BusSignals) -> Option<BusTransaction> {
        let next = BusPhase::from_signals(signals);
        if next != BusPhase::Access {
            return None;
        }

        let transaction = BusTransaction::from_signals(signals);

        if !self.phase.can_move_to(next) {
            tracing::warn!(
                "bus access at 0x{:02X} without a setup phase (previous phase {:?})",
                signals.address,
                self.phase
            );
        } else if self.latched.is_some_and(|latched| latched != transaction) {
            tracing::warn!(
                "bus access {transaction:?} differs from the one latched in setup {:?}",
                self.latched
            );
        }

        Some(transaction)
    }

    /// Advances the phase at the end of the tick.
    pub fn step(&mut self, signals: &BusSignals) {
        let next = BusPhase::from_signals(signals);

        if next != self.phase {
            tracing::trace!("bus phase {:?} -> {next:?}", self.phase);
        }

        self.latched = match next {
            BusPhase::Setup => Some(BusTransaction::from_signals(signals)),
            BusPhase::Idle | BusPhase::Access => None,
        };
        self.phase = next;
    }

    /// Response for this tick. Always ready, never an error.
    #[must_use]
    pub const fn respond(read_data: u32) -> BusResponse {
        BusResponse {
            read_data,
            ready: true,
            error: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn phase_follows_select_and_enable() {
        assert_eq!(BusPhase::from_signals(&BusSignals::idle()), BusPhase::Idle);

        let setup = BusSignals::setup_read(0x08);
        assert_eq!(BusPhase::from_signals(&setup), BusPhase::Setup);
        assert_eq!(
            BusPhase::from_signals(&setup.into_access()),
            BusPhase::Access
        );
    }

    #[test]
    fn access_only_after_setup() {
        assert!(BusPhase::Setup.can_move_to(BusPhase::Access));
        assert!(!BusPhase::Idle.can_move_to(BusPhase::Access));
        assert!(!BusPhase::Access.can_move_to(BusPhase::Access));
        assert!(BusPhase::Access.can_move_to(BusPhase::Setup));
        assert!(BusPhase::Access.can_move_to(BusPhase::Idle));
    }

    #[test]
    fn setup_does_not_produce_a_transaction() {
        let bus = BusInterface::default();
        assert_eq!(bus.decode(&BusSignals::setup_write(0x04, 1)), None);
        assert_eq!(bus.decode(&BusSignals::idle()), None);
    }

    #[test]
    fn write_transaction() {
        let mut bus = BusInterface::default();
        let setup = BusSignals::setup_write(0x04, 0xCAFE);

        bus.step(&setup);
        assert_eq!(bus.phase(), BusPhase::Setup);

        let access = setup.into_access();
        let transaction = bus.decode(&access);
        assert_eq!(
            transaction,
            Some(BusTransaction {
                address: 0x04,
                kind: TransactionKind::Write(0xCAFE),
            })
        );
        assert!(transaction.is_some_and(|t| t.is_write()));

        bus.step(&access);
        assert_eq!(bus.phase(), BusPhase::Access);
    }

    #[test]
    fn back_to_back_transactions() {
        let mut bus = BusInterface::default();

        let first = BusSignals::setup_read(0x00);
        bus.step(&first);
        bus.step(&first.into_access());

        // New setup straight after access, no idle tick in between.
        let second = BusSignals::setup_read(0x08);
        assert_eq!(bus.decode(&second), None);
        bus.step(&second);

        assert_eq!(
            bus.decode(&second.into_access()),
            Some(BusTransaction {
                address: 0x08,
                kind: TransactionKind::Read,
            })
        );
    }

    #[test]
    fn access_without_setup_is_still_performed() {
        let bus = BusInterface::default();
        assert_eq!(bus.phase(), BusPhase::Idle);

        let access = BusSignals::setup_write(0x04, 0x7).into_access();
        assert_eq!(
            bus.decode(&access),
            Some(BusTransaction {
                address: 0x04,
                kind: TransactionKind::Write(0x7),
            })
        );
    }

    #[test]
    fn access_uses_its_own_signals_over_the_latched_setup() {
        let mut bus = BusInterface::default();
        bus.step(&BusSignals::setup_read(0x04));

        let access = BusSignals::setup_read(0x08).into_access();
        assert_eq!(
            bus.decode(&access),
            Some(BusTransaction {
                address: 0x08,
                kind: TransactionKind::Read,
            })
        );
    }

    #[test]
    fn response_is_always_ready() {
        let response = BusInterface::respond(0x1234);
        assert!(response.ready);
        assert!(!response.error);
        assert_eq!(response.read_data, 0x1234);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut bus = BusInterface::default();
        bus.step(&BusSignals::setup_read(0x0C));
        bus.reset();
        assert_eq!(bus.phase(), BusPhase::Idle);
    }
}
