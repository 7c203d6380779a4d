//! # Scenarios
//!
//! A scenario is a YAML list of steps played against a [`Board`]:
//!
//! ```yaml
//! name: edge interrupt
//! steps:
//!   - op: write
//!     register: int_type
//!     value: 0x1
//!   - op: pad
//!     pin: 0
//!     level: true
//!   - op: idle
//!     ticks: 3
//!   - op: read
//!     register: int_status
//!     expect: 0x1
//! ```
//!
//! Registers are given by name (`dir`, `int_mask`, ...) or by byte offset.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use periph::board::Board;
use periph::hardware::PIN_COUNT;
use periph::hardware::registers::Register;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("step {step}: pin {pin} doesn't exist")]
    InvalidPin { step: usize, pin: u8 },

    #[error("step {step}: read of {target} returned 0x{actual:08X}, expected 0x{expected:08X}")]
    ReadMismatch {
        step: usize,
        target: Target,
        expected: u32,
        actual: u32,
    },

    #[error("step {step}: irq is {actual}, expected {expected}")]
    IrqMismatch {
        step: usize,
        expected: bool,
        actual: bool,
    },

    #[error("step {step}: pad {signal} is 0x{actual:08X}, expected 0x{expected:08X}")]
    PadMismatch {
        step: usize,
        signal: &'static str,
        expected: u32,
        actual: u32,
    },
}

/// Register addressed by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Named(Register),
    Offset(u32),
}

impl Target {
    const fn offset(self) -> u32 {
        match self {
            Self::Named(register) => register.offset(),
            Self::Offset(offset) => offset,
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(register) => write!(f, "{register}"),
            Self::Offset(offset) => match Register::try_from(*offset) {
                Ok(register) => write!(f, "{register}"),
                Err(_) => write!(f, "0x{offset:02X}"),
            },
        }
    }
}

const fn one_tick() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Hold reset low, then release it.
    Reset {
        #[serde(default = "one_tick")]
        ticks: usize,
    },
    Idle {
        ticks: usize,
    },
    /// Drive every pad, bit n is pin n.
    Pads {
        levels: u32,
    },
    Pad {
        pin: u8,
        level: bool,
    },
    Write {
        register: Target,
        value: u32,
    },
    Read {
        register: Target,
        expect: Option<u32>,
    },
    ExpectIrq {
        asserted: bool,
    },
    ExpectPads {
        value: Option<u32>,
        enable: Option<u32>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

/// Outcome of a successful run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub steps: usize,
    pub reads: usize,
    pub checks: usize,
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&text)
    }

    /// Plays every step on `board`, stopping at the first failed expectation.
    pub fn run(&self, board: &mut Board) -> Result<Report, ScenarioError> {
        let mut report = Report::default();

        for (step, action) in self.steps.iter().enumerate() {
            tracing::debug!("step {step}: {action:?}");

            match *action {
                Step::Reset { ticks } => board.reset(ticks),
                Step::Idle { ticks } => board.idle(ticks),
                Step::Pads { levels } => board.set_pads(levels),
                Step::Pad { pin, level } => {
                    if usize::from(pin) >= PIN_COUNT {
                        return Err(ScenarioError::InvalidPin { step, pin });
                    }
                    board.set_pad(pin, level);
                }
                Step::Write { register, value } => board.write(register.offset(), value),
                Step::Read { register, expect } => {
                    let actual = board.read(register.offset());
                    report.reads += 1;
                    tracing::info!("{register} = 0x{actual:08X}");

                    if let Some(expected) = expect {
                        report.checks += 1;
                        if actual != expected {
                            return Err(ScenarioError::ReadMismatch {
                                step,
                                target: register,
                                expected,
                                actual,
                            });
                        }
                    }
                }
                Step::ExpectIrq { asserted } => {
                    report.checks += 1;
                    let actual = board.gpio().irq();
                    if actual != asserted {
                        return Err(ScenarioError::IrqMismatch {
                            step,
                            expected: asserted,
                            actual,
                        });
                    }
                }
                Step::ExpectPads { value, enable } => {
                    let pads = board.gpio().pads();
                    let expectations = [
                        ("value", value, pads.value),
                        ("enable", enable, pads.enable),
                    ];

                    for (signal, expected, actual) in expectations {
                        let Some(expected) = expected else {
                            continue;
                        };
                        report.checks += 1;
                        if actual != expected {
                            return Err(ScenarioError::PadMismatch {
                                step,
                                signal,
                                expected,
                                actual,
                            });
                        }
                    }
                }
            }

            report.steps += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EDGE: &str = "
name: edge
steps:
  - op: write
    register: int_type
    value: 0x1
  - op: write
    register: int_polarity
    value: 0x1
  - op: write
    register: 0x0C
    value: 0x1
  - op: pad
    pin: 0
    level: true
  - op: idle
    ticks: 3
  - op: expect_irq
    asserted: true
  - op: read
    register: int_status
    expect: 0x1
  - op: write
    register: int_status
    value: 0x1
  - op: idle
    ticks: 1
  - op: expect_irq
    asserted: false
";

    #[test]
    fn parse_steps() {
        let scenario = Scenario::from_yaml(EDGE).unwrap();

        assert_eq!(scenario.name, "edge");
        assert_eq!(scenario.steps.len(), 10);
        assert_eq!(
            scenario.steps[0],
            Step::Write {
                register: Target::Named(Register::IntType),
                value: 1,
            }
        );
        assert_eq!(
            scenario.steps[2],
            Step::Write {
                register: Target::Offset(0x0C),
                value: 1,
            }
        );
        assert_eq!(
            scenario.steps[6],
            Step::Read {
                register: Target::Named(Register::IntStatus),
                expect: Some(1),
            }
        );
    }

    #[test]
    fn reset_defaults_to_one_tick() {
        let scenario = Scenario::from_yaml("name: r\nsteps:\n  - op: reset\n").unwrap();
        assert_eq!(scenario.steps, vec![Step::Reset { ticks: 1 }]);
    }

    #[test]
    fn run_edge_scenario() {
        let scenario = Scenario::from_yaml(EDGE).unwrap();
        let mut board = Board::new();

        let report = scenario.run(&mut board).unwrap();
        assert_eq!(
            report,
            Report {
                steps: 10,
                reads: 1,
                checks: 3,
            }
        );
    }

    #[test]
    fn failed_read_stops_the_run() {
        let scenario = Scenario::from_yaml(
            "
name: bad read
steps:
  - op: write
    register: dir
    value: 0xFF
  - op: read
    register: dir
    expect: 0x0F
  - op: idle
    ticks: 1
",
        )
        .unwrap();

        let error = scenario.run(&mut Board::new()).unwrap_err();
        assert!(matches!(
            error,
            ScenarioError::ReadMismatch {
                step: 1,
                expected: 0x0F,
                actual: 0xFF,
                ..
            }
        ));
        assert_eq!(
            error.to_string(),
            "step 1: read of DIR returned 0x000000FF, expected 0x0000000F"
        );
    }

    #[test]
    fn pad_expectations() {
        let scenario = Scenario::from_yaml(
            "
name: pads
steps:
  - op: write
    register: dir
    value: 0x3
  - op: write
    register: out
    value: 0x1
  - op: expect_pads
    value: 0x1
    enable: 0x3
  - op: expect_pads
    enable: 0x7
",
        )
        .unwrap();

        let error = scenario.run(&mut Board::new()).unwrap_err();
        assert!(matches!(
            error,
            ScenarioError::PadMismatch {
                step: 3,
                signal: "enable",
                ..
            }
        ));
    }

    #[test]
    fn invalid_pin() {
        let scenario =
            Scenario::from_yaml("name: p\nsteps:\n  - op: pad\n    pin: 32\n    level: true\n")
                .unwrap();

        let error = scenario.run(&mut Board::new()).unwrap_err();
        assert!(matches!(
            error,
            ScenarioError::InvalidPin { step: 0, pin: 32 }
        ));
    }

    #[test]
    fn unmapped_target_display() {
        assert_eq!(Target::Offset(0x40).to_string(), "0x40");
        assert_eq!(Target::Offset(0x10).to_string(), "INT_STATUS");
    }

    #[test]
    fn unknown_op_is_rejected() {
        let error = Scenario::from_yaml("name: x\nsteps:\n  - op: jump\n").unwrap_err();
        assert!(matches!(error, ScenarioError::Parse(_)));
    }

    #[test]
    fn missing_file() {
        let error = Scenario::load(Path::new("/nonexistent/scenario.yaml")).unwrap_err();
        assert!(matches!(error, ScenarioError::Io { .. }));
    }

    #[test]
    fn smoke_scenario_passes() {
        let scenario = Scenario::from_yaml(crate::SMOKE_SCENARIO).unwrap();
        scenario.run(&mut Board::new()).unwrap();
    }
}
