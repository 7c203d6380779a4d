#[allow(clippy::cast_possible_truncation)]
mod bitwise;

pub mod board;
pub mod bus;

#[allow(clippy::module_name_repetitions)]
pub mod gpio;
pub mod hardware;
