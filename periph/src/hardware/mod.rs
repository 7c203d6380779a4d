pub mod interrupts;
pub mod pins;
pub mod registers;

/// Number of GPIO pins handled by the peripheral.
pub const PIN_COUNT: usize = 32;

/// A block of state that advances once per tick.
///
/// `step` computes the next state from the current one and `input`, which must
/// only carry values sampled before any other component stepped in the same tick.
pub trait HardwareComponent {
    type Input;

    fn step(&mut self, input: Self::Input);

    /// Synchronous reset: every state element back to zero.
    fn reset(&mut self);
}
