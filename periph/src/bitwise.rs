use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Helper methods to manipulate bit vectors,
/// the index (`bit_idx`) goes from lsb to msb (right to left).
pub trait Bits
where
    Self: Copy + Into<u64> + TryFrom<u64>,
    <Self as TryFrom<u64>>::Error: Debug,
{
    /// Number of bits in the vector.
    const WIDTH: u8 = (size_of::<Self>() * 8) as u8;

    fn is_bit_on(self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < Self::WIDTH);
        let bitwise: u64 = self.into();
        (bitwise >> bit_idx) & 1 == 1
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool) {
        debug_assert!(bit_idx < Self::WIDTH);
        let mask = 1_u64 << bit_idx;
        let bitwise: u64 = (*self).into();
        let bitwise = if value { bitwise | mask } else { bitwise & !mask };
        *self = <Self as TryFrom<u64>>::try_from(bitwise).unwrap();
    }

    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let length = bits_range.len();
        debug_assert!(start + length as u8 <= Self::WIDTH);

        // `length` ones, e.g. 0..=15 gives 0xFFFF.
        let mask = if length >= 64 {
            u64::MAX
        } else {
            (1_u64 << length) - 1
        };

        let value: u64 = self.into();
        <Self as TryFrom<u64>>::try_from((value >> start) & mask).unwrap()
    }

    /// Every bit of the vector, lsb first.
    fn lanes(self) -> impl Iterator<Item = bool> {
        (0..Self::WIDTH).map(move |bit_idx| self.is_bit_on(bit_idx))
    }

    /// Packs `lanes` (lsb first) back into a vector. Extra lanes are ignored.
    fn from_lanes<I>(lanes: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let packed = lanes
            .into_iter()
            .take(Self::WIDTH as usize)
            .enumerate()
            .fold(0_u64, |acc, (idx, lane)| acc | (u64::from(lane) << idx));

        <Self as TryFrom<u64>>::try_from(packed).unwrap()
    }
}

impl Bits for u32 {}
impl Bits for u16 {}
