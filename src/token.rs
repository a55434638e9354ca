use std::hash::Hash;

/// A unit of input the engine can absorb.
///
/// Tokens must implement `Eq` and `Hash` consistently; the engine matches
/// repetitions through both and behaves unpredictably otherwise.
pub trait Token: Hash + Eq + Clone {
    /// Returns true for empty values that cannot stand as a terminal.
    fn is_blank(&self) -> bool {
        false
    }
}

macro_rules! never_blank {
    ($($ty:ty),* $(,)?) => {
        $(impl Token for $ty {})*
    };
}

never_blank!(char, bool, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Token for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Token for &str {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Token for Box<str> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Hash + Eq + Clone> Token for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Hash + Eq> Token for &[T] {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}
