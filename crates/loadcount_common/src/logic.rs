//! IEEE 1164 four-state logic values and wired-bus resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single 4-state logic value following the IEEE 1164 standard.
///
/// The four states represent:
/// - `Zero`: logic low (driven 0)
/// - `One`: logic high (driven 1)
/// - `X`: unknown, or two drivers in conflict
/// - `Z`: high-impedance (tri-state, not driven)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    Zero = 0,
    /// Logic high (1).
    One = 1,
    /// Unknown or conflicting.
    X = 2,
    /// High-impedance (tri-state).
    Z = 3,
}

impl Logic {
    /// Maps a boolean to a driven `Zero`/`One`.
    pub fn from_bool(value: bool) -> Self {
        if value {
            Logic::One
        } else {
            Logic::Zero
        }
    }

    /// Resolves two drivers sharing one wire.
    ///
    /// IEEE 1164 resolution table:
    /// ```text
    ///     0  1  X  Z
    /// 0 | 0  X  X  0
    /// 1 | X  1  X  1
    /// X | X  X  X  X
    /// Z | 0  1  X  Z
    /// ```
    pub fn resolve(self, other: Self) -> Self {
        use Logic::*;
        match (self, other) {
            (Z, v) | (v, Z) => v,
            (Zero, Zero) => Zero,
            (One, One) => One,
            _ => X,
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'X',
            Logic::Z => 'Z',
        };
        write!(f, "{c}")
    }
}

#[cfg(test)]
mod tests {
    use super::Logic::*;
    use super::*;

    #[test]
    fn resolve_table() {
        // Z yields to anything
        assert_eq!(Z.resolve(Zero), Zero);
        assert_eq!(One.resolve(Z), One);
        assert_eq!(Z.resolve(Z), Z);
        assert_eq!(Z.resolve(X), X);
        // Agreement
        assert_eq!(Zero.resolve(Zero), Zero);
        assert_eq!(One.resolve(One), One);
        // Contention
        assert_eq!(Zero.resolve(One), X);
        assert_eq!(One.resolve(Zero), X);
        assert_eq!(X.resolve(One), X);
    }

    #[test]
    fn resolve_is_commutative() {
        let all = [Zero, One, X, Z];
        for a in all {
            for b in all {
                assert_eq!(a.resolve(b), b.resolve(a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn display() {
        assert_eq!(format!("{Zero}{One}{X}{Z}"), "01XZ");
    }

    #[test]
    fn from_bool_is_driven() {
        assert_eq!(Logic::from_bool(true), One);
        assert_eq!(Logic::from_bool(false), Zero);
    }
}
