//! Closure and lambda map data types.

use std::fmt;

/// Where a lambda's captured state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LambdaClosure {
    /// Captures nothing; emitted as a static method on the shared singleton class
    Static,
    /// Captures only `this`; emitted as an instance method of the containing type
    ThisOnly,
    /// Captures locals through the closure with this index
    Closure(u32),
}

impl LambdaClosure {
    /// Smallest ordinal used on the wire, the one of [`LambdaClosure::ThisOnly`].
    pub const MIN_ORDINAL: i64 = -2;

    /// Wire ordinal: -2 for this-only, -1 for static, otherwise the closure index.
    #[must_use]
    pub fn ordinal(&self) -> i64 {
        match self {
            LambdaClosure::ThisOnly => -2,
            LambdaClosure::Static => -1,
            LambdaClosure::Closure(index) => i64::from(*index),
        }
    }

    /// Inverse of [`LambdaClosure::ordinal`].
    #[must_use]
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            -2 => Some(LambdaClosure::ThisOnly),
            -1 => Some(LambdaClosure::Static),
            _ => u32::try_from(ordinal).ok().map(LambdaClosure::Closure),
        }
    }

    /// The closure index, if the lambda captures through a closure.
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        match self {
            LambdaClosure::Closure(index) => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for LambdaClosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LambdaClosure::Static => write!(f, "static"),
            LambdaClosure::ThisOnly => write!(f, "this"),
            LambdaClosure::Closure(index) => write!(f, "{index}"),
        }
    }
}

/// A synthesized closure (display class instance) in the routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClosureInfo {
    /// Syntax offset of the scope that introduces the captured variables
    pub syntax_offset: i32,
    /// Index of the enclosing closure this one links to, if any
    pub parent: Option<u32>,
}

/// A lambda or local function defined in the routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LambdaInfo {
    /// Syntax offset of the lambda body
    pub syntax_offset: i32,
    /// Where its captured state lives
    pub closure: LambdaClosure,
}

/// The closure/lambda map of one routine.
///
/// Closures and lambdas keep their discovery order. Syntax offsets are opaque keys relative
/// to the routine's declaration and may be negative for code lowered out of field
/// initializers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LambdaMap {
    /// Per-type ordinal of the routine
    pub method_ordinal: u32,
    /// Closures in discovery order
    pub closures: Vec<ClosureInfo>,
    /// Lambdas in discovery order
    pub lambdas: Vec<LambdaInfo>,
}

impl LambdaMap {
    /// Returns `true` if the routine has neither closures nor lambdas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closures.is_empty() && self.lambdas.is_empty()
    }

    /// The lowest syntax offset in the map, capped at -1.
    ///
    /// Offsets are stored relative to this baseline so they encode as unsigned values.
    #[must_use]
    pub fn syntax_offset_baseline(&self) -> i32 {
        self.closures
            .iter()
            .map(|c| c.syntax_offset)
            .chain(self.lambdas.iter().map(|l| l.syntax_offset))
            .fold(-1, i32::min)
    }

    /// Lambdas capturing through closure `index`.
    pub fn lambdas_of(&self, index: u32) -> impl Iterator<Item = &LambdaInfo> {
        self.lambdas
            .iter()
            .filter(move |lambda| lambda.closure == LambdaClosure::Closure(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals() {
        for closure in [
            LambdaClosure::ThisOnly,
            LambdaClosure::Static,
            LambdaClosure::Closure(0),
            LambdaClosure::Closure(7),
        ] {
            assert_eq!(LambdaClosure::from_ordinal(closure.ordinal()), Some(closure));
        }
        assert_eq!(LambdaClosure::from_ordinal(-3), None);
        assert_eq!(LambdaClosure::ThisOnly.ordinal(), LambdaClosure::MIN_ORDINAL);
    }

    #[test]
    fn baseline() {
        let mut map = LambdaMap::default();
        assert_eq!(map.syntax_offset_baseline(), -1);

        map.lambdas.push(LambdaInfo {
            syntax_offset: 12,
            closure: LambdaClosure::Static,
        });
        assert_eq!(map.syntax_offset_baseline(), -1);

        map.closures.push(ClosureInfo {
            syntax_offset: -28,
            parent: None,
        });
        assert_eq!(map.syntax_offset_baseline(), -28);
    }

    #[test]
    fn display() {
        assert_eq!(LambdaClosure::ThisOnly.to_string(), "this");
        assert_eq!(LambdaClosure::Closure(3).to_string(), "3");
    }
}
