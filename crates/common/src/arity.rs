//! Arity: how many values an expression leaves on the value stack.
//!
//! An arity is a count plus a flag saying whether more values may follow.
//! `3` means exactly three values; `3+` means three or more. The weaver
//! only skips a runtime count check when the arity is exact.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::BundleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Arity {
    count: usize,
    more: bool,
}

impl Arity {
    /// Arity assumed for nodes that carry no annotation: nothing is known.
    pub const UNKNOWN: Arity = Arity { count: 0, more: true };

    pub const fn exactly(count: usize) -> Self {
        Arity { count, more: false }
    }

    pub const fn at_least(count: usize) -> Self {
        Arity { count, more: true }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn has_more(&self) -> bool {
        self.more
    }

    /// True when this arity guarantees exactly `n` values.
    pub fn is_exactly(&self, n: usize) -> bool {
        !self.more && self.count == n
    }
}

impl Default for Arity {
    fn default() -> Self {
        Arity::UNKNOWN
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.more {
            write!(f, "{}+", self.count)
        } else {
            write!(f, "{}", self.count)
        }
    }
}

impl FromStr for Arity {
    type Err = BundleError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (digits, more) = match text.strip_suffix('+') {
            Some(rest) => (rest, true),
            None => (text, false),
        };
        let count = digits
            .parse::<usize>()
            .map_err(|_| BundleError::InvalidArity(text.to_string()))?;
        Ok(Arity { count, more })
    }
}

impl TryFrom<String> for Arity {
    type Error = BundleError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_exact() {
        let arity: Arity = "2".parse().unwrap();
        assert_eq!(arity, Arity::exactly(2));
        assert!(arity.is_exactly(2));
        assert!(!arity.is_exactly(1));
    }

    #[test]
    fn parse_open_ended() {
        let arity: Arity = "1+".parse().unwrap();
        assert_eq!(arity, Arity::at_least(1));
        assert!(!arity.is_exactly(1));
        assert_eq!(arity.to_string(), "1+");
    }

    #[test]
    fn reject_garbage() {
        assert!(matches!(
            "two".parse::<Arity>(),
            Err(BundleError::InvalidArity(ref s)) if s == "two"
        ));
        assert!("+".parse::<Arity>().is_err());
    }

    #[test]
    fn default_is_unknown() {
        assert_eq!(Arity::default().to_string(), "0+");
    }
}
