use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Edge direction of a signal transition.
///
/// The numeric index is part of the contract: per-edge data throughout the
/// crate is stored in fixed-arity `[T; 2]` arrays indexed by [`RiseFall::index`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RiseFall {
    Rise,
    Fall,
}

impl RiseFall {
    pub const RANGE: [RiseFall; 2] = [RiseFall::Rise, RiseFall::Fall];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            RiseFall::Rise => 0,
            RiseFall::Fall => 1,
        }
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => RiseFall::Rise,
            _ => RiseFall::Fall,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            RiseFall::Rise => RiseFall::Fall,
            RiseFall::Fall => RiseFall::Rise,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            RiseFall::Rise => "rise",
            RiseFall::Fall => "fall",
        }
    }

    /// Single-character form used in report and deck comments.
    #[inline]
    pub const fn short_name(self) -> &'static str {
        match self {
            RiseFall::Rise => "^",
            RiseFall::Fall => "v",
        }
    }
}

impl Display for RiseFall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Rise, fall, or both; used only to filter per-edge data, never emitted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RiseFallBoth {
    Rise,
    Fall,
    Both,
}

impl RiseFallBoth {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            RiseFallBoth::Rise => 0,
            RiseFallBoth::Fall => 1,
            RiseFallBoth::Both => 2,
        }
    }

    #[inline]
    pub fn matches(self, tr: RiseFall) -> bool {
        match self {
            RiseFallBoth::Rise => tr == RiseFall::Rise,
            RiseFallBoth::Fall => tr == RiseFall::Fall,
            RiseFallBoth::Both => true,
        }
    }

    #[inline]
    pub const fn as_rise_fall(self) -> Option<RiseFall> {
        match self {
            RiseFallBoth::Rise => Some(RiseFall::Rise),
            RiseFallBoth::Fall => Some(RiseFall::Fall),
            RiseFallBoth::Both => None,
        }
    }
}

impl From<RiseFall> for RiseFallBoth {
    fn from(tr: RiseFall) -> Self {
        match tr {
            RiseFall::Rise => RiseFallBoth::Rise,
            RiseFall::Fall => RiseFallBoth::Fall,
        }
    }
}

/// Logic state assigned to a pin, either a settled constant or an edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LogicValue {
    Zero,
    One,
    Unknown,
    Rise,
    Fall,
}

/// Unateness of an expression with respect to one of its input ports.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TimingSense {
    PositiveUnate,
    NegativeUnate,
    NonUnate,
    /// The expression does not depend on the port.
    None,
}

impl TimingSense {
    #[inline]
    pub const fn invert(self) -> Self {
        match self {
            TimingSense::PositiveUnate => TimingSense::NegativeUnate,
            TimingSense::NegativeUnate => TimingSense::PositiveUnate,
            other => other,
        }
    }
}
