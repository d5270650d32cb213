//! Boolean function trees for liberty port functions.

use serde::{Deserialize, Serialize};

use crate::transition::TimingSense;

/// A liberty port function, e.g. `!(A & B)` for a NAND2 output.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum FuncExpr {
    Port(String),
    Not(Box<FuncExpr>),
    And(Box<FuncExpr>, Box<FuncExpr>),
    Or(Box<FuncExpr>, Box<FuncExpr>),
    Xor(Box<FuncExpr>, Box<FuncExpr>),
    One,
    Zero,
}

impl FuncExpr {
    pub fn port(name: impl Into<String>) -> Self {
        FuncExpr::Port(name.into())
    }

    pub fn not(expr: FuncExpr) -> Self {
        FuncExpr::Not(Box::new(expr))
    }

    pub fn and(left: FuncExpr, right: FuncExpr) -> Self {
        FuncExpr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: FuncExpr, right: FuncExpr) -> Self {
        FuncExpr::Or(Box::new(left), Box::new(right))
    }

    pub fn xor(left: FuncExpr, right: FuncExpr) -> Self {
        FuncExpr::Xor(Box::new(left), Box::new(right))
    }

    /// The port name if this node is a bare port reference.
    #[inline]
    pub fn port_name(&self) -> Option<&str> {
        match self {
            FuncExpr::Port(name) => Some(name),
            _ => None,
        }
    }

    /// Whether `port` appears anywhere in the expression.
    pub fn has_port(&self, port: &str) -> bool {
        match self {
            FuncExpr::Port(name) => name == port,
            FuncExpr::Not(expr) => expr.has_port(port),
            FuncExpr::And(left, right)
            | FuncExpr::Or(left, right)
            | FuncExpr::Xor(left, right) => left.has_port(port) || right.has_port(port),
            FuncExpr::One | FuncExpr::Zero => false,
        }
    }

    /// The first port found by leftmost-first descent, if any.
    pub fn one_port(&self) -> Option<&str> {
        match self {
            FuncExpr::Port(name) => Some(name),
            FuncExpr::Not(expr) => expr.one_port(),
            FuncExpr::And(left, right)
            | FuncExpr::Or(left, right)
            | FuncExpr::Xor(left, right) => left.one_port().or_else(|| right.one_port()),
            FuncExpr::One | FuncExpr::Zero => None,
        }
    }

    /// Unateness of the expression with respect to `port`.
    ///
    /// A port reached through both branches of a binary operator with
    /// conflicting senses, or through XOR, is non-unate.
    pub fn port_timing_sense(&self, port: &str) -> TimingSense {
        match self {
            FuncExpr::Port(name) => {
                if name == port {
                    TimingSense::PositiveUnate
                } else {
                    TimingSense::None
                }
            }
            FuncExpr::Not(expr) => expr.port_timing_sense(port).invert(),
            FuncExpr::And(left, right) | FuncExpr::Or(left, right) => {
                let left = left.port_timing_sense(port);
                let right = right.port_timing_sense(port);
                match (left, right) {
                    (TimingSense::None, sense) | (sense, TimingSense::None) => sense,
                    (l, r) if l == r => l,
                    _ => TimingSense::NonUnate,
                }
            }
            FuncExpr::Xor(left, right) => {
                if left.has_port(port) || right.has_port(port) {
                    TimingSense::NonUnate
                } else {
                    TimingSense::None
                }
            }
            FuncExpr::One | FuncExpr::Zero => TimingSense::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nand2() -> FuncExpr {
        FuncExpr::not(FuncExpr::and(FuncExpr::port("A"), FuncExpr::port("B")))
    }

    #[test]
    fn has_port_walks_the_tree() {
        let f = nand2();
        assert!(f.has_port("A"));
        assert!(f.has_port("B"));
        assert!(!f.has_port("C"));
    }

    #[test]
    fn one_port_is_leftmost() {
        let f = FuncExpr::or(
            FuncExpr::not(FuncExpr::port("EN")),
            FuncExpr::and(FuncExpr::port("D"), FuncExpr::port("SE")),
        );
        assert_eq!(f.one_port(), Some("EN"));
        assert_eq!(FuncExpr::One.one_port(), None);
    }

    #[test]
    fn nand_inputs_are_negative_unate() {
        let f = nand2();
        assert_eq!(f.port_timing_sense("A"), TimingSense::NegativeUnate);
        assert_eq!(f.port_timing_sense("B"), TimingSense::NegativeUnate);
        assert_eq!(f.port_timing_sense("C"), TimingSense::None);
    }

    #[test]
    fn buffer_is_positive_unate() {
        assert_eq!(
            FuncExpr::port("D").port_timing_sense("D"),
            TimingSense::PositiveUnate
        );
    }

    #[test]
    fn xor_is_non_unate() {
        let f = FuncExpr::xor(FuncExpr::port("A"), FuncExpr::port("B"));
        assert_eq!(f.port_timing_sense("A"), TimingSense::NonUnate);
    }

    #[test]
    fn reconvergent_and_of_mixed_sense_is_non_unate() {
        // A & !A
        let f = FuncExpr::and(FuncExpr::port("A"), FuncExpr::not(FuncExpr::port("A")));
        assert_eq!(f.port_timing_sense("A"), TimingSense::NonUnate);
    }
}
