//! Side-input sensitization: choose logic values (or clocked edges) for the
//! non-path inputs of each gate so the path's timing arc is the one that
//! propagates.

use indexmap::IndexMap;
use log::warn;

use crate::design::Design;
use crate::func::FuncExpr;
use crate::graph::TimingRole;
use crate::liberty::Sequential;
use crate::path::Clock;
use crate::stage::Stages;
use crate::transition::{LogicValue, RiseFall, TimingSense};

/// Values chosen for a stage's side inputs, keyed by liberty port name.
pub type PortValueMap = IndexMap<String, LogicValue>;

/// Sensitization result for one stage: the side-input values, plus the clock
/// and analysis point needed to place clocked edges.
#[derive(Debug, Clone, Default)]
pub struct Sensitization {
    pub port_values: PortValueMap,
    pub clock: Option<Clock>,
    pub dcalc_ap: usize,
}

/// Determine side-input values for a gate stage. Register clock-to-output
/// arcs sensitize through the cell's sequential description; everything else
/// walks the driver port's function.
pub fn stage_port_values(design: &Design, stages: &Stages, stage: usize) -> Sensitization {
    let mut sens = Sensitization::default();
    let is_reg_output = stages
        .gate_edge(stage)
        .map(|edge| design.graph.edge_role(edge).generic_role() == TimingRole::RegClkToQ)
        .unwrap_or(false);
    if is_reg_output {
        reg_port_values(design, stages, stage, &mut sens);
    } else if let Some(drvr_port) = stages.drvr_port(stage) {
        if let (Some(func), Some(input_port)) = (drvr_port.func(), stages.gate_input_port(stage)) {
            gate_port_values(func, input_port.name(), &mut sens.port_values);
        }
    }
    sens
}

/// Walk a driver function and force side ports so that a transition on
/// `input_port` propagates:
///
/// - `input_port + p` forces `p := 0`; `input_port + !p` forces `p := 1`
/// - `input_port * p` forces `p := 1`; `input_port * !p` forces `p := 0`
/// - `input_port ^ p` forces `p := 0` (the arc sense is not consulted)
///
/// Anything more complex recurses into both branches; unconstrained inputs
/// are left to the logic simulator's constants, else default to ground.
pub fn gate_port_values(expr: &FuncExpr, input_port: &str, port_values: &mut PortValueMap) {
    match expr {
        FuncExpr::Port(_) | FuncExpr::One | FuncExpr::Zero => {}
        FuncExpr::Not(inner) => gate_port_values(inner, input_port, port_values),
        FuncExpr::Or(left, right) => binary_port_values(
            left,
            right,
            input_port,
            LogicValue::Zero,
            LogicValue::One,
            port_values,
        ),
        FuncExpr::And(left, right) => binary_port_values(
            left,
            right,
            input_port,
            LogicValue::One,
            LogicValue::Zero,
            port_values,
        ),
        FuncExpr::Xor(left, right) => {
            if left.port_name() == Some(input_port) {
                if let Some(port) = right.port_name() {
                    port_values.insert(port.to_string(), LogicValue::Zero);
                    return;
                }
            }
            if right.port_name() == Some(input_port) {
                if let Some(port) = left.port_name() {
                    port_values.insert(port.to_string(), LogicValue::Zero);
                    return;
                }
            }
            gate_port_values(left, input_port, port_values);
            gate_port_values(right, input_port, port_values);
        }
    }
}

/// Shared OR/AND rule: when one side contains the path input and the other
/// side is a bare port, force `bare_value`; when the other side is a negated
/// port, force `negated_value`. Otherwise recurse.
fn binary_port_values(
    left: &FuncExpr,
    right: &FuncExpr,
    input_port: &str,
    bare_value: LogicValue,
    negated_value: LogicValue,
    port_values: &mut PortValueMap,
) {
    for (side, other) in [(left, right), (right, left)] {
        if side.has_port(input_port) {
            if let Some(port) = other.port_name() {
                port_values.insert(port.to_string(), bare_value);
                return;
            }
            if let FuncExpr::Not(inner) = other {
                if let Some(port) = inner.port_name() {
                    port_values.insert(port.to_string(), negated_value);
                    return;
                }
            }
        }
    }
    gate_port_values(left, input_port, port_values);
    gate_port_values(right, input_port, port_values);
}

/// Sensitize a register/latch output stage: find the sequential element the
/// driver function refers to and schedule an edge on one of its data inputs.
fn reg_port_values(design: &Design, stages: &Stages, stage: usize, sens: &mut Sensitization) {
    let Some(drvr_port) = stages.drvr_port(stage) else {
        return;
    };
    let Some(expr) = drvr_port.func() else {
        return;
    };
    // A register output function is a reference to an internal port (IQ, IQN).
    let Some(q_port) = expr.port_name() else {
        return;
    };
    let seq = stages
        .liberty_cell(stage)
        .and_then(|cell| cell.output_port_sequential(q_port));
    match seq {
        Some(seq) => {
            let drvr_path = stages.drvr_path(stage);
            seq_port_values(seq, drvr_path.transition(), &mut sens.port_values);
            sens.clock = drvr_path.clock().cloned();
            sens.dcalc_ap = drvr_path.dcalc_ap_index();
        }
        None => {
            let from = stages
                .gate_input_port(stage)
                .map(|port| port.name().to_string())
                .unwrap_or_default();
            warn!(
                "no register/latch found for path from {} to {}; side inputs default to ground",
                from,
                drvr_port.name()
            );
        }
    }
}

/// Pick one data input of the sequential and give it an edge consistent with
/// the output transition and the data expression's unateness.
fn seq_port_values(seq: &Sequential, tr: RiseFall, port_values: &mut PortValueMap) {
    let data = seq.data();
    if let Some(port) = data.one_port() {
        let value = match data.port_timing_sense(port) {
            TimingSense::PositiveUnate => match tr {
                RiseFall::Rise => Some(LogicValue::Rise),
                RiseFall::Fall => Some(LogicValue::Fall),
            },
            TimingSense::NegativeUnate => match tr {
                RiseFall::Rise => Some(LogicValue::Fall),
                RiseFall::Fall => Some(LogicValue::Rise),
            },
            TimingSense::NonUnate | TimingSense::None => None,
        };
        if let Some(value) = value {
            port_values.insert(port.to_string(), value);
        }
    }
}
