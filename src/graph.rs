//! Read-only snapshot of the timing graph: per-vertex slews computed by the
//! delay calculator, timing edges with their roles, and timing arcs with the
//! delay-table axes the slew resolution ladder consults.

use std::collections::HashMap;

use crate::network::PinId;
use crate::transition::RiseFall;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ArcId(pub usize);

/// Role of a timing edge in the graph.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TimingRole {
    Combinational,
    Wire,
    RegClkToQ,
    LatchEnToQ,
}

impl TimingRole {
    /// Latch enable-to-output arcs fold into the register clock-to-output
    /// role; both sensitize through the cell's sequential description.
    #[inline]
    pub fn generic_role(self) -> TimingRole {
        match self {
            TimingRole::LatchEnToQ => TimingRole::RegClkToQ,
            other => other,
        }
    }
}

/// Axis variable of a delay-table dimension.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AxisVariable {
    InputTransitionTime,
    InputNetTransition,
    OutputNetCapacitance,
}

impl AxisVariable {
    #[inline]
    pub fn is_input_transition(self) -> bool {
        matches!(
            self,
            AxisVariable::InputTransitionTime | AxisVariable::InputNetTransition
        )
    }
}

#[derive(Debug, Clone)]
pub struct TableAxis {
    pub variable: AxisVariable,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
struct EdgeData {
    role: TimingRole,
}

#[derive(Debug, Clone)]
struct ArcData {
    cell: Option<String>,
    edge: Option<EdgeId>,
    delay_axes: Vec<TableAxis>,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertex_count: usize,
    slews: HashMap<(VertexId, usize, usize), f64>,
    pin_load_vertices: HashMap<PinId, VertexId>,
    edges: Vec<EdgeData>,
    arcs: Vec<ArcData>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self) -> VertexId {
        let id = VertexId(self.vertex_count);
        self.vertex_count += 1;
        id
    }

    pub fn set_slew(&mut self, vertex: VertexId, tr: RiseFall, ap: usize, slew: f64) {
        self.slews.insert((vertex, tr.index(), ap), slew);
    }

    /// Delay-calculator slew at a vertex; 0.0 when the calculator has none.
    #[inline]
    pub fn slew(&self, vertex: VertexId, tr: RiseFall, ap: usize) -> f64 {
        self.slews
            .get(&(vertex, tr.index(), ap))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set_pin_load_vertex(&mut self, pin: PinId, vertex: VertexId) {
        self.pin_load_vertices.insert(pin, vertex);
    }

    #[inline]
    pub fn pin_load_vertex(&self, pin: PinId) -> Option<VertexId> {
        self.pin_load_vertices.get(&pin).copied()
    }

    pub fn add_edge(&mut self, role: TimingRole) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(EdgeData { role });
        id
    }

    #[inline]
    pub fn edge_role(&self, edge: EdgeId) -> TimingRole {
        self.edges[edge.0].role
    }

    pub fn add_arc(
        &mut self,
        cell: Option<String>,
        edge: Option<EdgeId>,
        delay_axes: Vec<TableAxis>,
    ) -> ArcId {
        let id = ArcId(self.arcs.len());
        self.arcs.push(ArcData {
            cell,
            edge,
            delay_axes,
        });
        id
    }

    #[inline]
    pub fn arc_cell_name(&self, arc: ArcId) -> Option<&str> {
        self.arcs[arc.0].cell.as_deref()
    }

    #[inline]
    pub fn arc_edge(&self, arc: ArcId) -> Option<EdgeId> {
        self.arcs[arc.0].edge
    }

    /// Smallest value on any input-transition-time axis of the arc's delay
    /// table, the second rung of the slew resolution ladder.
    pub fn arc_slew_axis_min(&self, arc: ArcId) -> Option<f64> {
        self.arcs[arc.0]
            .delay_axes
            .iter()
            .find(|axis| axis.variable.is_input_transition())
            .and_then(|axis| axis.values.first().copied())
    }
}
