//! The expanded timing path handed over by the analyzer: a random-access
//! sequence of pin arrivals, start to end, with the timing arc that produced
//! each arrival.

use serde::{Deserialize, Serialize};

use crate::graph::{ArcId, VertexId};
use crate::network::PinId;
use crate::transition::RiseFall;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    pub name: String,
    pub period: f64,
}

/// One pin arrival on the expanded path.
#[derive(Debug, Clone)]
pub struct PathPoint {
    pin: PinId,
    transition: RiseFall,
    arrival: f64,
    is_clock: bool,
    clock: Option<Clock>,
    clk_edge_time: Option<f64>,
    dcalc_ap: usize,
    vertex: VertexId,
}

impl PathPoint {
    pub fn new(pin: PinId, transition: RiseFall, arrival: f64, vertex: VertexId) -> Self {
        Self {
            pin,
            transition,
            arrival,
            is_clock: false,
            clock: None,
            clk_edge_time: None,
            dcalc_ap: 0,
            vertex,
        }
    }

    /// Associate the launching clock without placing the pin on the clock
    /// tree itself (e.g. a register output arrival).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Mark the arrival as propagating a clock. `edge_time` is the launching
    /// clock edge's time within the waveform; an edge inside the first period
    /// is a rising launch.
    pub fn on_clock(mut self, clock: Clock, edge_time: f64) -> Self {
        self.is_clock = true;
        self.clock = Some(clock);
        self.clk_edge_time = Some(edge_time);
        self
    }

    pub fn dcalc_ap(mut self, ap: usize) -> Self {
        self.dcalc_ap = ap;
        self
    }

    #[inline]
    pub fn pin(&self) -> PinId {
        self.pin
    }

    #[inline]
    pub fn transition(&self) -> RiseFall {
        self.transition
    }

    #[inline]
    pub fn arrival(&self) -> f64 {
        self.arrival
    }

    #[inline]
    pub fn is_clock(&self) -> bool {
        self.is_clock
    }

    #[inline]
    pub fn clock(&self) -> Option<&Clock> {
        self.clock.as_ref()
    }

    #[inline]
    pub fn clk_edge_time(&self) -> Option<f64> {
        self.clk_edge_time
    }

    #[inline]
    pub fn dcalc_ap_index(&self) -> usize {
        self.dcalc_ap
    }

    #[inline]
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }
}

/// The expanded path: index 0 is the start point. `prev_arc(i)` is the timing
/// arc that produced arrival `i`, absent for the start point and for wire
/// hops the analyzer did not annotate.
#[derive(Debug, Clone, Default)]
pub struct PathExpanded {
    points: Vec<PathPoint>,
    prev_arcs: Vec<Option<ArcId>>,
}

impl PathExpanded {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: PathPoint, prev_arc: Option<ArcId>) {
        self.points.push(point);
        self.prev_arcs.push(prev_arc);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn point(&self, index: usize) -> &PathPoint {
        &self.points[index]
    }

    #[inline]
    pub fn prev_arc(&self, index: usize) -> Option<ArcId> {
        self.prev_arcs.get(index).copied().flatten()
    }

    #[inline]
    pub fn start_path(&self) -> &PathPoint {
        &self.points[0]
    }

    #[inline]
    pub fn end_path(&self) -> &PathPoint {
        &self.points[self.points.len() - 1]
    }
}
