//! Stage decomposition of an expanded path.
//!
//! A stage is one gate plus the net it drives:
//!
//! ```text
//!            stage
//!       |---------------|
//!         |\             |\
//!  -------| >---/\/\/----| >---
//!   gate  |/ drvr    load|/
//!   input
//! ```
//!
//! Stage 1 is the input stage: the start pin drives its net directly and
//! there is no gate input. Stage `s` maps onto the expanded path with pure
//! index arithmetic: gate input at `2s-3`, driver at `2s-2`, load at `2s-1`.

use std::ops::RangeInclusive;

use crate::design::Design;
use crate::graph::{ArcId, EdgeId};
use crate::liberty::{LibertyCell, LibertyPort};
use crate::network::{InstId, PinId};
use crate::path::{PathExpanded, PathPoint};

pub struct Stages<'a> {
    design: &'a Design,
    path: &'a PathExpanded,
}

impl<'a> Stages<'a> {
    pub fn new(design: &'a Design, path: &'a PathExpanded) -> Self {
        Self { design, path }
    }

    #[inline]
    pub fn first(&self) -> usize {
        1
    }

    #[inline]
    pub fn last(&self) -> usize {
        (self.path.len() + 1) / 2
    }

    #[inline]
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.first()..=self.last()
    }

    pub fn name(&self, stage: usize) -> String {
        format!("stage{stage}")
    }

    pub fn gate_input_path(&self, stage: usize) -> Option<&'a PathPoint> {
        if stage > self.first() {
            Some(self.path.point(stage * 2 - 3))
        } else {
            None
        }
    }

    #[inline]
    pub fn drvr_path(&self, stage: usize) -> &'a PathPoint {
        self.path.point(stage * 2 - 2)
    }

    #[inline]
    pub fn load_path(&self, stage: usize) -> &'a PathPoint {
        self.path.point(stage * 2 - 1)
    }

    /// The timing arc through the stage's gate; `None` for the input stage.
    /// Out-of-range stages report `None`, so probing `last() + 1` is safe.
    #[inline]
    pub fn gate_arc(&self, stage: usize) -> Option<ArcId> {
        self.path.prev_arc(stage * 2 - 2)
    }

    /// The wire arc from the stage driver to its load.
    #[inline]
    pub fn wire_arc(&self, stage: usize) -> Option<ArcId> {
        self.path.prev_arc(stage * 2 - 1)
    }

    pub fn gate_edge(&self, stage: usize) -> Option<EdgeId> {
        self.gate_arc(stage)
            .and_then(|arc| self.design.graph.arc_edge(arc))
    }

    pub fn wire_edge(&self, stage: usize) -> Option<EdgeId> {
        self.wire_arc(stage)
            .and_then(|arc| self.design.graph.arc_edge(arc))
    }

    pub fn gate_input_pin(&self, stage: usize) -> Option<PinId> {
        self.gate_input_path(stage).map(|path| path.pin())
    }

    #[inline]
    pub fn drvr_pin(&self, stage: usize) -> PinId {
        self.drvr_path(stage).pin()
    }

    #[inline]
    pub fn load_pin(&self, stage: usize) -> PinId {
        self.load_path(stage).pin()
    }

    pub fn gate_input_port(&self, stage: usize) -> Option<&'a LibertyPort> {
        self.gate_input_pin(stage)
            .and_then(|pin| self.design.liberty_port(pin))
    }

    pub fn drvr_port(&self, stage: usize) -> Option<&'a LibertyPort> {
        self.design.liberty_port(self.drvr_pin(stage))
    }

    pub fn gate_input_pin_name(&self, stage: usize) -> Option<&'a str> {
        self.gate_input_pin(stage)
            .map(|pin| self.design.network.path_name(pin))
    }

    #[inline]
    pub fn drvr_pin_name(&self, stage: usize) -> &'a str {
        self.design.network.path_name(self.drvr_pin(stage))
    }

    #[inline]
    pub fn load_pin_name(&self, stage: usize) -> &'a str {
        self.design.network.path_name(self.load_pin(stage))
    }

    /// The instance whose gate drives the stage; `None` for the input stage
    /// (the driver is a top-level port).
    pub fn instance(&self, stage: usize) -> Option<InstId> {
        self.design.network.instance(self.drvr_pin(stage))
    }

    pub fn liberty_cell(&self, stage: usize) -> Option<&'a LibertyCell> {
        self.instance(stage)
            .and_then(|inst| self.design.liberty_cell(inst))
    }
}
