//! Bundle of the read-only snapshots the generator consumes: netlist, liberty
//! model, timing graph, parasitics, and propagated logic constants.

use crate::graph::Graph;
use crate::liberty::{LibertyCell, LibertyLibrary, LibertyPort};
use crate::network::{InstId, Network, PinId};
use crate::parasitics::Parasitics;
use crate::sim::LogicSim;

#[derive(Debug, Clone)]
pub struct Design {
    pub network: Network,
    pub library: LibertyLibrary,
    pub graph: Graph,
    pub parasitics: Parasitics,
    pub sim: LogicSim,
}

impl Design {
    pub fn new(
        network: Network,
        library: LibertyLibrary,
        graph: Graph,
        parasitics: Parasitics,
        sim: LogicSim,
    ) -> Self {
        Self {
            network,
            library,
            graph,
            parasitics,
            sim,
        }
    }

    #[inline]
    pub fn liberty_port(&self, pin: PinId) -> Option<&LibertyPort> {
        self.network.liberty_port(&self.library, pin)
    }

    #[inline]
    pub fn liberty_cell(&self, inst: InstId) -> Option<&LibertyCell> {
        self.network.liberty_cell(&self.library, inst)
    }
}
