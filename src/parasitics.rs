//! Read-only snapshot of extracted parasitics: one RC network per
//! (driver pin, analysis point), as a list of named nodes and two-terminal
//! devices. Emission order is not this module's concern; the deck writer
//! sorts devices and nodes canonically before writing.

use std::collections::HashMap;

use crate::network::PinId;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ParasiticNodeId(pub usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ParasiticDeviceId(pub usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ParasiticDeviceKind {
    Resistor,
    CouplingCap,
}

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    connection_pin: Option<PinId>,
    gnd_cap: f64,
}

#[derive(Debug, Clone)]
struct DeviceData {
    kind: ParasiticDeviceKind,
    node1: ParasiticNodeId,
    node2: ParasiticNodeId,
    value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ParasiticNetwork {
    nodes: Vec<NodeData>,
    devices: Vec<DeviceData>,
}

impl ParasiticNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        connection_pin: Option<PinId>,
        gnd_cap: f64,
    ) -> ParasiticNodeId {
        let id = ParasiticNodeId(self.nodes.len());
        self.nodes.push(NodeData {
            name: name.into(),
            connection_pin,
            gnd_cap,
        });
        id
    }

    pub fn add_resistor(&mut self, node1: ParasiticNodeId, node2: ParasiticNodeId, value: f64) {
        self.devices.push(DeviceData {
            kind: ParasiticDeviceKind::Resistor,
            node1,
            node2,
            value,
        });
    }

    pub fn add_coupling_cap(&mut self, node1: ParasiticNodeId, node2: ParasiticNodeId, value: f64) {
        self.devices.push(DeviceData {
            kind: ParasiticDeviceKind::CouplingCap,
            node1,
            node2,
            value,
        });
    }

    pub fn nodes(&self) -> impl Iterator<Item = ParasiticNodeId> {
        (0..self.nodes.len()).map(ParasiticNodeId)
    }

    pub fn devices(&self) -> impl Iterator<Item = ParasiticDeviceId> {
        (0..self.devices.len()).map(ParasiticDeviceId)
    }

    #[inline]
    pub fn is_resistor(&self, device: ParasiticDeviceId) -> bool {
        self.devices[device.0].kind == ParasiticDeviceKind::Resistor
    }

    #[inline]
    pub fn is_coupling_cap(&self, device: ParasiticDeviceId) -> bool {
        self.devices[device.0].kind == ParasiticDeviceKind::CouplingCap
    }

    #[inline]
    pub fn node1(&self, device: ParasiticDeviceId) -> ParasiticNodeId {
        self.devices[device.0].node1
    }

    #[inline]
    pub fn node2(&self, device: ParasiticDeviceId) -> ParasiticNodeId {
        self.devices[device.0].node2
    }

    /// Device value at an analysis point: ohms for resistors, farads for
    /// coupling caps. The snapshot holds the values of the analysis point it
    /// was extracted for, so `_ap` only documents the contract.
    #[inline]
    pub fn value(&self, device: ParasiticDeviceId, _ap: usize) -> f64 {
        self.devices[device.0].value
    }

    #[inline]
    pub fn node_name(&self, node: ParasiticNodeId) -> &str {
        &self.nodes[node.0].name
    }

    #[inline]
    pub fn connection_pin(&self, node: ParasiticNodeId) -> Option<PinId> {
        self.nodes[node.0].connection_pin
    }

    #[inline]
    pub fn node_gnd_cap(&self, node: ParasiticNodeId, _ap: usize) -> f64 {
        self.nodes[node.0].gnd_cap
    }
}

/// Store of parasitic networks keyed by driver pin and analysis point.
#[derive(Debug, Clone, Default)]
pub struct Parasitics {
    networks: HashMap<(PinId, usize), ParasiticNetwork>,
}

impl Parasitics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, drvr_pin: PinId, ap: usize, network: ParasiticNetwork) {
        self.networks.insert((drvr_pin, ap), network);
    }

    #[inline]
    pub fn find_parasitic_network(&self, drvr_pin: PinId, ap: usize) -> Option<&ParasiticNetwork> {
        self.networks.get(&(drvr_pin, ap))
    }
}
