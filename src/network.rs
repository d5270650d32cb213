//! Read-only snapshot of the gate-level netlist: instances, pins, nets, and
//! their connectivity, with hierarchical path names precomputed by the
//! embedding tool.

use crate::liberty::{LibertyCell, LibertyLibrary, LibertyPort, PortDirection};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct InstId(pub usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PinId(pub usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NetId(pub usize);

#[derive(Debug, Clone)]
struct InstanceData {
    name: String,
    cell: Option<String>,
    pins: Vec<PinId>,
}

#[derive(Debug, Clone)]
struct PinData {
    port: String,
    path_name: String,
    instance: Option<InstId>,
    net: Option<NetId>,
    direction: PortDirection,
    is_hierarchical: bool,
    is_top_level_port: bool,
}

#[derive(Debug, Clone)]
struct NetData {
    name: String,
    pins: Vec<PinId>,
}

#[derive(Debug, Clone, Default)]
pub struct Network {
    instances: Vec<InstanceData>,
    pins: Vec<PinData>,
    nets: Vec<NetData>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instance(&mut self, name: impl Into<String>, cell: impl Into<String>) -> InstId {
        let id = InstId(self.instances.len());
        self.instances.push(InstanceData {
            name: name.into(),
            cell: Some(cell.into()),
            pins: Vec::new(),
        });
        id
    }

    pub fn add_net(&mut self, name: impl Into<String>) -> NetId {
        let id = NetId(self.nets.len());
        self.nets.push(NetData {
            name: name.into(),
            pins: Vec::new(),
        });
        id
    }

    /// Add a pin on `instance`, connected to `net`. The pin's path name is
    /// `<instance>/<port>`.
    pub fn add_pin(
        &mut self,
        instance: InstId,
        port: impl Into<String>,
        direction: PortDirection,
        net: Option<NetId>,
    ) -> PinId {
        let port = port.into();
        let path_name = format!("{}/{}", self.instances[instance.0].name, port);
        let id = PinId(self.pins.len());
        self.pins.push(PinData {
            port,
            path_name,
            instance: Some(instance),
            net,
            direction,
            is_hierarchical: false,
            is_top_level_port: false,
        });
        self.instances[instance.0].pins.push(id);
        if let Some(net) = net {
            self.nets[net.0].pins.push(id);
        }
        id
    }

    /// Add a top-level port pin. `direction` is the port direction seen from
    /// outside the block (an input port drives its net).
    pub fn add_port(
        &mut self,
        name: impl Into<String>,
        direction: PortDirection,
        net: Option<NetId>,
    ) -> PinId {
        let name = name.into();
        let id = PinId(self.pins.len());
        self.pins.push(PinData {
            port: name.clone(),
            path_name: name,
            instance: None,
            net,
            direction,
            is_hierarchical: false,
            is_top_level_port: true,
        });
        if let Some(net) = net {
            self.nets[net.0].pins.push(id);
        }
        id
    }

    /// Add a hierarchical pin (a pin on a non-leaf instance boundary).
    pub fn add_hierarchical_pin(
        &mut self,
        path_name: impl Into<String>,
        direction: PortDirection,
        net: Option<NetId>,
    ) -> PinId {
        let path_name = path_name.into();
        let id = PinId(self.pins.len());
        self.pins.push(PinData {
            port: path_name.clone(),
            path_name,
            instance: None,
            net,
            direction,
            is_hierarchical: true,
            is_top_level_port: false,
        });
        if let Some(net) = net {
            self.nets[net.0].pins.push(id);
        }
        id
    }

    #[inline]
    pub fn path_name(&self, pin: PinId) -> &str {
        &self.pins[pin.0].path_name
    }

    #[inline]
    pub fn port_name(&self, pin: PinId) -> &str {
        &self.pins[pin.0].port
    }

    #[inline]
    pub fn instance(&self, pin: PinId) -> Option<InstId> {
        self.pins[pin.0].instance
    }

    #[inline]
    pub fn instance_name(&self, inst: InstId) -> &str {
        &self.instances[inst.0].name
    }

    #[inline]
    pub fn instance_cell_name(&self, inst: InstId) -> Option<&str> {
        self.instances[inst.0].cell.as_deref()
    }

    #[inline]
    pub fn direction(&self, pin: PinId) -> PortDirection {
        self.pins[pin.0].direction
    }

    #[inline]
    pub fn is_hierarchical(&self, pin: PinId) -> bool {
        self.pins[pin.0].is_hierarchical
    }

    #[inline]
    pub fn is_top_level_port(&self, pin: PinId) -> bool {
        self.pins[pin.0].is_top_level_port
    }

    /// Whether the pin sinks current from its net: an instance input, or a
    /// top-level output port.
    pub fn is_load(&self, pin: PinId) -> bool {
        let data = &self.pins[pin.0];
        if data.is_top_level_port {
            data.direction.is_any_output()
        } else {
            data.direction.is_any_input()
        }
    }

    #[inline]
    pub fn net(&self, pin: PinId) -> Option<NetId> {
        self.pins[pin.0].net
    }

    #[inline]
    pub fn net_name(&self, net: NetId) -> &str {
        &self.nets[net.0].name
    }

    pub fn find_pin(&self, inst: InstId, port_name: &str) -> Option<PinId> {
        self.instances[inst.0]
            .pins
            .iter()
            .copied()
            .find(|&pin| self.pins[pin.0].port == port_name)
    }

    /// Pins connected to the same net as `pin`, in netlist insertion order.
    /// Includes `pin` itself.
    pub fn connected_pins(&self, pin: PinId) -> impl Iterator<Item = PinId> + '_ {
        let pins = match self.pins[pin.0].net {
            Some(net) => self.nets[net.0].pins.as_slice(),
            None => &[],
        };
        pins.iter().copied()
    }

    /// The liberty cell of an instance.
    pub fn liberty_cell<'a>(
        &self,
        library: &'a LibertyLibrary,
        inst: InstId,
    ) -> Option<&'a LibertyCell> {
        self.instance_cell_name(inst)
            .and_then(|cell| library.find_cell(cell))
    }

    /// The liberty port backing a leaf instance pin.
    pub fn liberty_port<'a>(
        &self,
        library: &'a LibertyLibrary,
        pin: PinId,
    ) -> Option<&'a LibertyPort> {
        let inst = self.instance(pin)?;
        self.liberty_cell(library, inst)?
            .find_liberty_port(&self.pins[pin.0].port)
    }
}
