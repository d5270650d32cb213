//! Read-only snapshot of the liberty timing model: cells, ports, power/ground
//! pins, sequential elements, and the library-level thresholds and supplies
//! the deck generator needs.
//!
//! The snapshot is populated by the embedding tool (or by tests); nothing in
//! this module parses liberty text.

use indexmap::IndexMap;

use crate::func::FuncExpr;
use crate::transition::RiseFall;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
    Internal,
}

impl PortDirection {
    #[inline]
    pub fn is_any_input(self) -> bool {
        matches!(self, PortDirection::Input | PortDirection::Inout)
    }

    #[inline]
    pub fn is_any_output(self) -> bool {
        matches!(self, PortDirection::Output | PortDirection::Inout)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PgType {
    Power,
    Ground,
}

/// Operating corner data: the slice of a PVT the generator consumes.
#[derive(Debug, Clone)]
pub struct OperatingConditions {
    pub name: String,
    pub voltage: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone)]
pub struct LibertyPgPort {
    name: String,
    pg_type: PgType,
    voltage_name: Option<String>,
}

impl LibertyPgPort {
    pub fn new(name: impl Into<String>, pg_type: PgType, voltage_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            pg_type,
            voltage_name,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn pg_type(&self) -> PgType {
        self.pg_type
    }

    #[inline]
    pub fn voltage_name(&self) -> Option<&str> {
        self.voltage_name.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct LibertyPort {
    name: String,
    direction: PortDirection,
    function: Option<FuncExpr>,
    related_power_pin: Option<String>,
    related_ground_pin: Option<String>,
}

impl LibertyPort {
    pub fn new(name: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            name: name.into(),
            direction,
            function: None,
            related_power_pin: None,
            related_ground_pin: None,
        }
    }

    pub fn function(mut self, function: FuncExpr) -> Self {
        self.function = Some(function);
        self
    }

    pub fn related_power_pin(mut self, pin: impl Into<String>) -> Self {
        self.related_power_pin = Some(pin.into());
        self
    }

    pub fn related_ground_pin(mut self, pin: impl Into<String>) -> Self {
        self.related_ground_pin = Some(pin.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    #[inline]
    pub fn func(&self) -> Option<&FuncExpr> {
        self.function.as_ref()
    }

    #[inline]
    pub fn related_power_pin_name(&self) -> Option<&str> {
        self.related_power_pin.as_deref()
    }

    #[inline]
    pub fn related_ground_pin_name(&self) -> Option<&str> {
        self.related_ground_pin.as_deref()
    }
}

/// A register or latch description: the internal port its output expression
/// names (e.g. `IQ`), and its data input expression.
#[derive(Debug, Clone)]
pub struct Sequential {
    output: String,
    data: FuncExpr,
}

impl Sequential {
    pub fn new(output: impl Into<String>, data: FuncExpr) -> Self {
        Self {
            output: output.into(),
            data,
        }
    }

    #[inline]
    pub fn output(&self) -> &str {
        &self.output
    }

    #[inline]
    pub fn data(&self) -> &FuncExpr {
        &self.data
    }
}

#[derive(Debug, Clone)]
pub struct LibertyCell {
    name: String,
    ports: IndexMap<String, LibertyPort>,
    pg_ports: IndexMap<String, LibertyPgPort>,
    sequentials: Vec<Sequential>,
}

impl LibertyCell {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ports: IndexMap::new(),
            pg_ports: IndexMap::new(),
            sequentials: Vec::new(),
        }
    }

    pub fn port(mut self, port: LibertyPort) -> Self {
        self.ports.insert(port.name.clone(), port);
        self
    }

    pub fn pg_port(mut self, pg_port: LibertyPgPort) -> Self {
        self.pg_ports.insert(pg_port.name.clone(), pg_port);
        self
    }

    pub fn sequential(mut self, seq: Sequential) -> Self {
        self.sequentials.push(seq);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn find_liberty_port(&self, name: &str) -> Option<&LibertyPort> {
        self.ports.get(name)
    }

    #[inline]
    pub fn find_pg_port(&self, name: &str) -> Option<&LibertyPgPort> {
        self.pg_ports.get(name)
    }

    pub fn ports(&self) -> impl Iterator<Item = &LibertyPort> {
        self.ports.values()
    }

    /// The sequential element whose output expression names `port`, if any.
    /// `port` is the internal port a register output function refers to.
    pub fn output_port_sequential(&self, port: &str) -> Option<&Sequential> {
        self.sequentials.iter().find(|seq| seq.output == port)
    }
}

/// Library-level data: thresholds, supply voltages, units, and the cells.
///
/// Threshold accessors take a [`RiseFall`] and return fractions of the rail
/// voltage; the defaults are the common 50% delay / 20-80% slew convention.
#[derive(Debug, Clone)]
pub struct LibertyLibrary {
    name: String,
    time_unit_scale: f64,
    supply_voltages: IndexMap<String, f64>,
    default_operating_conditions: OperatingConditions,
    input_threshold: [f64; 2],
    slew_lower_threshold: [f64; 2],
    slew_upper_threshold: [f64; 2],
    cells: IndexMap<String, LibertyCell>,
}

impl LibertyLibrary {
    pub fn new(name: impl Into<String>, default_operating_conditions: OperatingConditions) -> Self {
        Self {
            name: name.into(),
            time_unit_scale: 1e-9,
            supply_voltages: IndexMap::new(),
            default_operating_conditions,
            input_threshold: [0.5, 0.5],
            slew_lower_threshold: [0.2, 0.2],
            slew_upper_threshold: [0.8, 0.8],
            cells: IndexMap::new(),
        }
    }

    pub fn time_unit_scale(mut self, scale: f64) -> Self {
        self.time_unit_scale = scale;
        self
    }

    pub fn supply_voltage_entry(mut self, name: impl Into<String>, voltage: f64) -> Self {
        self.supply_voltages.insert(name.into(), voltage);
        self
    }

    pub fn thresholds(mut self, tr: RiseFall, input: f64, slew_lower: f64, slew_upper: f64) -> Self {
        self.input_threshold[tr.index()] = input;
        self.slew_lower_threshold[tr.index()] = slew_lower;
        self.slew_upper_threshold[tr.index()] = slew_upper;
        self
    }

    pub fn cell(mut self, cell: LibertyCell) -> Self {
        self.cells.insert(cell.name.clone(), cell);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seconds per library time unit; the floor of the slew resolution ladder.
    #[inline]
    pub fn time_unit(&self) -> f64 {
        self.time_unit_scale
    }

    #[inline]
    pub fn supply_voltage(&self, name: &str) -> Option<f64> {
        self.supply_voltages.get(name).copied()
    }

    #[inline]
    pub fn default_operating_conditions(&self) -> &OperatingConditions {
        &self.default_operating_conditions
    }

    #[inline]
    pub fn input_threshold(&self, tr: RiseFall) -> f64 {
        self.input_threshold[tr.index()]
    }

    #[inline]
    pub fn slew_lower_threshold(&self, tr: RiseFall) -> f64 {
        self.slew_lower_threshold[tr.index()]
    }

    #[inline]
    pub fn slew_upper_threshold(&self, tr: RiseFall) -> f64 {
        self.slew_upper_threshold[tr.index()]
    }

    #[inline]
    pub fn find_cell(&self, name: &str) -> Option<&LibertyCell> {
        self.cells.get(name)
    }
}
