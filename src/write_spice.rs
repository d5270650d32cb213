//! Deck assembly: translate one expanded timing path into a self-contained
//! SPICE deck that reproduces the path's switching behavior and measures the
//! per-stage delays and slews the analyzer reported.
//!
//! The deck is written in a fixed order: header, stage instances, measure
//! statements, the input source, one subcircuit per stage, `.end`. Given the
//! same snapshot inputs, the output is byte-identical across runs.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::design::Design;
use crate::error::{PathSpiceError, Result};
use crate::graph::{ArcId, VertexId};
use crate::liberty::LibertyPgPort;
use crate::network::{InstId, PinId};
use crate::parasitics::{ParasiticNetwork, ParasiticNodeId};
use crate::path::{Clock, PathExpanded, PathPoint};
use crate::sensitize::{self, PortValueMap};
use crate::stage::Stages;
use crate::subckt::{self, CellPortOrders};
use crate::transition::{LogicValue, RiseFall};
use crate::waveform::{EdgeParams, Waveform};

/// Resistance used to patch missing driver-to-load connectivity.
const SHORT_CKT_RESISTANCE: f64 = 1e-4;

/// Cycles in the clocked input waveform.
const CLK_CYCLE_COUNT: usize = 3;

/// Invocation parameters: output and input file paths plus the names of the
/// power and ground supply nets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpicePathParams {
    /// Deck output file.
    pub deck_path: PathBuf,
    /// Harvested subcircuit output file, referenced by the deck's `.include`.
    pub subckt_path: PathBuf,
    /// Vendor subcircuit library to harvest from.
    pub lib_subckt_path: PathBuf,
    /// Device model file, referenced by the deck's `.include`.
    pub model_path: PathBuf,
    pub power_name: String,
    pub gnd_name: String,
}

/// Write the SPICE deck and harvested subcircuit file for `path`.
pub fn write_path_spice(
    design: &Design,
    path: &PathExpanded,
    params: &SpicePathParams,
) -> Result<()> {
    info!(
        "writing path spice deck to {}, subckts to {}",
        params.deck_path.display(),
        params.subckt_path.display()
    );
    let deck =
        File::create(&params.deck_path).map_err(|source| PathSpiceError::FileNotWritable {
            path: params.deck_path.clone(),
            source,
        })?;
    let stages = Stages::new(design, path);
    let cell_names = find_path_cell_names(design, &stages);
    let port_orders = subckt::copy_subckts(&design.library, params, &cell_names)?;

    let mut writer = DeckWriter::new(BufWriter::new(deck), design, path, params, port_orders);
    writer.write()
}

/// Cells whose subcircuits the deck instantiates: the gate of every stage
/// plus every side receiver hanging on a stage's driver net.
fn find_path_cell_names(design: &Design, stages: &Stages) -> BTreeSet<String> {
    let mut cells = BTreeSet::new();
    for stage in stages.indices() {
        if let Some(arc) = stages.gate_arc(stage) {
            if let Some(cell) = design.graph.arc_cell_name(arc) {
                cells.insert(cell.to_string());
            }
            let drvr_pin = stages.drvr_pin(stage);
            for pin in design.network.connected_pins(drvr_pin) {
                if design.liberty_port(pin).is_some() {
                    let cell = design
                        .network
                        .instance(pin)
                        .and_then(|inst| design.network.instance_cell_name(inst));
                    if let Some(cell) = cell {
                        cells.insert(cell.to_string());
                    }
                }
            }
        }
    }
    cells
}

fn spice_trans(tr: RiseFall) -> &'static str {
    match tr {
        RiseFall::Rise => "RISE",
        RiseFall::Fall => "FALL",
    }
}

fn clk_waveform_time_offset(clock: &Clock) -> f64 {
    clock.period / 10.0
}

/// Stable SPICE identifiers for parasitic nodes: pin-connected nodes keep
/// their own (pin path) name, interior nodes get `<net_name>/<k>` with `k`
/// assigned on first encounter and reset per driver net.
#[derive(Debug, Default)]
struct NodeNamer {
    net_name: String,
    ids: HashMap<ParasiticNodeId, usize>,
    next_id: usize,
}

impl NodeNamer {
    fn reset(&mut self, net_name: &str) {
        self.net_name.clear();
        self.net_name.push_str(net_name);
        self.ids.clear();
        self.next_id = 1;
    }

    fn name(&mut self, parasitic: &ParasiticNetwork, node: ParasiticNodeId) -> String {
        if parasitic.connection_pin(node).is_some() {
            parasitic.node_name(node).to_string()
        } else {
            let id = match self.ids.get(&node) {
                Some(&id) => id,
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.ids.insert(node, id);
                    id
                }
            };
            format!("{}/{}", self.net_name, id)
        }
    }
}

struct DeckWriter<'a, W: Write> {
    out: W,
    design: &'a Design,
    path: &'a PathExpanded,
    stages: Stages<'a>,
    params: &'a SpicePathParams,
    port_orders: CellPortOrders,
    node_namer: NodeNamer,
    power_voltage: f64,
    gnd_voltage: f64,
}

impl<'a, W: Write> DeckWriter<'a, W> {
    fn new(
        out: W,
        design: &'a Design,
        path: &'a PathExpanded,
        params: &'a SpicePathParams,
        port_orders: CellPortOrders,
    ) -> Self {
        let library = &design.library;
        let power_voltage = library
            .supply_voltage(&params.power_name)
            .unwrap_or_else(|| library.default_operating_conditions().voltage);
        let gnd_voltage = library.supply_voltage(&params.gnd_name).unwrap_or(0.0);
        Self {
            out,
            design,
            path,
            stages: Stages::new(design, path),
            params,
            port_orders,
            node_namer: NodeNamer::default(),
            power_voltage,
            gnd_voltage,
        }
    }

    fn write(&mut self) -> Result<()> {
        self.write_header()?;
        self.write_stage_instances()?;
        self.write_measure_stmts()?;
        self.write_input_source()?;
        self.write_stage_subckts()?;
        writeln!(self.out, ".end")?;
        self.out.flush()?;
        Ok(())
    }

    fn write_banner(&mut self, title: &str) -> Result<()> {
        let rule = "*".repeat(title.len() + 2);
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "* {title}")?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let start = self.path.start_path();
        let end = self.path.end_path();
        writeln!(
            self.out,
            "* Path from {} {} to {} {}",
            self.design.network.path_name(start.pin()),
            start.transition().short_name(),
            self.design.network.path_name(end.pin()),
            end.transition().short_name()
        )?;
        let temp = self.design.library.default_operating_conditions().temperature;
        writeln!(self.out, ".temp {:.1}", temp)?;
        writeln!(
            self.out,
            ".include \"{}\"",
            self.params.model_path.display()
        )?;
        writeln!(
            self.out,
            ".include \"{}\"",
            self.params.subckt_path.display()
        )?;

        let max_time = self.max_time();
        let time_step = max_time / 1e3;
        writeln!(self.out, ".tran {:.3e} {:.3e}", time_step, max_time)?;
        writeln!(self.out)?;
        Ok(())
    }

    /// The launching clock, when the path starts on a clock tree.
    fn input_clock(&self) -> Option<&'a Clock> {
        let input_path = self.stages.drvr_path(self.stages.first());
        if input_path.is_clock() {
            input_path.clock()
        } else {
            None
        }
    }

    /// Simulation horizon: the whole clock waveform for clocked paths, or
    /// 1.5x the end arrival padded by the boundary slews for combinational
    /// ones.
    fn max_time(&self) -> f64 {
        if let Some(clock) = self.input_clock() {
            clock.period * CLK_CYCLE_COUNT as f64 + clk_waveform_time_offset(clock)
        } else {
            let input_stage = self.stages.first();
            let input_path = self.stages.drvr_path(input_stage);
            let next_arc = self.stages.gate_arc(input_stage + 1);
            let input_slew = self.find_slew_with(input_path, input_path.transition(), next_arc);
            let end = self.path.end_path();
            let end_slew = self.find_slew(end);
            (input_slew + end.arrival() + end_slew * 2.0) * 1.5
        }
    }

    /// Slew resolution ladder: the delay calculator's value, else the
    /// smallest input-transition axis value of the next gate's delay table,
    /// else the library time unit.
    fn find_slew_vertex(
        &self,
        vertex: VertexId,
        tr: RiseFall,
        next_arc: Option<ArcId>,
        dcalc_ap: usize,
    ) -> f64 {
        let mut slew = self.design.graph.slew(vertex, tr, dcalc_ap);
        if slew == 0.0 {
            if let Some(arc) = next_arc {
                slew = self.design.graph.arc_slew_axis_min(arc).unwrap_or(0.0);
            }
        }
        if slew == 0.0 {
            slew = self.design.library.time_unit();
        }
        slew
    }

    fn find_slew(&self, path: &PathPoint) -> f64 {
        self.find_slew_vertex(
            path.vertex(),
            path.transition(),
            None,
            path.dcalc_ap_index(),
        )
    }

    fn find_slew_with(&self, path: &PathPoint, tr: RiseFall, next_arc: Option<ArcId>) -> f64 {
        self.find_slew_vertex(path.vertex(), tr, next_arc, path.dcalc_ap_index())
    }

    fn write_stage_instances(&mut self) -> Result<()> {
        self.write_banner("Stage instances")?;
        for stage in self.stages.indices() {
            let name = self.stages.name(stage);
            match self.stages.gate_input_pin_name(stage) {
                None => writeln!(
                    self.out,
                    "x{} {} {} {}",
                    name,
                    self.stages.drvr_pin_name(stage),
                    self.stages.load_pin_name(stage),
                    name
                )?,
                Some(input) => writeln!(
                    self.out,
                    "x{} {} {} {} {}",
                    name,
                    input,
                    self.stages.drvr_pin_name(stage),
                    self.stages.load_pin_name(stage),
                    name
                )?,
            }
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn write_measure_stmts(&mut self) -> Result<()> {
        self.write_banner("Measure statements")?;
        for stage in self.stages.indices() {
            let drvr_path = self.stages.drvr_path(stage);
            let load_path = self.stages.load_path(stage);
            if let Some(gate_input_path) = self.stages.gate_input_path(stage) {
                // gate input -> gate output
                self.write_measure_slew_stmt(stage, gate_input_path)?;
                self.write_measure_delay_stmt(stage, gate_input_path, drvr_path)?;
            }
            self.write_measure_slew_stmt(stage, drvr_path)?;
            // gate output | input port -> load
            self.write_measure_delay_stmt(stage, drvr_path, load_path)?;
            if stage == self.stages.last() {
                self.write_measure_slew_stmt(stage, load_path)?;
            }
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Delay between the transition-appropriate input thresholds of two pins,
    /// measured on the last crossing in the simulated window.
    fn write_measure_delay_stmt(
        &mut self,
        stage: usize,
        from_path: &PathPoint,
        to_path: &PathPoint,
    ) -> Result<()> {
        let library = &self.design.library;
        let from_tr = from_path.transition();
        let from_threshold = self.power_voltage * library.input_threshold(from_tr);
        let to_tr = to_path.transition();
        let to_threshold = self.power_voltage * library.input_threshold(to_tr);
        let stage_name = self.stages.name(stage);
        writeln!(
            self.out,
            ".measure tran {}_{}_delay_{}",
            stage_name,
            self.design.network.path_name(from_path.pin()),
            self.design.network.path_name(to_path.pin())
        )?;
        writeln!(
            self.out,
            "+trig v({}) val={:.3} {}=last",
            self.design.network.path_name(from_path.pin()),
            from_threshold,
            spice_trans(from_tr)
        )?;
        writeln!(
            self.out,
            "+targ v({}) val={:.3} {}=last",
            self.design.network.path_name(to_path.pin()),
            to_threshold,
            spice_trans(to_tr)
        )?;
        Ok(())
    }

    /// Slew between the library's lower and upper thresholds, in transition
    /// direction.
    fn write_measure_slew_stmt(&mut self, stage: usize, path: &PathPoint) -> Result<()> {
        let library = &self.design.library;
        let tr = path.transition();
        let lower = self.power_voltage * library.slew_lower_threshold(tr);
        let upper = self.power_voltage * library.slew_upper_threshold(tr);
        let (threshold1, threshold2) = match tr {
            RiseFall::Rise => (lower, upper),
            RiseFall::Fall => (upper, lower),
        };
        let stage_name = self.stages.name(stage);
        writeln!(
            self.out,
            ".measure tran {}_{}_slew",
            stage_name,
            self.design.network.path_name(path.pin())
        )?;
        writeln!(
            self.out,
            "+trig v({}) val={:.3} {}=last",
            self.design.network.path_name(path.pin()),
            threshold1,
            spice_trans(tr)
        )?;
        writeln!(
            self.out,
            "+targ v({}) val={:.3} {}=last",
            self.design.network.path_name(path.pin()),
            threshold2,
            spice_trans(tr)
        )?;
        Ok(())
    }

    fn write_input_source(&mut self) -> Result<()> {
        self.write_banner("Input source")?;
        if self.input_clock().is_some() {
            self.write_clk_waveform()?;
        } else {
            self.write_input_waveform()?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn write_input_waveform(&mut self) -> Result<()> {
        let input_stage = self.stages.first();
        let input_path = self.stages.drvr_path(input_stage);
        let tr = input_path.transition();
        let next_arc = self.stages.gate_arc(input_stage + 1);
        let slew0 = self.find_slew_with(input_path, tr, next_arc);
        // Arbitrary offset.
        let time0 = slew0;
        let mut volt_index = 1;
        self.write_step_volt_source(input_path.pin(), tr, slew0, time0, &mut volt_index)
    }

    /// A single-edge PWL source: off rail, one edge crossing the input
    /// threshold at `time`, on rail until the end of the simulation.
    fn write_step_volt_source(
        &mut self,
        pin: PinId,
        tr: RiseFall,
        slew: f64,
        time: f64,
        volt_index: &mut usize,
    ) -> Result<()> {
        let (volt0, volt1) = match tr {
            RiseFall::Rise => (self.gnd_voltage, self.power_voltage),
            RiseFall::Fall => (self.power_voltage, self.gnd_voltage),
        };
        let mut wav = Waveform::with_initial_value(volt0);
        wav.push_edge(self.edge_params(tr, time, slew));
        wav.push(self.max_time(), volt1);
        wav.write_pwl(&mut self.out, *volt_index, self.design.network.path_name(pin))?;
        *volt_index += 1;
        Ok(())
    }

    /// The clock stimulus: a square wave of [`CLK_CYCLE_COUNT`] cycles offset
    /// by a tenth of the period. Rising-edge launches start low, falling-edge
    /// launches start high.
    fn write_clk_waveform(&mut self) -> Result<()> {
        let input_stage = self.stages.first();
        let input_path = self.stages.drvr_path(input_stage);
        let next_arc = self.stages.gate_arc(input_stage + 1);
        let Some(clock) = self.input_clock() else {
            return Ok(());
        };
        let period = clock.period;
        let time_offset = clk_waveform_time_offset(clock);
        let edge_time = input_path.clk_edge_time().unwrap_or(0.0);
        let (tr0, volt0) = if edge_time < period {
            (RiseFall::Rise, self.gnd_voltage)
        } else {
            (RiseFall::Fall, self.power_voltage)
        };
        let tr1 = tr0.opposite();
        let slew0 = self.find_slew_with(input_path, tr0, next_arc);
        let slew1 = self.find_slew_with(input_path, tr1, next_arc);

        let mut wav = Waveform::with_initial_value(volt0);
        for cycle in 0..CLK_CYCLE_COUNT {
            let time0 = time_offset + cycle as f64 * period;
            let time1 = time0 + period / 2.0;
            wav.push_edge(self.edge_params(tr0, time0, slew0));
            wav.push_edge(self.edge_params(tr1, time1, slew1));
        }
        wav.push(self.max_time(), volt0);
        wav.write_pwl(
            &mut self.out,
            1,
            self.design.network.path_name(input_path.pin()),
        )?;
        Ok(())
    }

    fn edge_params(&self, tr: RiseFall, time: f64, slew: f64) -> EdgeParams {
        let library = &self.design.library;
        EdgeParams {
            tr,
            time,
            slew,
            threshold: library.input_threshold(tr),
            slew_lower: library.slew_lower_threshold(tr),
            slew_upper: library.slew_upper_threshold(tr),
            gnd_voltage: self.gnd_voltage,
            power_voltage: self.power_voltage,
        }
    }

    fn write_stage_subckts(&mut self) -> Result<()> {
        self.write_banner("Stage subckts")?;
        for stage in self.stages.indices() {
            if stage == self.stages.first() {
                self.write_input_stage(stage)?;
            } else {
                self.write_gate_stage(stage)?;
            }
        }
        Ok(())
    }

    /// Input port to first gate input: just the driven net's parasitics.
    /// External drivers are not modeled.
    fn write_input_stage(&mut self, stage: usize) -> Result<()> {
        writeln!(
            self.out,
            ".subckt {} {} {}",
            self.stages.name(stage),
            self.stages.drvr_pin_name(stage),
            self.stages.load_pin_name(stage)
        )?;
        self.write_stage_parasitics(stage)?;
        writeln!(self.out, ".ends")?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Gate stage: the path cell instance with its supplies and sensitized
    /// side inputs, any side receivers on the driven net, then the net's
    /// parasitics.
    fn write_gate_stage(&mut self, stage: usize) -> Result<()> {
        let Some(input_pin) = self.stages.gate_input_pin(stage) else {
            unreachable!("no gate input for stage {stage}");
        };
        let drvr_pin = self.stages.drvr_pin(stage);
        let load_pin = self.stages.load_pin(stage);
        writeln!(
            self.out,
            ".subckt {} {} {} {}",
            self.stages.name(stage),
            self.design.network.path_name(input_pin),
            self.stages.drvr_pin_name(stage),
            self.stages.load_pin_name(stage)
        )?;
        if let (Some(inst), Some(input_port), Some(drvr_port)) = (
            self.stages.instance(stage),
            self.stages.gate_input_port(stage),
            self.stages.drvr_port(stage),
        ) {
            writeln!(
                self.out,
                "* Gate {} {} -> {}",
                self.design.network.instance_name(inst),
                input_port.name(),
                drvr_port.name()
            )?;
        }
        self.write_subckt_inst(input_pin)?;
        let sens = sensitize::stage_port_values(self.design, &self.stages, stage);
        let mut volt_index = 1;
        self.write_subckt_inst_volt_srcs(
            stage,
            input_pin,
            &mut volt_index,
            &sens.port_values,
            sens.clock.as_ref(),
            sens.dcalc_ap,
        )?;
        writeln!(self.out)?;

        let empty_values = PortValueMap::new();
        let connected: Vec<PinId> = self.design.network.connected_pins(drvr_pin).collect();
        for pin in connected {
            if pin != drvr_pin
                && pin != load_pin
                && self.design.network.direction(pin).is_any_input()
                && !self.design.network.is_hierarchical(pin)
                && !self.design.network.is_top_level_port(pin)
            {
                writeln!(
                    self.out,
                    "* Side load {}",
                    self.design.network.path_name(pin)
                )?;
                self.write_subckt_inst(pin)?;
                self.write_subckt_inst_volt_srcs(
                    stage,
                    pin,
                    &mut volt_index,
                    &empty_values,
                    None,
                    0,
                )?;
                writeln!(self.out)?;
            }
        }

        self.write_stage_parasitics(stage)?;
        writeln!(self.out, ".ends")?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Instantiate the cell subcircuit attached to `input_pin`, connecting
    /// recorded ports positionally: the matching instance pin when one
    /// exists, else `<inst>/<port>` for supply ports.
    fn write_subckt_inst(&mut self, input_pin: PinId) -> Result<()> {
        let Some(inst) = self.design.network.instance(input_pin) else {
            return Ok(());
        };
        let inst_name = self.design.network.instance_name(inst).to_string();
        let Some(cell_name) = self
            .design
            .network
            .instance_cell_name(inst)
            .map(str::to_string)
        else {
            return Ok(());
        };
        let ports = self.recorded_ports(&cell_name)?;
        write!(self.out, "x{inst_name}")?;
        for port_name in &ports {
            if let Some(pin) = self.design.network.find_pin(inst, port_name) {
                write!(self.out, " {}", self.design.network.path_name(pin))?;
            } else {
                let is_pg = self
                    .design
                    .liberty_cell(inst)
                    .and_then(|cell| cell.find_pg_port(port_name))
                    .is_some();
                if is_pg
                    || port_name == &self.params.power_name
                    || port_name == &self.params.gnd_name
                {
                    write!(self.out, " {inst_name}/{port_name}")?;
                }
            }
        }
        writeln!(self.out, " {cell_name}")?;
        Ok(())
    }

    /// Supply and side-input sources for one cell instance: every recorded
    /// subckt port gets either its PG voltage, the configured rail, or (for
    /// non-path liberty inputs) a sensitizing DC level or clocked edge.
    fn write_subckt_inst_volt_srcs(
        &mut self,
        stage: usize,
        input_pin: PinId,
        volt_index: &mut usize,
        port_values: &PortValueMap,
        clk: Option<&Clock>,
        dcalc_ap: usize,
    ) -> Result<()> {
        let Some(inst) = self.design.network.instance(input_pin) else {
            return Ok(());
        };
        let inst_name = self.design.network.instance_name(inst).to_string();
        let Some(cell_name) = self
            .design
            .network
            .instance_cell_name(inst)
            .map(str::to_string)
        else {
            return Ok(());
        };
        let ports = self.recorded_ports(&cell_name)?;
        let input_port_name = self.design.network.port_name(input_pin).to_string();
        let drvr_port_name = self
            .design
            .network
            .port_name(self.stages.drvr_pin(stage))
            .to_string();

        enum PortKind {
            Supply(f64),
            Input {
                pin: Option<PinId>,
                related_power: Option<String>,
                related_ground: Option<String>,
            },
            Skip,
        }

        debug!("subckt {cell_name}");
        for port_name in &ports {
            let kind = {
                let Some(cell) = self.design.liberty_cell(inst) else {
                    return Ok(());
                };
                if let Some(pg_port) = cell.find_pg_port(port_name) {
                    debug!(" port {port_name} pwr/gnd");
                    PortKind::Supply(self.pg_port_voltage(&cell_name, pg_port)?)
                } else if port_name == &self.params.power_name {
                    PortKind::Supply(self.power_voltage)
                } else if port_name == &self.params.gnd_name {
                    PortKind::Supply(self.gnd_voltage)
                } else if port_name != &input_port_name && port_name != &drvr_port_name {
                    // Input voltage to sensitize the path from gate input to
                    // output.
                    match cell.find_liberty_port(port_name) {
                        Some(port) if port.direction().is_any_input() => PortKind::Input {
                            pin: self.design.network.find_pin(inst, port_name),
                            related_power: port.related_power_pin_name().map(str::to_string),
                            related_ground: port.related_ground_pin_name().map(str::to_string),
                        },
                        _ => PortKind::Skip,
                    }
                } else {
                    PortKind::Skip
                }
            };
            match kind {
                PortKind::Supply(voltage) => {
                    self.write_voltage_source(&inst_name, port_name, voltage, volt_index)?;
                }
                PortKind::Input {
                    pin,
                    related_power,
                    related_ground,
                } => {
                    // Tie high/low and propagated constants win over the
                    // sensitizer's choices.
                    let mut value = pin
                        .map(|pin| self.design.sim.logic_value(pin))
                        .unwrap_or(LogicValue::Unknown);
                    if value == LogicValue::Unknown {
                        if let Some(&chosen) = port_values.get(port_name.as_str()) {
                            value = chosen;
                        }
                    }
                    match value {
                        LogicValue::Zero | LogicValue::Unknown => {
                            let voltage = self.related_pg_voltage(
                                inst,
                                &cell_name,
                                related_ground.as_deref(),
                                self.gnd_voltage,
                            )?;
                            self.write_voltage_source(&inst_name, port_name, voltage, volt_index)?;
                        }
                        LogicValue::One => {
                            let voltage = self.related_pg_voltage(
                                inst,
                                &cell_name,
                                related_power.as_deref(),
                                self.power_voltage,
                            )?;
                            self.write_voltage_source(&inst_name, port_name, voltage, volt_index)?;
                        }
                        LogicValue::Rise => {
                            self.write_clked_step_source(
                                pin,
                                RiseFall::Rise,
                                clk,
                                dcalc_ap,
                                volt_index,
                            )?;
                        }
                        LogicValue::Fall => {
                            self.write_clked_step_source(
                                pin,
                                RiseFall::Fall,
                                clk,
                                dcalc_ap,
                                volt_index,
                            )?;
                        }
                    }
                }
                PortKind::Skip => {}
            }
        }
        Ok(())
    }

    /// PWL voltage source that switches midway through the first clock cycle.
    fn write_clked_step_source(
        &mut self,
        pin: Option<PinId>,
        tr: RiseFall,
        clk: Option<&Clock>,
        dcalc_ap: usize,
        volt_index: &mut usize,
    ) -> Result<()> {
        let (Some(pin), Some(clk)) = (pin, clk) else {
            warn!("clocked side input has no clock; leaving it unsourced");
            return Ok(());
        };
        let slew = match self.design.graph.pin_load_vertex(pin) {
            Some(vertex) => self.find_slew_vertex(vertex, tr, None, dcalc_ap),
            None => self.design.library.time_unit(),
        };
        let time = clk_waveform_time_offset(clk) + clk.period / 2.0;
        self.write_step_volt_source(pin, tr, slew, time, volt_index)
    }

    fn write_voltage_source(
        &mut self,
        inst_name: &str,
        port_name: &str,
        voltage: f64,
        volt_index: &mut usize,
    ) -> Result<()> {
        writeln!(
            self.out,
            "v{} {}/{} 0 {:.3}",
            volt_index, inst_name, port_name, voltage
        )?;
        *volt_index += 1;
        Ok(())
    }

    /// Port order captured from the cell's `.subckt` header. The harvest is
    /// fatal for unknown cells, so a miss here means the snapshot changed
    /// under us and is reported the same way.
    fn recorded_ports(&self, cell_name: &str) -> Result<Vec<String>> {
        self.port_orders
            .get(cell_name)
            .map(<[String]>::to_vec)
            .ok_or_else(|| PathSpiceError::MissingSubckts {
                path: self.params.lib_subckt_path.clone(),
                cells: vec![cell_name.to_string()],
            })
    }

    /// Voltage for a liberty `related_power_pin`/`related_ground_pin`
    /// reference; falls back to the configured rail when no pin is declared.
    fn related_pg_voltage(
        &self,
        inst: InstId,
        cell_name: &str,
        pg_port_name: Option<&str>,
        default_voltage: f64,
    ) -> Result<f64> {
        match pg_port_name {
            Some(name) => {
                let pg_port = self
                    .design
                    .liberty_cell(inst)
                    .and_then(|cell| cell.find_pg_port(name));
                match pg_port {
                    Some(pg_port) => self.pg_port_voltage(cell_name, pg_port),
                    None => Err(PathSpiceError::PgPortMissing {
                        cell: cell_name.to_string(),
                        port: name.to_string(),
                    }),
                }
            }
            None => Ok(default_voltage),
        }
    }

    /// Resolve a PG port's voltage: the library supply table first, then the
    /// configured power/ground names.
    fn pg_port_voltage(&self, cell_name: &str, pg_port: &LibertyPgPort) -> Result<f64> {
        match pg_port.voltage_name() {
            Some(voltage_name) => {
                if let Some(voltage) = self.design.library.supply_voltage(voltage_name) {
                    Ok(voltage)
                } else if voltage_name == self.params.power_name {
                    Ok(self.power_voltage)
                } else if voltage_name == self.params.gnd_name {
                    Ok(self.gnd_voltage)
                } else {
                    Err(PathSpiceError::PgVoltageUnresolved {
                        cell: cell_name.to_string(),
                        port: pg_port.name().to_string(),
                        voltage_name: voltage_name.to_string(),
                    })
                }
            }
            None => Err(PathSpiceError::PgVoltageNameMissing {
                cell: cell_name.to_string(),
                port: pg_port.name().to_string(),
            }),
        }
    }

    /// The driver net's RC network in canonical form: devices sorted by
    /// endpoint names, then patch resistors for loads the resistor graph
    /// missed, then node ground caps sorted by node name.
    fn write_stage_parasitics(&mut self, stage: usize) -> Result<()> {
        let drvr_path = self.stages.drvr_path(stage);
        let drvr_pin = drvr_path.pin();
        let parasitic_ap = drvr_path.dcalc_ap_index();
        let mut reachable_pins: HashSet<PinId> = HashSet::new();
        let mut res_index = 1;
        let mut cap_index = 1;

        let has_parasitic = self
            .design
            .parasitics
            .find_parasitic_network(drvr_pin, parasitic_ap)
            .is_some();
        if has_parasitic {
            let net_name = match self.design.network.net(drvr_pin) {
                Some(net) => self.design.network.net_name(net).to_string(),
                None => self.design.network.path_name(drvr_pin).to_string(),
            };
            self.node_namer.reset(&net_name);
            writeln!(self.out, "* Net {net_name}")?;

            if let Some(parasitic) = self
                .design
                .parasitics
                .find_parasitic_network(drvr_pin, parasitic_ap)
            {
                // Sort devices for consistent regression results.
                let devices: Vec<_> = parasitic
                    .devices()
                    .sorted_by(|&d1, &d2| {
                        let key1 = (
                            parasitic.node_name(parasitic.node1(d1)),
                            parasitic.node_name(parasitic.node2(d1)),
                        );
                        let key2 = (
                            parasitic.node_name(parasitic.node1(d2)),
                            parasitic.node_name(parasitic.node2(d2)),
                        );
                        key1.cmp(&key2)
                    })
                    .collect();
                for device in devices {
                    let value = parasitic.value(device, parasitic_ap);
                    if parasitic.is_resistor(device) {
                        let node1 = parasitic.node1(device);
                        let node2 = parasitic.node2(device);
                        let name1 = self.node_namer.name(parasitic, node1);
                        let name2 = self.node_namer.name(parasitic, node2);
                        writeln!(self.out, "R{} {} {} {:.3e}", res_index, name1, name2, value)?;
                        res_index += 1;
                        reachable_pins.extend(parasitic.connection_pin(node1));
                        reachable_pins.extend(parasitic.connection_pin(node2));
                    } else if parasitic.is_coupling_cap(device) {
                        // Ground coupling caps for now.
                        let name1 = self.node_namer.name(parasitic, parasitic.node1(device));
                        writeln!(self.out, "C{} {} 0 {:.3e}", cap_index, name1, value)?;
                        cap_index += 1;
                    }
                }
            }
        } else {
            warn!(
                "no parasitics for net driven by {}; shorting driver to loads",
                self.design.network.path_name(drvr_pin)
            );
            writeln!(self.out, "* No parasitics found for this net.")?;
        }

        // Add resistors from drvr to load for missing parasitic connections.
        let connected: Vec<PinId> = self.design.network.connected_pins(drvr_pin).collect();
        for pin in connected {
            if pin != drvr_pin
                && self.design.network.is_load(pin)
                && !self.design.network.is_hierarchical(pin)
                && !reachable_pins.contains(&pin)
            {
                writeln!(
                    self.out,
                    "R{} {} {} {:.3e}",
                    res_index,
                    self.design.network.path_name(drvr_pin),
                    self.design.network.path_name(pin),
                    SHORT_CKT_RESISTANCE
                )?;
                res_index += 1;
            }
        }

        if let Some(parasitic) = self
            .design
            .parasitics
            .find_parasitic_network(drvr_pin, parasitic_ap)
        {
            // Sort node capacitors for consistent regression results.
            let nodes: Vec<_> = parasitic
                .nodes()
                .sorted_by(|&n1, &n2| parasitic.node_name(n1).cmp(parasitic.node_name(n2)))
                .collect();
            for node in nodes {
                let cap = parasitic.node_gnd_cap(node, parasitic_ap);
                // Simulators refuse zero-valued caps.
                if cap > 0.0 {
                    let name = self.node_namer.name(parasitic, node);
                    writeln!(self.out, "C{} {} 0 {:.3e}", cap_index, name, cap)?;
                    cap_index += 1;
                }
            }
        }
        Ok(())
    }
}
