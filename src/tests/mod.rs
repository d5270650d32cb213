//! Scenario tests: build small design snapshots in memory, run the generator,
//! and assert on the emitted deck and subcircuit text.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::design::Design;
use crate::func::FuncExpr;
use crate::liberty::{
    LibertyCell, LibertyLibrary, LibertyPgPort, LibertyPort, OperatingConditions, PgType,
    PortDirection,
};
use crate::path::PathExpanded;
use crate::write_spice::{write_path_spice, SpicePathParams};
use crate::Result;

mod comb_deck;

pub(crate) const VDD: f64 = 1.8;

pub(crate) fn test_operating_conditions() -> OperatingConditions {
    OperatingConditions {
        name: "tt_025C_1v80".to_string(),
        voltage: VDD,
        temperature: 25.0,
    }
}

pub(crate) fn test_library() -> LibertyLibrary {
    LibertyLibrary::new("testlib", test_operating_conditions())
        .time_unit_scale(1e-9)
        .supply_voltage_entry("VDD", VDD)
        .supply_voltage_entry("VSS", 0.0)
}

pub(crate) fn pg_ports(cell: LibertyCell) -> LibertyCell {
    cell.pg_port(LibertyPgPort::new(
        "VDD",
        PgType::Power,
        Some("VDD".to_string()),
    ))
    .pg_port(LibertyPgPort::new(
        "VSS",
        PgType::Ground,
        Some("VSS".to_string()),
    ))
}

pub(crate) fn inv_cell() -> LibertyCell {
    pg_ports(
        LibertyCell::new("INV")
            .port(LibertyPort::new("A", PortDirection::Input))
            .port(
                LibertyPort::new("Y", PortDirection::Output)
                    .function(FuncExpr::not(FuncExpr::port("A"))),
            ),
    )
}

pub(crate) fn nand2_cell() -> LibertyCell {
    pg_ports(
        LibertyCell::new("NAND2")
            .port(LibertyPort::new("A", PortDirection::Input))
            .port(LibertyPort::new("B", PortDirection::Input))
            .port(
                LibertyPort::new("Y", PortDirection::Output).function(FuncExpr::not(
                    FuncExpr::and(FuncExpr::port("A"), FuncExpr::port("B")),
                )),
            ),
    )
}

pub(crate) fn nor2_cell() -> LibertyCell {
    pg_ports(
        LibertyCell::new("NOR2")
            .port(LibertyPort::new("A", PortDirection::Input))
            .port(LibertyPort::new("B", PortDirection::Input))
            .port(
                LibertyPort::new("Y", PortDirection::Output).function(FuncExpr::not(
                    FuncExpr::or(FuncExpr::port("A"), FuncExpr::port("B")),
                )),
            ),
    )
}

/// Test scaffolding around one invocation: scratch dir, file paths, and the
/// vendor subcircuit library content.
pub(crate) struct TestBench {
    /// Holds the scratch directory alive for the bench's lifetime.
    _dir: TempDir,
    pub params: SpicePathParams,
}

impl TestBench {
    pub fn new(vendor_subckts: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let lib_subckt_path = dir.path().join("cells.spice");
        fs::write(&lib_subckt_path, vendor_subckts).expect("write vendor subckts");
        let params = SpicePathParams {
            deck_path: dir.path().join("path.sp"),
            subckt_path: dir.path().join("subckts.sp"),
            lib_subckt_path,
            model_path: PathBuf::from("/pdk/models/sky130.spice"),
            power_name: "VDD".to_string(),
            gnd_name: "VSS".to_string(),
        };
        Self { _dir: dir, params }
    }

    pub fn run(&self, design: &Design, path: &PathExpanded) -> Result<(String, String)> {
        write_path_spice(design, path, &self.params)?;
        let deck = fs::read_to_string(&self.params.deck_path).expect("read deck");
        let subckts = fs::read_to_string(&self.params.subckt_path).expect("read subckts");
        Ok((deck, subckts))
    }
}

/// The `v(<pin>)` operands of every `+trig`/`+targ` line in the deck.
pub(crate) fn measured_pins(deck: &str) -> Vec<String> {
    deck.lines()
        .filter(|line| line.starts_with("+trig") || line.starts_with("+targ"))
        .filter_map(|line| {
            let start = line.find("v(")? + 2;
            let end = line[start..].find(')')? + start;
            Some(line[start..end].to_string())
        })
        .collect()
}

/// Second operand of the `.tran` line.
pub(crate) fn tran_stop(deck: &str) -> f64 {
    let line = deck
        .lines()
        .find(|line| line.starts_with(".tran"))
        .expect("deck has a .tran line");
    let mut fields = line.split_whitespace();
    fields.next();
    fields.next();
    fields
        .next()
        .expect(".tran has a stop time")
        .parse()
        .expect("stop time parses")
}
