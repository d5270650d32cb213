//! Subcircuit harvesting: stream the vendor subcircuit library, copy the
//! `.subckt` blocks for the cells a path touches into a fresh file, and
//! record every definition's port order for later instantiation.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use indexmap::IndexMap;
use log::debug;

use crate::error::{PathSpiceError, Result};
use crate::liberty::LibertyLibrary;
use crate::write_spice::SpicePathParams;

/// Port-name lists captured from `.subckt` headers, in vendor-file order.
#[derive(Debug, Clone, Default)]
pub struct CellPortOrders {
    orders: IndexMap<String, Vec<String>>,
}

impl CellPortOrders {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, cell: impl Into<String>, ports: Vec<String>) {
        self.orders.insert(cell.into(), ports);
    }

    #[inline]
    pub fn get(&self, cell: &str) -> Option<&[String]> {
        self.orders.get(cell).map(|ports| ports.as_slice())
    }
}

/// Copy the `.subckt` definitions of `needed_cells` from the vendor library
/// into the subcircuit output file, capturing port orders for every header
/// encountered along the way.
///
/// Fails if the vendor file cannot be read, the output cannot be written, a
/// copied block has no `.ends`, a recorded port maps to nothing in liberty,
/// or any needed cell is missing at end of file.
pub fn copy_subckts(
    library: &LibertyLibrary,
    params: &SpicePathParams,
    needed_cells: &BTreeSet<String>,
) -> Result<CellPortOrders> {
    let lib_file =
        File::open(&params.lib_subckt_path).map_err(|source| PathSpiceError::FileNotReadable {
            path: params.lib_subckt_path.clone(),
            source,
        })?;
    let out_file =
        File::create(&params.subckt_path).map_err(|source| PathSpiceError::FileNotWritable {
            path: params.subckt_path.clone(),
            source,
        })?;
    let mut reader = BufReader::new(lib_file);
    let mut out = BufWriter::new(out_file);

    let mut port_orders = CellPortOrders::new();
    let mut remaining = needed_cells.clone();

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim_end_matches(|c| c == '\n' || c == '\r');
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() >= 2 && tokens[0].eq_ignore_ascii_case(".subckt") {
            let cell = tokens[1].to_string();
            if remaining.contains(&cell) {
                debug!("harvesting subckt {cell}");
                writeln!(out, "{text}")?;
                copy_subckt_body(&mut reader, &mut out, &cell, params)?;
                remaining.remove(&cell);
            }
            record_port_order(library, params, &mut port_orders, &cell, &tokens[2..])?;
        }
    }
    out.flush()?;

    if !remaining.is_empty() {
        return Err(PathSpiceError::MissingSubckts {
            path: params.lib_subckt_path.clone(),
            cells: remaining.into_iter().collect(),
        });
    }
    Ok(port_orders)
}

/// Echo lines until the matching `.ends`, then a separating blank line.
fn copy_subckt_body<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
    cell: &str,
    params: &SpicePathParams,
) -> Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PathSpiceError::SubcktEndsMissing {
                cell: cell.to_string(),
                path: params.lib_subckt_path.clone(),
            });
        }
        let text = line.trim_end_matches(|c| c == '\n' || c == '\r');
        writeln!(out, "{text}")?;
        if text
            .get(..5)
            .map(|head| head.eq_ignore_ascii_case(".ends"))
            .unwrap_or(false)
        {
            writeln!(out)?;
            return Ok(());
        }
    }
}

/// Record a header's port list, checking each port against the cell's liberty
/// ports, PG pins, and the configured supply net names. Headers for cells the
/// liberty model does not know are ignored.
fn record_port_order(
    library: &LibertyLibrary,
    params: &SpicePathParams,
    port_orders: &mut CellPortOrders,
    cell_name: &str,
    port_tokens: &[&str],
) -> Result<()> {
    let Some(cell) = library.find_cell(cell_name) else {
        return Ok(());
    };
    let mut ports = Vec::with_capacity(port_tokens.len());
    for &port in port_tokens {
        if cell.find_liberty_port(port).is_none()
            && cell.find_pg_port(port).is_none()
            && port != params.power_name
            && port != params.gnd_name
        {
            return Err(PathSpiceError::SubcktPortUnmapped {
                cell: cell_name.to_string(),
                port: port.to_string(),
            });
        }
        ports.push(port.to_string());
    }
    port_orders.record(cell_name, ports);
    Ok(())
}
