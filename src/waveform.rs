//! Piecewise-linear waveform construction for deck voltage sources.

use std::io::Write;

use crate::transition::RiseFall;

/// A PWL waveform as a list of `(t, v)` breakpoints with strictly
/// increasing times.
#[derive(Debug, Clone, Default)]
pub struct Waveform {
    values: Vec<(f64, f64)>,
}

impl Waveform {
    #[inline]
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn with_initial_value(v: f64) -> Self {
        Self {
            values: vec![(0f64, v)],
        }
    }

    pub fn push(&mut self, t: f64, v: f64) {
        if let Some(tp) = self.last_t() {
            assert!(t > tp, "pwl breakpoints must have increasing times");
        }
        self.values.push((t, v));
    }

    /// Push the two breakpoints of a linear edge crossing the input
    /// threshold at `time`; see [`edge_breakpoints`].
    pub fn push_edge(&mut self, edge: EdgeParams) {
        let ((t0, v0), (t1, v1)) = edge_breakpoints(edge);
        self.push(t0, v0);
        self.push(t1, v1);
    }

    pub fn last_t(&self) -> Option<f64> {
        self.values.last().map(|v| v.0)
    }

    pub fn values(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }

    /// Write the waveform as `v<index> <node> 0 pwl(...)` continuation lines.
    pub fn write_pwl<W: Write>(
        &self,
        out: &mut W,
        index: usize,
        node: &str,
    ) -> std::io::Result<()> {
        writeln!(out, "v{} {} 0 pwl(", index, node)?;
        for (t, v) in self.values() {
            writeln!(out, "+{:.3e} {:.3e}", t, v)?;
        }
        writeln!(out, "+)")?;
        Ok(())
    }
}

/// One rising or falling edge of a PWL source, placed so that the waveform
/// crosses `rail * threshold` at `time` when it spends `slew` seconds between
/// the lower and upper slew thresholds.
#[derive(Debug, Copy, Clone)]
pub struct EdgeParams {
    pub tr: RiseFall,
    /// Threshold crossing time.
    pub time: f64,
    /// Transition time between the slew thresholds.
    pub slew: f64,
    /// Input threshold as a fraction of the rail swing.
    pub threshold: f64,
    /// Lower and upper slew thresholds as fractions of the rail swing.
    pub slew_lower: f64,
    pub slew_upper: f64,
    /// Ground and power rail voltages.
    pub gnd_voltage: f64,
    pub power_voltage: f64,
}

/// Breakpoints of a full-swing linear edge: the edge takes
/// `dt = slew / (slew_upper - slew_lower)` to cross the whole swing and is
/// shifted so the input threshold is crossed at `time`.
pub fn edge_breakpoints(edge: EdgeParams) -> ((f64, f64), (f64, f64)) {
    let (v0, v1) = match edge.tr {
        RiseFall::Rise => (edge.gnd_voltage, edge.power_voltage),
        RiseFall::Fall => (edge.power_voltage, edge.gnd_voltage),
    };
    let dt = edge.slew / (edge.slew_upper - edge.slew_lower);
    let t0 = edge.time - dt * edge.threshold;
    let t1 = t0 + dt;
    ((t0, v0), (t1, v1))
}
