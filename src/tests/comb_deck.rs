//! Combinational path scenarios: an INV -> NAND2 chain with a side receiver
//! and wire parasitics, plus NOR2 sensitization and propagated constants.

use approx::assert_abs_diff_eq;

use super::*;
use crate::graph::{Graph, TimingRole, VertexId};
use crate::network::Network;
use crate::parasitics::{ParasiticNetwork, Parasitics};
use crate::path::{PathExpanded, PathPoint};
use crate::sim::LogicSim;
use crate::transition::{LogicValue, RiseFall};

const CHAIN_VENDOR: &str = "\
* test cells
.subckt BUF A X VDD VSS
mp0 X A VDD VDD pmos
.ends

.subckt INV A Y VDD VSS
mp0 Y A VDD VDD pmos w=1.0u l=0.15u
mn0 Y A VSS VSS nmos w=0.65u l=0.15u
.ends

.subckt NAND2 A B Y VDD VSS
mp0 Y A VDD VDD pmos
mp1 Y B VDD VDD pmos
mn0 Y A net1 VSS nmos
mn1 net1 B VSS VSS nmos
.ends
";

/// in1 -> u1 (INV) -> u2 (NAND2) -> out1, with a second INV (u3) listening on
/// u1's output net and an RC network extracted for that net.
fn chain_design() -> (Design, PathExpanded) {
    let library = test_library().cell(inv_cell()).cell(nand2_cell());

    let mut network = Network::new();
    let n_in = network.add_net("n_in");
    let n1 = network.add_net("n1");
    let n_b = network.add_net("n_b");
    let n_out = network.add_net("n_out");
    let n3 = network.add_net("n3");

    let in1 = network.add_port("in1", PortDirection::Input, Some(n_in));
    let _in2 = network.add_port("in2", PortDirection::Input, Some(n_b));
    let u1 = network.add_instance("u1", "INV");
    let u1_a = network.add_pin(u1, "A", PortDirection::Input, Some(n_in));
    let u1_y = network.add_pin(u1, "Y", PortDirection::Output, Some(n1));
    let u2 = network.add_instance("u2", "NAND2");
    let u2_a = network.add_pin(u2, "A", PortDirection::Input, Some(n1));
    let _u2_b = network.add_pin(u2, "B", PortDirection::Input, Some(n_b));
    let u2_y = network.add_pin(u2, "Y", PortDirection::Output, Some(n_out));
    let u3 = network.add_instance("u3", "INV");
    let _u3_a = network.add_pin(u3, "A", PortDirection::Input, Some(n1));
    let _u3_y = network.add_pin(u3, "Y", PortDirection::Output, Some(n3));
    let out1 = network.add_port("out1", PortDirection::Output, Some(n_out));
    // A hierarchical boundary pin on the same net: never instantiated as a
    // side load and never patched.
    let _blk = network.add_hierarchical_pin("blk/p", PortDirection::Input, Some(n1));

    let mut graph = Graph::new();
    let points = [
        (in1, RiseFall::Rise, 0.0, 2e-11),
        (u1_a, RiseFall::Rise, 5e-12, 2.5e-11),
        (u1_y, RiseFall::Fall, 5.5e-11, 4e-11),
        (u2_a, RiseFall::Fall, 6.5e-11, 4.5e-11),
        (u2_y, RiseFall::Rise, 1.2e-10, 5e-11),
        (out1, RiseFall::Rise, 1.3e-10, 3e-11),
    ];
    let vertices: Vec<VertexId> = points
        .iter()
        .map(|&(_, tr, _, slew)| {
            let vertex = graph.add_vertex();
            graph.set_slew(vertex, tr, 0, slew);
            vertex
        })
        .collect();

    let gate1_edge = graph.add_edge(TimingRole::Combinational);
    let gate1_arc = graph.add_arc(Some("INV".to_string()), Some(gate1_edge), vec![]);
    let gate2_edge = graph.add_edge(TimingRole::Combinational);
    let gate2_arc = graph.add_arc(Some("NAND2".to_string()), Some(gate2_edge), vec![]);
    let wire_edge = graph.add_edge(TimingRole::Wire);
    let wire0_arc = graph.add_arc(None, Some(wire_edge), vec![]);
    let wire1_arc = graph.add_arc(None, Some(wire_edge), vec![]);
    let wire2_arc = graph.add_arc(None, Some(wire_edge), vec![]);
    let prev_arcs = [
        None,
        Some(wire0_arc),
        Some(gate1_arc),
        Some(wire1_arc),
        Some(gate2_arc),
        Some(wire2_arc),
    ];

    let mut path = PathExpanded::new();
    for (i, &(pin, tr, arrival, _)) in points.iter().enumerate() {
        path.push(PathPoint::new(pin, tr, arrival, vertices[i]), prev_arcs[i]);
    }

    let mut parasitics = Parasitics::new();
    let mut rc = ParasiticNetwork::new();
    let node_u1y = rc.add_node("u1/Y", Some(u1_y), 1e-15);
    let node_int = rc.add_node("3", None, 2e-15);
    let node_u2a = rc.add_node("u2/A", Some(u2_a), 5e-16);
    rc.add_resistor(node_u1y, node_int, 10.0);
    rc.add_resistor(node_int, node_u2a, 20.0);
    parasitics.insert(u1_y, 0, rc);

    let design = Design::new(network, library, graph, parasitics, LogicSim::new());
    (design, path)
}

#[test]
fn chain_deck_header_and_horizon() -> Result<()> {
    let (design, path) = chain_design();
    let bench = TestBench::new(CHAIN_VENDOR);
    let (deck, _) = bench.run(&design, &path)?;

    assert!(deck.starts_with("* Path from in1 ^ to out1 ^\n"));
    assert!(deck.contains("\n.temp 25.0\n"));
    assert!(deck.contains(".include \"/pdk/models/sky130.spice\"\n"));
    assert!(deck.contains(&format!(
        ".include \"{}\"\n",
        bench.params.subckt_path.display()
    )));
    // 1.5 * (input slew + end arrival + 2 * end slew)
    assert!(deck.contains("\n.tran 3.150e-13 3.150e-10\n"));
    assert!(deck.trim_end().ends_with(".end"));

    let stop = tran_stop(&deck);
    let end_arrival = 1.3e-10;
    let end_slew = 3e-11;
    assert!(stop >= end_arrival + 2.0 * end_slew);
    assert_abs_diff_eq!(stop, 3.15e-10, epsilon = 1e-13);
    Ok(())
}

#[test]
fn chain_stage_instances() -> Result<()> {
    let (design, path) = chain_design();
    let bench = TestBench::new(CHAIN_VENDOR);
    let (deck, _) = bench.run(&design, &path)?;

    assert!(deck.contains("\nxstage1 in1 u1/A stage1\n"));
    assert!(deck.contains("\nxstage2 u1/A u1/Y u2/A stage2\n"));
    assert!(deck.contains("\nxstage3 u2/A u2/Y out1 stage3\n"));
    Ok(())
}

#[test]
fn chain_measure_statements() -> Result<()> {
    let (design, path) = chain_design();
    let bench = TestBench::new(CHAIN_VENDOR);
    let (deck, _) = bench.run(&design, &path)?;

    // Input stage: driver slew and wire delay only.
    assert!(deck.contains(".measure tran stage1_in1_slew\n"));
    assert!(deck.contains(".measure tran stage1_in1_delay_u1/A\n"));
    // Gate stages add the gate input slew and the gate delay.
    assert!(deck.contains(".measure tran stage2_u1/A_slew\n"));
    assert!(deck.contains(".measure tran stage2_u1/A_delay_u1/Y\n"));
    assert!(deck.contains(".measure tran stage2_u1/Y_slew\n"));
    assert!(deck.contains(".measure tran stage2_u1/Y_delay_u2/A\n"));
    assert!(deck.contains(".measure tran stage3_u2/A_delay_u2/Y\n"));
    assert!(deck.contains(".measure tran stage3_u2/Y_delay_out1\n"));
    // Only the last stage measures the load slew.
    assert!(deck.contains(".measure tran stage3_out1_slew\n"));
    assert!(!deck.contains("stage1_u1/A_slew"));
    assert!(!deck.contains("stage2_u2/A_slew"));

    // Delay thresholds sit at the input threshold of each edge direction.
    assert!(deck.contains(
        ".measure tran stage2_u1/A_delay_u1/Y\n\
         +trig v(u1/A) val=0.900 RISE=last\n\
         +targ v(u1/Y) val=0.900 FALL=last\n"
    ));
    // Falling slews run upper -> lower.
    assert!(deck.contains(
        ".measure tran stage2_u1/Y_slew\n\
         +trig v(u1/Y) val=1.440 FALL=last\n\
         +targ v(u1/Y) val=0.360 FALL=last\n"
    ));
    // Rising slews run lower -> upper.
    assert!(deck.contains(
        ".measure tran stage1_in1_slew\n\
         +trig v(in1) val=0.360 RISE=last\n\
         +targ v(in1) val=1.440 RISE=last\n"
    ));
    Ok(())
}

#[test]
fn chain_measures_reference_stage_terminals() -> Result<()> {
    let (design, path) = chain_design();
    let bench = TestBench::new(CHAIN_VENDOR);
    let (deck, _) = bench.run(&design, &path)?;

    let terminals: Vec<&str> = deck
        .lines()
        .filter(|line| line.starts_with("xstage"))
        .flat_map(|line| line.split_whitespace().skip(1))
        .collect();
    let pins = measured_pins(&deck);
    assert!(!pins.is_empty());
    for pin in pins {
        assert!(
            terminals.contains(&pin.as_str()),
            "measure references unknown terminal {pin}"
        );
    }
    Ok(())
}

#[test]
fn chain_input_step_source() -> Result<()> {
    let (design, path) = chain_design();
    let bench = TestBench::new(CHAIN_VENDOR);
    let (deck, _) = bench.run(&design, &path)?;

    assert!(deck.contains("v1 in1 0 pwl(\n"));
    // Starts at the off rail at t=0, holds the on rail until the horizon.
    assert!(deck.contains("+0.000e0 0.000e0\n"));
    assert!(deck.contains("+3.150e-10 1.800e0\n"));
    Ok(())
}

#[test]
fn chain_gate_stage_subckts() -> Result<()> {
    let (design, path) = chain_design();
    let bench = TestBench::new(CHAIN_VENDOR);
    let (deck, _) = bench.run(&design, &path)?;

    // Path gate instance with supplies tied per PG port.
    assert!(deck.contains(
        ".subckt stage2 u1/A u1/Y u2/A\n\
         * Gate u1 A -> Y\n\
         xu1 u1/A u1/Y u1/VDD u1/VSS INV\n\
         v1 u1/VDD 0 1.800\n\
         v2 u1/VSS 0 0.000\n"
    ));
    // The side receiver gets its own instance and supplies.
    assert!(deck.contains(
        "* Side load u3/A\n\
         xu3 u3/A u3/Y u3/VDD u3/VSS INV\n\
         v3 u3/VDD 0 1.800\n\
         v4 u3/VSS 0 0.000\n"
    ));
    // NAND2 side input is forced to the power rail ahead of the supplies.
    assert!(deck.contains(
        ".subckt stage3 u2/A u2/Y out1\n\
         * Gate u2 A -> Y\n\
         xu2 u2/A u2/B u2/Y u2/VDD u2/VSS NAND2\n\
         v1 u2/B 0 1.800\n\
         v2 u2/VDD 0 1.800\n\
         v3 u2/VSS 0 0.000\n"
    ));
    Ok(())
}

#[test]
fn chain_parasitic_emission() -> Result<()> {
    let (design, path) = chain_design();
    let bench = TestBench::new(CHAIN_VENDOR);
    let (deck, _) = bench.run(&design, &path)?;

    // Devices sorted by endpoint names; interior node named on first
    // encounter; the unreached side receiver gets a patch resistor; node
    // caps sorted by name.
    assert!(deck.contains(
        "* Net n1\n\
         R1 n1/1 u2/A 2.000e1\n\
         R2 u1/Y n1/1 1.000e1\n\
         R3 u1/Y u3/A 1.000e-4\n\
         C1 n1/1 0 2.000e-15\n\
         C2 u1/Y 0 1.000e-15\n\
         C3 u2/A 0 5.000e-16\n"
    ));
    // Nets without parasitics fall back to short-circuit patches.
    assert!(deck.contains(
        ".subckt stage1 in1 u1/A\n\
         * No parasitics found for this net.\n\
         R1 in1 u1/A 1.000e-4\n\
         .ends\n"
    ));
    // The hierarchical pin on n1 is neither instantiated nor patched.
    assert!(!deck.contains("blk/p"));
    assert!(deck.contains(
        "* No parasitics found for this net.\n\
         R1 u2/Y out1 1.000e-4\n\
         .ends\n\n.end"
    ));
    Ok(())
}

#[test]
fn chain_harvests_each_cell_once() -> Result<()> {
    let (design, path) = chain_design();
    let bench = TestBench::new(CHAIN_VENDOR);
    let (_, subckts) = bench.run(&design, &path)?;

    assert_eq!(subckts.matches(".subckt INV A Y VDD VSS").count(), 1);
    assert_eq!(subckts.matches(".subckt NAND2 A B Y VDD VSS").count(), 1);
    assert!(!subckts.contains("BUF"));
    assert!(subckts.contains("mn1 net1 B VSS VSS nmos"));
    Ok(())
}

#[test]
fn chain_reruns_are_byte_identical() -> Result<()> {
    let (design, path) = chain_design();
    let bench = TestBench::new(CHAIN_VENDOR);
    let (deck1, subckts1) = bench.run(&design, &path)?;
    let (deck2, subckts2) = bench.run(&design, &path)?;
    assert_eq!(deck1, deck2);
    assert_eq!(subckts1, subckts2);
    Ok(())
}

#[test]
fn propagated_constant_wins_over_sensitizer() -> Result<()> {
    let (mut design, path) = chain_design();
    // The logic simulator says u2/B is tied low; the NAND rule would pick 1.
    let u2_b = {
        let network = &design.network;
        let inst = network.instance(path.point(4).pin()).unwrap();
        network.find_pin(inst, "B").unwrap()
    };
    design.sim.set_logic_value(u2_b, LogicValue::Zero);

    let bench = TestBench::new(CHAIN_VENDOR);
    let (deck, _) = bench.run(&design, &path)?;
    assert!(deck.contains("v1 u2/B 0 0.000\n"));
    assert!(!deck.contains("v1 u2/B 0 1.800\n"));
    Ok(())
}

#[test]
fn nor2_side_input_forced_low() -> Result<()> {
    let library = test_library().cell(nor2_cell());

    let mut network = Network::new();
    let n_in = network.add_net("n_in");
    let n_b = network.add_net("n_b");
    let n_out = network.add_net("n_out");
    let in1 = network.add_port("in1", PortDirection::Input, Some(n_in));
    let _in2 = network.add_port("in2", PortDirection::Input, Some(n_b));
    let u1 = network.add_instance("u1", "NOR2");
    let u1_a = network.add_pin(u1, "A", PortDirection::Input, Some(n_in));
    let _u1_b = network.add_pin(u1, "B", PortDirection::Input, Some(n_b));
    let u1_y = network.add_pin(u1, "Y", PortDirection::Output, Some(n_out));
    let out1 = network.add_port("out1", PortDirection::Output, Some(n_out));

    let mut graph = Graph::new();
    let gate_edge = graph.add_edge(TimingRole::Combinational);
    let gate_arc = graph.add_arc(Some("NOR2".to_string()), Some(gate_edge), vec![]);
    let points = [
        (in1, RiseFall::Rise, 0.0, None),
        (u1_a, RiseFall::Rise, 5e-12, None),
        (u1_y, RiseFall::Fall, 4e-11, Some(gate_arc)),
        (out1, RiseFall::Fall, 5e-11, None),
    ];
    let mut path = PathExpanded::new();
    for &(pin, tr, arrival, prev_arc) in &points {
        let vertex = graph.add_vertex();
        graph.set_slew(vertex, tr, 0, 2e-11);
        path.push(PathPoint::new(pin, tr, arrival, vertex), prev_arc);
    }

    let design = Design::new(network, library, graph, Parasitics::new(), LogicSim::new());
    let bench = TestBench::new(
        ".subckt NOR2 A B Y VDD VSS\n\
         mp0 Y A VDD VDD pmos\n\
         .ends\n",
    );
    let (deck, _) = bench.run(&design, &path)?;
    assert!(deck.contains("v1 u1/B 0 0.000\n"));
    Ok(())
}
