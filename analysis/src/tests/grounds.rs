use pretty_assertions::assert_eq;

use super::*;

// GROUND ELECTION AND OP-AMP CHECKS
// ================================================================================================

#[test]
fn ground_named_node_is_elected() {
    let analysis = analyze_ok(
        "
        U U1 in common_GND
        R R1 in out
        R R2 out common_GND",
    );
    let gnd = analysis.circuit.node_by_name("common_GND").unwrap();
    assert!(analysis.subnets.is_ground(gnd));
    assert!(analysis.table.unknown_by_node(gnd).is_none());
}

#[test]
fn first_node_elected_without_ground_name() {
    // No ground-named node and no op-amp: the first node in list order
    // becomes the reference.
    let analysis = analyze_ok(
        "
        U U1 top bottom
        R R1 top bottom",
    );
    let top = analysis.circuit.node_by_name("top").unwrap();
    assert!(analysis.subnets.is_ground(top));
    assert!(analysis.table.unknown_by_node(top).is_none());
}

#[test]
fn multiple_ground_names_in_one_subnet_rejected() {
    let result = analyze(
        "
        U U1 in gnd
        R R1 in Ground
        R R2 Ground gnd",
    );
    assert!(result.is_err());
}

#[test]
fn one_ground_per_subnet_is_accepted() {
    let analysis = analyze_ok(
        "
        R R1 a gnd
        U U1 a gnd
        R R2 b GND2
        U U2 b GND2",
    );
    assert_eq!(analysis.subnets.count(), 2);
    let gnd = analysis.circuit.node_by_name("gnd").unwrap();
    let gnd2 = analysis.circuit.node_by_name("GND2").unwrap();
    assert!(analysis.subnets.is_ground(gnd));
    assert!(analysis.subnets.is_ground(gnd2));
}

#[test]
fn opamp_requires_explicit_ground() {
    let result = analyze(
        "
        U U1 in ref
        R R1 in minus
        R R2 minus out
        OP OP1 minus ref out",
    );
    assert!(result.is_err());
}

#[test]
fn opamp_output_cannot_be_the_named_ground() {
    let result = analyze(
        "
        U U1 in ref
        R R1 in minus
        R R2 minus gnd
        OP OP1 minus ref gnd",
    );
    assert!(result.is_err());
}

#[test]
fn two_opamps_on_one_output_rejected() {
    let result = analyze(
        "
        U U1 in gnd
        R R1 in a
        R R2 in b
        R R3 a out
        R R4 b out
        OP OP1 a gnd out
        OP OP2 b gnd out",
    );
    assert!(result.is_err());
}

#[test]
fn opamp_may_not_bridge_subnets() {
    // Only the op-amp connects the two islands; its inputs carry no
    // current, so this topology is rejected.
    let result = analyze(
        "
        U U1 x gnd
        R R1 x y
        R R2 out w
        U U2 w gnd2
        OP OP1 y x out",
    );
    assert!(result.is_err());
}

#[test]
fn inverting_amplifier_is_valid() {
    let analysis = analyze_ok(
        "
        U U1 in gnd
        R R1 in minus
        R R2 minus out
        OP OP1 minus gnd out",
    );
    assert_eq!(analysis.subnets.count(), 1);
    let gnd = analysis.circuit.node_by_name("gnd").unwrap();
    assert!(analysis.subnets.is_ground(gnd));
    // in, minus, out + aux currents for U1 and OP1.
    assert_eq!(analysis.table.num_unknowns(), 5);
}
