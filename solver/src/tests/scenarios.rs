use pretty_assertions::assert_eq;

use crate::SolverError;

use super::*;

// END-TO-END SCENARIOS
// ================================================================================================
//
// Constant bits are assigned in canonical order: resistors first (netlist
// order), then conductances, inductors, capacitors and controlled-source
// gains. All expected coefficients below are written against that order.

#[test]
fn voltage_divider() {
    // mid/U1 = R2/(R1+R2); in admittance constants: g1/(g1+g2).
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in mid
        R R2 mid gnd
        .result G mid / U1",
    );
    let mid = unknown_index(&solution, "mid");
    assert!(solution.is_computed(mid));
    // Determinant g1 + g2, numerator g1 (bits: R1 = 0, R2 = 1).
    assert_eq!(solution.determinant(), &coeff(&[(1, &[0]), (1, &[1])]));
    assert_eq!(solution.numerator(mid, 0), &coeff(&[(1, &[0])]));
    // The input node was not requested and stays untouched.
    let input = unknown_index(&solution, "in");
    assert!(!solution.is_computed(input));
    assert!(solution.numerator(input, 0).is_zero());
}

#[test]
fn voltage_divider_input_follows_the_source() {
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in mid
        R R2 mid gnd
        .result all in mid",
    );
    let input = unknown_index(&solution, "in");
    let mid = unknown_index(&solution, "mid");
    // U_in = U1 exactly: numerator equals the determinant.
    assert_eq!(solution.determinant(), &coeff(&[(1, &[0]), (1, &[1])]));
    assert_eq!(solution.numerator(input, 0), &coeff(&[(1, &[0]), (1, &[1])]));
    assert_eq!(solution.numerator(mid, 0), &coeff(&[(1, &[0])]));
}

#[test]
fn inverting_amplifier() {
    // out/U1 = -R2/R1; in admittance constants: -g1/g2.
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in minus
        R R2 minus out
        OP OP1 minus gnd out
        .result A out / U1",
    );
    let out = unknown_index(&solution, "out");
    assert_eq!(solution.determinant(), &coeff(&[(1, &[1])]));
    assert_eq!(solution.numerator(out, 0), &coeff(&[(-1, &[0])]));
    // Numerically: R1 = 1k, R2 = 10k gives a gain of -10.
    let values = [1e-3, 1e-4];
    let gain = eval_transfer(&solution, out, 0, &values);
    assert!((gain + 10.0).abs() < 1e-9, "gain was {gain}");
}

#[test]
fn current_source_driven_resistor() {
    // U_a = R1 * I1: numerator 1, determinant g1.
    let solution = compile_ok(
        "
        I I1 gnd a
        R R1 a gnd
        .result U a / I1",
    );
    let a = unknown_index(&solution, "a");
    assert_eq!(solution.determinant(), &coeff(&[(1, &[0])]));
    assert_eq!(solution.numerator(a, 0), &coeff(&[(1, &[])]));
}

#[test]
fn parallel_voltage_sources_are_singular() {
    // Two ideal sources forced onto the same node pair: the eliminator must
    // run out of pivots.
    let result = compile(
        "
        U U1 a gnd
        U U2 a gnd
        .result G a / U1",
    );
    match result {
        Err(CompileError::Solver(SolverError::Singular { .. })) => {}
        other => panic!("expected a singularity, got {other:?}"),
    }
}

#[test]
fn controlled_source_bridging_two_subnets() {
    // Circuit A drives circuit B only through the VCVS's sense pair; B's
    // node voltage still resolves against A's source.
    let solution = compile_ok(
        "
        U U1 a gnd1
        R R1 a gnd1
        U(U) E1 b gnd2 a gnd1
        R R2 b gnd2
        .result all a b",
    );
    let a = unknown_index(&solution, "a");
    let b = unknown_index(&solution, "b");
    // Bits: R1 = 0, R2 = 1, gain of E1 = 2.
    assert_eq!(solution.determinant(), &coeff(&[(1, &[])]));
    assert_eq!(solution.numerator(a, 0), &coeff(&[(1, &[])]));
    assert_eq!(solution.numerator(b, 0), &coeff(&[(1, &[2])]));
}

#[test]
fn name_lookup_disambiguates_categories() {
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in mid
        R R2 mid gnd
        .voltage V mid gnd
        .result G V / U1",
    );
    // The user-defined voltage V is distinct from any unknown.
    let v = solution.find_name("V");
    assert_eq!(v.matches, 1);
    assert!(v.idx_user_voltage.is_some());
    assert!(v.idx_unknown.is_none());
    // 'mid' names exactly one unknown.
    let mid = solution.find_name("mid");
    assert_eq!(mid.matches, 1);
    assert!(mid.idx_unknown.is_some());
    // 'U1' names both the independent source and its branch current.
    let u1 = solution.find_name("U1");
    assert_eq!(u1.matches, 2);
    assert!(u1.idx_known.is_some());
    assert!(u1.idx_unknown.is_some());
    // The voltage's numerator matches the node it measures (minus ground).
    let v_dep = solution.voltage_dependent_index(v.idx_user_voltage.unwrap());
    assert!(solution.is_computed(v_dep));
    assert_eq!(solution.numerator(v_dep, 0), &coeff(&[(1, &[0])]));
}

#[test]
fn unresolvable_dependent_is_reported_not_available() {
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in gnd
        .result G nosuch / U1",
    );
    for dep in 0..solution.num_dependents() {
        assert!(!solution.is_computed(dep));
    }
    // Nothing was solved, so no determinant was extracted.
    assert!(solution.determinant().is_zero());
}
