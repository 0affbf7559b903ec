use pretty_assertions::assert_eq;

use super::*;

// TRANSFER FUNCTIONS ACROSS DEVICE CLASSES
// ================================================================================================

#[test]
fn rc_low_pass() {
    // out/U1 = g1/(g1 + sC) with g1 = 1/R1; the capacitor's constant is its
    // admittance coefficient. Bits: R1 = 0, C1 = 1.
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in out
        C C1 out gnd
        .result G out / U1",
    );
    let out = unknown_index(&solution, "out");
    assert_eq!(solution.determinant(), &coeff(&[(1, &[0]), (1, &[1])]));
    assert_eq!(solution.numerator(out, 0), &coeff(&[(1, &[0])]));
}

#[test]
fn lc_divider() {
    // An inductor feeding a capacitor: out/U1 = l/(l + c) with l = 1/(sL),
    // c = sC. Bits in canonical order: L1 = 0, C1 = 1.
    let solution = compile_ok(
        "
        U U1 in gnd
        L L1 in out
        C C1 out gnd
        .result G out / U1",
    );
    let out = unknown_index(&solution, "out");
    assert_eq!(solution.determinant(), &coeff(&[(1, &[0]), (1, &[1])]));
    assert_eq!(solution.numerator(out, 0), &coeff(&[(1, &[0])]));
}

#[test]
fn probe_current_through_a_divider() {
    // The probe sits between the two resistors; its branch current is
    // U1/(R1+R2), i.e. numerator g1*g2 over determinant g1+g2.
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in mid
        PI P1 mid out
        R R2 out gnd
        .result I P1 / U1",
    );
    let probe = unknown_index(&solution, "P1");
    assert!(solution.is_computed(probe));
    assert_eq!(solution.determinant(), &coeff(&[(1, &[0]), (1, &[1])]));
    assert_eq!(solution.numerator(probe, 0), &coeff(&[(1, &[0, 1])]));
    // The probe does not disturb the divider: numerically I = U1/(R1+R2).
    let values = [1.0 / 220.0, 1.0 / 330.0];
    let current = eval_transfer(&solution, probe, 0, &values);
    assert!((current - 1.0 / 550.0).abs() < 1e-12);
}

#[test]
fn vccs_transconductance() {
    // U_b = (gm/g2) * U_in with U_in pinned to the source. Bits: R1 = 0,
    // R2 = 1, gm = 2.
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in gnd
        I(U) G1 gnd b in gnd
        R R2 b gnd
        .result G b / U1",
    );
    let b = unknown_index(&solution, "b");
    assert_eq!(solution.determinant(), &coeff(&[(1, &[1])]));
    assert_eq!(solution.numerator(b, 0), &coeff(&[(1, &[2])]));
}

#[test]
fn cccs_current_mirror() {
    // I_P1 = g1*U1 through the input branch; the CCCS pumps k*I_P1 into R2,
    // so U_b = (k*g1/g2)*U1. Bits: R1 = 0, R2 = 1, k = 2.
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in a
        PI P1 a gnd
        I(I) F1 gnd b P1
        R R2 b gnd
        .result G b / U1",
    );
    let b = unknown_index(&solution, "b");
    assert!(solution.is_computed(b));
    assert_eq!(solution.determinant(), &coeff(&[(1, &[1])]));
    assert_eq!(solution.numerator(b, 0), &coeff(&[(1, &[0, 2])]));
    // Numerically: R1 = 100, R2 = 1000, k = 3 gives a gain of 30.
    let values = [1e-2, 1e-3, 3.0];
    let gain = eval_transfer(&solution, b, 0, &values);
    assert!((gain - 30.0).abs() < 1e-9, "gain was {gain}");
}

#[test]
fn ccvs_transresistance() {
    // U_b = k * I_P1 = k*g1*U1. Bits: R1 = 0, R2 = 1, k = 2.
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in a
        PI P1 a gnd
        U(I) H1 b gnd P1
        R R2 b gnd
        .result G b / U1",
    );
    let b = unknown_index(&solution, "b");
    // The ideal transresistance leaves no admittance in the determinant:
    // every unknown resolves with a unit pivot.
    assert_eq!(solution.determinant(), &coeff(&[(1, &[])]));
    assert_eq!(solution.numerator(b, 0), &coeff(&[(1, &[0, 2])]));
    // R1 = 100, k = 50: U_b/U1 = 0.5.
    let values = [1e-2, 1e-3, 50.0];
    let gain = eval_transfer(&solution, b, 0, &values);
    assert!((gain - 0.5).abs() < 1e-12, "gain was {gain}");
}

#[test]
fn vcvs_gain_stage() {
    // A plain VCVS amplifier inside one sub-network. U_out = k*U_in.
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in gnd
        U(U) E1 out gnd in gnd
        R R2 out gnd
        .result G out / U1",
    );
    let out = unknown_index(&solution, "out");
    let values = [1.0, 1.0, 7.0];
    let gain = eval_transfer(&solution, out, 0, &values);
    assert!((gain - 7.0).abs() < 1e-12, "gain was {gain}");
}

#[test]
fn user_voltage_across_a_bridge() {
    // A user-defined voltage between two interior nodes is the difference
    // of the node solutions.
    let solution = compile_ok(
        "
        U U1 in gnd
        R R1 in a
        R R2 a gnd
        R R3 in b
        R R4 b gnd
        .voltage Vab a b
        .result G Vab / U1",
    );
    let v = solution.find_name("Vab");
    assert_eq!(v.matches, 1);
    let dep = solution.voltage_dependent_index(v.idx_user_voltage.unwrap());
    assert!(solution.is_computed(dep));
    // R1=R2=R3=R4 balances the bridge: Vab = 0.
    let values = [1.0, 1.0, 1.0, 1.0];
    let balanced = eval_transfer(&solution, dep, 0, &values);
    assert!(balanced.abs() < 1e-12);
    // Unbalancing one arm: Vab/U1 = g1/(g1+g2) - g3/(g3+g4).
    let values = [1.0, 2.0, 1.0, 1.0];
    let unbalanced = eval_transfer(&solution, dep, 0, &values);
    assert!((unbalanced - (1.0 / 3.0 - 0.5)).abs() < 1e-12);
}
