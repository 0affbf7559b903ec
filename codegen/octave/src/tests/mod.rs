use std::sync::Arc;

use expect_test::expect;
use miden_diagnostics::term::termcolor::ColorChoice;
use miden_diagnostics::{CodeMap, DefaultEmitter, DiagnosticsHandler};

use linnet_analysis::{AnalysisConfig, NetworkAnalyzer};

use crate::{CodeGenerator, OctaveCodeGenerator};

/// Parses, analyzes, solves and renders a netlist.
fn render(source: &str) -> String {
    let codemap = Arc::new(CodeMap::new());
    let emitter = Arc::new(DefaultEmitter::new(ColorChoice::Auto));
    let diagnostics = DiagnosticsHandler::new(Default::default(), codemap.clone(), emitter);
    let circuit =
        linnet_netlist::parse(&diagnostics, codemap, source).expect("netlist failed to parse");
    let analysis = NetworkAnalyzer::new(&diagnostics, AnalysisConfig::default())
        .analyze(Arc::new(circuit))
        .expect("analysis failed");
    let solution = linnet_solver::solve(analysis, &diagnostics).expect("solving failed");
    OctaveCodeGenerator::new()
        .generate(&solution)
        .expect("rendering failed")
}

#[test]
fn voltage_divider_script() {
    let script = render(
        "
        .circuit divider
        U U1 in gnd
        R R1 in mid = 2.2k
        R R2 mid gnd = 330
        .result G mid / U1",
    );
    expect![[r#"
        % Transfer functions of circuit 'divider'
        % generated by linnet

        % Device values
        R1 = 2.2e3;
        R2 = 330;

        % Result 'G': mid / U1
        G_num = [1/R1];
        G_den = [1/R2 + 1/R1];
        % h = freqs(G_num, G_den, w);

    "#]]
    .assert_eq(&script);
}

#[test]
fn rc_low_pass_script() {
    let script = render(
        "
        .circuit lowpass
        U U1 in gnd
        R R1 in out = 1k
        C C1 out gnd = 100n
        .result G out / U1 plot \"loglog\"",
    );
    expect![[r#"
        % Transfer functions of circuit 'lowpass'
        % generated by linnet

        % Device values
        R1 = 1e3;
        C1 = 100e-9;

        % Result 'G': out / U1
        % plot: loglog
        G_num = [1/R1];
        G_den = [C1, 1/R1];
        % h = freqs(G_num, G_den, w);

    "#]]
    .assert_eq(&script);
}

#[test]
fn lc_divider_script_shifts_negative_degrees() {
    // The inductor's 1/s admittance shifts both polynomials by one degree
    // so the vectors stay polynomial.
    let script = render(
        "
        .circuit tank
        U U1 in gnd
        L L1 in out
        C C1 out gnd
        .result G out / U1",
    );
    expect![[r#"
        % Transfer functions of circuit 'tank'
        % generated by linnet

        % Device values
        L1 = 1; % no value in netlist
        C1 = 1; % no value in netlist

        % Result 'G': out / U1
        G_num = [1/L1];
        G_den = [C1, 0, 1/L1];
        % h = freqs(G_num, G_den, w);

    "#]]
    .assert_eq(&script);
}

#[test]
fn full_result_with_missing_dependent() {
    let script = render(
        "
        .circuit partial
        U U1 in gnd
        R R1 in mid = 47
        R R2 mid gnd = bogus
        .result all mid nosuch",
    );
    expect![[r#"
        % Transfer functions of circuit 'partial'
        % generated by linnet

        % Device values
        R1 = 47;
        R2 = 1; % value 'bogus' not understood

        % Result 'all_mid_U1': mid / U1
        all_mid_U1_num = [1/R1];
        all_mid_U1_den = [1/R2 + 1/R1];
        % h = freqs(all_mid_U1_num, all_mid_U1_den, w);

        % Result 'all_nosuch_U1': nosuch / U1
        % not available: 'nosuch' was not computed

    "#]]
    .assert_eq(&script);
}

#[test]
fn inverting_amplifier_script() {
    let script = render(
        "
        .circuit inverting
        U U1 in gnd
        R R1 in minus = 1k
        R R2 minus out = 10k
        OP OP1 minus gnd out
        .result A out / U1",
    );
    expect![[r#"
        % Transfer functions of circuit 'inverting'
        % generated by linnet

        % Device values
        R1 = 1e3;
        R2 = 10e3;

        % Result 'A': out / U1
        A_num = [-1/R1];
        A_den = [1/R2];
        % h = freqs(A_num, A_den, w);

    "#]]
    .assert_eq(&script);
}
