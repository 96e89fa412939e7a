use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use merminforge::codec::PackedCoefficients;
use merminforge::executor::MeasurementCounts;
use merminforge::hypergraph::{GateKind, GatePlacement, HypergraphState};
use merminforge::optimizer::{OptimizationResult, RunStatus};
use merminforge::polynomial::MerminPolynomial;
use strum::IntoEnumIterator;

fn right_align(table: &mut Table, from: usize, to: usize) {
    for i in from..=to {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn print_coefficients(name: &str, packed: &PackedCoefficients) {
    println!("\nCoefficients: {}", name);
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Qubit").add_attribute(Attribute::Bold),
        Cell::new("a.x"),
        Cell::new("a.y"),
        Cell::new("a.z"),
        Cell::new("a'.x").fg(Color::Cyan),
        Cell::new("a'.y").fg(Color::Cyan),
        Cell::new("a'.z").fg(Color::Cyan),
    ]);
    right_align(&mut table, 1, 6);

    for (q, (a, ap)) in packed.a.iter().zip(packed.a_prime.iter()).enumerate() {
        let mut row = vec![Cell::new(q).add_attribute(Attribute::Bold)];
        row.extend(a.iter().map(|v| Cell::new(format!("{:+.4}", v))));
        row.extend(ap.iter().map(|v| Cell::new(format!("{:+.4}", v)).fg(Color::Cyan)));
        table.add_row(row);
    }
    println!("{}", table);
}

pub fn print_run_summary(results: &[OptimizationResult]) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Run").add_attribute(Attribute::Bold),
        Cell::new("Status"),
        Cell::new("First mu"),
        Cell::new("Best mu").fg(Color::Green),
        Cell::new("Iter"),
        Cell::new("Radius"),
        Cell::new("Failed"),
    ]);
    right_align(&mut table, 2, 6);

    for r in results {
        let status = match &r.status {
            RunStatus::Converged(t) => Cell::new(t.to_string()),
            RunStatus::Failed(e) => Cell::new(format!("failed: {}", e)).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(r.run_id).add_attribute(Attribute::Bold),
            status,
            Cell::new(
                r.first_mu
                    .map(|m| format!("{:.6}", m))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format!("{:.6}", r.best_mu())).fg(Color::Green),
            Cell::new(r.iterations()),
            Cell::new(format!("{:.2e}", r.state.radius)),
            Cell::new(r.state.failed_candidates),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_state(state: &HypergraphState, placement: &GatePlacement, amplitudes: &[f64]) {
    println!(
        "\nHypergraph state: {} qubits, hyperedges {}",
        state.qubits(),
        state.edges()
    );

    let mut gates = new_table();
    gates.add_row(vec![
        Cell::new("Gate").add_attribute(Attribute::Bold),
        Cell::new("Count"),
    ]);
    right_align(&mut gates, 1, 1);
    for kind in GateKind::iter() {
        let n = placement.count(kind);
        if n > 0 {
            gates.add_row(vec![Cell::new(kind.to_string()), Cell::new(n)]);
        }
    }
    gates.add_row(vec![
        Cell::new("Qubits").add_attribute(Attribute::Bold),
        Cell::new(format!("{} + {} ancilla", placement.qubits, placement.ancillas)),
    ]);
    println!("{}", gates);

    let width = state.qubits();
    let mut amps = new_table();
    amps.add_row(vec![
        Cell::new("Basis").add_attribute(Attribute::Bold),
        Cell::new("Amplitude"),
    ]);
    right_align(&mut amps, 1, 1);
    for (i, a) in amplitudes.iter().enumerate() {
        let cell = Cell::new(format!("{:+.4}", a));
        let cell = if *a < 0.0 { cell.fg(Color::Red) } else { cell };
        amps.add_row(vec![Cell::new(format!("{:0width$b}", i, width = width)), cell]);
    }
    println!("{}", amps);
}

pub fn print_evaluation(
    polynomial: &MerminPolynomial,
    batches: &[(usize, MeasurementCounts)],
    value: f64,
) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Setting").add_attribute(Attribute::Bold),
        Cell::new("Coeff"),
        Cell::new("Shots"),
        Cell::new("<parity>"),
    ]);
    right_align(&mut table, 1, 3);

    for (setting, counts) in batches {
        let coefficient = polynomial.coefficients().get(*setting).copied().unwrap_or(0.0);
        let parity = merminforge::polynomial::measures_exploitation(counts)
            .expectation()
            .map(|e| format!("{:+.4}", e))
            .unwrap_or_else(|_| "empty".to_string());
        table.add_row(vec![
            Cell::new(setting),
            Cell::new(format!("{:+.3}", coefficient)),
            Cell::new(counts.total()),
            Cell::new(parity),
        ]);
    }
    println!("\n{}", table);
    println!("Polynomial value: {:.6}", value);
}
