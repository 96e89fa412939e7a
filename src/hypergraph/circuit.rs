use super::HypergraphState;
use crate::basis::U3Angles;
use crate::executor::ExecutionError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumDiscriminants, EnumIter, EnumString};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumDiscriminants)]
#[strum_discriminants(name(GateKind))]
#[strum_discriminants(derive(Display, EnumString, EnumIter, Hash))]
pub enum Gate {
    H(usize),
    Cz(usize, usize),
    /// Toffoli: flips `target` when both controls are 1.
    Ccx { controls: [usize; 2], target: usize },
    /// Multi-controlled Z. Symmetric in its members; `target` is only a label.
    Mcz { controls: Vec<usize>, target: usize },
    U3 { qubit: usize, angles: U3Angles },
    Measure { qubit: usize, clbit: usize },
}

impl Gate {
    pub fn kind(&self) -> GateKind {
        GateKind::from(self)
    }

    pub fn qubits(&self) -> Vec<usize> {
        match self {
            Gate::H(q) => vec![*q],
            Gate::Cz(a, b) => vec![*a, *b],
            Gate::Ccx { controls, target } => vec![controls[0], controls[1], *target],
            Gate::Mcz { controls, target } => {
                let mut all = controls.clone();
                all.push(*target);
                all
            }
            Gate::U3 { qubit, .. } => vec![*qubit],
            Gate::Measure { qubit, .. } => vec![*qubit],
        }
    }
}

/// Ordered gate list over `qubits` logical qubits plus `ancillas` work qubits
/// (indices `qubits..qubits + ancillas`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatePlacement {
    pub qubits: usize,
    pub ancillas: usize,
    pub gates: Vec<Gate>,
}

impl GatePlacement {
    pub fn new(qubits: usize) -> Self {
        Self {
            qubits,
            ancillas: 0,
            gates: Vec::new(),
        }
    }

    pub fn total_qubits(&self) -> usize {
        self.qubits + self.ancillas
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn count(&self, kind: GateKind) -> usize {
        self.gates.iter().filter(|g| g.kind() == kind).count()
    }

    /// Checks that every gate addresses a distinct, in-range qubit set.
    pub fn validate(&self) -> Result<(), ExecutionError> {
        let width = self.total_qubits();
        for (i, gate) in self.gates.iter().enumerate() {
            let mut touched = gate.qubits();
            if let Some(&q) = touched.iter().find(|&&q| q >= width) {
                return Err(ExecutionError::InvalidGatePlacement(format!(
                    "gate {} ({}) addresses qubit {} on a {}-qubit register",
                    i,
                    gate.kind(),
                    q,
                    width
                )));
            }
            touched.sort_unstable();
            if touched.windows(2).any(|w| w[0] == w[1]) {
                return Err(ExecutionError::InvalidGatePlacement(format!(
                    "gate {} ({}) repeats a qubit",
                    i,
                    gate.kind()
                )));
            }
            if let Gate::Measure { clbit, .. } = gate {
                if *clbit >= self.qubits {
                    return Err(ExecutionError::InvalidGatePlacement(format!(
                        "gate {} writes classical bit {} of {}",
                        i, clbit, self.qubits
                    )));
                }
            }
        }
        Ok(())
    }

    /// Lowers multi-controlled phases to `H`, `CZ` and `CCX`.
    ///
    /// Three members become `H(t) CCX H(t)`. Larger edges compute the AND of
    /// their members into a Toffoli ladder on ancillas starting at qubit `N`,
    /// apply `CZ` between the last ancilla and the last member, then uncompute
    /// the ladder. When any edge needs the ladder the register grows to
    /// `2N - 2` qubits and every ancilla ends in `|0>`.
    pub fn decompose(&self) -> GatePlacement {
        let n = self.qubits;
        let needs_ladder = self.gates.iter().any(|g| match g {
            Gate::Mcz { controls, .. } => controls.len() > 2,
            _ => false,
        });

        let mut out = GatePlacement {
            qubits: n,
            ancillas: if needs_ladder {
                self.ancillas.max(n.saturating_sub(2))
            } else {
                self.ancillas
            },
            gates: Vec::with_capacity(self.gates.len() * 4),
        };

        for gate in &self.gates {
            match gate {
                Gate::Mcz { controls, target } if controls.len() == 1 => {
                    out.gates.push(Gate::Cz(controls[0], *target));
                }
                Gate::Mcz { controls, target } if controls.len() == 2 => {
                    out.gates.push(Gate::H(*target));
                    out.gates.push(Gate::Ccx {
                        controls: [controls[0], controls[1]],
                        target: *target,
                    });
                    out.gates.push(Gate::H(*target));
                }
                Gate::Mcz { controls, target } if controls.len() > 2 => {
                    let ladder = toffoli_ladder(controls, n);
                    let last_ancilla = n + controls.len() - 2;
                    out.gates.extend(ladder.iter().cloned());
                    out.gates.push(Gate::Cz(last_ancilla, *target));
                    out.gates.extend(ladder.into_iter().rev());
                }
                other => out.gates.push(other.clone()),
            }
        }

        out
    }

    /// Appends a rotation and a measurement for each logical qubit.
    pub fn with_measurement(&self, rotations: &[U3Angles]) -> GatePlacement {
        let mut out = self.clone();
        for (qubit, angles) in rotations.iter().enumerate().take(self.qubits) {
            out.gates.push(Gate::U3 {
                qubit,
                angles: *angles,
            });
        }
        for qubit in 0..self.qubits {
            out.gates.push(Gate::Measure {
                qubit,
                clbit: qubit,
            });
        }
        out
    }
}

/// Toffolis accumulating the AND of `controls` into ancillas `base..`.
fn toffoli_ladder(controls: &[usize], base: usize) -> Vec<Gate> {
    let mut ladder = vec![Gate::Ccx {
        controls: [controls[0], controls[1]],
        target: base,
    }];
    for (step, &c) in controls.iter().enumerate().skip(2) {
        let previous = base + step - 2;
        ladder.push(Gate::Ccx {
            controls: [c, previous],
            target: previous + 1,
        });
    }
    ladder
}

/// Hadamard on every qubit, then one multi-controlled Z per hyperedge in
/// canonical order. The last member of each edge is the target.
pub fn build_gate_placement(state: &HypergraphState) -> GatePlacement {
    let mut placement = GatePlacement::new(state.qubits());
    placement.gates.extend((0..state.qubits()).map(Gate::H));

    for edge in state.edges().iter() {
        let (target, controls) = match edge.vertices().split_last() {
            Some((t, c)) => (*t, c.to_vec()),
            None => continue,
        };
        placement.gates.push(Gate::Mcz { controls, target });
    }

    debug!(
        "Placement for {} qubits: {} gates ({} MCZ)",
        placement.qubits,
        placement.len(),
        placement.count(GateKind::Mcz)
    );
    placement
}
