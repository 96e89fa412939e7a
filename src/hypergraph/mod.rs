pub mod circuit;

pub use self::circuit::{build_gate_placement, Gate, GateKind, GatePlacement};

use crate::error::{MerminError, MfResult};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Hard ceiling on the register size; the state oracle allocates `2^N` amplitudes.
pub const MAX_QUBITS: usize = 20;

/// Fixed-width binary expansion, most significant bit first.
///
/// ```
/// use merminforge::hypergraph::convert_to_binary;
/// assert_eq!(convert_to_binary(5, 5).unwrap(), "00101");
/// assert!(convert_to_binary(8, 3).is_err());
/// ```
pub fn convert_to_binary(number: u128, width: usize) -> MfResult<String> {
    if width < 128 && (number >> width) != 0 {
        return Err(MerminError::OutOfRange { number, width });
    }
    if width == 0 {
        return Ok(String::new());
    }
    Ok(format!("{:0width$b}", number, width = width))
}

/// Number of candidate hyperedges (subsets of size >= 2) on `qubits` vertices.
///
/// Fails outside `1..=MAX_QUBITS`.
pub fn hyperedge_count(qubits: usize) -> MfResult<usize> {
    check_qubits(qubits)?;
    Ok((1usize << qubits) - qubits - 1)
}

/// Sorted, distinct vertex list of size >= 2.
///
/// Orders by size first, then lexicographically, which is the canonical
/// enumeration order used by bit patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hyperedge(Vec<usize>);

impl Hyperedge {
    pub fn new(mut vertices: Vec<usize>) -> MfResult<Self> {
        vertices.sort_unstable();
        vertices.dedup();
        if vertices.len() < 2 {
            return Err(MerminError::Validation(format!(
                "hyperedge needs at least 2 distinct vertices, got {:?}",
                vertices
            )));
        }
        Ok(Self(vertices))
    }

    pub fn vertices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bit mask over qubit indices.
    pub fn mask(&self) -> usize {
        self.0.iter().fold(0, |m, &v| m | (1 << v))
    }

    pub fn max_vertex(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }
}

impl Ord for Hyperedge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Hyperedge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Hyperedge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().join(","))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperedgeSet(BTreeSet<Hyperedge>);

impl HyperedgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the edge was already present.
    pub fn insert(&mut self, edge: Hyperedge) -> bool {
        self.0.insert(edge)
    }

    pub fn contains(&self, edge: &Hyperedge) -> bool {
        self.0.contains(edge)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Hyperedge> {
        self.0.iter()
    }

    pub fn max_arity(&self) -> usize {
        self.0.iter().map(Hyperedge::len).max().unwrap_or(0)
    }
}

impl FromIterator<Hyperedge> for HyperedgeSet {
    fn from_iter<I: IntoIterator<Item = Hyperedge>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for HyperedgeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(" "))
    }
}

/// All subsets of `0..qubits` with at least two members, in canonical order.
pub fn canonical_hyperedges(qubits: usize) -> Vec<Hyperedge> {
    (2..=qubits)
        .flat_map(|size| (0..qubits).combinations(size))
        .map(Hyperedge)
        .collect()
}

pub(crate) fn check_qubits(qubits: usize) -> MfResult<()> {
    if qubits == 0 || qubits > MAX_QUBITS {
        return Err(MerminError::Validation(format!(
            "qubit count must be in 1..={}, got {}",
            MAX_QUBITS, qubits
        )));
    }
    Ok(())
}

/// Selects canonical hyperedge `k` when bit `k` of the MSB-first expansion of
/// `pattern` is set.
pub fn derive_hyperedges(qubits: usize, pattern: u128) -> MfResult<HyperedgeSet> {
    let bits = convert_to_binary(pattern, hyperedge_count(qubits)?)?;
    derive_hyperedges_from_bits(qubits, &bits)
}

/// Bit-string form of [`derive_hyperedges`]. The string must be exactly
/// `2^N - N - 1` characters long, which is the only way to reach every edge
/// once the enumeration outgrows 128 bits.
pub fn derive_hyperedges_from_bits(qubits: usize, bits: &str) -> MfResult<HyperedgeSet> {
    let width = hyperedge_count(qubits)?;
    if bits.len() != width {
        return Err(MerminError::ShapeMismatch {
            expected: width,
            actual: bits.len(),
        });
    }

    let mut set = HyperedgeSet::new();
    for (ch, edge) in bits.chars().zip(canonical_hyperedges(qubits)) {
        match ch {
            '1' => {
                set.insert(edge);
            }
            '0' => {}
            other => {
                return Err(MerminError::Validation(format!(
                    "pattern bit must be '0' or '1', got '{}'",
                    other
                )))
            }
        }
    }
    Ok(set)
}

/// An N-qubit hypergraph state. Built once per evaluation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HypergraphState {
    qubits: usize,
    edges: HyperedgeSet,
}

impl HypergraphState {
    pub fn new(qubits: usize, edges: HyperedgeSet) -> MfResult<Self> {
        check_qubits(qubits)?;
        if let Some(bad) = edges.iter().find(|e| e.max_vertex() >= qubits) {
            return Err(MerminError::Validation(format!(
                "hyperedge {} references a vertex outside 0..{}",
                bad, qubits
            )));
        }
        Ok(Self { qubits, edges })
    }

    pub fn from_pattern(qubits: usize, pattern: u128) -> MfResult<Self> {
        Self::new(qubits, derive_hyperedges(qubits, pattern)?)
    }

    pub fn from_bits(qubits: usize, bits: &str) -> MfResult<Self> {
        Self::new(qubits, derive_hyperedges_from_bits(qubits, bits)?)
    }

    pub fn qubits(&self) -> usize {
        self.qubits
    }

    pub fn edges(&self) -> &HyperedgeSet {
        &self.edges
    }

    pub fn gate_placement(&self) -> GatePlacement {
        build_gate_placement(self)
    }

    pub fn ideal_state_vector(&self) -> Vec<f64> {
        ideal_state_vector(self)
    }
}

/// Uniform superposition with a sign flip per hyperedge whose members are all
/// 1 in the basis index. Qubit `q` is bit `q` of the index.
pub fn ideal_state_vector(state: &HypergraphState) -> Vec<f64> {
    let dim = 1usize << state.qubits;
    let amplitude = (dim as f64).sqrt().recip();
    let masks: Vec<usize> = state.edges.iter().map(Hyperedge::mask).collect();

    (0..dim)
        .map(|index| {
            let flips = masks.iter().filter(|&&m| index & m == m).count();
            if flips % 2 == 0 {
                amplitude
            } else {
                -amplitude
            }
        })
        .collect()
}
