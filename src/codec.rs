//! Coefficient layouts for the Mermin measurement operators.
//!
//! Every qubit `k` carries two observables, `a_k = x X + y Y + z Z` and its
//! primed mirror `a'_k`, each described by an `[x, y, z]` triple. The search,
//! the basis change and the evaluation each prefer a different grouping:
//!
//! * **unpacked**: `[x1,y1,z1, .., xN,yN,zN, x'1,y'1,z'1, .., x'N,y'N,z'N]`
//! * **packed**: the whole `a` family, then the whole `a'` family
//! * **mixed**: `[a1, a'1, a2, a'2, ..]`
//!
//! Conversions are pure re-indexing, so any round trip is exact.

use crate::error::{MerminError, MfResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

pub type Triple = [f64; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Layout {
    Packed,
    Unpacked,
    Mixed,
}

/// Selects the `a` family (`Unprimed`) or the `a'` family (`Primed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Variant {
    Unprimed,
    Primed,
}

impl Variant {
    /// Slot of this variant inside a mixed `[a_k, a'_k]` pair.
    #[inline(always)]
    pub fn slot(self) -> usize {
        match self {
            Variant::Unprimed => 0,
            Variant::Primed => 1,
        }
    }
}

/// Number of scalar coefficients for `qubits` qubits, in any layout.
#[inline(always)]
pub fn expected_len(qubits: usize) -> usize {
    6 * qubits
}

/// Unit-length copy of `t`, or `None` for the zero triple.
pub fn normalized(t: Triple) -> Option<Triple> {
    let norm = (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt();
    if norm > 0.0 && norm.is_finite() {
        Some([t[0] / norm, t[1] / norm, t[2] / norm])
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnpackedCoefficients(pub Vec<f64>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackedCoefficients {
    pub a: Vec<Triple>,
    pub a_prime: Vec<Triple>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedCoefficients(pub Vec<Triple>);

impl PackedCoefficients {
    pub fn new(a: Vec<Triple>, a_prime: Vec<Triple>) -> MfResult<Self> {
        if a.len() != a_prime.len() {
            return Err(MerminError::ShapeMismatch {
                expected: 6 * a.len(),
                actual: 3 * (a.len() + a_prime.len()),
            });
        }
        Ok(Self { a, a_prime })
    }

    pub fn qubits(&self) -> usize {
        self.a.len()
    }

    pub fn family(&self, variant: Variant) -> &[Triple] {
        match variant {
            Variant::Unprimed => &self.a,
            Variant::Primed => &self.a_prime,
        }
    }

    /// # Panics
    ///
    /// If `qubit >= self.qubits()`; [`PackedCoefficients::get_triple`] is the
    /// fallible lookup.
    pub fn triple(&self, qubit: usize, variant: Variant) -> Triple {
        self.family(variant)[qubit]
    }

    pub fn get_triple(&self, qubit: usize, variant: Variant) -> MfResult<Triple> {
        self.family(variant).get(qubit).copied().ok_or_else(|| {
            MerminError::Validation(format!(
                "qubit {} is outside a {}-qubit coefficient set",
                qubit,
                self.qubits()
            ))
        })
    }

    /// Triples in unpacked order: the `a` family, then the `a'` family.
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.a.iter().chain(self.a_prime.iter())
    }

    /// Both families must hold exactly `qubits` triples.
    pub fn check_shape(&self, qubits: usize) -> MfResult<()> {
        if self.a.len() != qubits || self.a_prime.len() != qubits {
            return Err(MerminError::ShapeMismatch {
                expected: expected_len(qubits),
                actual: 3 * (self.a.len() + self.a_prime.len()),
            });
        }
        Ok(())
    }
}

impl UnpackedCoefficients {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl FromStr for UnpackedCoefficients {
    type Err = MerminError;

    /// Parses a comma or whitespace separated list of reals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|tok| !tok.is_empty())
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| {
                    MerminError::Validation(format!("Invalid coefficient '{}'", tok))
                })
            })
            .collect::<MfResult<Vec<f64>>>()
            .map(UnpackedCoefficients)
    }
}

pub fn packed_to_unpacked(
    packed: &PackedCoefficients,
    qubits: usize,
) -> MfResult<UnpackedCoefficients> {
    packed.check_shape(qubits)?;
    let values = packed.triples().flat_map(|t| t.iter().copied()).collect();
    Ok(UnpackedCoefficients(values))
}

pub fn unpacked_to_packed(
    unpacked: &UnpackedCoefficients,
    qubits: usize,
) -> MfResult<PackedCoefficients> {
    if unpacked.len() != expected_len(qubits) {
        return Err(MerminError::ShapeMismatch {
            expected: expected_len(qubits),
            actual: unpacked.len(),
        });
    }

    let mut triples: Vec<Triple> = unpacked
        .0
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    let a_prime = triples.split_off(qubits);

    Ok(PackedCoefficients { a: triples, a_prime })
}

pub fn packed_to_mixed(packed: &PackedCoefficients, qubits: usize) -> MfResult<MixedCoefficients> {
    packed.check_shape(qubits)?;
    let mut mixed = Vec::with_capacity(2 * qubits);
    for (a, a_prime) in packed.a.iter().zip(packed.a_prime.iter()) {
        mixed.push(*a);
        mixed.push(*a_prime);
    }
    Ok(MixedCoefficients(mixed))
}

pub fn mixed_to_packed(mixed: &MixedCoefficients, qubits: usize) -> MfResult<PackedCoefficients> {
    if mixed.0.len() != 2 * qubits {
        return Err(MerminError::ShapeMismatch {
            expected: expected_len(qubits),
            actual: 3 * mixed.0.len(),
        });
    }

    let mut a = Vec::with_capacity(qubits);
    let mut a_prime = Vec::with_capacity(qubits);
    for pair in mixed.0.chunks_exact(2) {
        a.push(pair[Variant::Unprimed.slot()]);
        a_prime.push(pair[Variant::Primed.slot()]);
    }
    Ok(PackedCoefficients { a, a_prime })
}

pub fn mixed_to_unpacked(
    mixed: &MixedCoefficients,
    qubits: usize,
) -> MfResult<UnpackedCoefficients> {
    packed_to_unpacked(&mixed_to_packed(mixed, qubits)?, qubits)
}

pub fn unpacked_to_mixed(
    unpacked: &UnpackedCoefficients,
    qubits: usize,
) -> MfResult<MixedCoefficients> {
    packed_to_mixed(&unpacked_to_packed(unpacked, qubits)?, qubits)
}

/// A coefficient vector tagged with its layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", content = "values", rename_all = "snake_case")]
pub enum CoefficientVector {
    Packed(PackedCoefficients),
    Unpacked(UnpackedCoefficients),
    Mixed(MixedCoefficients),
}

impl CoefficientVector {
    pub fn layout(&self) -> Layout {
        match self {
            CoefficientVector::Packed(_) => Layout::Packed,
            CoefficientVector::Unpacked(_) => Layout::Unpacked,
            CoefficientVector::Mixed(_) => Layout::Mixed,
        }
    }

    pub fn to_packed(&self, qubits: usize) -> MfResult<PackedCoefficients> {
        match self {
            CoefficientVector::Packed(p) => {
                p.check_shape(qubits)?;
                Ok(p.clone())
            }
            CoefficientVector::Unpacked(u) => unpacked_to_packed(u, qubits),
            CoefficientVector::Mixed(m) => mixed_to_packed(m, qubits),
        }
    }

    pub fn into_layout(self, target: Layout, qubits: usize) -> MfResult<CoefficientVector> {
        if self.layout() == target {
            // Still enforce the shape so the conversion stays total over valid input only.
            self.to_packed(qubits)?;
            return Ok(self);
        }
        let packed = self.to_packed(qubits)?;
        Ok(match target {
            Layout::Packed => CoefficientVector::Packed(packed),
            Layout::Unpacked => CoefficientVector::Unpacked(packed_to_unpacked(&packed, qubits)?),
            Layout::Mixed => CoefficientVector::Mixed(packed_to_mixed(&packed, qubits)?),
        })
    }
}
