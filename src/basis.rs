//! Maps Mermin observables onto single-qubit measurement rotations.
//!
//! Measuring `Z` after `U3(theta, pi, -phi - pi)` is the same as measuring
//! `sin(theta)cos(phi) X + sin(theta)sin(phi) Y + cos(theta) Z`.

use crate::codec::{self, PackedCoefficients, Triple, UnpackedCoefficients, Variant};
use crate::error::MfResult;
use crate::polynomial::setting_variants;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Gate parameters of a generic single-qubit `U3(theta, phi, lambda)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct U3Angles {
    pub theta: f64,
    pub phi: f64,
    pub lambda: f64,
}

impl U3Angles {
    pub const IDENTITY: U3Angles = U3Angles {
        theta: 0.0,
        phi: 0.0,
        lambda: 0.0,
    };

    /// `[[cos(t/2), -e^{i l} sin(t/2)], [e^{i p} sin(t/2), e^{i(p+l)} cos(t/2)]]`
    pub fn matrix(&self) -> [[Complex64; 2]; 2] {
        let (s, c) = (self.theta / 2.0).sin_cos();
        [
            [
                Complex64::new(c, 0.0),
                -Complex64::from_polar(s, self.lambda),
            ],
            [
                Complex64::from_polar(s, self.phi),
                Complex64::from_polar(c, self.phi + self.lambda),
            ],
        ]
    }
}

#[inline(always)]
fn clamped_acos(v: f64) -> f64 {
    v.clamp(-1.0, 1.0).acos()
}

/// Rotation that turns a `Z` measurement into a measurement of
/// `x X + y Y + z Z`. The triple is normalized first; the zero triple maps to
/// a plain `Z` measurement.
pub fn mermin_to_u3(x: f64, y: f64, z: f64) -> U3Angles {
    let [x, y, z] = match codec::normalized([x, y, z]) {
        Some(t) => t,
        None => return U3Angles::IDENTITY,
    };

    let theta = clamped_acos(z);
    let sin_theta = theta.sin();
    let mut phi = if sin_theta == 0.0 {
        0.0
    } else {
        clamped_acos(x / sin_theta)
    };
    if sin_theta != 0.0 && y / sin_theta < 0.0 {
        phi = -phi;
    }

    U3Angles {
        theta,
        phi: PI,
        lambda: -phi - PI,
    }
}

pub fn triple_to_u3(t: &Triple) -> U3Angles {
    mermin_to_u3(t[0], t[1], t[2])
}

/// U3 angles for every qubit of both observable families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisAngles {
    pub a: Vec<U3Angles>,
    pub a_prime: Vec<U3Angles>,
}

impl BasisAngles {
    pub fn from_packed(packed: &PackedCoefficients) -> Self {
        Self {
            a: packed.a.iter().map(triple_to_u3).collect(),
            a_prime: packed.a_prime.iter().map(triple_to_u3).collect(),
        }
    }

    pub fn qubits(&self) -> usize {
        self.a.len()
    }

    pub fn family(&self, variant: Variant) -> &[U3Angles] {
        match variant {
            Variant::Unprimed => &self.a,
            Variant::Primed => &self.a_prime,
        }
    }

    /// Per-qubit rotations for monomial `index`: qubit `k` takes the family
    /// named by character `k` of the N-bit expansion of `index`.
    pub fn rotations_for_setting(&self, index: usize) -> MfResult<Vec<U3Angles>> {
        let variants = setting_variants(index, self.qubits())?;
        Ok(variants
            .iter()
            .enumerate()
            .map(|(qubit, v)| self.family(*v)[qubit])
            .collect())
    }
}

pub fn coefficients_to_rotation_angles(
    unpacked: &UnpackedCoefficients,
    qubits: usize,
) -> MfResult<BasisAngles> {
    let packed = codec::unpacked_to_packed(unpacked, qubits)?;
    Ok(BasisAngles::from_packed(&packed))
}
