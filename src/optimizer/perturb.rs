use crate::codec::{normalized, PackedCoefficients, Triple};
use fastrand::Rng;

#[inline(always)]
fn symmetric(rng: &mut Rng, half_width: f64) -> f64 {
    (rng.f64() * 2.0 - 1.0) * half_width
}

/// Uniform components in `[-1, 1]`, normalized. Redraws the (measure zero) zero triple.
pub fn random_unit_triple(rng: &mut Rng) -> Triple {
    loop {
        let raw = [symmetric(rng, 1.0), symmetric(rng, 1.0), symmetric(rng, 1.0)];
        if let Some(t) = normalized(raw) {
            return t;
        }
    }
}

/// Fresh starting point: one random unit triple per qubit and family.
pub fn random_packed(rng: &mut Rng, qubits: usize) -> PackedCoefficients {
    let a = (0..qubits).map(|_| random_unit_triple(rng)).collect();
    let a_prime = (0..qubits).map(|_| random_unit_triple(rng)).collect();
    PackedCoefficients { a, a_prime }
}

/// Adds uniform noise in `[-radius, radius]` to every component and projects
/// each triple back onto the unit sphere. A triple that cancels to zero keeps
/// its previous value.
pub fn perturb(rng: &mut Rng, xbest: &PackedCoefficients, radius: f64) -> PackedCoefficients {
    let mut shift = |t: &Triple| -> Triple {
        let moved = [
            t[0] + symmetric(rng, radius),
            t[1] + symmetric(rng, radius),
            t[2] + symmetric(rng, radius),
        ];
        normalized(moved).unwrap_or(*t)
    };

    let a = xbest.a.iter().map(&mut shift).collect();
    let a_prime = xbest.a_prime.iter().map(&mut shift).collect();
    PackedCoefficients { a, a_prime }
}
