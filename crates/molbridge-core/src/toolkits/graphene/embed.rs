//! 3D coordinate generation.
//!
//! Coordinates are seeded by a breadth-first placement over the bond graph
//! and refined by steepest descent against distance targets derived from
//! covalent radii. Deterministic for a given input.

use nalgebra::{Point3, Vector3};

use super::element::element_by_number;
use super::molecule::{BondOrder, GraphMol};
use crate::toolkits::{ToolkitError, ToolkitResult};

/// Force field selection for refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceField {
    Uff,
    Mmff94,
}

impl ForceField {
    pub fn from_name(name: &str) -> ToolkitResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "uff" => Ok(ForceField::Uff),
            "mmff94" => Ok(ForceField::Mmff94),
            other => Err(ToolkitError::InvalidParameter(format!(
                "unknown forcefield '{other}' (available: uff, mmff94)"
            ))),
        }
    }

    /// Strength of the non-bonded repulsion term.
    fn repulsion(self) -> f64 {
        match self {
            ForceField::Uff => 0.4,
            ForceField::Mmff94 => 0.3,
        }
    }
}

/// Generates a 3D conformer in place and marks the molecule as 3D.
///
/// A molecule that already carries a full 3D conformer is not reseeded;
/// the existing coordinates are refined further, which is what a local
/// optimization pass wants.
pub fn embed_3d(mol: &mut GraphMol, forcefield: ForceField, steps: usize) {
    let n = mol.atom_count();
    if n == 0 {
        mol.coords = Some(Vec::new());
        mol.dim = 3;
        return;
    }

    let targets = bond_targets(mol);
    let mut coords = match mol.coords.take() {
        Some(existing) if existing.len() == n && mol.dim == 3 => existing,
        _ => seed_coordinates(mol, &targets),
    };
    refine(mol, &mut coords, &targets, forcefield, steps.max(1));

    mol.coords = Some(coords);
    mol.dim = 3;
}

/// Ideal bonded distances from covalent radii with a bond-order shortening.
fn bond_targets(mol: &GraphMol) -> Vec<f64> {
    mol.bonds
        .iter()
        .map(|bond| {
            let r1 = covalent_radius(mol.atoms[bond.a].atomic_number);
            let r2 = covalent_radius(mol.atoms[bond.b].atomic_number);
            let adjust = match bond.order {
                BondOrder::Single => 0.0,
                BondOrder::Aromatic => -0.04,
                BondOrder::Double => -0.10,
                BondOrder::Triple => -0.16,
            };
            r1 + r2 + adjust
        })
        .collect()
}

fn covalent_radius(atomic_number: u8) -> f64 {
    element_by_number(atomic_number)
        .map(|e| e.covalent_radius)
        .unwrap_or(0.77)
}

/// Breadth-first placement: each atom is dropped near its already-placed
/// parent along a direction cycled from a tetrahedral-ish set, with a
/// deterministic jitter so chains do not collapse onto a line.
fn seed_coordinates(mol: &GraphMol, targets: &[f64]) -> Vec<Point3<f64>> {
    let n = mol.atom_count();
    let mut coords = vec![Point3::origin(); n];
    let mut placed = vec![false; n];
    let mut rng = XorShift::new(0x6d6f_6c62_7269_6467);

    let directions = [
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(1.0, -1.0, -1.0),
        Vector3::new(-1.0, 1.0, -1.0),
        Vector3::new(-1.0, -1.0, 1.0),
    ];

    for start in 0..n {
        if placed[start] {
            continue;
        }
        // offset disconnected fragments so they never overlap
        coords[start] = Point3::new(start as f64 * 5.0, 0.0, 0.0);
        placed[start] = true;

        let mut queue = std::collections::VecDeque::from([start]);
        while let Some(parent) = queue.pop_front() {
            for (slot, &(child, bond)) in mol.adjacency[parent].iter().enumerate() {
                if placed[child] {
                    continue;
                }
                let jitter = Vector3::new(
                    rng.next_f64() - 0.5,
                    rng.next_f64() - 0.5,
                    rng.next_f64() - 0.5,
                ) * 0.2;
                let direction = (directions[slot % directions.len()] + jitter).normalize();
                coords[child] = coords[parent] + direction * targets[bond];
                placed[child] = true;
                queue.push_back(child);
            }
        }
    }

    coords
}

/// Steepest descent over harmonic bond terms, 1-3 angle distances, and a
/// short-range repulsion between non-bonded pairs.
fn refine(
    mol: &GraphMol,
    coords: &mut [Point3<f64>],
    targets: &[f64],
    forcefield: ForceField,
    steps: usize,
) {
    let n = coords.len();
    let angle_pairs = angle_targets(mol, targets);
    let repulsion = forcefield.repulsion();
    let step_size = 0.05;

    let mut gradient = vec![Vector3::zeros(); n];
    for _ in 0..steps {
        for g in gradient.iter_mut() {
            *g = Vector3::zeros();
        }

        for (bond, &target) in mol.bonds.iter().zip(targets.iter()) {
            accumulate_spring(coords, &mut gradient, bond.a, bond.b, target, 1.0);
        }
        for &(i, k, target) in &angle_pairs {
            accumulate_spring(coords, &mut gradient, i, k, target, 0.3);
        }

        // repulsion only when closer than the contact distance
        for i in 0..n {
            for k in (i + 1)..n {
                let delta = coords[k] - coords[i];
                let dist = delta.norm();
                let contact = 2.4;
                if dist > 1e-9 && dist < contact && !bonded(mol, i, k) {
                    let push = delta / dist * ((contact - dist) * repulsion);
                    gradient[i] -= push;
                    gradient[k] += push;
                }
            }
        }

        for (point, g) in coords.iter_mut().zip(gradient.iter()) {
            *point -= g * step_size;
        }
    }
}

fn bonded(mol: &GraphMol, a: usize, b: usize) -> bool {
    mol.adjacency[a].iter().any(|&(neighbor, _)| neighbor == b)
}

fn accumulate_spring(
    coords: &[Point3<f64>],
    gradient: &mut [Vector3<f64>],
    a: usize,
    b: usize,
    target: f64,
    weight: f64,
) {
    let delta = coords[b] - coords[a];
    let dist = delta.norm();
    if dist < 1e-9 {
        return;
    }
    let force = delta / dist * ((dist - target) * weight);
    gradient[a] -= force;
    gradient[b] += force;
}

/// 1-3 distance targets from idealized angles at the central atom.
fn angle_targets(mol: &GraphMol, targets: &[f64]) -> Vec<(usize, usize, f64)> {
    let mut pairs = Vec::new();
    for center in 0..mol.atom_count() {
        let neighbors = &mol.adjacency[center];
        if neighbors.len() < 2 {
            continue;
        }
        let angle = idealized_angle(mol, center).to_radians();
        for a in 0..neighbors.len() {
            for b in (a + 1)..neighbors.len() {
                let (i, bond_i) = neighbors[a];
                let (k, bond_k) = neighbors[b];
                let d1 = targets[bond_i];
                let d2 = targets[bond_k];
                let d13 = (d1 * d1 + d2 * d2 - 2.0 * d1 * d2 * angle.cos()).sqrt();
                pairs.push((i, k, d13));
            }
        }
    }
    pairs
}

fn idealized_angle(mol: &GraphMol, center: usize) -> f64 {
    let has_multiple_bond = mol.adjacency[center].iter().any(|&(_, bond)| {
        matches!(
            mol.bonds[bond].order,
            BondOrder::Double | BondOrder::Triple | BondOrder::Aromatic
        )
    });
    match mol.adjacency[center].len() {
        2 if has_multiple_bond => {
            if mol.adjacency[center]
                .iter()
                .any(|&(_, bond)| mol.bonds[bond].order == BondOrder::Triple)
            {
                180.0
            } else {
                120.0
            }
        }
        3 if has_multiple_bond || mol.atoms[center].is_aromatic => 120.0,
        _ => 109.5,
    }
}

struct XorShift {
    state: u64,
}

impl XorShift {
    fn new(seed: u64) -> Self {
        XorShift { state: if seed == 0 { 1 } else { seed } }
    }

    fn next_f64(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 11) as f64 / (1u64 << 53) as f64
    }
}
