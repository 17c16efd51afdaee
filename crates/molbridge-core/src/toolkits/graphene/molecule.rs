//! Molecular graph representation for the graph engine.

use nalgebra::Point3;

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Numeric bond order for valence calculations.
    pub fn as_f64(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }
}

/// An atom node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphAtom {
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub is_aromatic: bool,
    pub implicit_hydrogens: u8,
}

/// A bond edge between two atom indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphBond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
}

/// A molecular graph with optional conformer coordinates.
#[derive(Debug, Clone)]
pub struct GraphMol {
    pub title: String,
    pub atoms: Vec<GraphAtom>,
    pub bonds: Vec<GraphBond>,
    /// adjacency[atom] = (neighbor atom index, bond index) pairs
    pub adjacency: Vec<Vec<(usize, usize)>>,
    /// One point per atom when a conformer exists.
    pub coords: Option<Vec<Point3<f64>>>,
    /// Declared coordinate dimensionality of the conformer (2 or 3).
    pub dim: u8,
}

impl GraphMol {
    pub fn new(title: String, atoms: Vec<GraphAtom>, bonds: Vec<GraphBond>) -> Self {
        let adjacency = build_adjacency(atoms.len(), &bonds);
        GraphMol {
            title,
            atoms,
            bonds,
            adjacency,
            coords: None,
            dim: 0,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.atomic_number != 1).count()
    }

    /// Graph degree of an atom (explicit bonds only).
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Sum of formal charges.
    pub fn total_charge(&self) -> i32 {
        self.atoms.iter().map(|a| i32::from(a.formal_charge)).sum()
    }

    /// Explicit hydrogen atoms plus implicit hydrogen counts.
    pub fn total_hydrogen_count(&self) -> usize {
        let explicit = self.atoms.iter().filter(|a| a.atomic_number == 1).count();
        let implicit: usize = self
            .atoms
            .iter()
            .map(|a| a.implicit_hydrogens as usize)
            .sum();
        explicit + implicit
    }

    /// Sum of bond orders incident to an atom, integer-rounded.
    pub fn bond_order_sum(&self, atom: usize) -> usize {
        self.adjacency[atom]
            .iter()
            .map(|&(_, bond)| self.bonds[bond].order.as_f64())
            .sum::<f64>()
            .round() as usize
    }

    /// Rebuilds the adjacency list after direct atom/bond surgery.
    pub fn rebuild_adjacency(&mut self) {
        self.adjacency = build_adjacency(self.atoms.len(), &self.bonds);
    }

    /// Per-bond flags marking bonds that lie on a cycle.
    ///
    /// A bond is a ring bond iff its endpoints stay connected when the bond is
    /// removed. Molecular graphs are small enough that one BFS per bond is
    /// fine.
    pub fn ring_bonds(&self) -> Vec<bool> {
        (0..self.bonds.len())
            .map(|skip| {
                let bond = &self.bonds[skip];
                self.connected_without(bond.a, bond.b, skip)
            })
            .collect()
    }

    /// Per-atom flags marking atoms on at least one ring bond.
    pub fn ring_atoms(&self) -> Vec<bool> {
        let ring_bonds = self.ring_bonds();
        let mut flags = vec![false; self.atoms.len()];
        for (bond, &in_ring) in self.bonds.iter().zip(ring_bonds.iter()) {
            if in_ring {
                flags[bond.a] = true;
                flags[bond.b] = true;
            }
        }
        flags
    }

    /// Cyclomatic ring count: bonds - atoms + connected components.
    pub fn ring_count(&self) -> usize {
        let components = self.connected_components();
        (self.bond_count() + components).saturating_sub(self.atom_count())
    }

    fn connected_components(&self) -> usize {
        let n = self.atom_count();
        let mut seen = vec![false; n];
        let mut components = 0;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            components += 1;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(current) = stack.pop() {
                for &(neighbor, _) in &self.adjacency[current] {
                    if !seen[neighbor] {
                        seen[neighbor] = true;
                        stack.push(neighbor);
                    }
                }
            }
        }
        components
    }

    fn connected_without(&self, from: usize, to: usize, skip_bond: usize) -> bool {
        let mut seen = vec![false; self.atom_count()];
        let mut stack = vec![from];
        seen[from] = true;
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            for &(neighbor, bond) in &self.adjacency[current] {
                if bond != skip_bond && !seen[neighbor] {
                    seen[neighbor] = true;
                    stack.push(neighbor);
                }
            }
        }
        false
    }
}

fn build_adjacency(atom_count: usize, bonds: &[GraphBond]) -> Vec<Vec<(usize, usize)>> {
    let mut adjacency = vec![Vec::new(); atom_count];
    for (index, bond) in bonds.iter().enumerate() {
        adjacency[bond.a].push((bond.b, index));
        adjacency[bond.b].push((bond.a, index));
    }
    adjacency
}
