//! Molecular descriptors and formula generation.

use std::collections::BTreeMap;

use super::element::element_by_number;
use super::molecule::{BondOrder, GraphMol};

/// Computes the descriptor set reported by the engine.
pub fn compute(mol: &GraphMol) -> BTreeMap<String, f64> {
    let ring_bonds = mol.ring_bonds();
    let mut out = BTreeMap::new();
    out.insert("atoms".to_string(), mol.atom_count() as f64);
    out.insert("bonds".to_string(), mol.bond_count() as f64);
    out.insert("molwt".to_string(), molecular_weight(mol));
    out.insert("exactmass".to_string(), molecular_weight(mol));
    out.insert("heavy_atoms".to_string(), mol.heavy_atom_count() as f64);
    out.insert("hbd".to_string(), hbd_count(mol) as f64);
    out.insert("hba".to_string(), hba_count(mol) as f64);
    out.insert(
        "rotatable_bonds".to_string(),
        rotatable_bond_count(mol, &ring_bonds) as f64,
    );
    out.insert("rings".to_string(), mol.ring_count() as f64);
    out.insert(
        "aromatic_atoms".to_string(),
        mol.atoms.iter().filter(|a| a.is_aromatic).count() as f64,
    );
    out.insert("charge".to_string(), f64::from(mol.total_charge()));
    out
}

/// Sum of atomic weights, counting implicit hydrogens.
pub fn molecular_weight(mol: &GraphMol) -> f64 {
    const H_WEIGHT: f64 = 1.008;
    let mut mw = 0.0;
    for atom in &mol.atoms {
        if let Some(elem) = element_by_number(atom.atomic_number) {
            mw += elem.atomic_weight;
        }
        mw += f64::from(atom.implicit_hydrogens) * H_WEIGHT;
    }
    mw
}

/// Molecular formula in Hill order: C first, then H, then the rest
/// alphabetically.
pub fn formula(mol: &GraphMol) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for atom in &mol.atoms {
        if let Some(elem) = element_by_number(atom.atomic_number) {
            *counts.entry(elem.symbol).or_insert(0) += 1;
        }
        if atom.implicit_hydrogens > 0 {
            *counts.entry("H").or_insert(0) += atom.implicit_hydrogens as usize;
        }
    }

    let mut out = String::new();
    let mut push = |symbol: &str, count: usize| {
        out.push_str(symbol);
        if count > 1 {
            out.push_str(&count.to_string());
        }
    };

    if let Some(carbons) = counts.remove("C") {
        push("C", carbons);
        if let Some(hydrogens) = counts.remove("H") {
            push("H", hydrogens);
        }
    }
    for (symbol, count) in counts {
        push(symbol, count);
    }
    out
}

/// Nitrogen or oxygen atoms carrying at least one hydrogen.
fn hbd_count(mol: &GraphMol) -> usize {
    mol.atoms
        .iter()
        .enumerate()
        .filter(|(i, a)| {
            (a.atomic_number == 7 || a.atomic_number == 8)
                && (a.implicit_hydrogens > 0 || has_explicit_h(mol, *i))
        })
        .count()
}

fn has_explicit_h(mol: &GraphMol, atom: usize) -> bool {
    mol.adjacency[atom]
        .iter()
        .any(|&(n, _)| mol.atoms[n].atomic_number == 1)
}

/// Nitrogen and oxygen atoms.
fn hba_count(mol: &GraphMol) -> usize {
    mol.atoms
        .iter()
        .filter(|a| a.atomic_number == 7 || a.atomic_number == 8)
        .count()
}

/// Single non-ring bonds between non-terminal heavy atoms, excluding
/// amide C-N bonds.
fn rotatable_bond_count(mol: &GraphMol, ring_bonds: &[bool]) -> usize {
    mol.bonds
        .iter()
        .enumerate()
        .filter(|&(index, bond)| {
            bond.order == BondOrder::Single
                && !ring_bonds[index]
                && mol.degree(bond.a) > 1
                && mol.degree(bond.b) > 1
                && !is_amide_bond(mol, bond.a, bond.b)
        })
        .count()
}

fn is_amide_bond(mol: &GraphMol, a: usize, b: usize) -> bool {
    let (carbon, nitrogen) = match (mol.atoms[a].atomic_number, mol.atoms[b].atomic_number) {
        (6, 7) => (a, b),
        (7, 6) => (b, a),
        _ => return false,
    };
    mol.adjacency[carbon].iter().any(|&(neighbor, bond)| {
        neighbor != nitrogen
            && mol.atoms[neighbor].atomic_number == 8
            && mol.bonds[bond].order == BondOrder::Double
    })
}
