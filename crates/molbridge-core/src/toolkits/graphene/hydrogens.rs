//! Explicit hydrogen handling and pH-dependent protonation.

use nalgebra::Vector3;

use super::molecule::{BondOrder, GraphAtom, GraphBond, GraphMol};
use crate::toolkits::AddHydrogens;

// Approximate pKa values used for the pH correction: carboxylic acids
// lose their proton above 4.8, aliphatic amines gain one below 9.5.
const CARBOXYL_PKA: f64 = 4.8;
const AMINE_PKA: f64 = 9.5;

/// Turns implicit hydrogens into explicit atoms.
///
/// With `polar_only` set, only nitrogen, oxygen, and sulfur gain explicit
/// hydrogens. With `correct_for_ph`, protonation states are adjusted for
/// the given pH before any atoms are added.
pub fn add_hydrogens(mol: &mut GraphMol, opts: &AddHydrogens) {
    if opts.correct_for_ph {
        apply_ph(mol, opts.ph);
    }

    let heavy_count = mol.atom_count();
    let directions = [
        Vector3::new(0.6, 0.6, 0.6),
        Vector3::new(0.6, -0.6, -0.6),
        Vector3::new(-0.6, 0.6, -0.6),
        Vector3::new(-0.6, -0.6, 0.6),
    ];

    for parent in 0..heavy_count {
        let atom = &mol.atoms[parent];
        if atom.implicit_hydrogens == 0 {
            continue;
        }
        if opts.polar_only && !matches!(atom.atomic_number, 7 | 8 | 16) {
            continue;
        }

        let count = atom.implicit_hydrogens;
        mol.atoms[parent].implicit_hydrogens = 0;
        for slot in 0..count {
            let index = mol.atoms.len();
            mol.atoms.push(GraphAtom {
                atomic_number: 1,
                formal_charge: 0,
                is_aromatic: false,
                implicit_hydrogens: 0,
            });
            mol.bonds.push(GraphBond {
                a: parent,
                b: index,
                order: BondOrder::Single,
            });
            if let Some(coords) = mol.coords.as_mut() {
                let anchor = coords[parent];
                coords.push(anchor + directions[slot as usize % directions.len()]);
            }
        }
    }

    mol.rebuild_adjacency();
}

/// Deletes explicit hydrogen atoms, folding them back into the implicit
/// count of the heavy atom they were bonded to.
pub fn remove_hydrogens(mol: &mut GraphMol) {
    let n = mol.atom_count();
    let mut keep = vec![true; n];

    for (index, atom) in mol.atoms.iter().enumerate() {
        if atom.atomic_number != 1 {
            continue;
        }
        // only plain hydrogens bonded to exactly one heavy atom collapse
        if mol.adjacency[index].len() == 1 && atom.formal_charge == 0 {
            let (parent, _) = mol.adjacency[index][0];
            if mol.atoms[parent].atomic_number != 1 {
                keep[index] = false;
            }
        }
    }

    let mut remap = vec![usize::MAX; n];
    let mut next = 0;
    for index in 0..n {
        if keep[index] {
            remap[index] = next;
            next += 1;
        }
    }

    // credit each removed hydrogen to its parent before compacting
    let mut implicit_credit = vec![0u8; n];
    for (index, &kept) in keep.iter().enumerate() {
        if !kept {
            let (parent, _) = mol.adjacency[index][0];
            implicit_credit[parent] += 1;
        }
    }

    let mut atoms = Vec::with_capacity(next);
    for (index, atom) in mol.atoms.iter().enumerate() {
        if keep[index] {
            let mut atom = atom.clone();
            atom.implicit_hydrogens += implicit_credit[index];
            atoms.push(atom);
        }
    }

    let bonds: Vec<GraphBond> = mol
        .bonds
        .iter()
        .filter(|bond| keep[bond.a] && keep[bond.b])
        .map(|bond| GraphBond {
            a: remap[bond.a],
            b: remap[bond.b],
            order: bond.order,
        })
        .collect();

    if let Some(coords) = mol.coords.take() {
        mol.coords = Some(
            coords
                .into_iter()
                .enumerate()
                .filter(|(index, _)| keep[*index])
                .map(|(_, point)| point)
                .collect(),
        );
    }

    mol.atoms = atoms;
    mol.bonds = bonds;
    mol.rebuild_adjacency();
}

/// Shifts protonation states toward the given pH.
fn apply_ph(mol: &mut GraphMol, ph: f64) {
    for index in 0..mol.atom_count() {
        let atom = &mol.atoms[index];
        if atom.formal_charge != 0 {
            continue;
        }
        if atom.atomic_number == 8
            && ph > CARBOXYL_PKA
            && is_carboxyl_hydroxyl(mol, index)
            && mol.atoms[index].implicit_hydrogens > 0
        {
            mol.atoms[index].formal_charge = -1;
            mol.atoms[index].implicit_hydrogens -= 1;
        } else if atom.atomic_number == 7 && ph < AMINE_PKA && is_basic_amine(mol, index) {
            mol.atoms[index].formal_charge = 1;
            mol.atoms[index].implicit_hydrogens += 1;
        }
    }
}

/// Hydroxyl oxygen of a carboxylic acid: single-bonded to a carbon that
/// carries a double bond to another oxygen.
fn is_carboxyl_hydroxyl(mol: &GraphMol, oxygen: usize) -> bool {
    mol.adjacency[oxygen].iter().any(|&(carbon, bond)| {
        mol.atoms[carbon].atomic_number == 6
            && mol.bonds[bond].order == BondOrder::Single
            && mol.adjacency[carbon].iter().any(|&(other, other_bond)| {
                other != oxygen
                    && mol.atoms[other].atomic_number == 8
                    && mol.bonds[other_bond].order == BondOrder::Double
            })
    })
}

/// Aliphatic amine nitrogen: no multiple bonds, not aromatic, not an amide.
fn is_basic_amine(mol: &GraphMol, nitrogen: usize) -> bool {
    if mol.atoms[nitrogen].is_aromatic {
        return false;
    }
    let all_single = mol.adjacency[nitrogen]
        .iter()
        .all(|&(_, bond)| mol.bonds[bond].order == BondOrder::Single);
    if !all_single {
        return false;
    }
    // amide nitrogen: bonded to a carbonyl carbon
    let amide = mol.adjacency[nitrogen].iter().any(|&(carbon, _)| {
        mol.atoms[carbon].atomic_number == 6
            && mol.adjacency[carbon].iter().any(|&(other, other_bond)| {
                mol.atoms[other].atomic_number == 8
                    && mol.bonds[other_bond].order == BondOrder::Double
            })
    });
    !amide
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkits::graphene::smiles::parse_smiles;

    #[test]
    fn add_makes_hydrogens_explicit() {
        let mut mol = parse_smiles("CCO").unwrap();
        add_hydrogens(&mut mol, &AddHydrogens::default());
        assert_eq!(mol.atom_count(), 9);
        assert_eq!(mol.heavy_atom_count(), 3);
        assert!(mol.atoms.iter().all(|a| a.implicit_hydrogens == 0));
    }

    #[test]
    fn polar_only_skips_carbon() {
        let mut mol = parse_smiles("CCO").unwrap();
        add_hydrogens(
            &mut mol,
            &AddHydrogens { polar_only: true, ..AddHydrogens::default() },
        );
        // only the hydroxyl hydrogen becomes explicit
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.atoms[0].implicit_hydrogens, 3);
    }

    #[test]
    fn remove_restores_implicit_counts() {
        let mut mol = parse_smiles("CCO").unwrap();
        add_hydrogens(&mut mol, &AddHydrogens::default());
        remove_hydrogens(&mut mol);
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.total_hydrogen_count(), 6);
        assert_eq!(mol.bond_count(), 2);
    }

    #[test]
    fn ph_correction_deprotonates_acid() {
        let mut mol = parse_smiles("CC(=O)O").unwrap();
        add_hydrogens(
            &mut mol,
            &AddHydrogens { correct_for_ph: true, ph: 7.4, ..AddHydrogens::default() },
        );
        assert_eq!(mol.total_charge(), -1);
    }

    #[test]
    fn ph_correction_protonates_amine() {
        let mut mol = parse_smiles("CCN").unwrap();
        add_hydrogens(
            &mut mol,
            &AddHydrogens { correct_for_ph: true, ph: 7.4, ..AddHydrogens::default() },
        );
        assert_eq!(mol.total_charge(), 1);
        // protonated nitrogen carries three explicit hydrogens
        let n_index = mol
            .atoms
            .iter()
            .position(|a| a.atomic_number == 7)
            .unwrap();
        let h_neighbors = mol.adjacency[n_index]
            .iter()
            .filter(|&&(n, _)| mol.atoms[n].atomic_number == 1)
            .count();
        assert_eq!(h_neighbors, 3);
    }

    #[test]
    fn amide_nitrogen_is_not_protonated() {
        let mut mol = parse_smiles("CC(=O)NC").unwrap();
        add_hydrogens(
            &mut mol,
            &AddHydrogens { correct_for_ph: true, ph: 7.4, ..AddHydrogens::default() },
        );
        assert_eq!(mol.total_charge(), 0);
    }

    #[test]
    fn hydrogens_get_coordinates_when_conformer_exists() {
        use crate::toolkits::graphene::embed::{embed_3d, ForceField};
        let mut mol = parse_smiles("C").unwrap();
        embed_3d(&mut mol, ForceField::Uff, 10);
        add_hydrogens(&mut mol, &AddHydrogens::default());
        assert_eq!(mol.coords.as_ref().unwrap().len(), mol.atom_count());
    }
}
