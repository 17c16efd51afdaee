//! Morgan (ECFP-style) fingerprints and similarity metrics.

use super::molecule::{BondOrder, GraphMol};
use crate::toolkits::Fingerprint;

/// Fingerprint length used by the engine.
pub const DEFAULT_NBITS: usize = 2048;

/// Computes a Morgan fingerprint.
///
/// `radius` controls the neighborhood size (2 gives ECFP4, 3 gives ECFP6).
/// Atom environments are hashed with FNV-1a; neighbor contributions are
/// sorted before mixing so the result is invariant to atom ordering in
/// the input.
pub fn morgan_fingerprint(mol: &GraphMol, radius: usize, nbits: usize) -> Fingerprint {
    let n = mol.atom_count();
    let mut fp = Fingerprint::new(nbits);
    if n == 0 {
        return fp;
    }

    let ring_atoms = mol.ring_atoms();

    let mut identifiers: Vec<u64> = Vec::with_capacity(n);
    for (i, atom) in mol.atoms.iter().enumerate() {
        let mut h = FNV_OFFSET;
        h = fnv1a(h, u64::from(atom.atomic_number));
        h = fnv1a(h, mol.degree(i) as u64);
        h = fnv1a(h, u64::from(atom.implicit_hydrogens));
        h = fnv1a(h, atom.formal_charge as u64);
        h = fnv1a(h, u64::from(ring_atoms[i]));
        h = fnv1a(h, u64::from(atom.is_aromatic));
        identifiers.push(h);
    }

    for &id in &identifiers {
        fp.set_bit(id as usize % nbits);
    }

    for _ in 0..radius {
        let mut next: Vec<u64> = Vec::with_capacity(n);
        for i in 0..n {
            let mut h = FNV_OFFSET;
            h = fnv1a(h, identifiers[i]);

            let mut environment: Vec<(u64, u8)> = mol.adjacency[i]
                .iter()
                .map(|&(neighbor, bond)| {
                    (identifiers[neighbor], bond_code(mol.bonds[bond].order))
                })
                .collect();
            environment.sort_unstable();

            for (neighbor_id, order) in environment {
                h = fnv1a(h, neighbor_id);
                h = fnv1a(h, u64::from(order));
            }

            fp.set_bit(h as usize % nbits);
            next.push(h);
        }
        identifiers = next;
    }

    fp
}

/// Tanimoto coefficient: |A ∩ B| / |A ∪ B|. Two empty fingerprints count
/// as identical.
pub fn tanimoto(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let (and, or) = a.overlap(b);
    if or == 0 {
        return 1.0;
    }
    f64::from(and) / f64::from(or)
}

/// Dice coefficient: 2|A ∩ B| / (|A| + |B|).
pub fn dice(a: &Fingerprint, b: &Fingerprint) -> f64 {
    let (and, _) = a.overlap(b);
    let total = a.count_ones() + b.count_ones();
    if total == 0 {
        return 1.0;
    }
    2.0 * f64::from(and) / f64::from(total)
}

fn bond_code(order: BondOrder) -> u8 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
    }
}

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a(hash: u64, value: u64) -> u64 {
    let mut h = hash;
    for byte in value.to_le_bytes() {
        h ^= u64::from(byte);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkits::graphene::molecule::GraphMol;
    use crate::toolkits::graphene::smiles::parse_smiles;

    #[test]
    fn fingerprint_is_deterministic() {
        let mol = parse_smiles("CCO").unwrap();
        let fp1 = morgan_fingerprint(&mol, 2, DEFAULT_NBITS);
        let fp2 = morgan_fingerprint(&mol, 2, DEFAULT_NBITS);
        assert_eq!(fp1.overlap(&fp2).0, fp1.count_ones());
        assert!(fp1.count_ones() > 0);
    }

    #[test]
    fn fingerprint_ignores_atom_ordering() {
        // same molecule written from each end
        let fp1 = morgan_fingerprint(&parse_smiles("CCO").unwrap(), 2, DEFAULT_NBITS);
        let fp2 = morgan_fingerprint(&parse_smiles("OCC").unwrap(), 2, DEFAULT_NBITS);
        assert!((tanimoto(&fp1, &fp2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tanimoto_of_identical_is_one() {
        let fp = morgan_fingerprint(&parse_smiles("c1ccccc1").unwrap(), 2, DEFAULT_NBITS);
        assert!((tanimoto(&fp, &fp) - 1.0).abs() < 1e-12);
        assert!((dice(&fp, &fp) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn related_molecules_score_between_zero_and_one() {
        let fp1 = morgan_fingerprint(&parse_smiles("CCO").unwrap(), 2, DEFAULT_NBITS);
        let fp2 = morgan_fingerprint(&parse_smiles("CCCO").unwrap(), 2, DEFAULT_NBITS);
        let t = tanimoto(&fp1, &fp2);
        let d = dice(&fp1, &fp2);
        assert!(t > 0.0 && t < 1.0, "tanimoto = {t}");
        assert!(d > t, "dice ({d}) should exceed tanimoto ({t})");
    }

    #[test]
    fn larger_radius_sets_more_bits() {
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let r2 = morgan_fingerprint(&mol, 2, DEFAULT_NBITS);
        let r3 = morgan_fingerprint(&mol, 3, DEFAULT_NBITS);
        assert!(r3.count_ones() >= r2.count_ones());
    }

    #[test]
    fn empty_molecule_gives_empty_fingerprint() {
        let mol = GraphMol::new(String::new(), Vec::new(), Vec::new());
        let fp = morgan_fingerprint(&mol, 2, DEFAULT_NBITS);
        assert_eq!(fp.count_ones(), 0);
        let other = Fingerprint::new(DEFAULT_NBITS);
        assert!((tanimoto(&fp, &other) - 1.0).abs() < 1e-12);
    }
}
