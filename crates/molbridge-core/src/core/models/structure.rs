use nalgebra::Point3;

/// A single atom record from a structural (PDB-style) file.
#[derive(Debug, Clone, PartialEq)]
pub struct StructAtom {
    pub serial: u32,
    /// Atom name with its original column padding (e.g. `" CA "`).
    pub name: String,
    pub alt_loc: Option<char>,
    pub coords: Point3<f64>,
    pub occupancy: f64,
    pub temp_factor: f64,
    pub element: Option<String>,
    pub charge: Option<i8>,
    pub is_hetatm: bool,
}

/// A residue: a named group of atoms with a sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub name: String,
    pub seq_num: i32,
    pub i_code: Option<char>,
    pub atoms: Vec<StructAtom>,
}

/// A chain of residues identified by a single character.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: char,
    pub residues: Vec<Residue>,
}

impl Chain {
    pub fn new(id: char, residues: Vec<Residue>) -> Self {
        Chain { id, residues }
    }

    pub fn atom_count(&self) -> usize {
        self.residues.iter().map(|r| r.atoms.len()).sum()
    }
}

/// One coordinate model. Most crystal structures have exactly one; NMR
/// ensembles carry several.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub serial: i32,
    pub chains: Vec<Chain>,
}

/// A parsed structural file: an identifier plus one or more models.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub id: String,
    pub models: Vec<Model>,
}

impl Structure {
    /// The first model, which backend operations act on.
    pub fn first_model(&self) -> Option<&Model> {
        self.models.first()
    }

    pub fn atom_count(&self) -> usize {
        self.models
            .iter()
            .flat_map(|m| &m.chains)
            .map(|c| c.atom_count())
            .sum()
    }

    /// Iterates over all atoms of the first model.
    pub fn atoms(&self) -> impl Iterator<Item = &StructAtom> {
        self.first_model()
            .into_iter()
            .flat_map(|m| &m.chains)
            .flat_map(|c| &c.residues)
            .flat_map(|r| &r.atoms)
    }

    /// Mutable access to all atoms of every model.
    pub fn atoms_mut(&mut self) -> impl Iterator<Item = &mut StructAtom> {
        self.models
            .iter_mut()
            .flat_map(|m| &mut m.chains)
            .flat_map(|c| &mut c.residues)
            .flat_map(|r| &mut r.atoms)
    }

    /// Removes every residue whose name matches one in `names`
    /// (case-insensitive) from every chain of every model, then drops chains
    /// left empty. Returns the names of the removed residues in encounter
    /// order.
    pub fn remove_residues(&mut self, names: &[String]) -> Vec<String> {
        let upper: Vec<String> = names.iter().map(|n| n.to_uppercase()).collect();
        let mut removed = Vec::new();

        for model in &mut self.models {
            for chain in &mut model.chains {
                chain.residues.retain(|residue| {
                    if upper.contains(&residue.name.to_uppercase()) {
                        removed.push(residue.name.clone());
                        false
                    } else {
                        true
                    }
                });
            }
            model.chains.retain(|chain| !chain.residues.is_empty());
        }

        removed
    }

    /// True when an atom record looks like a hydrogen, judged by the element
    /// column when present and the atom name otherwise.
    pub fn is_hydrogen(atom: &StructAtom) -> bool {
        if let Some(element) = atom.element.as_deref() {
            return element.eq_ignore_ascii_case("H") || element.eq_ignore_ascii_case("D");
        }
        matches!(
            atom.name.trim().chars().next().map(|c| c.to_ascii_uppercase()),
            Some('H') | Some('D')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(name: &str, element: &str) -> StructAtom {
        StructAtom {
            serial: 1,
            name: name.to_string(),
            alt_loc: None,
            coords: Point3::new(0.0, 0.0, 0.0),
            occupancy: 1.0,
            temp_factor: 0.0,
            element: Some(element.to_string()),
            charge: None,
            is_hetatm: false,
        }
    }

    fn residue(name: &str) -> Residue {
        Residue {
            name: name.to_string(),
            seq_num: 1,
            i_code: None,
            atoms: vec![atom("CA", "C")],
        }
    }

    fn structure(chains: Vec<Chain>) -> Structure {
        Structure {
            id: "TEST".to_string(),
            models: vec![Model { serial: 1, chains }],
        }
    }

    #[test]
    fn remove_residues_is_case_insensitive() {
        let mut s = structure(vec![Chain::new(
            'A',
            vec![residue("HOH"), residue("ALA")],
        )]);
        let removed = s.remove_residues(&["hoh".to_string()]);
        assert_eq!(removed, vec!["HOH".to_string()]);
        assert_eq!(s.models[0].chains[0].residues.len(), 1);
        assert_eq!(s.models[0].chains[0].residues[0].name, "ALA");
    }

    #[test]
    fn fully_removed_chain_is_dropped() {
        let mut s = structure(vec![
            Chain::new('A', vec![residue("HOH"), residue("HOH")]),
            Chain::new('B', vec![residue("GLY")]),
        ]);
        s.remove_residues(&["HOH".to_string()]);
        assert_eq!(s.models[0].chains.len(), 1);
        assert_eq!(s.models[0].chains[0].id, 'B');
    }

    #[test]
    fn removal_spans_all_models() {
        let mut s = Structure {
            id: "NMR".to_string(),
            models: vec![
                Model {
                    serial: 1,
                    chains: vec![Chain::new('A', vec![residue("HOH"), residue("ALA")])],
                },
                Model {
                    serial: 2,
                    chains: vec![Chain::new('A', vec![residue("HOH"), residue("ALA")])],
                },
            ],
        };
        let removed = s.remove_residues(&["HOH".to_string()]);
        assert_eq!(removed.len(), 2);
        for model in &s.models {
            assert_eq!(model.chains[0].residues.len(), 1);
        }
    }

    #[test]
    fn hydrogen_detection_prefers_element_column() {
        assert!(Structure::is_hydrogen(&atom(" HB2", "H")));
        assert!(!Structure::is_hydrogen(&atom(" HG ", "HG")));
        let mut unnamed = atom(" HB2", "H");
        unnamed.element = None;
        assert!(Structure::is_hydrogen(&unnamed));
    }
}
