//! SMILES reading and writing for the graph engine.
//!
//! The parser covers the organic subset, bracket atoms with charge and
//! explicit hydrogen counts, branches, ring closures (including `%nn`),
//! and disconnected fragments. Stereo markers are consumed and dropped.

use std::collections::BTreeMap;

use super::element::element_by_symbol;
use super::molecule::{BondOrder, GraphAtom, GraphBond, GraphMol};
use crate::toolkits::{ToolkitError, ToolkitResult};

/// Parses a SMILES line into a molecular graph.
///
/// Anything after the first whitespace is taken as the molecule title,
/// matching how `.smi` records carry names.
pub fn parse_smiles(line: &str) -> ToolkitResult<GraphMol> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let smiles = parts.next().unwrap_or_default();
    let title = parts.next().unwrap_or("").trim().to_string();

    let mut parser = SmilesParser::new(smiles);
    parser.run()?;
    parser.check_balanced()?;
    parser.assign_implicit_hydrogens();
    Ok(GraphMol::new(title, parser.atoms, parser.bonds))
}

struct SmilesParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<GraphAtom>,
    bonds: Vec<GraphBond>,
    /// Atoms written in bracket form carry their hydrogen count verbatim.
    bracketed: Vec<bool>,
    /// open_rings[digit] = (atom index, bond order noted at the opening)
    open_rings: BTreeMap<u16, (usize, Option<BondOrder>)>,
    branch_stack: Vec<usize>,
    prev_atom: Option<usize>,
    pending_bond: Option<BondOrder>,
}

impl<'a> SmilesParser<'a> {
    fn new(input: &'a str) -> Self {
        SmilesParser {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            bracketed: Vec::new(),
            open_rings: BTreeMap::new(),
            branch_stack: Vec::new(),
            prev_atom: None,
            pending_bond: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn run(&mut self) -> ToolkitResult<()> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    self.bump();
                    if let Some(prev) = self.prev_atom {
                        self.branch_stack.push(prev);
                    }
                }
                b')' => {
                    self.bump();
                    self.prev_atom = self.branch_stack.pop();
                    self.pending_bond = None;
                }
                b'-' => {
                    self.bump();
                    self.pending_bond = Some(BondOrder::Single);
                }
                b'=' => {
                    self.bump();
                    self.pending_bond = Some(BondOrder::Double);
                }
                b'#' => {
                    self.bump();
                    self.pending_bond = Some(BondOrder::Triple);
                }
                b':' => {
                    self.bump();
                    self.pending_bond = Some(BondOrder::Aromatic);
                }
                b'/' | b'\\' => {
                    // cis/trans markers, not modeled
                    self.bump();
                }
                b'.' => {
                    self.bump();
                    self.prev_atom = None;
                    self.pending_bond = None;
                }
                b'%' => {
                    self.bump();
                    let ring = self.two_digit_ring()?;
                    self.ring_closure(ring)?;
                }
                b'[' => self.bracket_atom()?,
                ch if ch.is_ascii_digit() => {
                    self.bump();
                    self.ring_closure(u16::from(ch - b'0'))?;
                }
                ch if is_organic_start(ch) => self.organic_atom()?,
                ch => {
                    return Err(ToolkitError::Parse(format!(
                        "unexpected character '{}' at position {} in SMILES",
                        ch as char, self.pos
                    )));
                }
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> ToolkitResult<()> {
        let ch = self.bump().ok_or_else(|| ToolkitError::Parse("truncated SMILES".into()))?;
        let is_aromatic = ch.is_ascii_lowercase();
        let upper = ch.to_ascii_uppercase();

        let symbol = match (upper, is_aromatic, self.peek()) {
            (b'B', false, Some(b'r')) => {
                self.bump();
                "Br"
            }
            (b'C', false, Some(b'l')) => {
                self.bump();
                "Cl"
            }
            (b'B', _, _) => "B",
            (b'C', _, _) => "C",
            (b'N', _, _) => "N",
            (b'O', _, _) => "O",
            (b'P', _, _) => "P",
            (b'S', _, _) => "S",
            (b'F', _, _) => "F",
            (b'I', _, _) => "I",
            _ => {
                return Err(ToolkitError::Parse(format!(
                    "unknown organic-subset atom '{}'",
                    upper as char
                )));
            }
        };

        let elem = element_by_symbol(symbol)
            .ok_or_else(|| ToolkitError::Parse(format!("unknown element '{symbol}'")))?;

        self.push_atom(
            GraphAtom {
                atomic_number: elem.atomic_number,
                formal_charge: 0,
                is_aromatic,
                implicit_hydrogens: 0,
            },
            false,
        );
        Ok(())
    }

    fn bracket_atom(&mut self) -> ToolkitResult<()> {
        self.bump(); // '['

        // Isotope prefix is accepted and dropped.
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }

        let ch = self
            .bump()
            .ok_or_else(|| ToolkitError::Parse("unterminated bracket atom".into()))?;
        let is_aromatic = ch.is_ascii_lowercase();
        let upper = ch.to_ascii_uppercase();

        let symbol = match self.peek() {
            Some(next) if next.is_ascii_lowercase() && next != b'@' => {
                let two = format!("{}{}", upper as char, next as char);
                if element_by_symbol(&two).is_some() {
                    self.bump();
                    two
                } else {
                    (upper as char).to_string()
                }
            }
            _ => (upper as char).to_string(),
        };

        let elem = element_by_symbol(&symbol)
            .ok_or_else(|| ToolkitError::Parse(format!("unknown element '{symbol}'")))?;

        while self.peek() == Some(b'@') {
            self.bump();
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.bump();
            hydrogens = match self.peek() {
                Some(d) if d.is_ascii_digit() => {
                    self.bump();
                    d - b'0'
                }
                _ => 1,
            };
        }

        let charge = self.bracket_charge();

        if self.bump() != Some(b']') {
            return Err(ToolkitError::Parse("expected ']' closing bracket atom".into()));
        }

        self.push_atom(
            GraphAtom {
                atomic_number: elem.atomic_number,
                formal_charge: charge,
                is_aromatic,
                implicit_hydrogens: hydrogens,
            },
            true,
        );
        Ok(())
    }

    fn bracket_charge(&mut self) -> i8 {
        let sign: i8 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return 0,
        };
        self.bump();
        match self.peek() {
            Some(d) if d.is_ascii_digit() => {
                self.bump();
                sign * (d - b'0') as i8
            }
            Some(c) if (c == b'+' && sign > 0) || (c == b'-' && sign < 0) => {
                let mut magnitude = 1i8;
                while self.peek() == Some(c) {
                    self.bump();
                    magnitude += 1;
                }
                sign * magnitude
            }
            _ => sign,
        }
    }

    fn two_digit_ring(&mut self) -> ToolkitResult<u16> {
        let d1 = self.bump();
        let d2 = self.bump();
        match (d1, d2) {
            (Some(a), Some(b)) if a.is_ascii_digit() && b.is_ascii_digit() => {
                Ok(u16::from(a - b'0') * 10 + u16::from(b - b'0'))
            }
            _ => Err(ToolkitError::Parse("expected two digits after '%'".into())),
        }
    }

    fn ring_closure(&mut self, ring: u16) -> ToolkitResult<()> {
        let current = self
            .prev_atom
            .ok_or_else(|| ToolkitError::Parse("ring closure before any atom".into()))?;

        if let Some((open_atom, open_order)) = self.open_rings.remove(&ring) {
            let both_aromatic =
                self.atoms[open_atom].is_aromatic && self.atoms[current].is_aromatic;
            let order = self
                .pending_bond
                .take()
                .or(open_order)
                .unwrap_or(if both_aromatic {
                    BondOrder::Aromatic
                } else {
                    BondOrder::Single
                });
            self.bonds.push(GraphBond { a: open_atom, b: current, order });
        } else {
            self.open_rings.insert(ring, (current, self.pending_bond.take()));
        }
        Ok(())
    }

    fn push_atom(&mut self, atom: GraphAtom, bracketed: bool) {
        let index = self.atoms.len();
        let is_aromatic = atom.is_aromatic;
        self.atoms.push(atom);
        self.bracketed.push(bracketed);

        if let Some(prev) = self.prev_atom {
            let both_aromatic = self.atoms[prev].is_aromatic && is_aromatic;
            let order = self.pending_bond.take().unwrap_or(if both_aromatic {
                BondOrder::Aromatic
            } else {
                BondOrder::Single
            });
            self.bonds.push(GraphBond { a: prev, b: index, order });
        }
        self.pending_bond = None;
        self.prev_atom = Some(index);
    }

    fn check_balanced(&self) -> ToolkitResult<()> {
        if !self.open_rings.is_empty() {
            let open: Vec<u16> = self.open_rings.keys().copied().collect();
            return Err(ToolkitError::Parse(format!(
                "unmatched ring closure(s): {open:?}"
            )));
        }
        if !self.branch_stack.is_empty() {
            return Err(ToolkitError::Parse(format!(
                "{} unclosed '(' in SMILES",
                self.branch_stack.len()
            )));
        }
        Ok(())
    }

    /// Fills in hydrogen counts for organic-subset atoms from standard
    /// valences. Bracket atoms keep the count written in the input.
    fn assign_implicit_hydrogens(&mut self) {
        for i in 0..self.atoms.len() {
            if self.bracketed[i] {
                continue;
            }
            let Some(target) = default_valence(self.atoms[i].atomic_number) else {
                continue;
            };
            let used = if self.atoms[i].is_aromatic {
                // one electron is committed to the aromatic system
                self.bond_degree(i) + 1
            } else {
                self.bond_order_sum(i)
            };
            self.atoms[i].implicit_hydrogens = target.saturating_sub(used) as u8;
        }
    }

    fn bond_degree(&self, atom: usize) -> usize {
        self.bonds.iter().filter(|b| b.a == atom || b.b == atom).count()
    }

    fn bond_order_sum(&self, atom: usize) -> usize {
        self.bonds
            .iter()
            .filter(|b| b.a == atom || b.b == atom)
            .map(|b| b.order.as_f64())
            .sum::<f64>()
            .round() as usize
    }
}

fn is_organic_start(ch: u8) -> bool {
    matches!(
        ch,
        b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I'
            | b'b' | b'c' | b'n' | b'o' | b'p' | b's'
    )
}

fn default_valence(atomic_number: u8) -> Option<usize> {
    match atomic_number {
        5 | 7 | 15 => Some(3),
        6 => Some(4),
        8 | 16 => Some(2),
        9 | 17 | 35 | 53 => Some(1),
        _ => None,
    }
}

/// Serializes a molecular graph back to SMILES.
///
/// A first DFS classifies bonds into spanning-tree bonds and ring-closure
/// bonds and assigns closure digits; a second walk in the same order emits
/// the string. Output is valid but not canonical.
pub fn write_smiles(mol: &GraphMol) -> String {
    let mut writer = SmilesWriter::new(mol);
    writer.classify();
    writer.emit();
    writer.out
}

struct SmilesWriter<'a> {
    mol: &'a GraphMol,
    visited: Vec<bool>,
    /// tree_bonds[bond] = true when the bond is on the spanning tree
    tree_bonds: Vec<bool>,
    /// closures[atom] = (digit, bond) pairs this atom must emit
    closures: Vec<Vec<(u16, usize)>>,
    next_digit: u16,
    out: String,
}

impl<'a> SmilesWriter<'a> {
    fn new(mol: &'a GraphMol) -> Self {
        SmilesWriter {
            mol,
            visited: vec![false; mol.atom_count()],
            tree_bonds: vec![false; mol.bond_count()],
            closures: vec![Vec::new(); mol.atom_count()],
            next_digit: 1,
            out: String::new(),
        }
    }

    fn classify(&mut self) {
        let mut bond_seen = vec![false; self.mol.bond_count()];
        for start in 0..self.mol.atom_count() {
            if self.visited[start] {
                continue;
            }
            let mut stack = vec![start];
            self.visited[start] = true;
            while let Some(atom) = stack.pop() {
                for &(neighbor, bond) in &self.mol.adjacency[atom] {
                    if bond_seen[bond] {
                        continue;
                    }
                    bond_seen[bond] = true;
                    if self.visited[neighbor] {
                        // back edge: both endpoints emit the same digit
                        let digit = self.next_digit;
                        self.next_digit += 1;
                        self.closures[atom].push((digit, bond));
                        self.closures[neighbor].push((digit, bond));
                    } else {
                        self.tree_bonds[bond] = true;
                        self.visited[neighbor] = true;
                        stack.push(neighbor);
                    }
                }
            }
        }
        self.visited.fill(false);
    }

    fn emit(&mut self) {
        let mut first = true;
        for start in 0..self.mol.atom_count() {
            if self.visited[start] {
                continue;
            }
            if !first {
                self.out.push('.');
            }
            first = false;
            self.walk(start, None);
        }
    }

    fn walk(&mut self, atom: usize, from_bond: Option<usize>) {
        self.visited[atom] = true;

        if let Some(bond) = from_bond {
            self.write_bond(bond);
        }
        self.write_atom(atom);

        for (digit, bond) in self.closures[atom].clone() {
            self.write_bond(bond);
            self.write_ring_digit(digit);
        }

        let children: Vec<(usize, usize)> = self.mol.adjacency[atom]
            .iter()
            .copied()
            .filter(|&(n, b)| self.tree_bonds[b] && !self.visited[n])
            .collect();
        for (index, &(neighbor, bond)) in children.iter().enumerate() {
            if self.visited[neighbor] {
                continue;
            }
            let last = index == children.len() - 1;
            if last {
                self.walk(neighbor, Some(bond));
            } else {
                self.out.push('(');
                self.walk(neighbor, Some(bond));
                self.out.push(')');
            }
        }
    }

    fn write_ring_digit(&mut self, digit: u16) {
        if digit < 10 {
            self.out.push((b'0' + digit as u8) as char);
        } else {
            self.out.push('%');
            self.out.push_str(&format!("{digit:02}"));
        }
    }

    fn write_bond(&mut self, bond: usize) {
        let edge = &self.mol.bonds[bond];
        let both_aromatic =
            self.mol.atoms[edge.a].is_aromatic && self.mol.atoms[edge.b].is_aromatic;
        match edge.order {
            BondOrder::Single => {}
            BondOrder::Double => self.out.push('='),
            BondOrder::Triple => self.out.push('#'),
            BondOrder::Aromatic if both_aromatic => {}
            BondOrder::Aromatic => self.out.push(':'),
        }
    }

    fn write_atom(&mut self, atom: usize) {
        let a = &self.mol.atoms[atom];
        let symbol = super::element::element_by_number(a.atomic_number)
            .map(|e| e.symbol)
            .unwrap_or("*");

        let needs_bracket = a.formal_charge != 0
            || a.atomic_number == 1
            || default_valence(a.atomic_number).is_none()
            || self.implicit_h_mismatch(atom);

        if !needs_bracket {
            if a.is_aromatic {
                self.out.push_str(&symbol.to_ascii_lowercase());
            } else {
                self.out.push_str(symbol);
            }
            return;
        }

        self.out.push('[');
        if a.is_aromatic {
            self.out.push_str(&symbol.to_ascii_lowercase());
        } else {
            self.out.push_str(symbol);
        }
        match a.implicit_hydrogens {
            0 => {}
            1 => self.out.push('H'),
            n => self.out.push_str(&format!("H{n}")),
        }
        match a.formal_charge {
            0 => {}
            1 => self.out.push('+'),
            -1 => self.out.push('-'),
            c if c > 0 => self.out.push_str(&format!("+{c}")),
            c => self.out.push_str(&format!("-{}", -c)),
        }
        self.out.push(']');
    }

    /// True when the default-valence rule would not reproduce the stored
    /// hydrogen count, so it must be written explicitly.
    fn implicit_h_mismatch(&self, atom: usize) -> bool {
        let a = &self.mol.atoms[atom];
        let Some(target) = default_valence(a.atomic_number) else {
            return a.implicit_hydrogens > 0;
        };
        let used = if a.is_aromatic {
            self.mol.degree(atom) + 1
        } else {
            self.mol.bond_order_sum(atom)
        };
        target.saturating_sub(used) as u8 != a.implicit_hydrogens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_methane() {
        let mol = parse_smiles("C").unwrap();
        assert_eq!(mol.atom_count(), 1);
        assert_eq!(mol.atoms[0].atomic_number, 6);
        assert_eq!(mol.atoms[0].implicit_hydrogens, 4);
    }

    #[test]
    fn parses_ethanol_with_hydrogen_counts() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.atoms[0].implicit_hydrogens, 3);
        assert_eq!(mol.atoms[1].implicit_hydrogens, 2);
        assert_eq!(mol.atoms[2].implicit_hydrogens, 1);
    }

    #[test]
    fn parses_benzene_as_aromatic_ring() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 6);
        for atom in &mol.atoms {
            assert!(atom.is_aromatic);
            assert_eq!(atom.implicit_hydrogens, 1);
        }
        assert_eq!(mol.ring_count(), 1);
    }

    #[test]
    fn parses_branches_and_double_bonds() {
        let mol = parse_smiles("CC(=O)O").unwrap(); // acetic acid
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(mol.bonds[1].order, BondOrder::Double);
        assert_eq!(mol.atoms[3].implicit_hydrogens, 1);
    }

    #[test]
    fn parses_bracket_atoms_with_charge() {
        let mol = parse_smiles("[NH4+]").unwrap();
        assert_eq!(mol.atoms[0].atomic_number, 7);
        assert_eq!(mol.atoms[0].formal_charge, 1);
        assert_eq!(mol.atoms[0].implicit_hydrogens, 4);

        let anion = parse_smiles("[O-]").unwrap();
        assert_eq!(anion.atoms[0].formal_charge, -1);
    }

    #[test]
    fn title_is_taken_from_trailing_text() {
        let mol = parse_smiles("CCO ethanol").unwrap();
        assert_eq!(mol.title, "ethanol");
        assert_eq!(mol.atom_count(), 3);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_smiles("C(").is_err());
        assert!(parse_smiles("C1CC").is_err());
        assert!(parse_smiles("[").is_err());
        assert!(parse_smiles("Cz").is_err());
    }

    #[test]
    fn written_smiles_reparses_to_same_graph() {
        for input in ["CCO", "CC(=O)Oc1ccccc1C(=O)O", "C1CCCCC1", "[NH4+].[Cl-]"] {
            let mol = parse_smiles(input).unwrap();
            let text = write_smiles(&mol);
            let reparsed = parse_smiles(&text).unwrap();
            assert_eq!(reparsed.atom_count(), mol.atom_count(), "for {input}");
            assert_eq!(reparsed.bond_count(), mol.bond_count(), "for {input}");
            assert_eq!(reparsed.total_charge(), mol.total_charge(), "for {input}");
        }
    }

    #[test]
    fn two_digit_ring_closures() {
        let mol = parse_smiles("C%10CCCCCCCCC%10").unwrap();
        assert_eq!(mol.atom_count(), 10);
        assert_eq!(mol.bond_count(), 10);
    }
}
