//! Permissive fixed-column PDB reader and writer.
//!
//! Parses ATOM, HETATM, TER, HEADER and MODEL/ENDMDL records. All models of a
//! multi-model (NMR) file are kept. Malformed atom records are skipped with a
//! warning rather than aborting the parse.

use crate::core::models::structure::{Chain, Model, Residue, StructAtom, Structure};
use nalgebra::Point3;
use std::fmt::Write as _;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("no ATOM records found")]
    Empty,
    #[error("malformed {record} record: {reason}")]
    Malformed {
        record: &'static str,
        reason: String,
    },
}

/// Parses PDB-format text into a [`Structure`].
///
/// # Errors
///
/// Returns [`PdbError::Empty`] when not a single atom record could be read.
pub fn parse_pdb(input: &str) -> Result<Structure, PdbError> {
    let mut builder = ModelBuilder::default();
    let mut id = String::from("UNKN");
    let mut models: Vec<Model> = Vec::new();
    let mut model_serial: i32 = 1;
    let mut atom_count = 0usize;

    for line in input.lines() {
        if line.starts_with("HEADER") && line.len() >= 66 {
            let pdb_id = slice(line, 62, 66).trim();
            if !pdb_id.is_empty() {
                id = pdb_id.to_string();
            }
            continue;
        }

        if line.starts_with("MODEL") {
            if let Some(model) = builder.finish(model_serial) {
                models.push(model);
            }
            model_serial = slice(line, 10, 14).trim().parse().unwrap_or(model_serial + 1);
            continue;
        }

        if line.starts_with("ENDMDL") {
            if let Some(model) = builder.finish(model_serial) {
                models.push(model);
            }
            continue;
        }

        if line.starts_with("TER") {
            builder.flush_chain();
            continue;
        }

        let is_atom = line.starts_with("ATOM  ");
        let is_hetatm = line.starts_with("HETATM");
        if !(is_atom || is_hetatm) {
            continue;
        }

        match parse_atom_record(line, is_hetatm) {
            Ok(atom) => {
                let chain_id = slice(line, 21, 22).chars().next().unwrap_or(' ');
                let seq_num = slice(line, 22, 26).trim().parse::<i32>().unwrap_or(0);
                let i_code = slice(line, 26, 27).chars().next().filter(|c| *c != ' ');
                let res_name = slice(line, 17, 20).trim().to_string();
                builder.push(atom, chain_id, seq_num, i_code, res_name);
                atom_count += 1;
            }
            Err(err) => warn!("Skipping malformed PDB record: {}", err),
        }
    }

    if let Some(model) = builder.finish(model_serial) {
        models.push(model);
    }

    if atom_count == 0 {
        return Err(PdbError::Empty);
    }

    Ok(Structure { id, models })
}

/// Serializes a [`Structure`] back into PDB text.
///
/// Each chain ends with a TER record; MODEL/ENDMDL wrappers are emitted only
/// for multi-model structures. The output always ends with END.
pub fn write_pdb(structure: &Structure) -> String {
    let mut out = String::new();
    let multi_model = structure.models.len() > 1;

    for model in &structure.models {
        if multi_model {
            let _ = writeln!(out, "MODEL     {:>4}", model.serial);
        }
        for chain in &model.chains {
            let mut last: Option<&StructAtom> = None;
            let mut last_residue: Option<&Residue> = None;
            for residue in &chain.residues {
                for atom in &residue.atoms {
                    write_atom_record(&mut out, atom, chain.id, residue);
                    last = Some(atom);
                    last_residue = Some(residue);
                }
            }
            if let (Some(atom), Some(residue)) = (last, last_residue) {
                let _ = writeln!(
                    out,
                    "TER   {:>5}      {:<3} {}{:>4}{}",
                    atom.serial + 1,
                    residue.name,
                    chain.id,
                    residue.seq_num,
                    residue.i_code.unwrap_or(' '),
                );
            }
        }
        if multi_model {
            out.push_str("ENDMDL\n");
        }
    }

    out.push_str("END\n");
    out
}

fn write_atom_record(out: &mut String, atom: &StructAtom, chain_id: char, residue: &Residue) {
    let record = if atom.is_hetatm { "HETATM" } else { "ATOM  " };
    let name = pad_atom_name(&atom.name);
    let element = atom.element.as_deref().unwrap_or("");
    let charge = match atom.charge {
        Some(c) if c > 0 => format!("{}+", c),
        Some(c) if c < 0 => format!("{}-", -c),
        _ => String::new(),
    };
    let _ = writeln!(
        out,
        "{record}{:>5} {name}{}{:<3} {}{:>4}{}   {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}{:<2}",
        atom.serial,
        atom.alt_loc.unwrap_or(' '),
        residue.name,
        chain_id,
        residue.seq_num,
        residue.i_code.unwrap_or(' '),
        atom.coords.x,
        atom.coords.y,
        atom.coords.z,
        atom.occupancy,
        atom.temp_factor,
        element,
        charge,
    );
}

/// Atom names occupy columns 13-16; names of up to three characters start in
/// column 14 by convention.
fn pad_atom_name(name: &str) -> String {
    if name.len() >= 4 {
        slice(name, 0, 4).to_string()
    } else {
        let trimmed = name.trim();
        if trimmed.len() < 4 && name.len() == name.trim_start().len() && trimmed.len() <= 3 {
            format!(" {:<3}", trimmed)
        } else {
            format!("{:<4}", name)
        }
    }
}

fn parse_atom_record(line: &str, is_hetatm: bool) -> Result<StructAtom, PdbError> {
    if line.len() < 54 {
        return Err(PdbError::Malformed {
            record: "ATOM",
            reason: format!("record too short ({} chars)", line.len()),
        });
    }

    let serial = slice(line, 6, 11)
        .trim()
        .parse::<u32>()
        .map_err(|e| PdbError::Malformed {
            record: "ATOM",
            reason: format!("bad serial: {}", e),
        })?;
    let name = slice(line, 12, 16).to_string();
    let alt_loc = slice(line, 16, 17).chars().next().filter(|c| *c != ' ');

    let coord = |start, end, axis| {
        slice(line, start, end)
            .trim()
            .parse::<f64>()
            .map_err(|e| PdbError::Malformed {
                record: "ATOM",
                reason: format!("bad {} coordinate: {}", axis, e),
            })
    };
    let x = coord(30, 38, "x")?;
    let y = coord(38, 46, "y")?;
    let z = coord(46, 54, "z")?;

    let occupancy = slice(line, 54, 60).trim().parse::<f64>().unwrap_or(1.0);
    let temp_factor = slice(line, 60, 66).trim().parse::<f64>().unwrap_or(0.0);
    let element = {
        let e = slice(line, 76, 78).trim();
        if e.is_empty() { None } else { Some(e.to_string()) }
    };
    let charge = parse_charge(slice(line, 78, 80).trim());

    Ok(StructAtom {
        serial,
        name,
        alt_loc,
        coords: Point3::new(x, y, z),
        occupancy,
        temp_factor,
        element,
        charge,
        is_hetatm,
    })
}

/// PDB charges are written `2+` / `1-`; some producers emit `+2` / `-1`.
fn parse_charge(s: &str) -> Option<i8> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let (digit, sign) = match (bytes[0], bytes[1]) {
        (d, b'+') if d.is_ascii_digit() => (d - b'0', 1i8),
        (d, b'-') if d.is_ascii_digit() => (d - b'0', -1i8),
        (b'+', d) if d.is_ascii_digit() => (d - b'0', 1i8),
        (b'-', d) if d.is_ascii_digit() => (d - b'0', -1i8),
        _ => return None,
    };
    Some(sign * digit as i8)
}

/// Substring by byte columns, tolerant of short lines. PDB files are ASCII,
/// but caller-supplied text may not be; a column boundary inside a multi-byte
/// character yields an empty field instead of a panic.
fn slice(s: &str, start: usize, end: usize) -> &str {
    let bytes = s.as_bytes();
    let end = end.min(bytes.len());
    if start >= end {
        return "";
    }
    std::str::from_utf8(&bytes[start..end]).unwrap_or("")
}

#[derive(Default)]
struct ModelBuilder {
    chains: Vec<Chain>,
    current_chain: Option<char>,
    current_residue: Option<(i32, Option<char>, String)>,
    residues: Vec<Residue>,
    atoms: Vec<StructAtom>,
}

impl ModelBuilder {
    fn push(
        &mut self,
        atom: StructAtom,
        chain_id: char,
        seq_num: i32,
        i_code: Option<char>,
        res_name: String,
    ) {
        let key = (seq_num, i_code, res_name);
        if self.current_chain != Some(chain_id) {
            self.flush_chain();
            self.current_chain = Some(chain_id);
            self.current_residue = Some(key);
        } else if self.current_residue.as_ref() != Some(&key) {
            self.flush_residue();
            self.current_residue = Some(key);
        }
        self.atoms.push(atom);
    }

    fn flush_residue(&mut self) {
        if self.atoms.is_empty() {
            return;
        }
        if let Some((seq_num, i_code, name)) = self.current_residue.take() {
            self.residues.push(Residue {
                name,
                seq_num,
                i_code,
                atoms: std::mem::take(&mut self.atoms),
            });
        }
    }

    fn flush_chain(&mut self) {
        self.flush_residue();
        if let Some(id) = self.current_chain.take() {
            if !self.residues.is_empty() {
                self.chains.push(Chain::new(id, std::mem::take(&mut self.residues)));
            }
        }
    }

    fn finish(&mut self, serial: i32) -> Option<Model> {
        self.flush_chain();
        if self.chains.is_empty() {
            None
        } else {
            Some(Model {
                serial,
                chains: std::mem::take(&mut self.chains),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pdb() -> &'static str {
        "\
HEADER                                                        1CRN\n\
ATOM      1  N   THR A   1       2.464   9.901  13.546  1.00 10.00           N\n\
ATOM      2  CA  THR A   1       2.135  10.226  12.120  1.00 10.00           C\n\
ATOM      3  C   THR A   1       3.427  10.018  11.354  1.00 10.00           C\n\
HETATM    4  O   HOH A   2       3.426  10.335  10.184  1.00 10.00           O\n\
TER       5      HOH A   2\n\
END\n"
    }

    #[test]
    fn parse_single_chain() {
        let s = parse_pdb(minimal_pdb()).unwrap();
        assert_eq!(s.id, "1CRN");
        assert_eq!(s.models.len(), 1);
        let chain = &s.models[0].chains[0];
        assert_eq!(chain.id, 'A');
        assert_eq!(chain.residues.len(), 2);
        assert_eq!(chain.residues[1].name, "HOH");
        assert!(chain.residues[1].atoms[0].is_hetatm);
        assert_eq!(s.atom_count(), 4);
    }

    #[test]
    fn parse_multi_model() {
        let input = "\
MODEL        1\n\
ATOM      1  CA  ALA A   1       1.000   2.000   3.000  1.00  0.00           C\n\
ENDMDL\n\
MODEL        2\n\
ATOM      1  CA  ALA A   1       1.200   2.100   3.300  1.00  0.00           C\n\
ENDMDL\n\
END\n";
        let s = parse_pdb(input).unwrap();
        assert_eq!(s.models.len(), 2);
        assert_eq!(s.models[0].serial, 1);
        assert_eq!(s.models[1].serial, 2);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let input = "\
ATOM   BAD\n\
ATOM      1  CA  ALA A   1       1.000   2.000   3.000  1.00  0.00           C\n\
END\n";
        let s = parse_pdb(input).unwrap();
        assert_eq!(s.atom_count(), 1);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse_pdb("END\n"), Err(PdbError::Empty)));
    }

    #[test]
    fn non_ascii_records_are_skipped_not_panicked() {
        // multi-byte characters across the column boundaries
        let noise = format!("ATOM  {}\n", "é".repeat(30));
        assert!(matches!(parse_pdb(&noise), Err(PdbError::Empty)));

        let mixed = format!(
            "{noise}ATOM      1  CA  ALA A   1       1.000   2.000   3.000  1.00  0.00           C\nEND\n"
        );
        let s = parse_pdb(&mixed).unwrap();
        assert_eq!(s.atom_count(), 1);
    }

    #[test]
    fn write_round_trip_preserves_counts() {
        let s = parse_pdb(minimal_pdb()).unwrap();
        let text = write_pdb(&s);
        assert!(text.contains("TER"));
        assert!(text.ends_with("END\n"));
        let back = parse_pdb(&text).unwrap();
        assert_eq!(back.atom_count(), s.atom_count());
        assert_eq!(back.models[0].chains.len(), s.models[0].chains.len());
    }

    #[test]
    fn multi_model_round_trip_keeps_wrappers() {
        let input = "\
MODEL        1\n\
ATOM      1  CA  ALA A   1       1.000   2.000   3.000  1.00  0.00           C\n\
ENDMDL\n\
MODEL        2\n\
ATOM      1  CA  ALA A   1       1.200   2.100   3.300  1.00  0.00           C\n\
ENDMDL\n\
END\n";
        let s = parse_pdb(input).unwrap();
        let text = write_pdb(&s);
        assert_eq!(text.matches("MODEL ").count(), 2);
        assert_eq!(text.matches("ENDMDL").count(), 2);
        let back = parse_pdb(&text).unwrap();
        assert_eq!(back.models.len(), 2);
    }

    #[test]
    fn charge_parsing_both_orders() {
        assert_eq!(parse_charge("2+"), Some(2));
        assert_eq!(parse_charge("1-"), Some(-1));
        assert_eq!(parse_charge("+2"), Some(2));
        assert_eq!(parse_charge("-1"), Some(-1));
        assert_eq!(parse_charge(""), None);
        assert_eq!(parse_charge("ZZ"), None);
    }
}
