//! MDL molfile (V2000) reading and writing for the graph engine.
//!
//! Covers the atom and bond blocks, `M  CHG` charge properties, and the
//! `$$$$` record separator of SD files. Atom parity, stereo flags, and the
//! legacy charge column are ignored.

use nalgebra::Point3;

use super::element::element_by_symbol;
use super::molecule::{BondOrder, GraphAtom, GraphBond, GraphMol};
use crate::toolkits::{ToolkitError, ToolkitResult};

/// Parses the first record of an SD file or a bare molfile.
pub fn parse_first_record(input: &str) -> ToolkitResult<GraphMol> {
    let record: Vec<&str> = input
        .lines()
        .take_while(|line| !line.starts_with("$$$$"))
        .collect();
    parse_record(&record)
}

/// Parses every record of an SD file.
pub fn parse_all_records(input: &str) -> ToolkitResult<Vec<GraphMol>> {
    let mut mols = Vec::new();
    let mut record: Vec<&str> = Vec::new();
    for line in input.lines() {
        if line.starts_with("$$$$") {
            if record.iter().any(|l| !l.trim().is_empty()) {
                mols.push(parse_record(&record)?);
            }
            record.clear();
        } else {
            record.push(line);
        }
    }
    if record.iter().any(|l| !l.trim().is_empty()) {
        mols.push(parse_record(&record)?);
    }
    Ok(mols)
}

fn parse_record(lines: &[&str]) -> ToolkitResult<GraphMol> {
    if lines.len() < 4 {
        return Err(ToolkitError::Parse(
            "molfile too short: missing header or counts line".into(),
        ));
    }

    let title = lines[0].trim().to_string();
    let counts = lines[3];
    let atom_count = field_usize(counts, 0, 3, "atom count")?;
    let bond_count = field_usize(counts, 3, 6, "bond count")?;

    let atom_block_end = 4 + atom_count;
    let bond_block_end = atom_block_end + bond_count;
    if lines.len() < bond_block_end {
        return Err(ToolkitError::Parse(format!(
            "molfile truncated: counts line declares {atom_count} atoms and \
             {bond_count} bonds"
        )));
    }

    let mut atoms = Vec::with_capacity(atom_count);
    let mut coords = Vec::with_capacity(atom_count);
    for line in &lines[4..atom_block_end] {
        let x = field_f64(line, 0, 10, "x coordinate")?;
        let y = field_f64(line, 10, 20, "y coordinate")?;
        let z = field_f64(line, 20, 30, "z coordinate")?;
        let symbol = slice(line, 31, 34).trim();
        let elem = element_by_symbol(symbol).ok_or_else(|| {
            ToolkitError::Parse(format!("unknown element '{symbol}' in atom block"))
        })?;
        atoms.push(GraphAtom {
            atomic_number: elem.atomic_number,
            formal_charge: 0,
            is_aromatic: false,
            implicit_hydrogens: 0,
        });
        coords.push(Point3::new(x, y, z));
    }

    let mut bonds = Vec::with_capacity(bond_count);
    for line in &lines[atom_block_end..bond_block_end] {
        let a = field_usize(line, 0, 3, "bond atom 1")?;
        let b = field_usize(line, 3, 6, "bond atom 2")?;
        let kind = field_usize(line, 6, 9, "bond type")?;
        if a == 0 || b == 0 || a > atom_count || b > atom_count {
            return Err(ToolkitError::Parse(format!(
                "bond references atom out of range: {a}-{b}"
            )));
        }
        let order = match kind {
            1 => BondOrder::Single,
            2 => BondOrder::Double,
            3 => BondOrder::Triple,
            4 => BondOrder::Aromatic,
            other => {
                return Err(ToolkitError::Parse(format!("unknown bond type {other}")));
            }
        };
        if order == BondOrder::Aromatic {
            atoms[a - 1].is_aromatic = true;
            atoms[b - 1].is_aromatic = true;
        }
        bonds.push(GraphBond { a: a - 1, b: b - 1, order });
    }

    // Property block: only charges are modeled.
    for line in &lines[bond_block_end..] {
        if line.starts_with("M  END") {
            break;
        }
        if let Some(rest) = line.strip_prefix("M  CHG") {
            parse_charge_property(rest, &mut atoms)?;
        }
    }

    let mut mol = GraphMol::new(title, atoms, bonds);
    mol.dim = infer_dimension(&coords);
    if mol.dim > 0 {
        mol.coords = Some(coords);
    }
    assign_hydrogens(&mut mol);
    Ok(mol)
}

fn parse_charge_property(rest: &str, atoms: &mut [GraphAtom]) -> ToolkitResult<()> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let pairs = fields
        .first()
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(|| ToolkitError::Parse("malformed M  CHG line".into()))?;
    if fields.len() < 1 + pairs * 2 {
        return Err(ToolkitError::Parse("short M  CHG line".into()));
    }
    for pair in 0..pairs {
        let atom: usize = fields[1 + pair * 2]
            .parse()
            .map_err(|_| ToolkitError::Parse("bad atom index in M  CHG".into()))?;
        let charge: i8 = fields[2 + pair * 2]
            .parse()
            .map_err(|_| ToolkitError::Parse("bad charge in M  CHG".into()))?;
        if atom == 0 || atom > atoms.len() {
            return Err(ToolkitError::Parse(format!(
                "M  CHG references atom {atom} out of range"
            )));
        }
        atoms[atom - 1].formal_charge = charge;
    }
    Ok(())
}

fn infer_dimension(coords: &[Point3<f64>]) -> u8 {
    if coords.iter().any(|p| p.z.abs() > 1e-6) {
        3
    } else if coords.iter().any(|p| p.x.abs() > 1e-6 || p.y.abs() > 1e-6) {
        2
    } else {
        0
    }
}

/// Fills implicit hydrogen counts from standard valences, shifted by the
/// formal charge (ammonium nitrogen binds four, alkoxide oxygen one).
fn assign_hydrogens(mol: &mut GraphMol) {
    for i in 0..mol.atoms.len() {
        let atom = &mol.atoms[i];
        let Some(base) = standard_valence(atom.atomic_number) else {
            continue;
        };
        let target = (base as i32 + i32::from(atom.formal_charge)).max(0) as usize;
        let used = if atom.is_aromatic {
            mol.degree(i) + 1
        } else {
            mol.bond_order_sum(i)
        };
        mol.atoms[i].implicit_hydrogens = target.saturating_sub(used) as u8;
    }
}

fn standard_valence(atomic_number: u8) -> Option<usize> {
    match atomic_number {
        5 | 7 | 15 => Some(3),
        6 => Some(4),
        8 | 16 => Some(2),
        9 | 17 | 35 | 53 => Some(1),
        _ => None,
    }
}

fn slice(line: &str, start: usize, end: usize) -> &str {
    let bytes = line.as_bytes();
    let end = end.min(bytes.len());
    if start >= end {
        return "";
    }
    std::str::from_utf8(&bytes[start..end]).unwrap_or("")
}

fn field_usize(line: &str, start: usize, end: usize, what: &str) -> ToolkitResult<usize> {
    slice(line, start, end)
        .trim()
        .parse()
        .map_err(|_| ToolkitError::Parse(format!("malformed {what} field")))
}

fn field_f64(line: &str, start: usize, end: usize, what: &str) -> ToolkitResult<f64> {
    slice(line, start, end)
        .trim()
        .parse()
        .map_err(|_| ToolkitError::Parse(format!("malformed {what} field")))
}

/// Writes one SD record, terminated with `$$$$`.
pub fn write_record(mol: &GraphMol) -> String {
    let mut out = String::new();
    out.push_str(&mol.title);
    out.push('\n');
    let dim_tag = match mol.dim {
        3 => "3D",
        2 => "2D",
        _ => "0D",
    };
    out.push_str(&format!(" molbridge          {dim_tag}\n"));
    out.push('\n');
    out.push_str(&format!(
        "{:3}{:3}  0  0  0  0  0  0  0  0999 V2000\n",
        mol.atom_count(),
        mol.bond_count()
    ));

    let origin = Point3::origin();
    for (index, atom) in mol.atoms.iter().enumerate() {
        let point = mol
            .coords
            .as_ref()
            .and_then(|c| c.get(index))
            .unwrap_or(&origin);
        let symbol = super::element::element_by_number(atom.atomic_number)
            .map(|e| e.symbol)
            .unwrap_or("*");
        out.push_str(&format!(
            "{:10.4}{:10.4}{:10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0\n",
            point.x, point.y, point.z, symbol
        ));
    }

    for bond in &mol.bonds {
        let kind = match bond.order {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        };
        out.push_str(&format!("{:3}{:3}{:3}  0\n", bond.a + 1, bond.b + 1, kind));
    }

    let charged: Vec<(usize, i8)> = mol
        .atoms
        .iter()
        .enumerate()
        .filter(|(_, a)| a.formal_charge != 0)
        .map(|(i, a)| (i + 1, a.formal_charge))
        .collect();
    for chunk in charged.chunks(8) {
        out.push_str(&format!("M  CHG{:3}", chunk.len()));
        for (atom, charge) in chunk {
            out.push_str(&format!("{atom:4}{charge:4}"));
        }
        out.push('\n');
    }

    out.push_str("M  END\n$$$$\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // concat! keeps the leading spaces the fixed-column format requires
    const ETHANOL_3D: &str = concat!(
        "ethanol\n",
        " molbridge\n",
        "\n",
        "  3  2  0  0  0  0  0  0  0  0999 V2000\n",
        "   -0.8900    0.1200    0.0500 C   0  0  0  0  0  0  0  0  0  0  0  0\n",
        "    0.5600   -0.2700    0.1100 C   0  0  0  0  0  0  0  0  0  0  0  0\n",
        "    1.3800    0.8800   -0.0900 O   0  0  0  0  0  0  0  0  0  0  0  0\n",
        "  1  2  1  0\n",
        "  2  3  1  0\n",
        "M  END\n",
        "$$$$\n",
    );

    #[test]
    fn parses_first_record_with_coordinates() {
        let mol = parse_first_record(ETHANOL_3D).unwrap();
        assert_eq!(mol.title, "ethanol");
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.dim, 3);
        let coords = mol.coords.as_ref().unwrap();
        assert!((coords[0].x + 0.89).abs() < 1e-9);
        assert_eq!(mol.atoms[2].atomic_number, 8);
        assert_eq!(mol.atoms[2].implicit_hydrogens, 1);
    }

    #[test]
    fn zero_coordinates_mean_no_conformer() {
        let flat = ETHANOL_3D
            .lines()
            .map(|l| {
                if l.contains(" C ") || l.contains(" O ") {
                    let sym = slice(l, 31, 34);
                    format!(
                        "    0.0000    0.0000    0.0000 {sym} 0  0  0  0  0  0  0  0  0  0  0  0"
                    )
                } else {
                    l.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let mol = parse_first_record(&flat).unwrap();
        assert_eq!(mol.dim, 0);
        assert!(mol.coords.is_none());
    }

    #[test]
    fn charge_property_overrides_atoms() {
        let text = ETHANOL_3D.replace("M  END", "M  CHG  1   3  -1\nM  END");
        let mol = parse_first_record(&text).unwrap();
        assert_eq!(mol.atoms[2].formal_charge, -1);
        assert_eq!(mol.total_charge(), -1);
        // alkoxide oxygen has no hydrogen left
        assert_eq!(mol.atoms[2].implicit_hydrogens, 0);
    }

    #[test]
    fn multi_record_file_parses_each_record() {
        let two = format!("{ETHANOL_3D}{ETHANOL_3D}");
        let mols = parse_all_records(&two).unwrap();
        assert_eq!(mols.len(), 2);
        // first-record parsing stops at the separator
        assert_eq!(parse_first_record(&two).unwrap().atom_count(), 3);
    }

    #[test]
    fn written_record_round_trips() {
        let mol = parse_first_record(ETHANOL_3D).unwrap();
        let text = write_record(&mol);
        assert!(text.ends_with("$$$$\n"));
        let reparsed = parse_first_record(&text).unwrap();
        assert_eq!(reparsed.atom_count(), 3);
        assert_eq!(reparsed.bond_count(), 2);
        assert_eq!(reparsed.dim, 3);
        assert_eq!(reparsed.title, "ethanol");
    }

    #[test]
    fn truncated_counts_line_is_an_error() {
        assert!(parse_first_record("name\n\n\n  5  4  0\n  END").is_err());
        assert!(parse_first_record("").is_err());
    }
}
