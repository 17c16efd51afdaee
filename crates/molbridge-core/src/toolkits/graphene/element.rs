//! Periodic table data for the graph engine.

use phf::{Map, phf_map};

/// A chemical element with the properties the engine needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub atomic_number: u8,
    pub symbol: &'static str,
    pub atomic_weight: f64,
    /// Default valence used for implicit hydrogen calculation.
    pub valence: u8,
    /// Covalent radius in Angstroms, used for bond-length targets.
    pub covalent_radius: f64,
}

const fn elem(
    atomic_number: u8,
    symbol: &'static str,
    atomic_weight: f64,
    valence: u8,
    covalent_radius: f64,
) -> Element {
    Element {
        atomic_number,
        symbol,
        atomic_weight,
        valence,
        covalent_radius,
    }
}

/// Elements 1-54 (H through Xe).
static ELEMENTS: [Element; 54] = [
    elem(1, "H", 1.008, 1, 0.31),
    elem(2, "He", 4.003, 0, 0.28),
    elem(3, "Li", 6.941, 1, 1.28),
    elem(4, "Be", 9.012, 2, 0.96),
    elem(5, "B", 10.81, 3, 0.84),
    elem(6, "C", 12.011, 4, 0.76),
    elem(7, "N", 14.007, 3, 0.71),
    elem(8, "O", 15.999, 2, 0.66),
    elem(9, "F", 18.998, 1, 0.57),
    elem(10, "Ne", 20.180, 0, 0.58),
    elem(11, "Na", 22.990, 1, 1.66),
    elem(12, "Mg", 24.305, 2, 1.41),
    elem(13, "Al", 26.982, 3, 1.21),
    elem(14, "Si", 28.086, 4, 1.11),
    elem(15, "P", 30.974, 3, 1.07),
    elem(16, "S", 32.06, 2, 1.05),
    elem(17, "Cl", 35.45, 1, 1.02),
    elem(18, "Ar", 39.948, 0, 1.06),
    elem(19, "K", 39.098, 1, 2.03),
    elem(20, "Ca", 40.078, 2, 1.76),
    elem(21, "Sc", 44.956, 3, 1.70),
    elem(22, "Ti", 47.867, 4, 1.60),
    elem(23, "V", 50.942, 5, 1.53),
    elem(24, "Cr", 51.996, 3, 1.39),
    elem(25, "Mn", 54.938, 2, 1.39),
    elem(26, "Fe", 55.845, 3, 1.32),
    elem(27, "Co", 58.933, 3, 1.26),
    elem(28, "Ni", 58.693, 2, 1.24),
    elem(29, "Cu", 63.546, 2, 1.32),
    elem(30, "Zn", 65.38, 2, 1.22),
    elem(31, "Ga", 69.723, 3, 1.22),
    elem(32, "Ge", 72.63, 4, 1.20),
    elem(33, "As", 74.922, 3, 1.19),
    elem(34, "Se", 78.96, 2, 1.20),
    elem(35, "Br", 79.904, 1, 1.20),
    elem(36, "Kr", 83.798, 0, 1.16),
    elem(37, "Rb", 85.468, 1, 2.20),
    elem(38, "Sr", 87.62, 2, 1.95),
    elem(39, "Y", 88.906, 3, 1.90),
    elem(40, "Zr", 91.224, 4, 1.75),
    elem(41, "Nb", 92.906, 5, 1.64),
    elem(42, "Mo", 95.95, 6, 1.54),
    elem(43, "Tc", 98.0, 7, 1.47),
    elem(44, "Ru", 101.07, 4, 1.46),
    elem(45, "Rh", 102.906, 3, 1.42),
    elem(46, "Pd", 106.42, 2, 1.39),
    elem(47, "Ag", 107.868, 1, 1.45),
    elem(48, "Cd", 112.414, 2, 1.44),
    elem(49, "In", 114.818, 3, 1.42),
    elem(50, "Sn", 118.710, 4, 1.39),
    elem(51, "Sb", 121.760, 3, 1.39),
    elem(52, "Te", 127.60, 2, 1.38),
    elem(53, "I", 126.904, 1, 1.39),
    elem(54, "Xe", 131.293, 0, 1.40),
];

/// Symbol → index into [`ELEMENTS`].
static BY_SYMBOL: Map<&'static str, u8> = phf_map! {
    "H" => 1, "He" => 2, "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7,
    "O" => 8, "F" => 9, "Ne" => 10, "Na" => 11, "Mg" => 12, "Al" => 13,
    "Si" => 14, "P" => 15, "S" => 16, "Cl" => 17, "Ar" => 18, "K" => 19,
    "Ca" => 20, "Sc" => 21, "Ti" => 22, "V" => 23, "Cr" => 24, "Mn" => 25,
    "Fe" => 26, "Co" => 27, "Ni" => 28, "Cu" => 29, "Zn" => 30, "Ga" => 31,
    "Ge" => 32, "As" => 33, "Se" => 34, "Br" => 35, "Kr" => 36, "Rb" => 37,
    "Sr" => 38, "Y" => 39, "Zr" => 40, "Nb" => 41, "Mo" => 42, "Tc" => 43,
    "Ru" => 44, "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48, "In" => 49,
    "Sn" => 50, "Sb" => 51, "Te" => 52, "I" => 53, "Xe" => 54,
};

/// Looks up an element by symbol (e.g. `"C"`, `"Fe"`).
pub fn element_by_symbol(symbol: &str) -> Option<&'static Element> {
    BY_SYMBOL
        .get(symbol)
        .map(|&n| &ELEMENTS[(n - 1) as usize])
}

/// Looks up an element by atomic number.
pub fn element_by_number(n: u8) -> Option<&'static Element> {
    if (1..=54).contains(&n) {
        Some(&ELEMENTS[(n - 1) as usize])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_lookup_matches_number_lookup() {
        let c = element_by_symbol("C").unwrap();
        assert_eq!(c.atomic_number, 6);
        assert_eq!(element_by_number(6).unwrap().symbol, "C");
        assert!((c.atomic_weight - 12.011).abs() < 1e-6);
    }

    #[test]
    fn unknown_lookups_return_none() {
        assert!(element_by_symbol("Zz").is_none());
        assert!(element_by_number(0).is_none());
        assert!(element_by_number(55).is_none());
    }

    #[test]
    fn covalent_radii_are_plausible() {
        let h = element_by_symbol("H").unwrap();
        let c = element_by_symbol("C").unwrap();
        assert!(h.covalent_radius < c.covalent_radius);
        assert!(c.covalent_radius < 1.0);
    }
}
