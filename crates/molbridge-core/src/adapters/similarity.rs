//! Fingerprint similarity between a test set and a reference set.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::adapters::read::mol_read;
use crate::toolkits::registry;
use crate::toolkits::{Fingerprint, ToolkitResult};

/// Name of the statistics table written into the working directory.
pub const CSV_FILE: &str = "adan_chemical_similarity.csv";

/// Column-major table: column name to row-index-keyed values.
pub type SimilarityTable = BTreeMap<String, BTreeMap<String, f64>>;

/// Computes per-structure similarity statistics between two structure sets.
///
/// Every test structure is scored against every reference structure with
/// the named fingerprint and metric. The raw pairwise scores are reduced to
/// one row of statistics per test structure: `average`, `max_sim` and
/// `idx_max_sim`, plus a 0/1 `CI` column flagging rows whose average
/// similarity reaches the cutoff, when one is supplied. The statistics
/// table is written as CSV into `workdir` (created if absent) and also
/// returned as a nested mapping; the raw matrix itself is never persisted.
#[allow(clippy::too_many_arguments)]
pub fn chemical_similarity(
    toolkit_name: &str,
    test_set: &[String],
    reference_set: &[String],
    mol_format: &str,
    fp_kind: &str,
    metric: &str,
    ci_cutoff: Option<f64>,
    workdir: &Path,
) -> ToolkitResult<SimilarityTable> {
    let toolkit = registry::get(toolkit_name)?;

    let test_fps = fingerprints(toolkit_name, test_set, mol_format, fp_kind)?;
    let reference_fps = fingerprints(toolkit_name, reference_set, mol_format, fp_kind)?;
    debug!(
        "Scoring {} test against {} reference structures ({} / {})",
        test_fps.len(),
        reference_fps.len(),
        fp_kind,
        metric
    );

    let mut table: SimilarityTable = BTreeMap::new();
    let mut row_stats: Vec<(f64, f64, usize)> = Vec::with_capacity(test_fps.len());

    for test_fp in &test_fps {
        let mut sum = 0.0;
        let mut max_sim = f64::NEG_INFINITY;
        let mut idx_max = 0usize;
        for (column, reference_fp) in reference_fps.iter().enumerate() {
            let score = toolkit.similarity(test_fp, reference_fp, metric)?;
            if score > max_sim {
                max_sim = score;
                idx_max = column;
            }
            sum += score;
        }
        let average = if reference_fps.is_empty() {
            0.0
        } else {
            sum / reference_fps.len() as f64
        };
        let max_sim = if reference_fps.is_empty() { 0.0 } else { max_sim };
        row_stats.push((average, max_sim, idx_max));
    }

    for (row, &(average, max_sim, idx_max)) in row_stats.iter().enumerate() {
        let key = row.to_string();
        table
            .entry("average".to_string())
            .or_default()
            .insert(key.clone(), average);
        table
            .entry("max_sim".to_string())
            .or_default()
            .insert(key.clone(), max_sim);
        table
            .entry("idx_max_sim".to_string())
            .or_default()
            .insert(key.clone(), idx_max as f64);
        if let Some(cutoff) = ci_cutoff {
            table
                .entry("CI".to_string())
                .or_default()
                .insert(key, if average >= cutoff { 1.0 } else { 0.0 });
        }
    }
    if let Some(cutoff) = ci_cutoff {
        info!("Applied CI cutoff {} to similarity matrix", cutoff);
    }

    // non-atomic: concurrent calls may race on the directory and the file
    if !workdir.is_dir() {
        fs::create_dir_all(workdir)?;
    }
    write_csv(&table, test_set.len(), &workdir.join(CSV_FILE))?;

    Ok(table)
}

fn fingerprints(
    toolkit_name: &str,
    structures: &[String],
    mol_format: &str,
    fp_kind: &str,
) -> ToolkitResult<Vec<Fingerprint>> {
    let toolkit = registry::get(toolkit_name)?;
    structures
        .iter()
        .map(|input| {
            let handle = mol_read(input, Some(mol_format), false, toolkit_name)?;
            toolkit.fingerprint(&handle.mol, fp_kind)
        })
        .collect()
}

fn write_csv(table: &SimilarityTable, rows: usize, path: &Path) -> ToolkitResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![String::new()];
    header.extend(table.keys().cloned());
    writer.write_record(&header)?;

    for row in 0..rows {
        let key = row.to_string();
        let mut record = vec![key.clone()];
        for column in table.values() {
            record.push(
                column
                    .get(&key)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    debug!("Wrote similarity statistics to {}", path.display());
    Ok(())
}
