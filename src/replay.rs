use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;

use crate::types::{ProbVector, NUM_CLASSES};

/// Carga una traza de probabilidades por frame desde un CSV con cabecera
/// `frame,p_neutral,p_cerrar,p_abrir`, una fila por frame en orden.
pub fn load_prob_trace(path: impl AsRef<Path>) -> Result<Vec<ProbVector>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("No se pudo abrir la traza {:?}", path))?;
    parse_prob_trace(file).with_context(|| format!("Traza inválida en {:?}", path))
}

pub fn parse_prob_trace(reader: impl Read) -> Result<Vec<ProbVector>> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let mut trace = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("Fila {} inválida", row_idx + 1))?;
        if record.len() < 1 + NUM_CLASSES {
            bail!(
                "La fila {} tiene {} columnas, se esperaban {}",
                row_idx + 1,
                record.len(),
                1 + NUM_CLASSES
            );
        }

        let mut probs: ProbVector = [0.0; NUM_CLASSES];
        for (i, prob) in probs.iter_mut().enumerate() {
            let value: f32 = record[1 + i]
                .parse()
                .with_context(|| format!("Probabilidad inválida en fila {}", row_idx + 1))?;
            if !(0.0..=1.0).contains(&value) {
                bail!(
                    "Probabilidad fuera de [0,1] en fila {}: {}",
                    row_idx + 1,
                    value
                );
            }
            *prob = value;
        }
        trace.push(probs);
    }

    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trace() {
        let csv = "frame,p_neutral,p_cerrar,p_abrir\n\
                   0,0.9,0.05,0.05\n\
                   1,0.1,0.1,0.8\n";
        let trace = parse_prob_trace(csv.as_bytes()).unwrap();
        assert_eq!(trace.len(), 2);
        assert!((trace[0][0] - 0.9).abs() < 1e-6);
        assert!((trace[1][2] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let csv = "frame,p_neutral,p_cerrar,p_abrir\n0,1.5,0.0,0.0\n";
        assert!(parse_prob_trace(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_short_row() {
        let csv = "frame,p_neutral,p_cerrar\n0,0.5,0.5\n";
        assert!(parse_prob_trace(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_trace_ok() {
        let csv = "frame,p_neutral,p_cerrar,p_abrir\n";
        assert!(parse_prob_trace(csv.as_bytes()).unwrap().is_empty());
    }
}
