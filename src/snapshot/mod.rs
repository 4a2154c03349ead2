//! Flat binary graph snapshots and action streams.
//!
//! Both formats are sequences of 64-bit words opening with a marker word that
//! reveals the writer's byte order.
//!
//! ```text
//! graph:   [marker][nv][ne][off; nv + 1][ind; ne][weight; ne]
//! actions: [marker][n][(source, destination); n]
//! ```
//!
//! An action pair with both fields complemented deletes the complemented edge.

pub use words::{WordFile, WordWriter};

mod words;

use crate::{
    batch::BatchAction,
    csr::Csr,
    error::{Error, Result},
    types::Timestamp,
};
use log::info;
use std::path::Path;

/// Reads a graph snapshot into a CSR carrying weights.
pub fn read_graph_snapshot<P: AsRef<Path>>(path: P) -> Result<Csr> {
    let file = WordFile::open(&path)?;
    if file.len() < 3 {
        return Err(Error::CorruptSnapshot("truncated graph header".into()));
    }
    let (nv, ne) = (file.word(1), file.word(2));
    if nv < 0 || ne < 0 {
        return Err(Error::CorruptSnapshot(format!(
            "negative sizes nv: {} ne: {}",
            nv, ne
        )));
    }
    let (nv, ne) = (nv as usize, ne as usize);
    let expected = ne
        .checked_mul(2)
        .and_then(|x| x.checked_add(nv))
        .and_then(|x| x.checked_add(4))
        .ok_or_else(|| Error::CorruptSnapshot(format!("sizes overflow nv: {} ne: {}", nv, ne)))?;
    if file.len() != expected {
        return Err(Error::SizeMismatch {
            expected,
            actual: file.len(),
        });
    }
    info!(
        "reading graph {}: nv: {} ne: {}",
        path.as_ref().display(),
        nv,
        ne
    );
    let off = file.words(3, nv + 1);
    let ind = file.words(4 + nv, ne);
    let weight = file.words(4 + nv + ne, ne);
    Csr::from_parts(off, ind, Some(weight)).map_err(|e| Error::CorruptSnapshot(e.to_string()))
}

/// Writes `csr` as a graph snapshot; missing weights are written as 1.
pub fn write_graph_snapshot<P: AsRef<Path>>(path: P, csr: &Csr) -> Result<()> {
    let mut out = WordWriter::create(path)?;
    out.write(&[csr.num_vertices() as i64, csr.num_edges() as i64])?;
    out.write(csr.off())?;
    out.write(csr.ind())?;
    match csr.weight() {
        Some(weight) => out.write(weight)?,
        None => out.write(&vec![1; csr.num_edges()])?,
    }
    out.finish()
}

/// Reads an action stream; action `i` gets weight 1 and time `i + 1`.
pub fn read_action_stream<P: AsRef<Path>>(path: P) -> Result<Vec<BatchAction>> {
    let file = WordFile::open(&path)?;
    if file.len() < 2 {
        return Err(Error::CorruptSnapshot("truncated action header".into()));
    }
    let n = file.word(1);
    if n < 0 {
        return Err(Error::CorruptSnapshot(format!("negative action count {}", n)));
    }
    let expected = (n as usize)
        .checked_mul(2)
        .and_then(|x| x.checked_add(2))
        .ok_or_else(|| Error::CorruptSnapshot(format!("action count overflows: {}", n)))?;
    if file.len() != expected {
        return Err(Error::SizeMismatch {
            expected,
            actual: file.len(),
        });
    }
    info!("reading {} actions from {}", n, path.as_ref().display());
    let pairs = file.words(2, 2 * n as usize);
    Ok(pairs
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            let (s, d) = (pair[0], pair[1]);
            let time = i as Timestamp + 1;
            if s < 0 && d < 0 {
                BatchAction::delete(!s, !d, time)
            } else {
                BatchAction::insert(s, d, 1, time)
            }
        })
        .collect())
}

/// Writes `actions` as an action stream; weights and times are not stored.
pub fn write_action_stream<P: AsRef<Path>>(path: P, actions: &[BatchAction]) -> Result<()> {
    let mut out = WordWriter::create(path)?;
    out.write(&[actions.len() as i64])?;
    for action in actions {
        if action.is_delete() {
            out.write(&[!action.source, !action.destination])?;
        } else {
            out.write(&[action.source, action.destination])?;
        }
    }
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_graph_snapshot_round_trip() {
        let csr = Csr::from_parts(vec![0, 2, 2, 3], vec![1, 2, 0], Some(vec![5, -6, 7])).unwrap();
        let file = NamedTempFile::new().unwrap();
        write_graph_snapshot(file.path(), &csr).unwrap();
        assert_eq!(std::fs::metadata(file.path()).unwrap().len(), 8 * (3 + 4 + 6));
        assert_eq!(read_graph_snapshot(file.path()).unwrap(), csr);
    }

    #[test]
    fn test_unweighted_snapshot_gets_unit_weights() {
        let csr = Csr::from_parts(vec![0, 1], vec![0], None).unwrap();
        let file = NamedTempFile::new().unwrap();
        write_graph_snapshot(file.path(), &csr).unwrap();
        assert_eq!(read_graph_snapshot(file.path()).unwrap().weight(), Some(&[1][..]));
    }

    #[test]
    fn test_size_mismatch() {
        let mut file = NamedTempFile::new().unwrap();
        for w in [crate::types::ENDIAN_MARKER, 2, 1, 0, 1, 1, 1].iter() {
            file.write_all(&w.to_ne_bytes()).unwrap();
        }
        file.flush().unwrap();
        assert!(matches!(
            read_graph_snapshot(file.path()),
            Err(Error::SizeMismatch { expected: 8, actual: 7 })
        ));
        assert!(matches!(
            read_action_stream(file.path()),
            Err(Error::SizeMismatch { expected: 6, actual: 7 })
        ));
    }

    fn write_words(words: &[i64]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for w in words.iter() {
            file.write_all(&w.to_ne_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_huge_header_sizes() {
        let marker = crate::types::ENDIAN_MARKER;
        let file = write_words(&[marker, 1, i64::MAX, 0, 0]);
        assert!(matches!(
            read_graph_snapshot(file.path()),
            Err(Error::CorruptSnapshot(_))
        ));
        let file = write_words(&[marker, i64::MAX, i64::MAX / 2, 0, 0]);
        assert!(matches!(
            read_graph_snapshot(file.path()),
            Err(Error::CorruptSnapshot(_))
        ));
        let file = write_words(&[marker, i64::MAX - 8, 0, 0]);
        assert!(matches!(
            read_graph_snapshot(file.path()),
            Err(Error::SizeMismatch { actual: 4, .. })
        ));
        let file = write_words(&[marker, i64::MAX, 0, 0]);
        assert!(matches!(
            read_action_stream(file.path()),
            Err(Error::CorruptSnapshot(_))
        ));
        let file = write_words(&[marker, i64::MAX / 2, 0, 0]);
        assert!(matches!(
            read_action_stream(file.path()),
            Err(Error::SizeMismatch { actual: 4, .. })
        ));
    }

    #[test]
    fn test_action_stream_round_trip() {
        let actions = vec![
            BatchAction::insert(0, 3, 1, 1),
            BatchAction::delete(0, 3, 2),
            BatchAction::insert(2, 0, 1, 3),
        ];
        let file = NamedTempFile::new().unwrap();
        write_action_stream(file.path(), &actions).unwrap();
        assert_eq!(read_action_stream(file.path()).unwrap(), actions);
    }
}
