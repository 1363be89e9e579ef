// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Trajectory Storage
// ─────────────────────────────────────────────────────────────────────
//! Dense, append-only storage of map iterates.
//!
//! Rows are state vectors of `dimension + 1` components, stored
//! row-major in a single `Vec<f64>`.

use std::io::{BufWriter, Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{AttractorError, AttractorResult};

/// Magic tag of the persisted array format ("ATRJ").
const MAGIC: u64 = 0x4154_524A;
/// Upper bound on values reserved up front when reading.
const MAX_PREALLOC: usize = 1 << 20;

/// Ordered sequence of state vectors produced by iterating a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    dimension: usize,
    data: Vec<f64>,
}

impl Trajectory {
    /// Empty trajectory with room for `rows` states.
    pub fn with_capacity(dimension: usize, rows: usize) -> Self {
        Self {
            dimension,
            data: Vec::with_capacity(rows * (dimension + 1)),
        }
    }

    /// Wrap a flat row-major buffer.
    pub fn from_flat(dimension: usize, data: Vec<f64>) -> AttractorResult<Self> {
        let width = dimension + 1;
        if data.len() % width != 0 {
            return Err(AttractorError::Validation(format!(
                "flat buffer of {} values is not a multiple of row width {width}",
                data.len()
            )));
        }
        Ok(Self { dimension, data })
    }

    /// Append one state. Panics in debug builds on a width mismatch.
    #[inline]
    pub fn push(&mut self, state: &[f64]) {
        debug_assert_eq!(state.len(), self.width());
        self.data.extend_from_slice(state);
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Components per state (`dimension + 1`).
    pub fn width(&self) -> usize {
        self.dimension + 1
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.data.len() / self.width()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let w = self.width();
        &self.data[index * w..(index + 1) * w]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.width())
    }

    pub fn first(&self) -> Option<&[f64]> {
        self.rows().next()
    }

    pub fn last(&self) -> Option<&[f64]> {
        self.rows().last()
    }

    /// True when the terminal state is present and entirely finite.
    pub fn terminal_is_finite(&self) -> bool {
        self.last()
            .is_some_and(|row| row.iter().all(|v| v.is_finite()))
    }

    /// Copy one component out of every state, starting at row `skip`.
    pub fn column(&self, component: usize, skip: usize) -> Vec<f64> {
        self.rows().skip(skip).map(|row| row[component]).collect()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Join shards in the given order.
    pub fn concat(shards: Vec<Trajectory>) -> AttractorResult<Self> {
        let Some(dimension) = shards.first().map(|s| s.dimension) else {
            return Err(AttractorError::Validation(
                "cannot concatenate zero shards".to_string(),
            ));
        };
        if let Some(bad) = shards.iter().find(|s| s.dimension != dimension) {
            return Err(AttractorError::Validation(format!(
                "shard dimension mismatch: {} vs {dimension}",
                bad.dimension
            )));
        }
        let total: usize = shards.iter().map(|s| s.data.len()).sum();
        let mut data = Vec::with_capacity(total);
        for shard in shards {
            data.extend(shard.data);
        }
        Ok(Self { dimension, data })
    }

    /// Persist as a little-endian dense array: magic, rows, columns, values.
    pub fn write_to<W: Write>(&self, writer: W) -> AttractorResult<()> {
        let mut writer = BufWriter::new(writer);
        writer.write_all(&MAGIC.to_le_bytes())?;
        writer.write_all(&(self.len() as u64).to_le_bytes())?;
        writer.write_all(&(self.width() as u64).to_le_bytes())?;
        for v in &self.data {
            writer.write_all(&v.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Inverse of [`Trajectory::write_to`].
    pub fn read_from<R: Read>(mut reader: R) -> AttractorResult<Self> {
        let mut word = [0u8; 8];
        let mut next_u64 = |r: &mut R| -> AttractorResult<u64> {
            r.read_exact(&mut word)?;
            Ok(u64::from_le_bytes(word))
        };
        if next_u64(&mut reader)? != MAGIC {
            return Err(AttractorError::Io("not a trajectory array".to_string()));
        }
        let rows = next_u64(&mut reader)?;
        let cols = next_u64(&mut reader)?;
        if cols < 2 {
            return Err(AttractorError::Io(format!("invalid column count {cols}")));
        }
        let total = rows
            .checked_mul(cols)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| n.checked_mul(8).is_some())
            .ok_or_else(|| {
                AttractorError::Io(format!("header claims {rows}x{cols} values"))
            })?;
        // The header is untrusted; grow as values actually arrive.
        let mut data = Vec::with_capacity(total.min(MAX_PREALLOC));
        for _ in 0..total {
            data.push(f64::from_bits(next_u64(&mut reader)?));
        }
        Self::from_flat((cols - 1) as usize, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trajectory {
        let mut t = Trajectory::with_capacity(2, 3);
        t.push(&[0.0, 0.1, 0.2]);
        t.push(&[1.0, 1.1, 1.2]);
        t.push(&[2.0, 2.1, 2.2]);
        t
    }

    #[test]
    fn test_shape() {
        let t = sample();
        assert_eq!(t.len(), 3);
        assert_eq!(t.width(), 3);
        assert_eq!(t.row(1), &[1.0, 1.1, 1.2]);
        assert_eq!(t.last().unwrap(), &[2.0, 2.1, 2.2]);
    }

    #[test]
    fn test_column_with_skip() {
        let t = sample();
        assert_eq!(t.column(1, 0), vec![0.1, 1.1, 2.1]);
        assert_eq!(t.column(2, 1), vec![1.2, 2.2]);
    }

    #[test]
    fn test_terminal_finiteness() {
        let mut t = sample();
        assert!(t.terminal_is_finite());
        t.push(&[3.0, f64::NAN, 3.2]);
        assert!(!t.terminal_is_finite());
        assert!(!Trajectory::with_capacity(2, 0).terminal_is_finite());
    }

    #[test]
    fn test_from_flat_rejects_ragged() {
        assert!(Trajectory::from_flat(2, vec![0.0; 7]).is_err());
        assert_eq!(Trajectory::from_flat(2, vec![0.0; 9]).unwrap().len(), 3);
    }

    #[test]
    fn test_concat_preserves_order() {
        let a = sample();
        let mut b = Trajectory::with_capacity(2, 1);
        b.push(&[9.0, 9.1, 9.2]);
        let joined = Trajectory::concat(vec![a, b]).unwrap();
        assert_eq!(joined.len(), 4);
        assert_eq!(joined.row(3), &[9.0, 9.1, 9.2]);
        assert_eq!(joined.row(0), &[0.0, 0.1, 0.2]);
    }

    #[test]
    fn test_concat_dimension_mismatch() {
        let a = sample();
        let b = Trajectory::with_capacity(3, 0);
        assert!(Trajectory::concat(vec![a, b]).is_err());
        assert!(Trajectory::concat(Vec::new()).is_err());
    }

    #[test]
    fn test_persisted_array() {
        let mut t = sample();
        t.push(&[f64::INFINITY, -0.0, 1e300]);
        let mut buf = Vec::new();
        t.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 8 * (3 + 12));
        let back = Trajectory::read_from(buf.as_slice()).unwrap();
        assert_eq!(back.len(), 4);
        assert_eq!(back.dimension(), 2);
        assert_eq!(back.row(3)[0], f64::INFINITY);
    }

    fn header(rows: u64, cols: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC.to_le_bytes());
        buf.extend_from_slice(&rows.to_le_bytes());
        buf.extend_from_slice(&cols.to_le_bytes());
        buf
    }

    #[test]
    fn test_read_rejects_oversized_header() {
        let buf = header(u64::MAX / 4, 3);
        assert!(matches!(
            Trajectory::read_from(buf.as_slice()),
            Err(AttractorError::Io(_))
        ));
    }

    #[test]
    fn test_read_truncated_body_is_io_error() {
        // Plausible header, body far shorter than claimed.
        let mut buf = header(1 << 40, 3);
        buf.extend_from_slice(&1.0f64.to_le_bytes());
        assert!(matches!(
            Trajectory::read_from(buf.as_slice()),
            Err(AttractorError::Io(_))
        ));
    }

    #[test]
    fn test_write_to_buffered_sink_round_trips() {
        let t = sample();
        let mut buf = Vec::new();
        t.write_to(&mut buf).unwrap();
        assert_eq!(&buf[..8], &MAGIC.to_le_bytes());
        assert_eq!(Trajectory::read_from(buf.as_slice()).unwrap(), t);
    }

    #[test]
    fn test_read_rejects_bad_magic() {
        let buf = vec![0u8; 24];
        assert!(matches!(
            Trajectory::read_from(buf.as_slice()),
            Err(AttractorError::Io(_))
        ));
    }
}
