//! Compressed sparse column matrices persisted as `.npz` archives.
//!
//! Per-step feature vectors are mostly zeros (unit slots for types that
//! never appear, empty minimap pixels), so each replay's `steps × features`
//! matrix is stored in CSC form. The archive holds four arrays:
//!
//! | name      | dtype | contents                                  |
//! |-----------|-------|-------------------------------------------|
//! | `data`    | f32   | non-zero values, column by column         |
//! | `indices` | i32   | row of each value                         |
//! | `indptr`  | i32   | `cols + 1` offsets into `data`            |
//! | `shape`   | i64   | `[rows, cols]`                            |
//!
//! which `numpy.load` plus `scipy.sparse.csc_matrix((data, indices,
//! indptr), shape)` read back directly.

use std::fs::File;
use std::path::Path;

use ndarray::{Array1, Array2};
use ndarray_npy::{NpzReader, NpzWriter, ReadableElement};

use crate::atomic::write_atomic;
use crate::error::StoreError;

/// A `rows × cols` matrix of `f32` in compressed sparse column layout.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
    indices: Vec<i32>,
    indptr: Vec<i32>,
}

impl SparseMatrix {
    /// Build from row-major rows of equal length.
    ///
    /// An empty row list yields a `0 × 0` matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use sc2feat_store::SparseMatrix;
    ///
    /// let m = SparseMatrix::from_rows(&[vec![0.0, 2.0], vec![3.0, 0.0]]).unwrap();
    /// assert_eq!(m.shape(), (2, 2));
    /// assert_eq!(m.nnz(), 2);
    /// assert_eq!(m.get(0, 1), 2.0);
    /// assert_eq!(m.get(1, 1), 0.0);
    /// ```
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self, StoreError> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        for (i, row) in rows.iter().enumerate() {
            let actual = row.as_ref().len();
            if actual != cols {
                return Err(StoreError::RaggedRows {
                    row: i,
                    expected: cols,
                    actual,
                });
            }
        }

        // Count per column, then scatter; keeps the row-major input
        // streaming instead of striding across it once per column.
        let mut counts = vec![0usize; cols];
        for row in rows {
            for (c, &v) in row.as_ref().iter().enumerate() {
                if v != 0.0 {
                    counts[c] += 1;
                }
            }
        }
        let mut offsets = Vec::with_capacity(cols + 1);
        offsets.push(0usize);
        for &n in &counts {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + n);
        }
        let nnz = offsets[cols];
        if nnz > i32::MAX as usize || rows.len() > i32::MAX as usize {
            return Err(StoreError::TooLarge { nnz });
        }

        let mut data = vec![0.0f32; nnz];
        let mut indices = vec![0i32; nnz];
        let mut cursor = offsets[..cols].to_vec();
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.as_ref().iter().enumerate() {
                if v != 0.0 {
                    data[cursor[c]] = v;
                    indices[cursor[c]] = r as i32;
                    cursor[c] += 1;
                }
            }
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data,
            indices,
            indptr: offsets.into_iter().map(|o| o as i32).collect(),
        })
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored non-zero values.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Value at `(row, col)`; zero when out of range.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        if row >= self.rows || col >= self.cols {
            return 0.0;
        }
        let (start, end) = (self.indptr[col] as usize, self.indptr[col + 1] as usize);
        match self.indices[start..end].binary_search(&(row as i32)) {
            Ok(i) => self.data[start + i],
            Err(_) => 0.0,
        }
    }

    /// Dense copy.
    pub fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::zeros((self.rows, self.cols));
        for col in 0..self.cols {
            let (start, end) = (self.indptr[col] as usize, self.indptr[col + 1] as usize);
            for i in start..end {
                dense[[self.indices[i] as usize, col]] = self.data[i];
            }
        }
        dense
    }

    /// Write to `path` as a compressed `.npz` archive, atomically.
    pub fn write_npz(&self, path: &Path) -> Result<(), StoreError> {
        let npz_err = |source| StoreError::NpzWrite {
            path: path.to_path_buf(),
            source,
        };
        write_atomic(path, |file| {
            let mut npz = NpzWriter::new_compressed(file);
            npz.add_array("data", &Array1::from(self.data.clone()))
                .map_err(npz_err)?;
            npz.add_array("indices", &Array1::from(self.indices.clone()))
                .map_err(npz_err)?;
            npz.add_array("indptr", &Array1::from(self.indptr.clone()))
                .map_err(npz_err)?;
            npz.add_array("shape", &Array1::from(vec![self.rows as i64, self.cols as i64]))
                .map_err(npz_err)?;
            npz.finish().map_err(npz_err)?;
            Ok(())
        })
    }

    /// Read an archive written by [`write_npz`](Self::write_npz).
    pub fn read_npz(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        let mut npz = NpzReader::new(file).map_err(|source| StoreError::NpzRead {
            path: path.to_path_buf(),
            source,
        })?;

        let data: Array1<f32> = read_array(&mut npz, path, "data")?;
        let indices: Array1<i32> = read_array(&mut npz, path, "indices")?;
        let indptr: Array1<i32> = read_array(&mut npz, path, "indptr")?;
        let shape: Array1<i64> = read_array(&mut npz, path, "shape")?;

        let malformed = |detail: String| StoreError::MalformedMatrix {
            path: path.to_path_buf(),
            detail,
        };
        let (rows, cols) = match shape.as_slice() {
            Some(&[r, c]) if r >= 0 && c >= 0 => (r as usize, c as usize),
            _ => return Err(malformed(format!("bad shape {shape}"))),
        };
        if indptr.len() != cols + 1 {
            return Err(malformed(format!(
                "indptr has {} entries for {cols} columns",
                indptr.len()
            )));
        }
        if data.len() != indices.len() || indptr[cols] as usize != data.len() {
            return Err(malformed("data, indices and indptr disagree".to_string()));
        }
        if indices.iter().any(|&r| r < 0 || r as usize >= rows) {
            return Err(malformed("row index out of range".to_string()));
        }

        Ok(Self {
            rows,
            cols,
            data: data.to_vec(),
            indices: indices.to_vec(),
            indptr: indptr.to_vec(),
        })
    }
}

fn read_array<T: ReadableElement>(
    npz: &mut NpzReader<File>,
    path: &Path,
    name: &str,
) -> Result<Array1<T>, StoreError> {
    let read_err = |source| StoreError::NpzRead {
        path: path.to_path_buf(),
        source,
    };
    let entry = npz
        .names()
        .map_err(read_err)?
        .into_iter()
        .find(|n| n == name || n.strip_suffix(".npy") == Some(name))
        .ok_or_else(|| StoreError::MalformedMatrix {
            path: path.to_path_buf(),
            detail: format!("missing array '{name}'"),
        })?;
    npz.by_name(&entry).map_err(read_err)
}
