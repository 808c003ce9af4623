//! Compressed sparse row matrix for per-document term weights.
//!
//! Row `i` holds the weights of document `i`; column indices within a row
//! are strictly increasing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    pub n_cols: usize,
    /// `indptr[i]..indptr[i + 1]` spans row `i` in `indices` and `data`.
    pub indptr: Vec<usize>,
    pub indices: Vec<usize>,
    pub data: Vec<f64>,
}

impl SparseMatrix {
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            indptr: vec![0],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build from per-row `(column, weight)` lists. Entries are sorted by
    /// column.
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<(usize, f64)>>) -> Self {
        let mut m = Self::new(n_cols);
        for mut row in rows {
            row.sort_by_key(|&(col, _)| col);
            m.push_row(&row);
        }
        m
    }

    fn push_row(&mut self, row: &[(usize, f64)]) {
        for &(col, weight) in row {
            debug_assert!(col < self.n_cols);
            self.indices.push(col);
            self.data.push(weight);
        }
        self.indptr.push(self.indices.len());
    }

    /// Check the CSR layout so that row access cannot go out of bounds.
    pub fn validate(&self) -> Result<(), String> {
        match self.indptr.first() {
            None => return Err("indptr is empty".to_string()),
            Some(&start) if start != 0 => {
                return Err(format!("indptr starts at {start}, expected 0"))
            }
            Some(_) => {}
        }
        if self.indices.len() != self.data.len() {
            return Err(format!(
                "{} column indices but {} weights",
                self.indices.len(),
                self.data.len()
            ));
        }
        let end = self.indptr[self.indptr.len() - 1];
        if end != self.indices.len() {
            return Err(format!(
                "indptr ends at {end} but there are {} entries",
                self.indices.len()
            ));
        }
        for (row, span) in self.indptr.windows(2).enumerate() {
            if span[0] > span[1] || span[1] > end {
                return Err(format!("indptr is out of order at row {row}"));
            }
            let cols = &self.indices[span[0]..span[1]];
            if let Some(&col) = cols.iter().find(|&&c| c >= self.n_cols) {
                return Err(format!("row {row} has column {col} >= {}", self.n_cols));
            }
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(format!("row {row} columns are not strictly increasing"));
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column indices and weights of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let span = self.indptr[i]..self.indptr[i + 1];
        (&self.indices[span.clone()], &self.data[span])
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (cols, weights) = self.row(row);
        cols.binary_search(&col).map_or(0.0, |pos| weights[pos])
    }

    pub fn density(&self) -> f64 {
        let cells = self.rows() * self.n_cols;
        if cells == 0 {
            0.0
        } else {
            self.nnz() as f64 / cells as f64
        }
    }

    /// Number of all-zero rows.
    pub fn empty_rows(&self) -> usize {
        self.indptr.windows(2).filter(|w| w[0] == w[1]).count()
    }
}
