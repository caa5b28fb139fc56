//! Row-major `f32` matrix shared between training threads.
//!
//! Cells are `AtomicU32` bit patterns accessed with relaxed ordering.
//! Read-modify-write on a cell is not atomic: concurrent updates to the same
//! row may lose increments, which lock-free SGD tolerates.

use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

pub struct SharedMatrix {
    rows: usize,
    cols: usize,
    data: Vec<AtomicU32>,
}

impl SharedMatrix {
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        let data = (0..rows * cols).map(|_| AtomicU32::new(0f32.to_bits())).collect();
        Self { rows, cols, data }
    }

    /// Uniform in `(-0.5, 0.5) / cols`.
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let scale = 1.0 / cols as f32;
        let data = (0..rows * cols)
            .map(|_| AtomicU32::new(((rng.random::<f32>() - 0.5) * scale).to_bits()))
            .collect();
        Self { rows, cols, data }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    fn row(&self, row: usize) -> &[AtomicU32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn read_row(&self, row: usize, out: &mut [f32]) {
        for (dst, cell) in out.iter_mut().zip(self.row(row)) {
            *dst = f32::from_bits(cell.load(Ordering::Relaxed));
        }
    }

    #[must_use]
    pub fn row_vec(&self, row: usize) -> Vec<f32> {
        let mut out = vec![0.0; self.cols];
        self.read_row(row, &mut out);
        out
    }

    pub fn write_row(&self, row: usize, values: &[f32]) {
        for (cell, value) in self.row(row).iter().zip(values) {
            cell.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    /// `row += scale * delta`
    pub fn add_to_row(&self, row: usize, delta: &[f32], scale: f32) {
        for (cell, d) in self.row(row).iter().zip(delta) {
            let current = f32::from_bits(cell.load(Ordering::Relaxed));
            cell.store((current + scale * d).to_bits(), Ordering::Relaxed);
        }
    }

    /// `out += scale * row`
    pub fn accumulate_row(&self, row: usize, out: &mut [f32], scale: f32) {
        for (dst, cell) in out.iter_mut().zip(self.row(row)) {
            *dst += scale * f32::from_bits(cell.load(Ordering::Relaxed));
        }
    }

    #[must_use]
    pub fn dot_row(&self, row: usize, v: &[f32]) -> f32 {
        self.row(row)
            .iter()
            .zip(v)
            .map(|(cell, x)| f32::from_bits(cell.load(Ordering::Relaxed)) * x)
            .sum()
    }
}
