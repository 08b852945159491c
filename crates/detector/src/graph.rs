//! Dense log-price matrix shared between the updater and the detector.

use std::sync::atomic::{AtomicU64, Ordering};

/// A VxV matrix of edge weights where `f64::INFINITY` means "no edge" and
/// each finite weight is the negated natural log of a conversion ratio.
/// The diagonal doubles as the liveness marker: `w(u, u) == 0` once node
/// `u` has been observed, infinite before.
///
/// Cells are `f64` bit patterns in relaxed atomics. There is exactly one
/// writer (the updater); the detector reads whatever state is current and
/// tolerates mid-iteration updates because it reruns every interval.
pub struct PriceGraph {
    cells: Box<[AtomicU64]>,
    stride: usize,
}

impl PriceGraph {
    pub fn new(max_nodes: usize) -> Self {
        let no_edge = f64::INFINITY.to_bits();
        let cells = (0..max_nodes * max_nodes)
            .map(|_| AtomicU64::new(no_edge))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            cells,
            stride: max_nodes,
        }
    }

    pub fn max_nodes(&self) -> usize {
        self.stride
    }

    #[inline]
    fn cell(&self, from: usize, to: usize) -> &AtomicU64 {
        &self.cells[from * self.stride + to]
    }

    #[inline]
    pub fn weight(&self, from: usize, to: usize) -> f64 {
        f64::from_bits(self.cell(from, to).load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_weight(&self, from: usize, to: usize, weight: f64) {
        self.cell(from, to).store(weight.to_bits(), Ordering::Relaxed);
    }

    /// Marks a node as observed by zeroing its self-edge.
    pub fn mark_live(&self, node: usize) {
        self.set_weight(node, node, 0.0);
    }

    pub fn is_live(&self, node: usize) -> bool {
        self.weight(node, node) == 0.0
    }
}
