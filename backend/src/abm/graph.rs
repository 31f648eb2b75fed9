//! Contact graph in compressed sparse row form
//!
//! `offsets[i]..offsets[i + 1]` indexes agent `i`'s neighbours in `targets`.
//! Rows are sorted and deduplicated, there are no self-loops, and every edge
//! is stored in both directions. The topology is fixed once built.

use crate::rng::RngManager;

#[derive(Debug, Clone, PartialEq)]
pub struct ContactGraph {
    offsets: Vec<usize>,
    targets: Vec<u32>,
}

impl ContactGraph {
    /// Build a symmetric graph over `n` nodes from undirected edges.
    ///
    /// Self-loops and duplicates are dropped; out-of-range endpoints are ignored.
    ///
    /// # Example
    /// ```
    /// use crisis_simulator_core_rs::abm::ContactGraph;
    ///
    /// let g = ContactGraph::from_edges(3, &[(0, 1), (1, 0), (1, 2), (2, 2)]);
    /// assert_eq!(g.neighbors(1), &[0, 2]);
    /// assert_eq!(g.degree(2), 1);
    /// assert!(g.is_symmetric());
    /// ```
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut rows: Vec<Vec<u32>> = vec![Vec::new(); n];
        for &(a, b) in edges {
            if a == b || a >= n || b >= n {
                continue;
            }
            rows[a].push(b as u32);
            rows[b].push(a as u32);
        }

        let mut offsets = Vec::with_capacity(n + 1);
        let mut targets = Vec::new();
        offsets.push(0);
        for mut row in rows {
            row.sort_unstable();
            row.dedup();
            targets.extend_from_slice(&row);
            offsets.push(targets.len());
        }
        Self { offsets, targets }
    }

    /// Ring lattice of degree `k` plus random symmetric shortcuts.
    ///
    /// Each node links to its `k / 2` successors on the ring, then
    /// `shortcuts_per_node` extra edges to uniformly drawn nodes.
    pub fn small_world(n: usize, k: usize, shortcuts_per_node: usize, rng: &mut RngManager) -> Self {
        let half = k / 2;
        let mut edges = Vec::with_capacity(n * (half + shortcuts_per_node));
        if n > 1 {
            for i in 0..n {
                for step in 1..=half {
                    edges.push((i, (i + step) % n));
                }
            }
            for i in 0..n {
                for _ in 0..shortcuts_per_node {
                    let j = rng.range(0, n as i64) as usize;
                    edges.push((i, j));
                }
            }
        }
        Self::from_edges(n, &edges)
    }

    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored directed entries (twice the undirected edge count)
    pub fn nnz(&self) -> usize {
        self.targets.len()
    }

    pub fn neighbors(&self, node: usize) -> &[u32] {
        &self.targets[self.offsets[node]..self.offsets[node + 1]]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.offsets[node + 1] - self.offsets[node]
    }

    /// Sparse matrix-vector product `out = A · values`
    pub fn neighbor_sum(&self, values: &[f64], out: &mut [f64]) {
        debug_assert_eq!(values.len(), self.len());
        debug_assert_eq!(out.len(), self.len());
        for (node, slot) in out.iter_mut().enumerate() {
            *slot = self
                .neighbors(node)
                .iter()
                .map(|&j| values[j as usize])
                .sum();
        }
    }

    /// Mean of `values` over each node's neighbours (0 for isolated nodes)
    pub fn neighbor_mean(&self, values: &[f64], out: &mut [f64]) {
        self.neighbor_sum(values, out);
        for (node, slot) in out.iter_mut().enumerate() {
            let degree = self.degree(node);
            *slot = if degree == 0 { 0.0 } else { *slot / degree as f64 };
        }
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.len()).all(|i| {
            self.neighbors(i)
                .iter()
                .all(|&j| self.neighbors(j as usize).binary_search(&(i as u32)).is_ok())
        })
    }
}
