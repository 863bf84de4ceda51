//! Qubit topology for ZENO
//!
//! Gantree: L1_Circuit → Topology
//!
//! Undirected coupling graphs: small parametric lattices for tests and the
//! 127-qubit heavy-hex lattice of the reference processor.

use crate::circuit::Circuit;
use crate::error::{ZenoError, ZenoResult};
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// Undirected edge, stored with the smaller endpoint first
pub type Edge = (QubitId, QubitId);

// ============================================================================
// Presets
// ============================================================================

/// Named topologies with a fixed qubit count
/// Gantree: TopologyPreset // preset enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyPreset {
    /// Open chain
    Line(usize),
    /// Closed chain
    Ring(usize),
    /// Square lattice
    Grid {
        /// Rows
        rows: usize,
        /// Columns
        cols: usize,
    },
    /// 7-qubit heavy-hex cell (Falcon r5.11H)
    HeavyHex7,
    /// 127-qubit heavy-hex lattice (Eagle r1)
    HeavyHex127,
}

impl TopologyPreset {
    /// Qubit count the preset describes
    pub fn expected_qubits(&self) -> usize {
        match self {
            TopologyPreset::Line(n) | TopologyPreset::Ring(n) => *n,
            TopologyPreset::Grid { rows, cols } => rows * cols,
            TopologyPreset::HeavyHex7 => 7,
            TopologyPreset::HeavyHex127 => 127,
        }
    }

    /// Preset name
    pub fn name(&self) -> String {
        match self {
            TopologyPreset::Line(n) => format!("linear_{}", n),
            TopologyPreset::Ring(n) => format!("ring_{}", n),
            TopologyPreset::Grid { rows, cols } => format!("grid_{}x{}", rows, cols),
            TopologyPreset::HeavyHex7 => "heavy_hex_7".to_string(),
            TopologyPreset::HeavyHex127 => "heavy_hex_127".to_string(),
        }
    }

    /// Build the topology
    pub fn build(&self) -> Topology {
        match self {
            TopologyPreset::Line(n) => Topology::linear(*n),
            TopologyPreset::Ring(n) => Topology::ring(*n),
            TopologyPreset::Grid { rows, cols } => Topology::grid(*rows, *cols),
            TopologyPreset::HeavyHex7 => Topology::heavy_hex_7(),
            TopologyPreset::HeavyHex127 => Topology::heavy_hex_127(),
        }
    }

    /// Build and check against a requested register size
    pub fn build_for(&self, num_qubits: usize) -> ZenoResult<Topology> {
        let topology = self.build();
        topology.validate_preset(self, num_qubits)?;
        Ok(topology)
    }
}

impl fmt::Display for TopologyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Topology
// ============================================================================

#[derive(Serialize, Deserialize)]
struct RawTopology {
    num_qubits: usize,
    edges: Vec<Edge>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<RawTopology> for Topology {
    type Error = ZenoError;

    fn try_from(raw: RawTopology) -> Result<Self, Self::Error> {
        let mut topo = Topology::from_edges(raw.num_qubits, &raw.edges)?;
        topo.name = raw.name;
        Ok(topo)
    }
}

impl From<Topology> for RawTopology {
    fn from(topo: Topology) -> Self {
        Self {
            num_qubits: topo.num_qubits,
            edges: topo.edges,
            name: topo.name,
        }
    }
}

/// Qubit coupling graph
/// Gantree: Topology // undirected graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTopology", into = "RawTopology")]
pub struct Topology {
    /// Number of qubits
    num_qubits: usize,

    /// Sorted, normalized edges
    edges: Vec<Edge>,

    /// Optional topology name
    name: Option<String>,
}

impl Topology {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create from an explicit edge list
    /// Gantree: from_edges(n, edges) -> Result<Self> // validated
    ///
    /// Rejects self-loops (`InvalidCoupling`), repeated edges in either
    /// orientation (`DuplicateCoupling`) and endpoints `>= num_qubits`
    /// (`InvalidTarget`).
    pub fn from_edges(num_qubits: usize, edges: &[Edge]) -> ZenoResult<Self> {
        let mut seen = BTreeSet::new();
        for &(a, b) in edges {
            if a == b {
                return Err(ZenoError::InvalidCoupling(a, b));
            }
            for q in [a, b] {
                if q >= num_qubits {
                    return Err(ZenoError::invalid_target(q, num_qubits));
                }
            }
            if !seen.insert((a.min(b), a.max(b))) {
                return Err(ZenoError::DuplicateCoupling(a, b));
            }
        }
        Ok(Self {
            num_qubits,
            edges: seen.into_iter().collect(),
            name: None,
        })
    }

    fn named(num_qubits: usize, edges: Vec<Edge>, name: String) -> Self {
        let mut edges: Vec<Edge> = edges.into_iter().map(|(a, b)| (a.min(b), a.max(b))).collect();
        edges.sort_unstable();
        edges.dedup();
        Self {
            num_qubits,
            edges,
            name: Some(name),
        }
    }

    /// Create from a preset, checking the requested register size
    pub fn from_preset(preset: TopologyPreset, num_qubits: usize) -> ZenoResult<Self> {
        preset.build_for(num_qubits)
    }

    /// Create linear chain topology
    ///
    /// Connectivity: 0-1-2-3-...-N-1
    pub fn linear(n: usize) -> Self {
        let edges = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        Self::named(n, edges, format!("linear_{}", n))
    }

    /// Create ring topology
    ///
    /// Connectivity: 0-1-2-...-N-1-0 (a line for N < 3)
    pub fn ring(n: usize) -> Self {
        let mut edges: Vec<Edge> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        if n > 2 {
            edges.push((0, n - 1));
        }
        Self::named(n, edges, format!("ring_{}", n))
    }

    /// Create grid topology
    ///
    /// Qubit indexing: row * cols + col
    pub fn grid(rows: usize, cols: usize) -> Self {
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                if c + 1 < cols {
                    edges.push((q, q + 1));
                }
                if r + 1 < rows {
                    edges.push((q, q + cols));
                }
            }
        }
        Self::named(rows * cols, edges, format!("grid_{}x{}", rows, cols))
    }

    /// 7-qubit heavy-hex cell (ibm_lagos / ibm_perth layout)
    pub fn heavy_hex_7() -> Self {
        let edges = vec![(0, 1), (1, 2), (1, 3), (3, 5), (4, 5), (5, 6)];
        Self::named(7, edges, "heavy_hex_7".to_string())
    }

    /// 127-qubit heavy-hex lattice (ibm_washington / Eagle layout)
    /// Gantree: heavy_hex_127() -> Self // 127 qubits, 144 edges
    ///
    /// Seven rows of data qubits (14, 15, 15, 15, 15, 15, 14) joined by
    /// 24 bridge qubits, four between each pair of adjacent rows.
    pub fn heavy_hex_127() -> Self {
        const ROWS: [(QubitId, QubitId); 7] = [
            (0, 13),
            (18, 32),
            (37, 51),
            (56, 70),
            (75, 89),
            (94, 108),
            (113, 126),
        ];
        // (bridge, upper-row qubit, lower-row qubit)
        const BRIDGES: [(QubitId, QubitId, QubitId); 24] = [
            (14, 0, 18),
            (15, 4, 22),
            (16, 8, 26),
            (17, 12, 30),
            (33, 20, 39),
            (34, 24, 43),
            (35, 28, 47),
            (36, 32, 51),
            (52, 37, 56),
            (53, 41, 60),
            (54, 45, 64),
            (55, 49, 68),
            (71, 58, 77),
            (72, 62, 81),
            (73, 66, 85),
            (74, 70, 89),
            (90, 75, 94),
            (91, 79, 98),
            (92, 83, 102),
            (93, 87, 106),
            (109, 96, 114),
            (110, 100, 118),
            (111, 104, 122),
            (112, 108, 126),
        ];

        let mut edges = Vec::with_capacity(144);
        for (start, end) in ROWS {
            edges.extend((start..end).map(|q| (q, q + 1)));
        }
        for (bridge, upper, lower) in BRIDGES {
            edges.push((upper, bridge));
            edges.push((bridge, lower));
        }
        Self::named(127, edges, "heavy_hex_127".to_string())
    }

    /// Create all-to-all topology (ideal)
    pub fn all_to_all(n: usize) -> Self {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                edges.push((i, j));
            }
        }
        Self::named(n, edges, format!("all_to_all_{}", n))
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Edges as sorted `(min, max)` pairs
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get number of edges
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get topology name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set topology name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    // ========================================================================
    // Connectivity Queries
    // ========================================================================

    /// True if `i` and `j` share an edge (never for `i == j`)
    /// Gantree: is_coupled(i, j) -> bool // edge lookup
    pub fn is_coupled(&self, i: QubitId, j: QubitId) -> bool {
        i != j && self.edges.binary_search(&(i.min(j), i.max(j))).is_ok()
    }

    /// Get neighbors of a qubit, sorted
    pub fn neighbors(&self, qubit: QubitId) -> Vec<QubitId> {
        let mut result: Vec<QubitId> = self
            .edges
            .iter()
            .filter_map(|&(a, b)| {
                if a == qubit {
                    Some(b)
                } else if b == qubit {
                    Some(a)
                } else {
                    None
                }
            })
            .collect();
        result.sort_unstable();
        result
    }

    /// Number of couplings of a qubit
    pub fn degree(&self, qubit: QubitId) -> usize {
        self.edges
            .iter()
            .filter(|&&(a, b)| a == qubit || b == qubit)
            .count()
    }

    /// Largest degree over all qubits
    pub fn max_degree(&self) -> usize {
        let mut degrees = vec![0usize; self.num_qubits];
        for &(a, b) in &self.edges {
            degrees[a] += 1;
            degrees[b] += 1;
        }
        degrees.into_iter().max().unwrap_or(0)
    }

    fn adjacency_list(&self) -> Vec<Vec<QubitId>> {
        let mut adj = vec![Vec::new(); self.num_qubits];
        for &(a, b) in &self.edges {
            adj[a].push(b);
            adj[b].push(a);
        }
        adj
    }

    /// Hop counts from `source` to every qubit; `None` when unreachable
    /// Gantree: distances_from(q) -> Vec<Option<usize>> // BFS
    pub fn distances_from(&self, source: QubitId) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.num_qubits];
        if source >= self.num_qubits {
            return dist;
        }
        let adj = self.adjacency_list();
        dist[source] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(q) = queue.pop_front() {
            let next = dist[q].map(|d| d + 1);
            for &n in &adj[q] {
                if dist[n].is_none() {
                    dist[n] = next;
                    queue.push_back(n);
                }
            }
        }
        dist
    }

    /// Qubits on a shortest coupling path, both endpoints included
    pub fn shortest_path(&self, start: QubitId, end: QubitId) -> Option<Vec<QubitId>> {
        // walk back from `end` along strictly decreasing distance to `start`
        let dist = self.distances_from(start);
        let mut hops = (*dist.get(end)?)?;
        let mut path = vec![end];
        let mut node = end;
        while hops > 0 {
            hops -= 1;
            node = self
                .neighbors(node)
                .into_iter()
                .find(|&n| dist[n] == Some(hops))?;
            path.push(node);
        }
        path.reverse();
        Some(path)
    }

    /// Hop count between two qubits
    pub fn distance(&self, q1: QubitId, q2: QubitId) -> Option<usize> {
        self.distances_from(q1).get(q2).copied().flatten()
    }

    /// True if every qubit is reachable from qubit 0
    pub fn is_fully_connected(&self) -> bool {
        self.num_qubits <= 1 || self.distances_from(0).iter().all(Option::is_some)
    }

    /// Largest hop count between two connected qubits
    pub fn diameter(&self) -> usize {
        (0..self.num_qubits)
            .filter_map(|q| self.distances_from(q).into_iter().flatten().max())
            .max()
            .unwrap_or(0)
    }

    // ========================================================================
    // Edge Colouring
    // ========================================================================

    /// Partition the edges into matchings
    /// Gantree: edge_coloring() -> Vec<Vec<Edge>> // greedy, <= 2Δ-1 colours
    ///
    /// Edges are visited in sorted order and take the smallest colour free
    /// at both endpoints.
    pub fn edge_coloring(&self) -> Vec<Vec<Edge>> {
        let mut used: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.num_qubits];
        let mut classes: Vec<Vec<Edge>> = Vec::new();
        for &(a, b) in &self.edges {
            let colour = (0..)
                .find(|c| !used[a].contains(c) && !used[b].contains(c))
                .unwrap_or(0);
            used[a].insert(colour);
            used[b].insert(colour);
            if classes.len() <= colour {
                classes.resize_with(colour + 1, Vec::new);
            }
            classes[colour].push((a, b));
        }
        classes
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Fail with `TopologyMismatch` if the preset size differs from `num_qubits`
    pub fn validate_preset(&self, preset: &TopologyPreset, num_qubits: usize) -> ZenoResult<()> {
        let expected = preset.expected_qubits();
        if expected != num_qubits || self.num_qubits != expected {
            return Err(ZenoError::TopologyMismatch {
                preset: preset.name(),
                expected,
                found: num_qubits,
            });
        }
        Ok(())
    }

    /// Validate a circuit against this topology
    /// Gantree: validate_circuit(&self, Circuit) -> Result // coupling check
    pub fn validate_circuit(&self, circuit: &Circuit) -> ZenoResult<()> {
        if circuit.num_qubits() != self.num_qubits {
            return Err(ZenoError::TopologyMismatch {
                preset: self.name.clone().unwrap_or_else(|| "custom".into()),
                expected: self.num_qubits,
                found: circuit.num_qubits(),
            });
        }
        for (q1, q2) in circuit.two_qubit_pairs() {
            if !self.is_coupled(q1, q2) {
                return Err(ZenoError::TopologyViolation { q1, q2 });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Topology({} qubits, {} edges{})",
            self.num_qubits,
            self.num_edges(),
            self.name
                .as_ref()
                .map(|n| format!(", {}", n))
                .unwrap_or_default()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Gate;

    #[test]
    fn test_linear_topology() {
        let topo = Topology::linear(5);
        assert_eq!(topo.num_qubits(), 5);
        assert_eq!(topo.num_edges(), 4);
        assert!(topo.is_coupled(0, 1));
        assert!(topo.is_coupled(2, 1));
        assert!(!topo.is_coupled(0, 2));
        assert!(!topo.is_coupled(1, 1));
    }

    #[test]
    fn test_ring_topology() {
        let topo = Topology::ring(4);
        assert_eq!(topo.num_edges(), 4);
        assert!(topo.is_coupled(3, 0));
        assert_eq!(Topology::ring(2).num_edges(), 1);
    }

    #[test]
    fn test_grid_topology() {
        let topo = Topology::grid(2, 3);
        assert_eq!(topo.num_qubits(), 6);
        assert_eq!(topo.num_edges(), 7);
        assert_eq!(topo.max_degree(), 3);
    }

    #[test]
    fn test_from_edges_validation() {
        assert!(matches!(
            Topology::from_edges(3, &[(1, 1)]),
            Err(ZenoError::InvalidCoupling(1, 1))
        ));
        assert!(matches!(
            Topology::from_edges(3, &[(0, 1), (1, 0)]),
            Err(ZenoError::DuplicateCoupling(1, 0))
        ));
        assert!(matches!(
            Topology::from_edges(3, &[(0, 3)]),
            Err(ZenoError::InvalidTarget { qubit: 3, .. })
        ));
        let topo = Topology::from_edges(3, &[(2, 1), (0, 1)]).unwrap();
        assert_eq!(topo.edges(), &[(0, 1), (1, 2)]);
    }

    #[test]
    fn test_heavy_hex_127() {
        let topo = Topology::heavy_hex_127();
        assert_eq!(topo.num_qubits(), 127);
        assert_eq!(topo.num_edges(), 144);
        assert_eq!(topo.max_degree(), 3);
        assert!(topo.is_fully_connected());
        assert!(topo.is_coupled(0, 14));
        assert!(topo.is_coupled(14, 18));
        assert!(topo.is_coupled(112, 126));
        // every qubit has at least one coupling
        assert!((0..127).all(|q| topo.degree(q) >= 1));
    }

    #[test]
    fn test_heavy_hex_7() {
        let topo = Topology::heavy_hex_7();
        assert_eq!(topo.num_qubits(), 7);
        assert_eq!(topo.num_edges(), 6);
        assert!(topo.is_fully_connected());
    }

    #[test]
    fn test_edge_coloring_proper() {
        for topo in [
            Topology::grid(3, 3),
            Topology::heavy_hex_127(),
            Topology::ring(5),
            Topology::all_to_all(5),
        ] {
            let classes = topo.edge_coloring();
            let total: usize = classes.iter().map(Vec::len).sum();
            assert_eq!(total, topo.num_edges());
            assert!(classes.len() <= 2 * topo.max_degree() - 1);
            for class in &classes {
                let mut seen = BTreeSet::new();
                for &(a, b) in class {
                    assert!(seen.insert(a));
                    assert!(seen.insert(b));
                }
            }
        }
    }

    #[test]
    fn test_edge_coloring_line() {
        let classes = Topology::linear(5).edge_coloring();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0], vec![(0, 1), (2, 3)]);
        assert_eq!(classes[1], vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn test_validate_preset() {
        let preset = TopologyPreset::HeavyHex127;
        assert!(matches!(
            Topology::from_preset(preset, 14),
            Err(ZenoError::TopologyMismatch {
                expected: 127,
                found: 14,
                ..
            })
        ));
        assert!(Topology::from_preset(TopologyPreset::Line(4), 4).is_ok());
    }

    #[test]
    fn test_shortest_path() {
        let topo = Topology::linear(5);
        assert_eq!(topo.shortest_path(0, 4).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(topo.shortest_path(0, 0).unwrap(), vec![0]);
        assert_eq!(topo.distance(1, 3), Some(2));
    }

    #[test]
    fn test_diameter() {
        assert_eq!(Topology::linear(5).diameter(), 4);
        assert_eq!(Topology::ring(6).diameter(), 3);
        assert_eq!(Topology::grid(2, 3).diameter(), 3);
    }

    #[test]
    fn test_disconnected_components() {
        let topo = Topology::from_edges(5, &[(0, 1), (1, 2), (3, 4)]).unwrap();
        assert!(!topo.is_fully_connected());
        assert_eq!(topo.distances_from(0), vec![Some(0), Some(1), Some(2), None, None]);
        assert_eq!(topo.distance(0, 4), None);
        assert_eq!(topo.shortest_path(4, 3).unwrap(), vec![4, 3]);
        assert!(topo.shortest_path(0, 3).is_none());
        assert!(topo.shortest_path(0, 9).is_none());
        // largest distance within a component
        assert_eq!(topo.diameter(), 2);
    }

    #[test]
    fn test_validate_circuit() {
        let topo = Topology::linear(3);
        let mut ok = Circuit::new(3);
        ok.add_gate(Gate::cnot(1, 0)).unwrap();
        assert!(topo.validate_circuit(&ok).is_ok());

        let mut bad = Circuit::new(3);
        bad.add_gate(Gate::cnot(0, 2)).unwrap();
        assert!(matches!(
            topo.validate_circuit(&bad),
            Err(ZenoError::TopologyViolation { q1: 0, q2: 2 })
        ));
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let topo = Topology::grid(2, 2);
        let json = serde_json::to_string(&topo).unwrap();
        let back: Topology = serde_json::from_str(&json).unwrap();
        assert_eq!(back, topo);

        let bad = r#"{"num_qubits":2,"edges":[[0,0]]}"#;
        assert!(serde_json::from_str::<Topology>(bad).is_err());
    }
}
