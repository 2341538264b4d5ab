//! Mesh connectivity over the indices of a control-point slice
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// An edge between two vertices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Vertex indices
    pub verts: [u32; 2],
    /// Hidden edges do not carry distance
    pub hidden: bool,
}

impl Edge {
    /// Builds a visible edge
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            verts: [a, b],
            hidden: false,
        }
    }

    /// Returns the vertex at the other end of the edge
    pub fn other(&self, v: u32) -> u32 {
        if self.verts[0] == v {
            self.verts[1]
        } else {
            self.verts[0]
        }
    }
}

/// A polygon, given as a loop of vertex indices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Vertex indices, in winding order
    pub verts: Vec<u32>,
    /// Hidden faces do not carry distance across them
    pub hidden: bool,
}

impl Face {
    /// Builds a visible face
    pub fn new(verts: impl Into<Vec<u32>>) -> Self {
        Self {
            verts: verts.into(),
            hidden: false,
        }
    }
}

/// Vertex, edge, and face connectivity
///
/// Vertex indices refer to positions in the control-point slice that the
/// topology is used with.  Faces do not need to list their edges
/// explicitly; edges are matched to faces by their vertex pairs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Topology {
    /// Edges of the mesh
    pub edges: Vec<Edge>,
    /// Faces of the mesh
    pub faces: Vec<Face>,
    /// Per-vertex hidden flags; an empty vector means nothing is hidden
    pub hidden_verts: Vec<bool>,
}

/// Adjacency tables derived from a [`Topology`]
#[derive(Debug)]
pub(crate) struct Adjacency {
    /// For each vertex, the edges that use it
    pub vert_edges: Vec<Vec<usize>>,
    /// For each edge, the indices of faces that contain it
    pub edge_faces: Vec<Vec<usize>>,
}

impl Topology {
    /// Builds an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a topology from edges alone
    pub fn from_edges(edges: impl IntoIterator<Item = [u32; 2]>) -> Self {
        Self {
            edges: edges.into_iter().map(|[a, b]| Edge::new(a, b)).collect(),
            ..Self::default()
        }
    }

    /// Builds a topology from faces, generating one edge per face side
    ///
    /// Sides shared between faces produce a single edge.
    pub fn from_faces(faces: impl IntoIterator<Item = Vec<u32>>) -> Self {
        let faces: Vec<Face> = faces.into_iter().map(Face::new).collect();
        let mut seen = std::collections::HashSet::new();
        let mut edges = vec![];
        for f in &faces {
            for i in 0..f.verts.len() {
                let a = f.verts[i];
                let b = f.verts[(i + 1) % f.verts.len()];
                if seen.insert((a.min(b), a.max(b))) {
                    edges.push(Edge::new(a, b));
                }
            }
        }
        Self {
            edges,
            faces,
            hidden_verts: vec![],
        }
    }

    /// Checks whether the given vertex is hidden
    pub fn is_vert_hidden(&self, v: usize) -> bool {
        self.hidden_verts.get(v).copied().unwrap_or(false)
    }

    /// Checks that every index is in range for `vertex_count` points
    pub fn validate(&self, vertex_count: usize) -> Result<()> {
        if !self.hidden_verts.is_empty()
            && self.hidden_verts.len() != vertex_count
        {
            return Err(Error::BadHiddenMask(
                self.hidden_verts.len(),
                vertex_count,
            ));
        }
        let check = |v: u32| {
            if (v as usize) < vertex_count {
                Ok(())
            } else {
                Err(Error::BadVertexIndex(v as usize, vertex_count))
            }
        };
        for (i, e) in self.edges.iter().enumerate() {
            check(e.verts[0])?;
            check(e.verts[1])?;
            if e.verts[0] == e.verts[1] {
                return Err(Error::DegenerateEdge(i, e.verts[0] as usize));
            }
        }
        for (i, f) in self.faces.iter().enumerate() {
            if f.verts.len() < 3 {
                return Err(Error::BadFace(i, f.verts.len()));
            }
            for &v in &f.verts {
                check(v)?;
            }
        }
        Ok(())
    }

    /// Builds vertex-to-edge and edge-to-face tables
    ///
    /// The topology must have been validated against `vertex_count`.
    pub(crate) fn adjacency(&self, vertex_count: usize) -> Adjacency {
        let mut vert_edges = vec![vec![]; vertex_count];
        let mut edge_index = std::collections::HashMap::new();
        for (i, e) in self.edges.iter().enumerate() {
            let [a, b] = e.verts;
            vert_edges[a as usize].push(i);
            vert_edges[b as usize].push(i);
            edge_index.entry((a.min(b), a.max(b))).or_insert(i);
        }
        let mut edge_faces = vec![vec![]; self.edges.len()];
        for (fi, f) in self.faces.iter().enumerate() {
            for i in 0..f.verts.len() {
                let a = f.verts[i];
                let b = f.verts[(i + 1) % f.verts.len()];
                if let Some(&e) = edge_index.get(&(a.min(b), a.max(b))) {
                    edge_faces[e].push(fi);
                }
            }
        }
        Adjacency {
            vert_edges,
            edge_faces,
        }
    }
}
