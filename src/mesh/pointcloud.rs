//!
//! PointCloud module. Describes a point cloud data structure and possible operations on it. This
//! is just a collection of points, onto which you may attach arbitrary application specific
//! attributes.
//!

use ahash::HashMapExt;

use crate::attrib::*;
use crate::mesh::topology::*;
use crate::mesh::vertex_positions::impl_vertex_positions;
use crate::Real;

/// A collection of disconnected points, possibly but not necessarily representing some geometry.
/// The points may have arbitrary attributes assigned to them such as orientation.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud<T: Real> {
    /// Vertex positions.
    pub vertex_positions: Vec<[T; 3]>,
    /// Vertex attribute data.
    pub vertex_attributes: AttribDict,
}

impl<T: Real> PointCloud<T> {
    /// Construct a `PointCloud` from an array of vertices.
    /// # Examples
    /// ```
    /// use meshblock::mesh::{PointCloud, VertexPositions};
    /// let points = vec![
    ///     [0.0, 0.0, 0.0],
    ///     [1.0, 0.0, 0.0],
    ///     [0.0, 1.0, 0.0],
    ///     [1.0, 1.0, 0.0],
    ///     [0.0, 0.0, 1.0],
    ///     [1.0, 0.0, 1.0]];
    ///
    /// let ptcloud = PointCloud::new(points.clone());
    ///
    /// let positions = ptcloud.vertex_positions().to_vec();
    /// assert_eq!(positions, points);
    /// ```
    #[inline]
    pub fn new(verts: Vec<[T; 3]>) -> PointCloud<T> {
        PointCloud {
            vertex_positions: verts,
            vertex_attributes: AttribDict::new(),
        }
    }
}

impl<T: Real> Default for PointCloud<T> {
    /// Produce an empty `PointCloud`.
    ///
    /// This is not particularly useful on its own, however it can be
    /// used as a null case for various mesh algorithms.
    fn default() -> Self {
        PointCloud::new(vec![])
    }
}

impl_vertex_positions!(PointCloud);

impl<T: Real> NumVertices for PointCloud<T> {
    #[inline]
    fn num_vertices(&self) -> usize {
        self.vertex_positions.len()
    }
}

impl<T: Real> Attrib for PointCloud<T> {
    fn attrib_size(&self, loc: Location) -> Option<usize> {
        match loc {
            Location::Vertex => Some(self.num_vertices()),
            Location::Cell => None,
        }
    }
    fn attrib_dict(&self, loc: Location) -> Option<&AttribDict> {
        match loc {
            Location::Vertex => Some(&self.vertex_attributes),
            Location::Cell => None,
        }
    }
    fn attrib_dict_mut(&mut self, loc: Location) -> Option<&mut AttribDict> {
        match loc {
            Location::Vertex => Some(&mut self.vertex_attributes),
            Location::Cell => None,
        }
    }
}

/// Convert a polygon mesh to a point cloud by erasing all polygon data.
impl<T: Real> From<super::PolyMesh<T>> for PointCloud<T> {
    fn from(polymesh: super::PolyMesh<T>) -> PointCloud<T> {
        let super::PolyMesh {
            vertex_positions,
            vertex_attributes,
            ..
        } = polymesh;

        PointCloud {
            vertex_positions,
            vertex_attributes,
        }
    }
}

/// Convert an unstructured mesh to a point cloud by erasing all cell data.
impl<T: Real> From<super::Mesh<T>> for PointCloud<T> {
    fn from(mesh: super::Mesh<T>) -> PointCloud<T> {
        let super::Mesh {
            vertex_positions,
            vertex_attributes,
            ..
        } = mesh;

        PointCloud {
            vertex_positions,
            vertex_attributes,
        }
    }
}
