//!
//! Polymesh module. This module defines a surface mesh data structure constructed from polygons
//! of variable size.
//!

use ahash::HashMapExt;

use crate::attrib::*;
use crate::bbox::BBox;
use crate::mesh::topology::*;
use crate::mesh::vertex_positions::impl_vertex_positions;
use crate::ops::Empty;
use crate::Real;

/// Mesh with arbitrarily shaped faces. It could have polygons with any number of sides.
///
/// All faces with three or more vertices are closed polygons. Faces with two vertices are line
/// segments, which is how outlines and wireframes are represented, and single vertex faces are
/// points.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyMesh<T: Real> {
    /// Vertex positions.
    pub vertex_positions: Vec<[T; 3]>,
    /// Indices into `vertices` representing face vertices.
    pub indices: Vec<usize>,
    /// Offsets into `indices` representing individual faces. The last element in this `Vec` is
    /// always the length of `indices` for convenience.
    pub offsets: Vec<usize>,
    /// Vertex attributes.
    pub vertex_attributes: AttribDict,
    /// Polygon attributes.
    pub face_attributes: AttribDict,
}

impl<T: Real> PolyMesh<T> {
    /// Construct a `PolyMesh` from an array of vertices and an array of sizes and indices.
    ///
    /// The `faces` array contains the indices into the vertex array for each face preceeded by the
    /// number of vertices in the corresponding face. I.e. `faces` is expected to be structured as
    /// a contiguous array of a number (corresponding to the number of vertices in the face)
    /// followed by the vertex indices (in the same face):
    /// ```verbatim
    ///     n i_1 i_2 ... i_n m j_1 j_2 ... j_m ...
    /// ```
    ///
    /// # Examples
    /// ```
    /// use meshblock::mesh::PolyMesh;
    /// let points = vec![
    ///     [0.0, 0.0, 0.0],
    ///     [1.0, 0.0, 0.0],
    ///     [0.0, 1.0, 0.0],
    ///     [1.0, 1.0, 0.0],
    ///     [0.0, 0.0, 1.0],
    ///     [1.0, 0.0, 1.0]];
    /// let faces = vec![3, 0, 1, 2, // first triangle
    ///                  3, 1, 3, 2, // second triangle
    ///                  4, 0, 1, 5, 4]; // quadrilateral
    ///
    /// let polymesh = PolyMesh::new(points, &faces);
    ///
    /// assert_eq!(polymesh.indices, [0, 1, 2, 1, 3, 2, 0, 1, 5, 4]);
    /// assert_eq!(polymesh.offsets, [0, 3, 6, 10]);
    ///
    /// ```
    pub fn new(verts: Vec<[T; 3]>, faces: &[usize]) -> PolyMesh<T> {
        let mut indices = Vec::new();
        let mut offsets = vec![0];
        let mut i = 0;
        while i < faces.len() {
            let n = faces[i];
            i += 1;
            let end = (i + n).min(faces.len());
            indices.extend_from_slice(&faces[i..end]);
            offsets.push(indices.len());
            i = end;
        }

        PolyMesh::from_raw_parts(verts, indices, offsets)
    }

    /// Construct a `PolyMesh` from flat `indices` and `offsets` as stored in the struct.
    ///
    /// `offsets` must start with zero and end with `indices.len()`.
    pub fn from_raw_parts(
        verts: Vec<[T; 3]>,
        indices: Vec<usize>,
        offsets: Vec<usize>,
    ) -> PolyMesh<T> {
        debug_assert_eq!(offsets.first(), Some(&0));
        debug_assert_eq!(offsets.last(), Some(&indices.len()));
        PolyMesh {
            vertex_positions: verts,
            indices,
            offsets,
            vertex_attributes: AttribDict::new(),
            face_attributes: AttribDict::new(),
        }
    }

    /// Build the twelve edges of a bounding box as line segments.
    ///
    /// An empty box produces an empty mesh.
    ///
    /// # Examples
    /// ```
    /// use meshblock::bbox::BBox;
    /// use meshblock::mesh::{NumFaces, NumVertices, PolyMesh};
    /// let outline = PolyMesh::from_bbox_outline(&BBox::<f64>::unit());
    /// assert_eq!(outline.num_vertices(), 8);
    /// assert_eq!(outline.num_faces(), 12);
    /// ```
    pub fn from_bbox_outline(bbox: &BBox<T>) -> PolyMesh<T> {
        if bbox.is_empty() {
            return PolyMesh::default();
        }
        let [x0, x1, y0, y1, z0, z1] = bbox.bounds();
        let verts = vec![
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y1, z0],
            [x0, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x1, y1, z1],
            [x0, y1, z1],
        ];
        #[rustfmt::skip]
        let edges = [
            2, 0, 1, 2, 1, 2, 2, 2, 3, 2, 3, 0, // bottom
            2, 4, 5, 2, 5, 6, 2, 6, 7, 2, 7, 4, // top
            2, 0, 4, 2, 1, 5, 2, 2, 6, 2, 3, 7, // sides
        ];
        PolyMesh::new(verts, &edges)
    }

    /// Iterate over the vertex indices of every face.
    pub fn face_iter(&self) -> DynamicIndexSliceIter {
        DynamicIndexSliceIter::new(&self.indices, &self.offsets)
    }

    /// Number of vertices referenced by the face at `fidx`.
    #[inline]
    pub fn num_vertices_at_face(&self, fidx: usize) -> usize {
        self.offsets[fidx + 1] - self.offsets[fidx]
    }
}

impl<T: Real> Default for PolyMesh<T> {
    /// Produce an empty mesh. This is not particularly useful on its own, however it can be
    /// used as a null case for various mesh algorithms.
    fn default() -> Self {
        PolyMesh::new(vec![], &[])
    }
}

impl_vertex_positions!(PolyMesh);

impl<T: Real> NumVertices for PolyMesh<T> {
    #[inline]
    fn num_vertices(&self) -> usize {
        self.vertex_positions.len()
    }
}

impl<T: Real> NumFaces for PolyMesh<T> {
    #[inline]
    fn num_faces(&self) -> usize {
        self.offsets.len() - 1
    }
}

impl<T: Real> Attrib for PolyMesh<T> {
    fn attrib_size(&self, loc: Location) -> Option<usize> {
        Some(match loc {
            Location::Vertex => self.num_vertices(),
            Location::Cell => self.num_faces(),
        })
    }
    fn attrib_dict(&self, loc: Location) -> Option<&AttribDict> {
        Some(match loc {
            Location::Vertex => &self.vertex_attributes,
            Location::Cell => &self.face_attributes,
        })
    }
    fn attrib_dict_mut(&mut self, loc: Location) -> Option<&mut AttribDict> {
        Some(match loc {
            Location::Vertex => &mut self.vertex_attributes,
            Location::Cell => &mut self.face_attributes,
        })
    }
}

/// A face-less mesh carrying the points and vertex attributes of a point cloud.
impl<T: Real> From<super::PointCloud<T>> for PolyMesh<T> {
    fn from(ptcloud: super::PointCloud<T>) -> PolyMesh<T> {
        let super::PointCloud {
            vertex_positions,
            vertex_attributes,
        } = ptcloud;

        PolyMesh {
            vertex_attributes,
            ..PolyMesh::new(vertex_positions, &[])
        }
    }
}

/// Iterator over variable size index slices delimited by an offsets array.
pub struct DynamicIndexSliceIter<'a> {
    /// Vertex indices of a non-uniform mesh.
    indices: &'a [usize],
    /// Face offsets into the `indices` array as in `PolyMesh`.
    offsets: &'a [usize],
}

impl<'a> DynamicIndexSliceIter<'a> {
    pub(crate) fn new(indices: &'a [usize], offsets: &'a [usize]) -> Self {
        DynamicIndexSliceIter { indices, offsets }
    }
}

impl<'a> Iterator for DynamicIndexSliceIter<'a> {
    type Item = &'a [usize];

    fn next(&mut self) -> Option<&'a [usize]> {
        let (head, tail) = self.offsets.split_first()?;
        let next = tail.first()?;
        self.offsets = tail;
        let (l, r) = self.indices.split_at(next - head);
        self.indices = r;
        Some(l)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.offsets.len().saturating_sub(1);
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for DynamicIndexSliceIter<'a> {}
