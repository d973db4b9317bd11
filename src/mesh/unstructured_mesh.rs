//!
//! Unstructured mesh module.
//!
//! This module defines a mesh data structure constructed from unstructured
//! cells of arbitrary shape.
//!

pub mod surface;

use ahash::HashMapExt;

use crate::attrib::*;
use crate::mesh::polymesh::{DynamicIndexSliceIter, PolyMesh};
use crate::mesh::topology::*;
use crate::mesh::vertex_positions::impl_vertex_positions;
use crate::mesh::PointCloud;
use crate::Real;

/// A marker for the type of cell contained in a Mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    Vertex,
    Line,
    Triangle,
    Quad,
    /// A planar polygon with any number of vertices.
    Polygon,
    Tetrahedron,
    Pyramid,
    Wedge,
    Hexahedron,
}

impl CellType {
    // see https://raw.githubusercontent.com/Kitware/vtk-examples/gh-pages/src/Testing/Baseline/Cxx/GeometricObjects/TestLinearCellDemo.png
    // for vertex positions.
    pub const TETRAHEDRON_FACES: &'static [&'static [usize]] =
        &[&[1, 3, 2], &[0, 2, 3], &[0, 3, 1], &[0, 1, 2]];

    pub const PYRAMID_FACES: &'static [&'static [usize]] = &[
        &[0, 4, 1],
        &[1, 4, 2],
        &[2, 4, 3],
        &[3, 4, 0],
        &[0, 1, 2, 3],
    ];

    pub const WEDGE_FACES: &'static [&'static [usize]] = &[
        &[0, 2, 1],
        &[3, 4, 5],
        &[0, 3, 5, 2],
        &[2, 5, 4, 1],
        &[1, 4, 3, 0],
    ];

    pub const HEXAHEDRON_FACES: &'static [&'static [usize]] = &[
        &[0, 1, 2, 3],
        &[0, 3, 7, 4],
        &[0, 4, 5, 1],
        &[6, 2, 1, 5],
        &[6, 5, 4, 7],
        &[6, 7, 3, 2],
    ];

    pub const PYRAMID_TETS: &'static [[usize; 4]] = &[[0, 1, 2, 4], [0, 2, 3, 4]];

    pub const WEDGE_TETS: &'static [[usize; 4]] = &[[0, 1, 2, 5], [0, 1, 4, 5], [0, 3, 4, 5]];

    // Six tetrahedra around the diagonal from vertex 0 to vertex 6.
    pub const HEXAHEDRON_TETS: &'static [[usize; 4]] = &[
        [0, 1, 2, 6],
        [0, 2, 3, 6],
        [0, 3, 7, 6],
        [0, 7, 4, 6],
        [0, 4, 5, 6],
        [0, 5, 1, 6],
    ];

    /// Returns the number of vertices referenced by this cell type, or `None` for polygons, which
    /// may have any number of vertices.
    pub fn num_verts(&self) -> Option<usize> {
        match self {
            CellType::Vertex => Some(1),
            CellType::Line => Some(2),
            CellType::Triangle => Some(3),
            CellType::Quad => Some(4),
            CellType::Polygon => None,
            CellType::Tetrahedron => Some(4),
            CellType::Pyramid => Some(5),
            CellType::Wedge => Some(6),
            CellType::Hexahedron => Some(8),
        }
    }

    /// Topological dimension of the cell.
    pub fn dim(&self) -> usize {
        match self {
            CellType::Vertex => 0,
            CellType::Line => 1,
            CellType::Triangle | CellType::Quad | CellType::Polygon => 2,
            CellType::Tetrahedron | CellType::Pyramid | CellType::Wedge | CellType::Hexahedron => 3,
        }
    }

    /// The faces of a volumetric cell as local vertex indices, oriented outwards.
    ///
    /// Cells of lower dimension have no faces.
    pub fn faces(&self) -> &'static [&'static [usize]] {
        match self {
            CellType::Tetrahedron => Self::TETRAHEDRON_FACES,
            CellType::Pyramid => Self::PYRAMID_FACES,
            CellType::Wedge => Self::WEDGE_FACES,
            CellType::Hexahedron => Self::HEXAHEDRON_FACES,
            _ => &[],
        }
    }

    /// Tetrahedra filling a volumetric cell, as local vertex indices.
    ///
    /// Cells of lower dimension have no volume and produce no tetrahedra.
    pub fn tetrahedra(&self) -> &'static [[usize; 4]] {
        match self {
            CellType::Tetrahedron => &[[0, 1, 2, 3]],
            CellType::Pyramid => Self::PYRAMID_TETS,
            CellType::Wedge => Self::WEDGE_TETS,
            CellType::Hexahedron => Self::HEXAHEDRON_TETS,
            _ => &[],
        }
    }

    /// The cell type of a polygon with `n` vertices, following the convention that two vertex
    /// polygons are line segments.
    pub fn from_polygon_size(n: usize) -> CellType {
        match n {
            1 => CellType::Vertex,
            2 => CellType::Line,
            3 => CellType::Triangle,
            4 => CellType::Quad,
            _ => CellType::Polygon,
        }
    }

    /// Returns `true` if a cell with `n` vertices is a valid instance of this type.
    pub fn accepts(&self, n: usize) -> bool {
        match self.num_verts() {
            Some(m) => m == n,
            None => n >= 3,
        }
    }
}

/// Mesh with arbitrarily shaped elements or cells.
///
/// The currently supported cell types are listed in the [`CellType`] enum. Each cell stores its
/// own type, so cells of different types may be interleaved freely.
///
/// NOTE: We stick with the terminology cell but these could very well be called
/// elements. The exact terminology would depend on how this mesh is used.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh<T: Real> {
    /// Vertex positions.
    pub vertex_positions: Vec<[T; 3]>,
    /// Indices into `vertices` for all cells, stored contiguously.
    pub indices: Vec<usize>,
    /// Offsets into `indices` delimiting individual cells. The last element in this `Vec` is
    /// always the length of `indices`.
    pub offsets: Vec<usize>,
    /// Type of each cell.
    pub types: Vec<CellType>,
    /// Vertex attributes.
    pub vertex_attributes: AttribDict,
    /// Cell attributes.
    pub cell_attributes: AttribDict,
}

impl<T: Real> Mesh<T> {
    /// Constructs a `Mesh` from an array of vertices and a list of typed cells.
    ///
    /// # Examples
    /// ```
    /// use meshblock::mesh::{Mesh, CellType};
    /// let points = vec![
    ///     [0.0, 0.0, 0.0],
    ///     [1.0, 0.0, 0.0],
    ///     [0.0, 1.0, 0.0],
    ///     [1.0, 1.0, 0.0],
    ///     [0.0, 0.0, 1.0],
    ///     [1.0, 0.0, 1.0]];
    /// let cells = vec![
    ///     (CellType::Triangle, vec![0, 1, 2]),
    ///     (CellType::Triangle, vec![1, 3, 2]),
    ///     (CellType::Tetrahedron, vec![0, 1, 5, 4]),
    /// ];
    ///
    /// let mesh = Mesh::from_cells(points, cells);
    ///
    /// assert_eq!(mesh.indices, vec![0, 1, 2, 1, 3, 2, 0, 1, 5, 4]);
    /// assert_eq!(mesh.offsets, vec![0, 3, 6, 10]);
    /// let mut iter = mesh.cell_iter();
    /// assert_eq!(iter.next(), Some(&[0,1,2][..]));
    /// assert_eq!(iter.next(), Some(&[1,3,2][..]));
    /// assert_eq!(iter.next(), Some(&[0,1,5,4][..]));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn from_cells(
        verts: Vec<[T; 3]>,
        cells: impl IntoIterator<Item = (CellType, Vec<usize>)>,
    ) -> Mesh<T> {
        let mut mesh = Mesh::from_raw_parts(verts, Vec::new(), vec![0], Vec::new());
        for (cell_type, cell) in cells {
            mesh.push_cell(cell_type, &cell);
        }
        mesh
    }

    /// Constructs a `Mesh` from flat cell storage as kept in the struct.
    ///
    /// `offsets` must start with zero, end with `indices.len()` and have one more entry than
    /// `types`.
    pub fn from_raw_parts(
        verts: Vec<[T; 3]>,
        indices: Vec<usize>,
        offsets: Vec<usize>,
        types: Vec<CellType>,
    ) -> Mesh<T> {
        debug_assert_eq!(offsets.len(), types.len() + 1);
        debug_assert_eq!(offsets.last(), Some(&indices.len()));
        Mesh {
            vertex_positions: verts,
            indices,
            offsets,
            types,
            vertex_attributes: AttribDict::new(),
            cell_attributes: AttribDict::new(),
        }
    }

    /// Append a single cell.
    ///
    /// Cell attributes are not extended, so callers adding cells to a mesh with cell attributes
    /// must extend those as well.
    pub fn push_cell(&mut self, cell_type: CellType, cell: &[usize]) {
        debug_assert!(cell_type.accepts(cell.len()));
        self.indices.extend_from_slice(cell);
        self.offsets.push(self.indices.len());
        self.types.push(cell_type);
    }

    /// Iterate over the vertex indices of every cell.
    pub fn cell_iter(&self) -> DynamicIndexSliceIter {
        DynamicIndexSliceIter::new(&self.indices, &self.offsets)
    }

    /// Vertex indices of the cell at `cidx`.
    #[inline]
    pub fn cell(&self, cidx: usize) -> &[usize] {
        &self.indices[self.offsets[cidx]..self.offsets[cidx + 1]]
    }

    /// Type of the cell at `cidx`.
    #[inline]
    pub fn cell_type(&self, cidx: usize) -> CellType {
        self.types[cidx]
    }

    /// Iterate over cells along with their types.
    pub fn typed_cell_iter(&self) -> impl Iterator<Item = (CellType, &[usize])> {
        self.types.iter().copied().zip(self.cell_iter())
    }

    /// Total volume of all volumetric cells.
    ///
    /// Each cell is split into tetrahedra whose unsigned volumes are summed, so the result does
    /// not depend on cell orientation. Cells of lower dimension do not contribute.
    ///
    /// # Examples
    /// ```
    /// use meshblock::mesh::{CellType, Mesh};
    /// let mesh: Mesh<f64> = Mesh::from_cells(
    ///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    ///     vec![(CellType::Tetrahedron, vec![0, 1, 2, 3])],
    /// );
    /// assert!((mesh.volume() - 1.0 / 6.0).abs() < 1e-12);
    /// ```
    pub fn volume(&self) -> T {
        let mut volume = T::zero();
        for (cell_type, cell) in self.typed_cell_iter() {
            for &tet in cell_type.tetrahedra() {
                let [a, b, c, d] = tet.map(|i| self.vertex_positions[cell[i]]);
                volume = volume + tet_volume(a, b, c, d);
            }
        }
        volume
    }
}

fn tet_volume<T: Real>(a: [T; 3], b: [T; 3], c: [T; 3], d: [T; 3]) -> T {
    let edge = |p: [T; 3]| math::Vector3::new(p[0] - d[0], p[1] - d[1], p[2] - d[2]);
    let shape = math::Matrix3::from_columns(&[edge(a), edge(b), edge(c)]);
    num_traits::Float::abs(shape.determinant()) / math::convert(6.0)
}

impl<T: Real> Default for Mesh<T> {
    /// Produce an empty mesh. This is not particularly useful on its own, however it can be
    /// used as a null case for various mesh algorithms.
    fn default() -> Self {
        Mesh::from_raw_parts(vec![], vec![], vec![0], vec![])
    }
}

impl_vertex_positions!(Mesh);

impl<T: Real> NumVertices for Mesh<T> {
    #[inline]
    fn num_vertices(&self) -> usize {
        self.vertex_positions.len()
    }
}

impl<T: Real> NumCells for Mesh<T> {
    #[inline]
    fn num_cells(&self) -> usize {
        self.types.len()
    }
}

impl<T: Real> Attrib for Mesh<T> {
    fn attrib_size(&self, loc: Location) -> Option<usize> {
        Some(match loc {
            Location::Vertex => self.num_vertices(),
            Location::Cell => self.num_cells(),
        })
    }
    fn attrib_dict(&self, loc: Location) -> Option<&AttribDict> {
        Some(match loc {
            Location::Vertex => &self.vertex_attributes,
            Location::Cell => &self.cell_attributes,
        })
    }
    fn attrib_dict_mut(&mut self, loc: Location) -> Option<&mut AttribDict> {
        Some(match loc {
            Location::Vertex => &mut self.vertex_attributes,
            Location::Cell => &mut self.cell_attributes,
        })
    }
}

/// Each polygon becomes a cell. Face attributes become cell attributes.
impl<T: Real> From<&PolyMesh<T>> for Mesh<T> {
    fn from(mesh: &PolyMesh<T>) -> Mesh<T> {
        let types = mesh
            .face_iter()
            .map(|f| CellType::from_polygon_size(f.len()))
            .collect();
        Mesh {
            vertex_attributes: mesh.vertex_attributes.clone(),
            cell_attributes: mesh.face_attributes.clone(),
            ..Mesh::from_raw_parts(
                mesh.vertex_positions.clone(),
                mesh.indices.clone(),
                mesh.offsets.clone(),
                types,
            )
        }
    }
}

/// Each point becomes a vertex cell.
impl<T: Real> From<&PointCloud<T>> for Mesh<T> {
    fn from(ptcloud: &PointCloud<T>) -> Mesh<T> {
        let n = ptcloud.vertex_positions.len();
        Mesh {
            vertex_attributes: ptcloud.vertex_attributes.clone(),
            ..Mesh::from_raw_parts(
                ptcloud.vertex_positions.clone(),
                (0..n).collect(),
                (0..=n).collect(),
                vec![CellType::Vertex; n],
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mixed_mesh() -> Mesh<f64> {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
        ];
        Mesh::from_cells(
            points,
            vec![
                (CellType::Triangle, vec![0, 1, 2]),
                (CellType::Tetrahedron, vec![0, 1, 5, 4]),
                (CellType::Line, vec![2, 3]),
            ],
        )
    }

    #[test]
    fn mesh_test() {
        let mesh = mixed_mesh();
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_cells(), 3);
        assert_eq!(mesh.cell(1), &[0, 1, 5, 4]);
        assert_eq!(mesh.cell_type(2), CellType::Line);

        let types: Vec<_> = mesh.typed_cell_iter().map(|(t, c)| (t, c.len())).collect();
        assert_eq!(
            types,
            vec![
                (CellType::Triangle, 3),
                (CellType::Tetrahedron, 4),
                (CellType::Line, 2)
            ]
        );
    }

    #[test]
    fn cell_type_test() {
        assert_eq!(CellType::Hexahedron.faces().len(), 6);
        assert_eq!(CellType::Wedge.faces().len(), 5);
        assert_eq!(CellType::Pyramid.faces().len(), 5);
        assert!(CellType::Quad.faces().is_empty());
        assert_eq!(CellType::from_polygon_size(2), CellType::Line);
        assert_eq!(CellType::from_polygon_size(7), CellType::Polygon);
        assert!(CellType::Polygon.accepts(5));
        assert!(!CellType::Polygon.accepts(2));
        assert!(!CellType::Tetrahedron.accepts(3));

        // Every face of every cell references all of its vertices.
        for ty in [
            CellType::Tetrahedron,
            CellType::Pyramid,
            CellType::Wedge,
            CellType::Hexahedron,
        ] {
            let mut seen = vec![false; ty.num_verts().unwrap()];
            for face in ty.faces() {
                for &v in face.iter() {
                    seen[v] = true;
                }
            }
            assert!(seen.into_iter().all(|s| s));
        }
    }

    #[test]
    fn volume_test() {
        let cube = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let hex = Mesh::from_cells(
            cube.clone(),
            vec![(CellType::Hexahedron, vec![0, 1, 2, 3, 4, 5, 6, 7])],
        );
        assert_relative_eq!(hex.volume(), 1.0, epsilon = 1e-12);

        // Volumes are unsigned, so swapping the top and bottom faces changes nothing.
        let scaled: Vec<_> = cube.iter().map(|p| [2.0 * p[0], 3.0 * p[1], 0.5 * p[2]]).collect();
        let flipped = Mesh::from_cells(
            scaled,
            vec![(CellType::Hexahedron, vec![4, 5, 6, 7, 0, 1, 2, 3])],
        );
        assert_relative_eq!(flipped.volume(), 3.0, epsilon = 1e-12);

        let mixed = Mesh::from_cells(
            cube,
            vec![
                (CellType::Tetrahedron, vec![0, 1, 3, 4]),
                (CellType::Pyramid, vec![0, 1, 2, 3, 6]),
                (CellType::Wedge, vec![0, 1, 3, 4, 5, 7]),
                (CellType::Triangle, vec![0, 1, 2]),
                (CellType::Line, vec![0, 6]),
            ],
        );
        assert_relative_eq!(mixed.volume(), 1.0 / 6.0 + 1.0 / 3.0 + 0.5, epsilon = 1e-12);

        assert_eq!(Mesh::<f64>::default().volume(), 0.0);
    }

    #[test]
    fn cell_attrib_test() {
        let mut mesh = mixed_mesh();
        mesh.add_attrib_data(Location::Cell, "material", vec![1i32, 2, 3])
            .unwrap();
        assert!(mesh
            .add_attrib_data(Location::Cell, "short", vec![1i32])
            .is_err());
        assert_eq!(
            mesh.find_attrib("material").map(Attribute::len),
            Some(3)
        );
    }

    #[test]
    fn from_polymesh_test() {
        let mut polymesh = PolyMesh::new(
            vec![[0.0f64; 3]; 5],
            &[3, 0, 1, 2, 2, 3, 4, 5, 0, 1, 2, 3, 4],
        );
        polymesh
            .add_attrib_data(Location::Cell, "id", vec![0u8, 1, 2])
            .unwrap();
        let mesh = Mesh::from(&polymesh);
        assert_eq!(
            mesh.types,
            vec![CellType::Triangle, CellType::Line, CellType::Polygon]
        );
        assert_eq!(
            mesh.attrib_as_slice::<u8>(Location::Cell, "id").unwrap(),
            &[0, 1, 2]
        );
    }

    #[test]
    fn from_pointcloud_test() {
        let ptcloud = PointCloud::new(vec![[0.0f32; 3], [1.0; 3]]);
        let mesh = Mesh::from(&ptcloud);
        assert_eq!(mesh.num_cells(), 2);
        assert_eq!(mesh.types, vec![CellType::Vertex; 2]);
        assert_eq!(mesh.cell(1), &[1]);
    }
}
