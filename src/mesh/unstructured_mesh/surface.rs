use ahash::{HashMap, HashMapExt};

use crate::attrib::AttribDict;
use crate::mesh::topology::NumVertices;
use crate::mesh::{Mesh, PolyMesh};
use crate::Real;

/// A face of the surface along with the cell it came from.
struct SurfaceFace {
    verts: Vec<usize>,
    cell: usize,
    /// Sorted vertices for faces of volumetric cells, which are only kept if unshared.
    key: Option<Vec<usize>>,
}

impl<T: Real> Mesh<T> {
    /// Collect the faces making up the surface of this mesh.
    ///
    /// Faces of volumetric cells are kept if no other volumetric cell uses the same vertices.
    /// Lower dimensional cells are kept as is, so lines become two vertex faces and vertex
    /// cells become single vertex faces.
    ///
    /// Faces are reported in cell order, so the result is deterministic.
    fn surface_faces(&self) -> Vec<SurfaceFace> {
        let mut faces = Vec::new();
        let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();

        for (cidx, (cell_type, cell)) in self.typed_cell_iter().enumerate() {
            match cell_type.dim() {
                3 => {
                    for local in cell_type.faces() {
                        let verts: Vec<usize> = local.iter().map(|&i| cell[i]).collect();
                        let mut key = verts.clone();
                        key.sort_unstable();
                        *counts.entry(key.clone()).or_insert(0) += 1;
                        faces.push(SurfaceFace {
                            verts,
                            cell: cidx,
                            key: Some(key),
                        });
                    }
                }
                _ => faces.push(SurfaceFace {
                    verts: cell.to_vec(),
                    cell: cidx,
                    key: None,
                }),
            }
        }

        faces.retain(|f| match &f.key {
            Some(key) => counts.get(key) == Some(&1),
            None => true,
        });
        faces
    }

    /// Extract the surface of this mesh as a polygon mesh.
    ///
    /// Only vertices referenced by the surface are kept, in their original order. Vertex
    /// attributes are carried over for the kept vertices and each face inherits the cell
    /// attributes of the cell it came from.
    ///
    /// # Examples
    /// ```
    /// use meshblock::mesh::{CellType, Mesh, NumFaces, NumVertices};
    /// let points = vec![
    ///     [0.0, 0.0, 0.0],
    ///     [1.0, 0.0, 0.0],
    ///     [0.0, 1.0, 0.0],
    ///     [0.0, 0.0, 1.0],
    ///     [1.0, 1.0, 1.0]];
    /// // Two tetrahedra sharing the face (0, 1, 2).
    /// let mesh = Mesh::from_cells(points, vec![
    ///     (CellType::Tetrahedron, vec![0, 1, 2, 3]),
    ///     (CellType::Tetrahedron, vec![0, 2, 1, 4]),
    /// ]);
    ///
    /// let surface = mesh.surface();
    /// assert_eq!(surface.num_faces(), 6);
    /// assert_eq!(surface.num_vertices(), 5);
    /// ```
    pub fn surface(&self) -> PolyMesh<T> {
        let faces = self.surface_faces();

        // Map used vertices to their new indices, preserving order.
        let mut new_index = vec![None; self.num_vertices()];
        for face in faces.iter() {
            for &v in face.verts.iter() {
                new_index[v] = Some(0);
            }
        }
        let mut kept = Vec::new();
        for (v, idx) in new_index.iter_mut().enumerate() {
            if idx.is_some() {
                *idx = Some(kept.len());
                kept.push(v);
            }
        }

        let mut indices = Vec::new();
        let mut offsets = vec![0];
        let mut face_cells = Vec::with_capacity(faces.len());
        for face in faces.iter() {
            indices.extend(face.verts.iter().filter_map(|&v| new_index[v]));
            offsets.push(indices.len());
            face_cells.push(face.cell);
        }

        let verts = kept.iter().map(|&v| self.vertex_positions[v]).collect();
        let mut surface = PolyMesh::from_raw_parts(verts, indices, offsets);
        surface.vertex_attributes = select_dict(&self.vertex_attributes, &kept);
        surface.face_attributes = select_dict(&self.cell_attributes, &face_cells);
        surface
    }
}

fn select_dict(dict: &AttribDict, indices: &[usize]) -> AttribDict {
    dict.iter()
        .map(|(name, attrib)| (name.clone(), attrib.select(indices)))
        .collect()
}
