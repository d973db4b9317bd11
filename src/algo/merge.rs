/*!
 * This module defines the `Merge` trait which defines how objects are merged together.
 * Implementations for the mesh types are also included here.
 */

use std::collections::hash_map::Entry;

use ahash::{HashMap, HashMapExt};
use num_traits::ToPrimitive;
use ordered_float::OrderedFloat;

use crate::attrib::*;
use crate::mesh::topology::*;
use crate::mesh::{Mesh, PointCloud, PolyMesh};
use crate::Real;

/// A trait describing the action of merging mutltiple objects into a single object of the same
/// type.
pub trait Merge {
    /// Append a copy of `other` to self and return the resulting merged object as a mutable
    /// reference.
    fn merge_from(&mut self, other: &Self) -> &mut Self;

    /// Merge another object into self and return the resulting merged object as a mutable
    /// reference.
    fn merge(&mut self, other: Self) -> &mut Self
    where
        Self: Sized,
    {
        self.merge_from(&other)
    }

    /// Merge an iterator of objects into one of the same type.
    fn merge_iter(iterable: impl IntoIterator<Item = Self>) -> Self
    where
        Self: Default + Sized,
    {
        let mut iter = iterable.into_iter();

        let mut obj = iter.next().unwrap_or_default();

        for other in iter {
            obj.merge(other);
        }

        obj
    }

    /// Merge a `Vec` of objects into one of the same type.
    fn merge_vec(vec: Vec<Self>) -> Self
    where
        Self: Default + Sized,
    {
        Self::merge_iter(vec)
    }

    /// In contrast to `merge_vec`, this function takes an immutable reference to a collection of
    /// meshes, and creates a brand new mesh that is a union of all the given meshes.
    fn merge_slice(slice: &[Self]) -> Self
    where
        Self: Default + Sized,
    {
        let mut obj = Self::default();
        for other in slice {
            obj.merge_from(other);
        }
        obj
    }
}

/// Helper function to merge two attribute tables together.
///
/// `num_elements` must correspond to the number of elements in each attribute inside `dict`.
/// `num_additional_elements` must correspond to the number of elements in each attribute inside
/// `additional_dict`.
///
/// Attributes missing on either side are padded with zeros. An attribute whose type or component
/// count differs between the two tables keeps its original type and receives zeros for the
/// additional elements.
pub(crate) fn merge_attribute_dicts(
    dict: &mut AttribDict,
    num_elements: usize,
    additional_dict: &AttribDict,
    num_additional_elements: usize,
) {
    for (name, other_attrib) in additional_dict.iter() {
        // Check if self already has this attribute. If so, we append, otherwise we create a
        // brand new one.
        match dict.entry(name.to_owned()) {
            Entry::Occupied(entry) => {
                let attrib = entry.into_mut();
                if !attrib.append(other_attrib) {
                    log::warn!(
                        "attribute '{}' stores {}x{} but merged data stores {}x{}; filling with zeros",
                        name,
                        attrib.elem_type(),
                        attrib.num_comp(),
                        other_attrib.elem_type(),
                        other_attrib.num_comp(),
                    );
                    attrib.extend_by(num_additional_elements);
                }
            }
            Entry::Vacant(entry) => {
                let mut attrib = other_attrib.zeros_like(num_elements);
                attrib.append(other_attrib);
                entry.insert(attrib);
            }
        }
    }

    // Extend any attributes in dict that weren't present in `additional_dict` to make sure there
    // are the same number of elements in each attribute in `dict` after this function is
    // completed.
    let total = num_elements + num_additional_elements;
    for attrib in dict.values_mut() {
        if attrib.len() < total {
            attrib.extend_by(total - attrib.len());
        }

        debug_assert_eq!(attrib.len(), total);
    }
}

/// Append `other_indices` shifted by `vertex_offset` along with their offsets.
fn append_index_lists(
    indices: &mut Vec<usize>,
    offsets: &mut Vec<usize>,
    other_indices: &[usize],
    other_offsets: &[usize],
    vertex_offset: usize,
) {
    let index_offset = indices.len();
    indices.extend(other_indices.iter().map(|&i| i + vertex_offset));
    offsets.extend(other_offsets.iter().skip(1).map(|&o| o + index_offset));
}

impl<T: Real> Merge for PointCloud<T> {
    fn merge_from(&mut self, other: &Self) -> &mut Self {
        let self_num_vertices = self.num_vertices();
        let other_num_vertices = other.num_vertices();

        self.vertex_positions
            .extend_from_slice(&other.vertex_positions);

        // Transfer attributes
        merge_attribute_dicts(
            &mut self.vertex_attributes,
            self_num_vertices,
            &other.vertex_attributes,
            other_num_vertices,
        );
        self
    }
}

impl<T: Real> Merge for PolyMesh<T> {
    fn merge_from(&mut self, other: &Self) -> &mut Self {
        let self_num_vertices = self.num_vertices();
        let other_num_vertices = other.num_vertices();
        let self_num_faces = self.num_faces();
        let other_num_faces = other.num_faces();

        self.vertex_positions
            .extend_from_slice(&other.vertex_positions);
        append_index_lists(
            &mut self.indices,
            &mut self.offsets,
            &other.indices,
            &other.offsets,
            self_num_vertices,
        );

        // Transfer attributes
        merge_attribute_dicts(
            &mut self.vertex_attributes,
            self_num_vertices,
            &other.vertex_attributes,
            other_num_vertices,
        );
        merge_attribute_dicts(
            &mut self.face_attributes,
            self_num_faces,
            &other.face_attributes,
            other_num_faces,
        );
        self
    }
}

impl<T: Real> Merge for Mesh<T> {
    fn merge_from(&mut self, other: &Self) -> &mut Self {
        let self_num_vertices = self.num_vertices();
        let other_num_vertices = other.num_vertices();
        let self_num_cells = self.num_cells();
        let other_num_cells = other.num_cells();

        self.vertex_positions
            .extend_from_slice(&other.vertex_positions);
        append_index_lists(
            &mut self.indices,
            &mut self.offsets,
            &other.indices,
            &other.offsets,
            self_num_vertices,
        );
        self.types.extend_from_slice(&other.types);

        // Transfer attributes
        merge_attribute_dicts(
            &mut self.vertex_attributes,
            self_num_vertices,
            &other.vertex_attributes,
            other_num_vertices,
        );
        merge_attribute_dicts(
            &mut self.cell_attributes,
            self_num_cells,
            &other.cell_attributes,
            other_num_cells,
        );
        self
    }
}

impl<T: Real> Mesh<T> {
    /// Merge vertices with identical positions into one.
    ///
    /// The first occurrence of each position is kept along with its vertex attribute values, and
    /// cells referencing later duplicates are redirected to it. Returns the number of vertices
    /// removed.
    ///
    /// # Examples
    /// ```
    /// use meshblock::mesh::{CellType, Mesh, NumVertices};
    /// let mut mesh = Mesh::from_cells(
    ///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
    ///     vec![(CellType::Line, vec![0, 1]), (CellType::Line, vec![2, 3])],
    /// );
    /// assert_eq!(mesh.merge_coincident_points(), 1);
    /// assert_eq!(mesh.num_vertices(), 3);
    /// assert_eq!(mesh.indices, vec![0, 1, 1, 2]);
    /// ```
    pub fn merge_coincident_points(&mut self) -> usize {
        let num_vertices = self.num_vertices();
        let mut first_occurrence: HashMap<[OrderedFloat<f64>; 3], usize> =
            HashMap::with_capacity(num_vertices);
        let mut kept = Vec::new();
        let mut remap = Vec::with_capacity(num_vertices);

        for (i, &pos) in self.vertex_positions.iter().enumerate() {
            let key = pos.map(|x| OrderedFloat(ToPrimitive::to_f64(&x).unwrap_or(f64::NAN)));
            let new_index = *first_occurrence.entry(key).or_insert_with(|| {
                kept.push(i);
                kept.len() - 1
            });
            remap.push(new_index);
        }

        let removed = num_vertices - kept.len();
        if removed == 0 {
            return 0;
        }

        log::debug!("merged {} coincident points", removed);

        self.vertex_positions = kept.iter().map(|&i| self.vertex_positions[i]).collect();
        for idx in self.indices.iter_mut() {
            *idx = remap[*idx];
        }
        for attrib in self.vertex_attributes.values_mut() {
            *attrib = attrib.select(&kept);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::CellType;

    fn two_triangles() -> (PolyMesh<f64>, PolyMesh<f64>) {
        let mut a = PolyMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[3, 0, 1, 2],
        );
        a.add_attrib_data(Location::Vertex, "v", vec![0i32, 1, 2])
            .unwrap();
        a.add_attrib_data(Location::Cell, "f", vec![7u8]).unwrap();

        let mut b = PolyMesh::new(
            vec![[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            &[3, 0, 1, 2],
        );
        b.add_attrib_data(Location::Vertex, "v", vec![3i32, 4, 5])
            .unwrap();
        b.add_attrib_data(Location::Vertex, "w", vec![1.0f32, 1.0, 1.0])
            .unwrap();
        (a, b)
    }

    #[test]
    fn polymesh_merge() {
        let (mut a, b) = two_triangles();
        a.merge(b);

        assert_eq!(a.num_vertices(), 6);
        assert_eq!(a.num_faces(), 2);
        assert_eq!(a.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(a.offsets, vec![0, 3, 6]);

        // Present on both sides: concatenated.
        assert_eq!(
            a.attrib_as_slice::<i32>(Location::Vertex, "v").unwrap(),
            &[0, 1, 2, 3, 4, 5]
        );
        // Missing on the left: zero padded in front.
        assert_eq!(
            a.attrib_as_slice::<f32>(Location::Vertex, "w").unwrap(),
            &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]
        );
        // Missing on the right: zero padded at the back.
        assert_eq!(a.attrib_as_slice::<u8>(Location::Cell, "f").unwrap(), &[7, 0]);
    }

    #[test]
    fn mismatched_types_are_zero_filled() {
        let (mut a, mut b) = two_triangles();
        b.remove_attrib(Location::Vertex, "v").unwrap();
        b.add_attrib_data(Location::Vertex, "v", vec![3.0f64, 4.0, 5.0])
            .unwrap();
        a.merge_from(&b);
        assert_eq!(
            a.attrib_as_slice::<i32>(Location::Vertex, "v").unwrap(),
            &[0, 1, 2, 0, 0, 0]
        );
    }

    #[test]
    fn merge_slice_and_iter() {
        let (a, b) = two_triangles();
        let merged = PolyMesh::merge_slice(&[a.clone(), b.clone()]);
        let mut expected = a.clone();
        expected.merge_from(&b);
        assert_eq!(merged, expected);
        assert_eq!(PolyMesh::merge_vec(vec![a, b]), expected);
        assert_eq!(PolyMesh::<f64>::merge_iter(vec![]), PolyMesh::default());
    }

    #[test]
    fn pointcloud_merge() {
        let mut a = PointCloud::new(vec![[0.0f32; 3]]);
        let b = PointCloud::new(vec![[1.0f32; 3], [2.0; 3]]);
        a.merge(b);
        assert_eq!(a.vertex_positions, vec![[0.0; 3], [1.0; 3], [2.0; 3]]);
    }

    #[test]
    fn mesh_merge_and_weld() {
        let (a, b) = two_triangles();
        let mut mesh = Mesh::from(&a);
        mesh.merge_from(&Mesh::from(&b));
        assert_eq!(mesh.num_cells(), 2);
        assert_eq!(mesh.types, vec![CellType::Triangle; 2]);

        // Vertices 1 and 2 of `a` coincide with vertices 0 and 2 of `b`.
        assert_eq!(mesh.merge_coincident_points(), 2);
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 1, 3, 2]);
        assert_eq!(
            mesh.attrib_as_slice::<i32>(Location::Vertex, "v").unwrap(),
            &[0, 1, 2, 4]
        );
        assert_eq!(mesh.merge_coincident_points(), 0);
    }
}
