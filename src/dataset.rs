//!
//! The dataset capability shared by everything that can be stored in a [`MultiBlock`].
//!
//! A dataset can report its bounds, produce its boundary surface and append itself to an
//! unstructured [`Mesh`]. The mesh types of this crate and [`MultiBlock`] itself implement
//! [`DataSet`]; user types can implement it too, in which case they are treated as opaque by the
//! persistence layer.
//!

use std::fmt::Debug;
use std::sync::Arc;

use crate::algo::Merge;
use crate::attrib::Attribute;
use crate::bbox::BBox;
use crate::mesh::{Mesh, NumVertices, PointCloud, PolyMesh, VertexMesh};
use crate::multiblock::MultiBlock;
use crate::ops::{BoundingBox, Empty};
use crate::Real;

/// A shared handle to a dataset stored in a block.
///
/// Containers only hold handles, so the same dataset may appear in any number of blocks and
/// containers. Two handles refer to the same dataset when `Arc::ptr_eq` holds.
pub type SharedDataSet<T = f64> = Arc<dyn DataSet<T>>;

/// Concrete view of a dataset, used by consumers that need more than the common interface.
#[derive(Copy, Clone, Debug)]
pub enum DataSetView<'a, T: Real> {
    PointCloud(&'a PointCloud<T>),
    PolyMesh(&'a PolyMesh<T>),
    Mesh(&'a Mesh<T>),
    MultiBlock(&'a MultiBlock<T>),
    /// A dataset type defined outside this crate.
    Other,
}

/// Capability interface of a dataset.
pub trait DataSet<T: Real>: Debug + Send + Sync {
    /// Axis-aligned bounds of all points, or `None` if there are no points.
    fn bounds(&self) -> Option<BBox<T>>;

    /// The boundary surface of this dataset.
    fn extract_surface(&self) -> PolyMesh<T>;

    /// Append the points, cells and arrays of this dataset to `target`.
    fn merge_into(&self, target: &mut Mesh<T>);

    /// An independent copy of this dataset.
    fn deep_copy(&self) -> SharedDataSet<T>;

    /// Total number of points.
    fn num_points(&self) -> usize;

    /// Total volume of the volumetric cells. Datasets without such cells have zero volume.
    fn volume(&self) -> T {
        T::zero()
    }

    /// Smallest and largest value of the named array, ignoring NaN.
    fn data_range(&self, _name: &str) -> Option<(f64, f64)> {
        None
    }

    /// Short name of the dataset kind, used in summaries and errors.
    fn type_name(&self) -> &'static str;

    fn view(&self) -> DataSetView<'_, T> {
        DataSetView::Other
    }
}

fn vertex_mesh_bounds<T: Real, M: VertexMesh<T>>(mesh: &M) -> Option<BBox<T>> {
    let bbox = mesh.bounding_box();
    if bbox.is_empty() {
        None
    } else {
        Some(bbox)
    }
}

fn vertex_mesh_data_range<T: Real, M: VertexMesh<T>>(mesh: &M, name: &str) -> Option<(f64, f64)> {
    mesh.find_attrib(name).and_then(Attribute::range)
}

impl<T: Real> DataSet<T> for PointCloud<T> {
    fn bounds(&self) -> Option<BBox<T>> {
        vertex_mesh_bounds(self)
    }
    fn extract_surface(&self) -> PolyMesh<T> {
        PolyMesh::from(self.clone())
    }
    fn merge_into(&self, target: &mut Mesh<T>) {
        target.merge_from(&Mesh::from(self));
    }
    fn deep_copy(&self) -> SharedDataSet<T> {
        Arc::new(self.clone())
    }
    fn num_points(&self) -> usize {
        self.num_vertices()
    }
    fn data_range(&self, name: &str) -> Option<(f64, f64)> {
        vertex_mesh_data_range(self, name)
    }
    fn type_name(&self) -> &'static str {
        "PointCloud"
    }
    fn view(&self) -> DataSetView<'_, T> {
        DataSetView::PointCloud(self)
    }
}

impl<T: Real> DataSet<T> for PolyMesh<T> {
    fn bounds(&self) -> Option<BBox<T>> {
        vertex_mesh_bounds(self)
    }
    fn extract_surface(&self) -> PolyMesh<T> {
        self.clone()
    }
    fn merge_into(&self, target: &mut Mesh<T>) {
        target.merge_from(&Mesh::from(self));
    }
    fn deep_copy(&self) -> SharedDataSet<T> {
        Arc::new(self.clone())
    }
    fn num_points(&self) -> usize {
        self.num_vertices()
    }
    fn data_range(&self, name: &str) -> Option<(f64, f64)> {
        vertex_mesh_data_range(self, name)
    }
    fn type_name(&self) -> &'static str {
        "PolyMesh"
    }
    fn view(&self) -> DataSetView<'_, T> {
        DataSetView::PolyMesh(self)
    }
}

impl<T: Real> DataSet<T> for Mesh<T> {
    fn bounds(&self) -> Option<BBox<T>> {
        vertex_mesh_bounds(self)
    }
    fn extract_surface(&self) -> PolyMesh<T> {
        self.surface()
    }
    fn merge_into(&self, target: &mut Mesh<T>) {
        target.merge_from(self);
    }
    fn deep_copy(&self) -> SharedDataSet<T> {
        Arc::new(self.clone())
    }
    fn num_points(&self) -> usize {
        self.num_vertices()
    }
    fn volume(&self) -> T {
        Mesh::volume(self)
    }
    fn data_range(&self, name: &str) -> Option<(f64, f64)> {
        vertex_mesh_data_range(self, name)
    }
    fn type_name(&self) -> &'static str {
        "Mesh"
    }
    fn view(&self) -> DataSetView<'_, T> {
        DataSetView::Mesh(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrib::{Attrib, Location};
    use crate::mesh::CellType;

    #[test]
    fn pointcloud_dataset() {
        let ptcloud = PointCloud::new(vec![[0.0, 1.0, 2.0], [3.0, -1.0, 0.0]]);
        let bounds = ptcloud.bounds().unwrap();
        assert_eq!(bounds.bounds(), [0.0, 3.0, -1.0, 1.0, 0.0, 2.0]);
        assert_eq!(ptcloud.num_points(), 2);
        assert_eq!(ptcloud.extract_surface().vertex_positions.len(), 2);
        assert!(matches!(ptcloud.view(), DataSetView::PointCloud(_)));

        let mut mesh = Mesh::default();
        ptcloud.merge_into(&mut mesh);
        assert_eq!(mesh.types, vec![CellType::Vertex; 2]);

        assert!(PointCloud::<f64>::default().bounds().is_none());
    }

    #[test]
    fn mesh_dataset() {
        let mut mesh: Mesh<f64> = Mesh::from_cells(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            vec![(CellType::Tetrahedron, vec![0, 1, 2, 3])],
        );
        mesh.add_attrib_data(Location::Cell, "p", vec![2.5f64])
            .unwrap();
        assert_eq!(mesh.extract_surface().offsets.len(), 5);
        assert_eq!(mesh.data_range("p"), Some((2.5, 2.5)));
        assert_eq!(mesh.data_range("q"), None);
        assert_eq!(DataSet::type_name(&mesh), "Mesh");
        assert!((DataSet::volume(&mesh) - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(DataSet::volume(&mesh.extract_surface()), 0.0);
    }

    #[test]
    fn deep_copy_is_independent() {
        let mesh: SharedDataSet = Arc::new(PolyMesh::new(vec![[0.0; 3]], &[]));
        let copy = mesh.deep_copy();
        assert!(!Arc::ptr_eq(&mesh, &copy));
        assert_eq!(copy.num_points(), 1);
    }
}
