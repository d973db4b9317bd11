pub mod topology;

pub mod pointcloud;
pub mod polymesh;
pub mod unstructured_mesh;
pub mod vertex_positions;

// Re-export meshes and traits
pub use self::pointcloud::*;
pub use self::polymesh::*;
pub use self::topology::*;
pub use self::unstructured_mesh::*;
pub use self::vertex_positions::*;

use crate::attrib::Attrib;

/// VertexMesh is a marker trait to allow user code to be generic over vertex centric meshes with
/// vertex positions and attributes.
pub trait VertexMesh<T>: Attrib + NumVertices + VertexPositions<Element = [T; 3]> {}
impl<M, T> VertexMesh<T> for M where M: Attrib + NumVertices + VertexPositions<Element = [T; 3]> {}
