//!
//! This module defines the `VertexPositions` trait, which gives uniform access to the positions of
//! every mesh type in this crate.
//!

use crate::bbox::BBox;
use crate::ops::*;
use crate::Real;
use std::slice::{Iter, IterMut};

/// Access to the vertex positions of a mesh.
pub trait VertexPositions {
    type Element: Copy;

    /// Vertex positions as a slice of triplets.
    fn vertex_positions(&self) -> &[Self::Element];

    /// Vertex positions as a mutable slice of triplets.
    fn vertex_positions_mut(&mut self) -> &mut [Self::Element];

    /// Vertex iterator.
    #[inline]
    fn vertex_position_iter(&self) -> Iter<Self::Element> {
        self.vertex_positions().iter()
    }

    /// Mutable vertex iterator.
    #[inline]
    fn vertex_position_iter_mut(&mut self) -> IterMut<Self::Element> {
        self.vertex_positions_mut().iter_mut()
    }

    /// Vertex accessor.
    #[inline]
    fn vertex_position(&self, vidx: usize) -> Self::Element {
        self.vertex_positions()[vidx]
    }
}

impl<M, T: Real> BoundingBox<T> for M
where
    M: VertexPositions<Element = [T; 3]>,
{
    /// Compute the bounding box of this object.
    fn bounding_box(&self) -> BBox<T> {
        let mut bbox = BBox::empty();
        for &pos in self.vertex_position_iter() {
            bbox.absorb(pos);
        }
        bbox
    }
}

/// Implement `VertexPositions` for a mesh storing its positions in a `vertex_positions` field.
macro_rules! impl_vertex_positions {
    ($mesh:ident) => {
        impl<T: $crate::Real> $crate::mesh::VertexPositions for $mesh<T> {
            type Element = [T; 3];

            #[inline]
            fn vertex_positions(&self) -> &[[T; 3]] {
                &self.vertex_positions
            }

            #[inline]
            fn vertex_positions_mut(&mut self) -> &mut [[T; 3]] {
                &mut self.vertex_positions
            }
        }
    };
}

pub(crate) use impl_vertex_positions;
