//!
//! Simple quantifiers shared by all mesh types.
//!

pub trait NumVertices {
    fn num_vertices(&self) -> usize;
}
pub trait NumFaces {
    fn num_faces(&self) -> usize;
}
pub trait NumCells {
    fn num_cells(&self) -> usize;
}
