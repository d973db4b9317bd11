//! A library of name-addressable multi-block mesh containers.
//!
//! # Overview
//!
//! A [`MultiBlock`] is an ordered list of optional datasets, each of which may also carry a unique
//! name. Blocks are shared through `Arc` handles, so the same mesh can live in several containers
//! at once. Containers nest, aggregate bounds over all their blocks, merge their contents into a
//! single surface or unstructured mesh and, with the `io` feature, round-trip through a manifest
//! file with one VTK file per block.
//!
//! The dataset kinds shipped with the crate are [`PointCloud`], [`PolyMesh`] and [`Mesh`]. Any
//! other type implementing [`DataSet`] can be stored as a block too.

pub mod algo;
pub mod attrib;
pub mod bbox;
pub mod dataset;
pub mod error;
pub mod mesh;
pub mod multiblock;
pub mod ops;

#[cfg(feature = "io")]
pub mod io;

// public re-exports
pub use self::dataset::{DataSet, DataSetView, SharedDataSet};
pub use self::error::{Error, Result};
pub use self::multiblock::MultiBlock;
pub use crate::mesh::*;

/// Plain old data trait. Types that implement this trait contain no references and can be shared
/// across threads.
pub trait Pod: 'static + Copy + Sized + Send + Sync {}
impl<T> Pod for T where T: 'static + Copy + Sized + Send + Sync {}

/// Floating point type used for vertex positions.
pub trait Real:
    math::ComplexField + num_traits::Float + ::std::fmt::Debug + std::iter::Sum + Pod
{
}
impl<T> Real for T where
    T: math::ComplexField + num_traits::Float + ::std::fmt::Debug + std::iter::Sum + Pod
{
}
