//!
//! The multi-block container.
//!
//! A [`MultiBlock`] is an ordered list of blocks. Each block holds an optional shared dataset and
//! an optional name which is unique within the container. Blocks are addressed by position or by
//! name.
//!
//! Names follow a last writer wins policy: giving a block a name that is already in use takes the
//! name away from the block that held it, which becomes unnamed.
//!

use std::fmt;
use std::sync::Arc;

use ahash::{HashMap, HashMapExt};
use num_traits::ToPrimitive;

use crate::algo::Merge;
use crate::bbox::BBox;
use crate::dataset::{DataSet, DataSetView, SharedDataSet};
use crate::error::{Error, Result};
use crate::mesh::{Mesh, PolyMesh};
use crate::ops::*;
use crate::Real;

/// A single slot of a [`MultiBlock`].
#[derive(Clone, Debug)]
struct Block<T: Real> {
    data: Option<SharedDataSet<T>>,
    name: Option<String>,
}

impl<T: Real> Block<T> {
    fn new(data: Option<SharedDataSet<T>>) -> Self {
        Block { data, name: None }
    }
}

/// An ordered, name-addressable collection of optional datasets.
///
/// Cloning a `MultiBlock` is shallow: the clone shares every dataset with the original. Use
/// [`MultiBlock::copy`] with `deep = true` to duplicate the datasets as well.
///
/// There is no structural equality on containers. Two blocks hold the same dataset when their
/// handles satisfy `Arc::ptr_eq`.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use meshblock::{MultiBlock, PointCloud, SharedDataSet};
///
/// let points: SharedDataSet = Arc::new(PointCloud::new(vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]));
///
/// let mut multi = MultiBlock::new();
/// multi.append(Some(Arc::clone(&points)));
/// multi.append_with_name(None, "empty");
///
/// assert_eq!(multi.num_blocks(), 2);
/// assert_eq!(multi.get_index_by_name("empty").unwrap(), 1);
/// assert!(Arc::ptr_eq(multi.get(0).unwrap().unwrap(), &points));
/// assert_eq!(multi.bounds().unwrap().bounds(), [0.0, 1.0, 0.0, 2.0, 0.0, 3.0]);
/// ```
#[derive(Clone, Debug)]
pub struct MultiBlock<T: Real = f64> {
    blocks: Vec<Block<T>>,
    /// Index of the block holding each name.
    names: HashMap<String, usize>,
}

impl<T: Real> Default for MultiBlock<T> {
    fn default() -> Self {
        MultiBlock {
            blocks: Vec::new(),
            names: HashMap::new(),
        }
    }
}

impl<T: Real> MultiBlock<T> {
    /// Construct an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a container with one unnamed block per item, in order.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Option<SharedDataSet<T>>>) -> Self {
        MultiBlock {
            blocks: blocks.into_iter().map(Block::new).collect(),
            names: HashMap::new(),
        }
    }

    /// Construct a container with one named block per item, in iteration order.
    ///
    /// Repeated names follow the usual last writer wins policy, so only the last block given a
    /// particular name keeps it.
    pub fn from_named<S: AsRef<str>>(
        blocks: impl IntoIterator<Item = (S, SharedDataSet<T>)>,
    ) -> Self {
        let mut multi = Self::new();
        for (name, data) in blocks {
            multi.append_with_name(Some(data), name.as_ref());
        }
        multi
    }

    /// Copy this container.
    ///
    /// A shallow copy shares all datasets with `self`. A deep copy duplicates every dataset,
    /// including those inside nested containers. Names are copied either way.
    pub fn copy(&self, deep: bool) -> Self {
        if !deep {
            return self.clone();
        }
        MultiBlock {
            blocks: self
                .blocks
                .iter()
                .map(|block| Block {
                    data: block.data.as_ref().map(|d| d.deep_copy()),
                    name: block.name.clone(),
                })
                .collect(),
            names: self.names.clone(),
        }
    }

    /// Number of blocks, including empty ones.
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if there are no blocks at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Resize the container to `n` blocks.
    ///
    /// Growing appends empty, unnamed blocks. Shrinking drops the trailing blocks along with
    /// their names.
    pub fn set_num_blocks(&mut self, n: usize) {
        if n < self.blocks.len() {
            log::debug!("truncating multi-block from {} to {} blocks", self.blocks.len(), n);
            for block in self.blocks.drain(n..) {
                if let Some(name) = block.name {
                    self.names.remove(&name);
                }
            }
        } else {
            self.blocks.resize_with(n, || Block::new(None));
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.blocks.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds {
                index,
                len: self.blocks.len(),
            })
        }
    }

    /// The dataset at `index`, or `None` if that block is empty.
    pub fn get(&self, index: usize) -> Result<Option<&SharedDataSet<T>>> {
        self.check_index(index)?;
        Ok(self.blocks[index].data.as_ref())
    }

    /// The dataset in the block named `name`, or `None` if that block is empty.
    pub fn get_by_name(&self, name: &str) -> Result<Option<&SharedDataSet<T>>> {
        let index = self.get_index_by_name(name)?;
        Ok(self.blocks[index].data.as_ref())
    }

    /// Replace the dataset at `index`, keeping the block's name.
    ///
    /// Setting an index past the end grows the container to `index + 1` blocks, padding with
    /// empty blocks.
    pub fn set(&mut self, index: usize, data: Option<SharedDataSet<T>>) {
        if index >= self.blocks.len() {
            self.set_num_blocks(index + 1);
        }
        self.blocks[index].data = data;
    }

    /// Replace the dataset at `index` and give the block `name`.
    ///
    /// Grows the container like [`MultiBlock::set`].
    pub fn set_with_name(&mut self, index: usize, name: &str, data: Option<SharedDataSet<T>>) {
        self.set(index, data);
        self.assign_name(index, name);
    }

    /// Replace the dataset in the block named `name`, or append a new block with that name if
    /// there is none. Returns the index of the block.
    pub fn set_by_name(&mut self, name: &str, data: Option<SharedDataSet<T>>) -> usize {
        match self.names.get(name) {
            Some(&index) => {
                self.blocks[index].data = data;
                index
            }
            None => self.append_with_name(data, name),
        }
    }

    /// Add an unnamed block at the end and return its index.
    pub fn append(&mut self, data: Option<SharedDataSet<T>>) -> usize {
        self.blocks.push(Block::new(data));
        self.blocks.len() - 1
    }

    /// Add a named block at the end and return its index.
    pub fn append_with_name(&mut self, data: Option<SharedDataSet<T>>, name: &str) -> usize {
        let index = self.append(data);
        self.assign_name(index, name);
        index
    }

    /// Remove the block at `index`, shifting later blocks down by one.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        self.pop(index).map(|_| ())
    }

    /// Remove the block named `name`, shifting later blocks down by one.
    pub fn delete_by_name(&mut self, name: &str) -> Result<()> {
        let index = self.get_index_by_name(name)?;
        self.delete(index)
    }

    /// Remove the block at `index` and return its dataset. Later blocks shift down by one and
    /// keep their names.
    pub fn pop(&mut self, index: usize) -> Result<Option<SharedDataSet<T>>> {
        self.check_index(index)?;
        let block = self.blocks.remove(index);
        if let Some(name) = &block.name {
            self.names.remove(name);
        }
        for i in self.names.values_mut() {
            if *i > index {
                *i -= 1;
            }
        }
        Ok(block.data)
    }

    /// Name the block at `index`, or clear its name when `name` is `None`.
    ///
    /// A name already held by another block is moved to this one.
    pub fn set_block_name(&mut self, index: usize, name: Option<&str>) -> Result<()> {
        self.check_index(index)?;
        match name {
            Some(name) => self.assign_name(index, name),
            None => {
                if let Some(old) = self.blocks[index].name.take() {
                    self.names.remove(&old);
                }
            }
        }
        Ok(())
    }

    /// Give the block at a valid `index` the given name, taking it from any other holder.
    fn assign_name(&mut self, index: usize, name: &str) {
        if self.blocks[index].name.as_deref() == Some(name) {
            return;
        }
        if let Some(old) = self.blocks[index].name.take() {
            self.names.remove(&old);
        }
        if let Some(prev) = self.names.insert(name.to_owned(), index) {
            log::debug!(
                "block name '{}' moved from block {} to block {}",
                name,
                prev,
                index
            );
            self.blocks[prev].name = None;
        }
        self.blocks[index].name = Some(name.to_owned());
    }

    /// Name of the block at `index`.
    ///
    /// Returns `None` for unnamed blocks and for indices out of range.
    pub fn get_block_name(&self, index: usize) -> Option<&str> {
        self.blocks.get(index)?.name.as_deref()
    }

    /// Index of the block named `name`.
    pub fn get_index_by_name(&self, name: &str) -> Result<usize> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| Error::KeyNotFound(name.to_owned()))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Names of all blocks in order.
    pub fn keys(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.blocks.iter().map(|b| b.name.as_deref())
    }

    /// Iterate over the datasets of all blocks in order. Empty blocks yield `None`.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            blocks: self.blocks.iter(),
        }
    }

    /// Iterate over names and datasets of all blocks in order.
    pub fn iter_named(&self) -> impl Iterator<Item = (Option<&str>, Option<&SharedDataSet<T>>)> {
        self.blocks
            .iter()
            .map(|b| (b.name.as_deref(), b.data.as_ref()))
    }

    /// Bounds spanning every non-empty block, recursing into nested containers.
    ///
    /// Returns `None` if no block has any points.
    pub fn bounds(&self) -> Option<BBox<T>> {
        let mut bbox = BBox::empty();
        for block_bounds in self.iter().flatten().filter_map(|data| data.bounds()) {
            bbox.absorb(block_bounds);
        }
        if bbox.is_empty() {
            None
        } else {
            Some(bbox)
        }
    }

    /// Center of the bounds.
    pub fn center(&self) -> Option<[T; 3]> {
        self.bounds().and_then(|bbox| bbox.centroid())
    }

    /// Length of the diagonal of the bounds, zero if there are none.
    pub fn length(&self) -> T
    where
        T: math::RealField,
    {
        self.bounds().map_or_else(T::zero, |bbox| bbox.diameter())
    }

    /// Total volume of all blocks, including those of nested containers.
    ///
    /// Only volumetric cells contribute, so point clouds and polygon meshes add nothing.
    pub fn volume(&self) -> T {
        self.iter().flatten().map(|data| data.volume()).sum()
    }

    /// The edges of the bounds as line segments.
    pub fn outline(&self) -> PolyMesh<T> {
        PolyMesh::from_bbox_outline(&self.bounds().unwrap_or_else(BBox::empty))
    }

    /// Merge the surfaces of all blocks into one polygon mesh. Empty blocks are skipped.
    pub fn extract_geometry(&self) -> PolyMesh<T> {
        let mut geometry = PolyMesh::default();
        for data in self.iter().flatten() {
            geometry.merge_from(&data.extract_surface());
        }
        geometry
    }

    /// Merge all blocks into one unstructured mesh, keeping vertex and cell arrays. Empty blocks
    /// are skipped.
    ///
    /// With `merge_points` set, points at identical positions are merged into one.
    pub fn combine(&self, merge_points: bool) -> Mesh<T> {
        let mut mesh = Mesh::default();
        for data in self.iter().flatten() {
            data.merge_into(&mut mesh);
        }
        if merge_points {
            mesh.merge_coincident_points();
        }
        mesh
    }

    /// Smallest and largest value of the named array over all blocks, ignoring NaN.
    ///
    /// Returns `None` if no block carries the array.
    pub fn get_data_range(&self, name: &str) -> Option<(f64, f64)> {
        self.iter()
            .flatten()
            .filter_map(|data| data.data_range(name))
            .reduce(|(lo, hi), (block_lo, block_hi)| (lo.min(block_lo), hi.max(block_hi)))
    }

    /// Remove empty blocks, and with `empty` set, also blocks without any points.
    ///
    /// Nested containers are cleaned as well. They are replaced by cleaned copies so that other
    /// holders of the nested container are unaffected.
    pub fn clean(&mut self, empty: bool) {
        let blocks = std::mem::take(&mut self.blocks);
        let num_before = blocks.len();
        self.names.clear();

        for block in blocks {
            let data = match block.data {
                Some(data) => data,
                None => continue,
            };
            let cleaned = match data.view() {
                DataSetView::MultiBlock(nested) => {
                    let mut nested = nested.clone();
                    nested.clean(empty);
                    Some(Arc::new(nested) as SharedDataSet<T>)
                }
                _ => None,
            };
            let data = match cleaned {
                Some(nested) => nested,
                None if empty && data.num_points() == 0 => continue,
                None => data,
            };
            if let Some(name) = &block.name {
                self.names.insert(name.clone(), self.blocks.len());
            }
            self.blocks.push(Block {
                data: Some(data),
                name: block.name,
            });
        }

        log::debug!("cleaned {} blocks", num_before - self.blocks.len());
    }

    /// Build a new container by applying `f` to the dataset of every non-empty block.
    ///
    /// Names are kept and empty blocks stay empty. Nested containers are traversed, with `f`
    /// applied to their blocks instead.
    pub fn map_blocks<F>(&self, mut f: F) -> MultiBlock<T>
    where
        F: FnMut(&SharedDataSet<T>) -> Option<SharedDataSet<T>>,
    {
        self.map_blocks_dyn(&mut f)
    }

    fn map_blocks_dyn(
        &self,
        f: &mut dyn FnMut(&SharedDataSet<T>) -> Option<SharedDataSet<T>>,
    ) -> MultiBlock<T> {
        let blocks = self
            .blocks
            .iter()
            .map(|block| {
                let data = block.data.as_ref().and_then(|data| match data.view() {
                    DataSetView::MultiBlock(nested) => {
                        Some(Arc::new(nested.map_blocks_dyn(&mut *f)) as SharedDataSet<T>)
                    }
                    _ => f(data),
                });
                Block {
                    data,
                    name: block.name.clone(),
                }
            })
            .collect();
        MultiBlock {
            blocks,
            names: self.names.clone(),
        }
    }
}

/// Iterator over the datasets of a [`MultiBlock`].
#[derive(Clone)]
pub struct Iter<'a, T: Real> {
    blocks: std::slice::Iter<'a, Block<T>>,
}

impl<'a, T: Real> Iterator for Iter<'a, T> {
    type Item = Option<&'a SharedDataSet<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.blocks.next().map(|b| b.data.as_ref())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.blocks.size_hint()
    }
}

impl<'a, T: Real> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.blocks.next_back().map(|b| b.data.as_ref())
    }
}

impl<'a, T: Real> ExactSizeIterator for Iter<'a, T> {}

impl<'a, T: Real> IntoIterator for &'a MultiBlock<T> {
    type Item = Option<&'a SharedDataSet<T>>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Real> FromIterator<SharedDataSet<T>> for MultiBlock<T> {
    fn from_iter<I: IntoIterator<Item = SharedDataSet<T>>>(iter: I) -> Self {
        MultiBlock::from_blocks(iter.into_iter().map(Some))
    }
}

impl<T: Real> FromIterator<Option<SharedDataSet<T>>> for MultiBlock<T> {
    fn from_iter<I: IntoIterator<Item = Option<SharedDataSet<T>>>>(iter: I) -> Self {
        MultiBlock::from_blocks(iter)
    }
}

impl<T: Real> FromIterator<(String, SharedDataSet<T>)> for MultiBlock<T> {
    fn from_iter<I: IntoIterator<Item = (String, SharedDataSet<T>)>>(iter: I) -> Self {
        MultiBlock::from_named(iter)
    }
}

impl<T: Real> DataSet<T> for MultiBlock<T> {
    fn bounds(&self) -> Option<BBox<T>> {
        MultiBlock::bounds(self)
    }
    fn extract_surface(&self) -> PolyMesh<T> {
        self.extract_geometry()
    }
    fn merge_into(&self, target: &mut Mesh<T>) {
        for data in self.iter().flatten() {
            data.merge_into(target);
        }
    }
    fn deep_copy(&self) -> SharedDataSet<T> {
        Arc::new(self.copy(true))
    }
    fn num_points(&self) -> usize {
        self.iter().flatten().map(|data| data.num_points()).sum()
    }
    fn volume(&self) -> T {
        MultiBlock::volume(self)
    }
    fn data_range(&self, name: &str) -> Option<(f64, f64)> {
        self.get_data_range(name)
    }
    fn type_name(&self) -> &'static str {
        "MultiBlock"
    }
    fn view(&self) -> DataSetView<'_, T> {
        DataSetView::MultiBlock(self)
    }
}

/// A summary of the container: block count, bounds along each axis and one row per block.
impl<T: Real> fmt::Display for MultiBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "MultiBlock")?;
        writeln!(f, "  N Blocks:\t{}", self.num_blocks())?;
        match self.bounds() {
            Some(bbox) => {
                let b = bbox
                    .bounds()
                    .map(|x| ToPrimitive::to_f64(&x).unwrap_or(f64::NAN));
                writeln!(f, "  X Bounds:\t{:.3}, {:.3}", b[0], b[1])?;
                writeln!(f, "  Y Bounds:\t{:.3}, {:.3}", b[2], b[3])?;
                writeln!(f, "  Z Bounds:\t{:.3}, {:.3}", b[4], b[5])?;
            }
            None => writeln!(f, "  Bounds:\tNone")?,
        }
        for (i, (name, data)) in self.iter_named().enumerate() {
            writeln!(
                f,
                "  {}\t{}\t{}",
                i,
                name.unwrap_or("-"),
                data.map_or("None", |d| d.type_name())
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrib::{Attrib, Location};
    use crate::mesh::{CellType, NumCells, NumFaces, NumVertices, PointCloud};
    use approx::assert_relative_eq;

    fn points(pts: Vec<[f64; 3]>) -> SharedDataSet {
        Arc::new(PointCloud::new(pts))
    }

    fn triangle(offset: f64) -> PolyMesh<f64> {
        PolyMesh::new(
            vec![
                [offset, 0.0, 0.0],
                [offset + 1.0, 0.0, 0.0],
                [offset, 1.0, 0.0],
            ],
            &[3, 0, 1, 2],
        )
    }

    fn is(a: Option<&SharedDataSet>, b: &SharedDataSet) -> bool {
        a.map_or(false, |a| Arc::ptr_eq(a, b))
    }

    #[test]
    fn append_get_delete() {
        let a = points(vec![[0.0; 3]]);
        let b = points(vec![[1.0; 3]]);
        let c = points(vec![[2.0; 3]]);

        let mut multi: MultiBlock = MultiBlock::new();
        assert_eq!(multi.append(Some(Arc::clone(&a))), 0);
        assert_eq!(multi.append_with_name(Some(Arc::clone(&b)), "second"), 1);
        assert_eq!(multi.append(Some(Arc::clone(&c))), 2);

        assert_eq!(multi.num_blocks(), 3);
        assert_eq!(multi.get_block_name(1), Some("second"));
        assert!(is(multi.get(2).unwrap(), &c));

        multi.delete(0).unwrap();
        assert_eq!(multi.num_blocks(), 2);
        assert!(is(multi.get(0).unwrap(), &b));
        assert_eq!(multi.get_block_name(0), Some("second"));
        assert_eq!(multi.get_index_by_name("second").unwrap(), 0);
        assert!(is(multi.get_by_name("second").unwrap(), &b));
    }

    #[test]
    fn resize_and_name() {
        let mut multi = MultiBlock::<f64>::new();
        multi.set_num_blocks(4);
        assert_eq!(multi.num_blocks(), 4);
        multi.set_block_name(1, Some("x")).unwrap();
        multi.set_block_name(3, Some("y")).unwrap();

        assert_eq!(multi.get_index_by_name("x").unwrap(), 1);
        assert_eq!(multi.get_index_by_name("y").unwrap(), 3);
        assert!(multi.get(0).unwrap().is_none());
        assert!(multi.get(2).unwrap().is_none());

        // Truncation drops names with their blocks.
        multi.set_num_blocks(2);
        assert_eq!(multi.num_blocks(), 2);
        assert!(!multi.contains_name("y"));
        assert!(multi.contains_name("x"));
        multi.set_num_blocks(3);
        assert_eq!(multi.get_block_name(2), None);
    }

    #[test]
    fn truncation_discards_data() {
        let a = points(vec![[0.0; 3]]);
        let mut multi: MultiBlock = vec![Arc::clone(&a), Arc::clone(&a)].into_iter().collect();
        multi.set_num_blocks(1);
        multi.set_num_blocks(2);
        assert!(multi.get(1).unwrap().is_none());
        assert_eq!(Arc::strong_count(&a), 2);
    }

    #[test]
    fn out_of_range() {
        let mut multi = MultiBlock::<f64>::new();
        multi.append(None);
        assert!(matches!(
            multi.get(1),
            Err(Error::IndexOutOfBounds { index: 1, len: 1 })
        ));
        assert!(multi.delete(5).is_err());
        assert!(multi.pop(1).is_err());
        assert!(multi.set_block_name(1, Some("a")).is_err());
        assert_eq!(multi.get_block_name(10), None);
        assert_eq!(multi.num_blocks(), 1);
    }

    #[test]
    fn missing_names() {
        let mut multi = MultiBlock::<f64>::new();
        multi.append_with_name(None, "a");
        assert!(matches!(multi.get_by_name("b"), Err(Error::KeyNotFound(n)) if n == "b"));
        assert!(matches!(multi.get_index_by_name("b"), Err(Error::KeyNotFound(_))));
        assert!(matches!(multi.delete_by_name("b"), Err(Error::KeyNotFound(_))));
        multi.delete_by_name("a").unwrap();
        assert!(multi.is_empty());
    }

    #[test]
    fn set_grows_and_keeps_name() {
        let a = points(vec![[0.0; 3]]);
        let b = points(vec![[1.0; 3]]);
        let mut multi: MultiBlock = MultiBlock::new();
        multi.set(2, Some(Arc::clone(&a)));
        assert_eq!(multi.num_blocks(), 3);
        assert!(multi.get(0).unwrap().is_none());
        assert!(is(multi.get(2).unwrap(), &a));

        multi.set_block_name(2, Some("a")).unwrap();
        multi.set(2, Some(Arc::clone(&b)));
        assert_eq!(multi.get_block_name(2), Some("a"));
        assert!(is(multi.get_by_name("a").unwrap(), &b));

        multi.set(2, None);
        assert!(multi.get(2).unwrap().is_none());
        assert_eq!(multi.get_block_name(2), Some("a"));

        multi.set_with_name(4, "late", Some(Arc::clone(&a)));
        assert_eq!(multi.num_blocks(), 5);
        assert_eq!(multi.get_index_by_name("late").unwrap(), 4);
    }

    #[test]
    fn set_by_name() {
        let a = points(vec![[0.0; 3]]);
        let b = points(vec![[1.0; 3]]);
        let mut multi: MultiBlock = MultiBlock::new();
        assert_eq!(multi.set_by_name("a", Some(Arc::clone(&a))), 0);
        assert_eq!(multi.set_by_name("b", None), 1);
        assert_eq!(multi.set_by_name("a", Some(Arc::clone(&b))), 0);
        assert_eq!(multi.num_blocks(), 2);
        assert!(is(multi.get(0).unwrap(), &b));
    }

    #[test]
    fn name_collision_moves_name() {
        let mut multi = MultiBlock::<f64>::new();
        multi.set_num_blocks(3);
        multi.set_block_name(0, Some("shared")).unwrap();
        multi.set_block_name(2, Some("shared")).unwrap();

        assert_eq!(multi.get_index_by_name("shared").unwrap(), 2);
        assert_eq!(multi.get_block_name(0), None);
        assert_eq!(multi.get_block_name(2), Some("shared"));

        // Renaming releases the old name.
        multi.set_block_name(2, Some("other")).unwrap();
        assert!(!multi.contains_name("shared"));
        multi.set_block_name(2, None).unwrap();
        assert!(!multi.contains_name("other"));
        assert_eq!(multi.keys().collect::<Vec<_>>(), vec![None, None, None]);

        // Same name twice on the same block is a no-op.
        multi.set_block_name(1, Some("one")).unwrap();
        multi.set_block_name(1, Some("one")).unwrap();
        assert_eq!(multi.get_index_by_name("one").unwrap(), 1);
    }

    #[test]
    fn names_follow_shifts() {
        let mut multi = MultiBlock::<f64>::new();
        for name in ["a", "b", "c", "d"] {
            multi.append_with_name(None, name);
        }
        assert!(multi.pop(1).unwrap().is_none());
        assert_eq!(multi.get_index_by_name("a").unwrap(), 0);
        assert_eq!(multi.get_index_by_name("c").unwrap(), 1);
        assert_eq!(multi.get_index_by_name("d").unwrap(), 2);
        assert!(!multi.contains_name("b"));
        assert_eq!(
            multi.keys().collect::<Vec<_>>(),
            vec![Some("a"), Some("c"), Some("d")]
        );
    }

    #[test]
    fn pop_returns_data() {
        let a = points(vec![[0.0; 3]]);
        let mut multi: MultiBlock = MultiBlock::new();
        multi.append(None);
        multi.append(Some(Arc::clone(&a)));
        let popped = multi.pop(1).unwrap().unwrap();
        assert!(Arc::ptr_eq(&popped, &a));
        assert_eq!(multi.num_blocks(), 1);
    }

    #[test]
    fn construction() {
        let a = points(vec![[0.0; 3]]);
        let multi: MultiBlock = vec![Some(Arc::clone(&a)), None].into_iter().collect();
        assert_eq!(multi.num_blocks(), 2);
        assert_eq!(multi.get_block_name(0), None);

        let named: MultiBlock = vec![
            ("first".to_string(), Arc::clone(&a)),
            ("second".to_string(), Arc::clone(&a)),
        ]
        .into_iter()
        .collect();
        assert_eq!(named.get_index_by_name("second").unwrap(), 1);

        let dup = MultiBlock::from_named(vec![("x", Arc::clone(&a)), ("x", Arc::clone(&a))]);
        assert_eq!(dup.num_blocks(), 2);
        assert_eq!(dup.keys().collect::<Vec<_>>(), vec![None, Some("x")]);
    }

    #[test]
    fn iteration() {
        let a = points(vec![[0.0; 3]]);
        let mut multi: MultiBlock = MultiBlock::new();
        multi.append(Some(Arc::clone(&a)));
        multi.append(None);
        multi.append_with_name(Some(Arc::clone(&a)), "last");

        let items: Vec<bool> = multi.iter().map(|d| d.is_some()).collect();
        assert_eq!(items, vec![true, false, true]);

        // Iteration is restartable.
        assert_eq!(multi.iter().count(), 3);
        assert_eq!((&multi).into_iter().rev().count(), 3);
        assert_eq!(multi.iter().len(), 3);

        let mut n = 0;
        for data in &multi {
            if data.is_some() {
                n += 1;
            }
        }
        assert_eq!(n, 2);

        let names: Vec<_> = multi.iter_named().map(|(name, _)| name).collect();
        assert_eq!(names, vec![None, None, Some("last")]);
    }

    #[test]
    fn bounds_of_empty() {
        let mut multi = MultiBlock::<f64>::new();
        assert!(multi.bounds().is_none());
        multi.set_num_blocks(3);
        assert!(multi.bounds().is_none());
        multi.append(Some(points(vec![])));
        assert!(multi.bounds().is_none());
        assert!(multi.center().is_none());
        assert_eq!(multi.length(), 0.0);
        assert_eq!(multi.outline().num_faces(), 0);
    }

    #[test]
    fn nested_bounds() {
        let mut inner: MultiBlock = MultiBlock::new();
        inner.append(Some(points(vec![[-1.0, 0.0, 5.0]])));
        let mut outer: MultiBlock = MultiBlock::new();
        outer.append(Some(Arc::new(triangle(0.0))));
        outer.append(None);
        outer.append(Some(Arc::new(inner)));

        let bounds = outer.bounds().unwrap();
        assert_eq!(bounds.bounds(), [-1.0, 1.0, 0.0, 1.0, 0.0, 5.0]);
        assert_eq!(outer.center(), Some([0.0, 0.5, 2.5]));
        assert_relative_eq!(outer.length(), (4.0f64 + 1.0 + 25.0).sqrt());
        assert_eq!(outer.outline().num_vertices(), 8);
        assert_eq!(DataSet::num_points(&outer), 4);
    }

    #[test]
    fn extract_geometry() {
        let tet = Mesh::from_cells(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            vec![(CellType::Tetrahedron, vec![0, 1, 2, 3])],
        );
        let mut multi: MultiBlock = MultiBlock::new();
        multi.append(Some(Arc::new(tet)));
        multi.append(None);
        multi.append(Some(Arc::new(triangle(5.0))));

        let geometry = multi.extract_geometry();
        assert_eq!(geometry.num_faces(), 5);
        assert_eq!(geometry.num_vertices(), 7);
        assert!(MultiBlock::<f64>::new().extract_geometry().vertex_positions.is_empty());

        // Point content survives whether it is stored as a point cloud or as vertex cells.
        let cloud = PointCloud::new(vec![[0.0, 0.0, 5.0], [1.0, 1.0, 5.0]]);
        let mut as_cloud: MultiBlock = MultiBlock::new();
        as_cloud.append(Some(Arc::new(cloud.clone())));
        let mut as_cells: MultiBlock = MultiBlock::new();
        as_cells.append(Some(Arc::new(Mesh::from(&cloud))));
        assert_eq!(as_cloud.extract_geometry().num_vertices(), 2);
        assert_eq!(as_cells.extract_geometry().num_vertices(), 2);

        let mut combined: MultiBlock = MultiBlock::new();
        combined.append(Some(Arc::new(multi.combine(false))));
        combined.append(Some(Arc::new(as_cloud.combine(false))));
        let geometry = combined.extract_geometry();
        assert_eq!(geometry.num_vertices(), 9);
        assert_eq!(geometry.num_faces(), 7);
    }

    #[test]
    fn volume() {
        let cube = vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 2.0],
            [2.0, 0.0, 2.0],
            [2.0, 2.0, 2.0],
            [0.0, 2.0, 2.0],
        ];
        let hex = Mesh::from_cells(
            cube,
            vec![(CellType::Hexahedron, vec![0, 1, 2, 3, 4, 5, 6, 7])],
        );
        let tet = Mesh::from_cells(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            vec![(CellType::Tetrahedron, vec![0, 1, 2, 3])],
        );

        let mut nested: MultiBlock = MultiBlock::new();
        nested.append(Some(Arc::new(tet)));
        nested.append(Some(Arc::new(triangle(0.0))));
        nested.append(None);

        let mut multi: MultiBlock = MultiBlock::new();
        multi.append(Some(Arc::new(hex)));
        multi.append(Some(points(vec![[1.0; 3]])));
        multi.append(Some(Arc::new(nested)));

        assert_relative_eq!(multi.volume(), 8.0 + 1.0 / 6.0, epsilon = 1e-12);
        assert_eq!(MultiBlock::<f64>::new().volume(), 0.0);
    }

    #[test]
    fn combine() {
        let mut left = triangle(0.0);
        left.add_attrib_data(Location::Vertex, "t", vec![1.0f64, 2.0, 3.0])
            .unwrap();
        let mut right = triangle(1.0);
        right
            .add_attrib_data(Location::Vertex, "t", vec![4.0f64, 5.0, 6.0])
            .unwrap();

        let mut multi: MultiBlock = MultiBlock::new();
        multi.append(Some(Arc::new(left)));
        multi.append(None);
        multi.append(Some(Arc::new(right)));
        multi.append(Some(points(vec![[9.0, 9.0, 9.0]])));

        let mesh = multi.combine(false);
        assert_eq!(mesh.num_vertices(), 7);
        assert_eq!(mesh.num_cells(), 3);
        assert_eq!(
            mesh.types,
            vec![CellType::Triangle, CellType::Triangle, CellType::Vertex]
        );
        assert_eq!(
            mesh.attrib_as_slice::<f64>(Location::Vertex, "t").unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.0]
        );

        // The right triangle shares its first vertex with the second vertex of the left one.
        let merged = multi.combine(true);
        assert_eq!(merged.num_vertices(), 6);
        assert_eq!(merged.num_cells(), 3);

        assert_eq!(multi.get_data_range("t"), Some((1.0, 6.0)));
        assert_eq!(multi.get_data_range("missing"), None);
    }

    #[test]
    fn clean() {
        let a = points(vec![[0.0; 3]]);
        let mut inner: MultiBlock = MultiBlock::new();
        inner.append(None);
        inner.append_with_name(Some(points(vec![])), "hollow");
        inner.append(Some(Arc::clone(&a)));
        let inner: SharedDataSet = Arc::new(inner);

        let mut multi: MultiBlock = MultiBlock::new();
        multi.append(None);
        multi.append_with_name(Some(Arc::clone(&a)), "a");
        multi.append(Some(points(vec![])));
        multi.append_with_name(Some(Arc::clone(&inner)), "inner");

        let mut kept_empty = multi.clone();
        kept_empty.clean(false);
        assert_eq!(kept_empty.num_blocks(), 3);

        multi.clean(true);
        assert_eq!(multi.num_blocks(), 2);
        assert_eq!(multi.get_index_by_name("a").unwrap(), 0);
        assert_eq!(multi.get_index_by_name("inner").unwrap(), 1);

        // The nested container was replaced by a cleaned copy.
        let cleaned_inner = multi.get(1).unwrap().unwrap();
        assert!(!Arc::ptr_eq(cleaned_inner, &inner));
        match cleaned_inner.view() {
            DataSetView::MultiBlock(nested) => {
                assert_eq!(nested.num_blocks(), 1);
                assert!(!nested.contains_name("hollow"));
            }
            _ => panic!("expected a nested container"),
        }
        match inner.view() {
            DataSetView::MultiBlock(nested) => assert_eq!(nested.num_blocks(), 3),
            _ => panic!("expected a nested container"),
        }
    }

    #[test]
    fn shallow_and_deep_copy() {
        let a = points(vec![[0.0; 3]]);
        let mut inner: MultiBlock = MultiBlock::new();
        inner.append(Some(Arc::clone(&a)));
        let mut multi: MultiBlock = MultiBlock::new();
        multi.append_with_name(Some(Arc::clone(&a)), "a");
        multi.append_with_name(Some(Arc::new(inner)), "inner");

        let shallow = multi.copy(false);
        assert!(is(shallow.get(0).unwrap(), &a));
        assert_eq!(shallow.get_index_by_name("inner").unwrap(), 1);

        let deep = multi.copy(true);
        assert!(!is(deep.get(0).unwrap(), &a));
        assert_eq!(deep.get_index_by_name("a").unwrap(), 0);
        match deep.get(1).unwrap().unwrap().view() {
            DataSetView::MultiBlock(nested) => assert!(!is(nested.get(0).unwrap(), &a)),
            _ => panic!("expected a nested container"),
        }
        assert_eq!(deep.bounds(), multi.bounds());

        // Mutating a copy leaves the original alone.
        let mut copy = multi.copy(false);
        copy.delete(0).unwrap();
        assert_eq!(multi.num_blocks(), 2);
    }

    #[test]
    fn map_blocks() {
        let mut inner: MultiBlock = MultiBlock::new();
        inner.append(Some(Arc::new(triangle(0.0)) as SharedDataSet));
        let mut multi: MultiBlock = MultiBlock::new();
        multi.append_with_name(Some(Arc::new(triangle(1.0))), "tri");
        multi.append(None);
        multi.append(Some(Arc::new(inner)));

        let outlines = multi.map_blocks(|data| {
            data.bounds()
                .map(|b| Arc::new(PolyMesh::from_bbox_outline(&b)) as SharedDataSet)
        });
        assert_eq!(outlines.num_blocks(), 3);
        assert_eq!(outlines.get_index_by_name("tri").unwrap(), 0);
        assert!(outlines.get(1).unwrap().is_none());
        assert_eq!(DataSet::num_points(&outlines), 16);
        assert_eq!(outlines.get(0).unwrap().unwrap().type_name(), "PolyMesh");
    }

    #[test]
    fn display() {
        let mut multi: MultiBlock = MultiBlock::new();
        multi.append_with_name(Some(Arc::new(triangle(0.0))), "tri");
        multi.append(None);
        let summary = multi.to_string();
        assert!(summary.contains("N Blocks:\t2"));
        assert!(summary.contains("X Bounds:\t0.000, 1.000"));
        assert!(summary.contains("tri\tPolyMesh"));
        assert!(summary.contains("1\t-\tNone"));
        assert!(MultiBlock::<f64>::new().to_string().contains("Bounds:\tNone"));
    }

    #[test]
    fn send_and_sync() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<MultiBlock<f64>>();
        assert_send_sync::<SharedDataSet<f32>>();
    }
}
