use crate::bbox::BBox;

pub trait Empty {
    /// Construct an empty object.
    fn empty() -> Self;
    /// Check if this object is empty.
    fn is_empty(&self) -> bool;
}

pub trait Contains<RHS = Self> {
    /// Check if this object contains another.
    fn contains(&self, obj: RHS) -> bool;
}

pub trait Absorb<RHS = Self> {
    type Output;

    /// Absorb another object.
    /// For example if a = [-1, 2] and b = [3, 4] is are closed intervals,
    /// then a.absorb(b) == [-1 4].
    fn absorb(self, rhs: RHS) -> Self::Output;
}

pub trait Centroid<T> {
    /// Compute the centroid of the object.
    fn centroid(self) -> T;
}

pub trait BoundingBox<T> {
    /// Compute the bounding box of this object.
    ///
    /// Objects without any points produce an empty box.
    fn bounding_box(&self) -> BBox<T>;
}
