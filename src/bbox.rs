use crate::ops::*;
use math::Vector3;
use num_traits::Float;

/// General purpose axis-aligned bounding box.
///
/// An empty box has its minimum corner at positive infinity and its maximum corner at negative
/// infinity, so absorbing any point into it yields a degenerate box around that point.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BBox<T> {
    min: [T; 3],
    max: [T; 3],
}

impl<T: Float> BBox<T> {
    /// Construct a bounding box containing points `minb` and `maxb`.
    /// # Examples
    /// ```
    /// # use meshblock::bbox::*;
    /// let min_p = [0.0; 3];
    /// let max_p = [1.5, 0.5, 1.0];
    /// let sample_box = BBox::<f32>::new(min_p, max_p);
    ///
    /// assert_eq!(sample_box.min_corner(), min_p);
    /// assert_eq!(sample_box.max_corner(), max_p);
    /// ```
    pub fn new(minb: [T; 3], maxb: [T; 3]) -> Self {
        let mut empty_bbox = BBox::empty();
        empty_bbox.absorb(minb).absorb(maxb);
        empty_bbox
    }

    /// Construct a bounding box from six numbers `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    ///
    /// This is the inverse of [`BBox::bounds`].
    /// # Examples
    /// ```
    /// # use meshblock::bbox::*;
    /// let bbox = BBox::from_bounds([-1.0, 1.0, 0.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(bbox.min_corner(), [-1.0, 0.0, 3.0]);
    /// assert_eq!(bbox.max_corner(), [1.0, 2.0, 4.0]);
    /// ```
    pub fn from_bounds(bounds: [T; 6]) -> Self {
        BBox::new(
            [bounds[0], bounds[2], bounds[4]],
            [bounds[1], bounds[3], bounds[5]],
        )
    }

    /// Construct a unit bounding box from zero to one in each dimension.
    pub fn unit() -> BBox<T> {
        BBox {
            min: [T::zero(); 3],
            max: [T::one(); 3],
        }
    }

    /// The extents of this box as six numbers `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    pub fn bounds(&self) -> [T; 6] {
        [
            self.min[0],
            self.max[0],
            self.min[1],
            self.max[1],
            self.min[2],
            self.max[2],
        ]
    }

    /// Get the size of the box in each dimension.
    /// # Examples
    /// ```
    /// # use meshblock::bbox::*;
    /// let unit_box = BBox::<f32>::unit();
    /// assert_eq!(unit_box.size(), [1.0, 1.0, 1.0]);
    /// ```
    pub fn size(&self) -> [T; 3] {
        if self.is_empty() {
            return [T::zero(); 3];
        }
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn min_corner(&self) -> [T; 3] {
        self.min
    }

    pub fn max_corner(&self) -> [T; 3] {
        self.max
    }

    /// Diameter of the bounding box is the distance between the min and max corners.
    pub fn diameter(&self) -> T
    where
        T: math::RealField,
    {
        if self.is_empty() {
            return T::zero();
        }
        (Vector3::from(self.max_corner()) - Vector3::from(self.min_corner())).norm()
    }
}

impl<T: Float> Empty for BBox<T> {
    fn empty() -> Self {
        BBox {
            min: [T::infinity(); 3],
            max: [T::neg_infinity(); 3],
        }
    }
    fn is_empty(&self) -> bool {
        (0..3).any(|i| !(self.min[i] <= self.max[i]))
    }
}

impl<T: PartialOrd + Copy> Contains<[T; 3]> for BBox<T> {
    fn contains(&self, p: [T; 3]) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }
}

impl<'a, T: Float, P> Absorb<P> for &'a mut BBox<T>
where
    P: Into<[T; 3]>,
{
    type Output = &'a mut BBox<T>;

    fn absorb(self, p: P) -> Self::Output {
        let p = p.into();
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
        self
    }
}

impl<'a, T: Float> Absorb<BBox<T>> for &'a mut BBox<T> {
    type Output = &'a mut BBox<T>;

    fn absorb(self, other: BBox<T>) -> Self::Output {
        if !other.is_empty() {
            self.absorb(other.min).absorb(other.max)
        } else {
            self
        }
    }
}

impl<'a, T: Float> Centroid<Option<[T; 3]>> for &'a BBox<T> {
    fn centroid(self) -> Option<[T; 3]> {
        if self.is_empty() {
            return None;
        }
        let two = T::one() + T::one();
        Some([
            (self.min[0] + self.max[0]) / two,
            (self.min[1] + self.max[1]) / two,
            (self.min[2] + self.max[2]) / two,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_construct_test() {
        let unit_box = BBox::<f32>::new([0.0; 3], [1.0; 3]);
        assert_eq!(unit_box, BBox::<f32>::unit());

        let flipped = BBox::<f64>::new([1.0; 3], [0.0; 3]);
        assert_eq!(flipped, BBox::<f64>::unit());
    }

    #[test]
    fn bbox_empty_test() {
        let empty_box = BBox::<f32>::empty();
        assert!(empty_box.is_empty());
        assert!(!empty_box.contains([0.0; 3]));
        assert_eq!(empty_box.size(), [0.0; 3]);
        assert_eq!(empty_box.centroid(), None);
        assert!(!BBox::<f32>::unit().is_empty());
    }

    #[test]
    fn bbox_bounds_test() {
        let bbox = BBox::new([0.0, -1.0, 2.0], [1.0, 1.0, 5.0]);
        assert_eq!(bbox.bounds(), [0.0, 1.0, -1.0, 1.0, 2.0, 5.0]);
        assert_eq!(BBox::from_bounds(bbox.bounds()), bbox);
    }

    #[test]
    fn bbox_absorb_test() {
        let mut bbox = BBox::<f32>::empty();
        bbox.absorb([-1.0; 3]);
        bbox.absorb([1.0; 3]);
        assert!(bbox.contains([0.0; 3]));
        assert!(bbox.contains([0.5, 0.5, 1.0]));
        assert!(bbox.contains([-0.5; 3]));
        assert!(!bbox.contains([-1.5; 3]));

        // Empty boxes don't change anything.
        bbox.absorb(BBox::empty());
        assert_eq!(bbox, BBox::new([-1.0; 3], [1.0; 3]));

        bbox.absorb(BBox::new([2.0; 3], [3.0; 3]));
        assert_eq!(bbox.bounds(), [-1.0, 3.0, -1.0, 3.0, -1.0, 3.0]);
    }

    #[test]
    fn bbox_centroid_test() {
        let bbox = BBox::<f32>::unit();
        assert_eq!(bbox.centroid(), Some([0.5; 3]));
    }

    #[test]
    fn bbox_diameter_test() {
        let bbox = BBox::<f64>::new([0.0; 3], [1.0, 2.0, 2.0]);
        assert_eq!(bbox.diameter(), 3.0);
        assert_eq!(BBox::<f64>::empty().diameter(), 0.0);
    }
}
