#![warn(missing_docs)]

//! # Attribute API.
//!
//! Attributes are named arrays of numbers attached to the vertices or cells of a mesh. Each
//! attribute stores a flat buffer of a single primitive element type together with the number of
//! components per element, so a field of 3D vectors over `n` vertices holds `3 * n` values.
//!
//! Attributes live in an [`AttribDict`] per [`Location`]. Meshes expose their dictionaries through
//! the [`Attrib`] trait, which provides the checked insertion and lookup functions.

use std::collections::hash_map::Entry;

use ahash::HashMap;
use num_traits::ToPrimitive;

use crate::error::{Error, Result};

/// Attribute dictionary for a single mesh location.
pub type AttribDict = HashMap<String, Attribute>;

/// The mesh element an attribute is attached to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// One element per vertex.
    Vertex,
    /// One element per cell. Faces of a polygon mesh are its cells.
    Cell,
}

/// Typed storage for attribute values.
#[derive(Clone, Debug, PartialEq)]
pub enum AttribData {
    /// Signed 8-bit integers.
    I8(Vec<i8>),
    /// Unsigned 8-bit integers.
    U8(Vec<u8>),
    /// Signed 16-bit integers.
    I16(Vec<i16>),
    /// Unsigned 16-bit integers.
    U16(Vec<u16>),
    /// Signed 32-bit integers.
    I32(Vec<i32>),
    /// Unsigned 32-bit integers.
    U32(Vec<u32>),
    /// Signed 64-bit integers.
    I64(Vec<i64>),
    /// Unsigned 64-bit integers.
    U64(Vec<u64>),
    /// Single precision floats.
    F32(Vec<f32>),
    /// Double precision floats.
    F64(Vec<f64>),
}

/// Evaluate `$body` with `$v` bound to the buffer inside `$data`, whatever its element type.
macro_rules! call_valued {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            AttribData::I8($v) => $body,
            AttribData::U8($v) => $body,
            AttribData::I16($v) => $body,
            AttribData::U16($v) => $body,
            AttribData::I32($v) => $body,
            AttribData::U32($v) => $body,
            AttribData::I64($v) => $body,
            AttribData::U64($v) => $body,
            AttribData::F32($v) => $body,
            AttribData::F64($v) => $body,
        }
    };
}

/// Same as `call_valued` but rebuilds an `AttribData` of the same variant from the result.
macro_rules! map_valued {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            AttribData::I8($v) => AttribData::I8($body),
            AttribData::U8($v) => AttribData::U8($body),
            AttribData::I16($v) => AttribData::I16($body),
            AttribData::U16($v) => AttribData::U16($body),
            AttribData::I32($v) => AttribData::I32($body),
            AttribData::U32($v) => AttribData::U32($body),
            AttribData::I64($v) => AttribData::I64($body),
            AttribData::U64($v) => AttribData::U64($body),
            AttribData::F32($v) => AttribData::F32($body),
            AttribData::F64($v) => AttribData::F64($body),
        }
    };
}

/// A primitive value that can be stored in an attribute.
pub trait AttribValue: Copy + Default + PartialOrd + ToPrimitive + std::fmt::Debug + 'static {
    /// Name of the element type as reported in errors.
    const TYPE_NAME: &'static str;
    /// Wrap a buffer of values.
    fn into_data(values: Vec<Self>) -> AttribData;
    /// Borrow the buffer if it stores this type.
    fn slice_of(data: &AttribData) -> Option<&[Self]>;
    /// Mutably borrow the buffer if it stores this type.
    fn vec_of_mut(data: &mut AttribData) -> Option<&mut Vec<Self>>;
}

macro_rules! impl_attrib_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl AttribValue for $t {
                const TYPE_NAME: &'static str = stringify!($t);
                fn into_data(values: Vec<Self>) -> AttribData {
                    AttribData::$variant(values)
                }
                fn slice_of(data: &AttribData) -> Option<&[Self]> {
                    match data {
                        AttribData::$variant(v) => Some(v.as_slice()),
                        _ => None,
                    }
                }
                fn vec_of_mut(data: &mut AttribData) -> Option<&mut Vec<Self>> {
                    match data {
                        AttribData::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_attrib_value!(
    i8 => I8, u8 => U8, i16 => I16, u16 => U16, i32 => I32,
    u32 => U32, i64 => I64, u64 => U64, f32 => F32, f64 => F64,
);

fn select_values<V: Copy>(values: &[V], num_comp: usize, indices: &[usize]) -> Vec<V> {
    let mut out = Vec::with_capacity(indices.len() * num_comp);
    for &i in indices {
        out.extend_from_slice(&values[i * num_comp..(i + 1) * num_comp]);
    }
    out
}

fn value_range<V: ToPrimitive>(values: &[V]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter_map(ToPrimitive::to_f64)
        .filter(|v| !v.is_nan())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

impl AttribData {
    /// Total number of values in the buffer.
    pub fn len(&self) -> usize {
        call_valued!(self, v => v.len())
    }

    /// Returns `true` if the buffer holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the element type stored in this buffer.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttribData::I8(_) => i8::TYPE_NAME,
            AttribData::U8(_) => u8::TYPE_NAME,
            AttribData::I16(_) => i16::TYPE_NAME,
            AttribData::U16(_) => u16::TYPE_NAME,
            AttribData::I32(_) => i32::TYPE_NAME,
            AttribData::U32(_) => u32::TYPE_NAME,
            AttribData::I64(_) => i64::TYPE_NAME,
            AttribData::U64(_) => u64::TYPE_NAME,
            AttribData::F32(_) => f32::TYPE_NAME,
            AttribData::F64(_) => f64::TYPE_NAME,
        }
    }

    /// Returns `true` if both buffers store the same element type.
    pub fn same_type(&self, other: &AttribData) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// A zero filled buffer of the same type with `len` values.
    pub fn zeros_like(&self, len: usize) -> AttribData {
        map_valued!(self, v => {
            let _ = v;
            vec![Default::default(); len]
        })
    }

    /// Append `n` zero values.
    pub fn extend_by(&mut self, n: usize) {
        call_valued!(self, v => v.resize(v.len() + n, Default::default()))
    }

    /// Append the values of `other` if it stores the same type. Returns `false` on a type
    /// mismatch, leaving `self` unchanged.
    pub fn append(&mut self, other: &AttribData) -> bool {
        match (self, other) {
            (AttribData::I8(a), AttribData::I8(b)) => a.extend_from_slice(b),
            (AttribData::U8(a), AttribData::U8(b)) => a.extend_from_slice(b),
            (AttribData::I16(a), AttribData::I16(b)) => a.extend_from_slice(b),
            (AttribData::U16(a), AttribData::U16(b)) => a.extend_from_slice(b),
            (AttribData::I32(a), AttribData::I32(b)) => a.extend_from_slice(b),
            (AttribData::U32(a), AttribData::U32(b)) => a.extend_from_slice(b),
            (AttribData::I64(a), AttribData::I64(b)) => a.extend_from_slice(b),
            (AttribData::U64(a), AttribData::U64(b)) => a.extend_from_slice(b),
            (AttribData::F32(a), AttribData::F32(b)) => a.extend_from_slice(b),
            (AttribData::F64(a), AttribData::F64(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }

    /// Values converted to `f64`, in storage order.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        call_valued!(self, v => v.iter().map(|x| x.to_f64().unwrap_or(f64::NAN)).collect())
    }
}

/// A named array attached to a mesh location.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    num_comp: usize,
    data: AttribData,
}

impl Attribute {
    /// Build an attribute from a flat buffer with `num_comp` values per element.
    pub fn new(data: AttribData, num_comp: usize) -> Result<Self> {
        if num_comp == 0 || data.len() % num_comp != 0 {
            return Err(Error::AttribComponents {
                len: data.len(),
                num_comp,
            });
        }
        Ok(Attribute { num_comp, data })
    }

    /// An attribute with one value per element.
    ///
    /// # Examples
    /// ```
    /// use meshblock::attrib::Attribute;
    /// let temperature = Attribute::scalars(vec![1.5f32, 2.0, 3.5]);
    /// assert_eq!(temperature.len(), 3);
    /// assert_eq!(temperature.num_comp(), 1);
    /// ```
    pub fn scalars<V: AttribValue>(values: Vec<V>) -> Self {
        Attribute {
            num_comp: 1,
            data: V::into_data(values),
        }
    }

    /// An attribute with `N` values per element.
    pub fn vectors<V: AttribValue, const N: usize>(values: Vec<[V; N]>) -> Self {
        let flat: Vec<V> = values.iter().flat_map(|v| v.iter().copied()).collect();
        Attribute {
            num_comp: N.max(1),
            data: V::into_data(flat),
        }
    }

    /// Number of values per element.
    pub fn num_comp(&self) -> usize {
        self.num_comp
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.num_comp
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The underlying flat buffer.
    pub fn data(&self) -> &AttribData {
        &self.data
    }

    /// Consume the attribute, returning its flat buffer.
    pub fn into_data(self) -> AttribData {
        self.data
    }

    /// Name of the element type.
    pub fn elem_type(&self) -> &'static str {
        self.data.type_name()
    }

    /// The flat buffer as a typed slice.
    pub fn as_slice<V: AttribValue>(&self) -> Result<&[V]> {
        V::slice_of(&self.data).ok_or(Error::AttribTypeMismatch {
            expected: V::TYPE_NAME,
            actual: self.data.type_name(),
        })
    }

    /// The flat buffer as a mutable typed `Vec`.
    ///
    /// Callers must keep the length a multiple of `num_comp`.
    pub fn as_mut_vec<V: AttribValue>(&mut self) -> Result<&mut Vec<V>> {
        let actual = self.data.type_name();
        V::vec_of_mut(&mut self.data).ok_or(Error::AttribTypeMismatch {
            expected: V::TYPE_NAME,
            actual,
        })
    }

    /// Returns `true` if `other` can be appended to this attribute.
    pub fn is_compatible(&self, other: &Attribute) -> bool {
        self.num_comp == other.num_comp && self.data.same_type(&other.data)
    }

    /// A zero filled attribute of the same type and component count with `len` elements.
    pub fn zeros_like(&self, len: usize) -> Attribute {
        Attribute {
            num_comp: self.num_comp,
            data: self.data.zeros_like(len * self.num_comp),
        }
    }

    /// Append `n` zero elements.
    pub fn extend_by(&mut self, n: usize) {
        self.data.extend_by(n * self.num_comp);
    }

    /// Append the elements of `other`. Returns `false` and leaves `self` untouched if the two are
    /// not compatible.
    pub fn append(&mut self, other: &Attribute) -> bool {
        self.num_comp == other.num_comp && self.data.append(&other.data)
    }

    /// Build a new attribute from the elements at `indices`, in that order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    pub fn select(&self, indices: &[usize]) -> Attribute {
        let num_comp = self.num_comp;
        Attribute {
            num_comp,
            data: map_valued!(&self.data, v => select_values(v, num_comp, indices)),
        }
    }

    /// Smallest and largest value over all components, ignoring NaN.
    ///
    /// Returns `None` for an attribute without any non-NaN values.
    pub fn range(&self) -> Option<(f64, f64)> {
        call_valued!(&self.data, v => value_range(v))
    }
}

/// Attribute interface for meshes.
///
/// Implementors only provide access to their dictionaries; the checked insertion and lookup
/// functions are derived from those.
pub trait Attrib {
    /// Number of elements at the given location, or `None` if the mesh has no such location.
    fn attrib_size(&self, loc: Location) -> Option<usize>;

    /// Read only access to the attribute dictionary at `loc`.
    fn attrib_dict(&self, loc: Location) -> Option<&AttribDict>;

    /// Read and write access to the attribute dictionary at `loc`.
    fn attrib_dict_mut(&mut self, loc: Location) -> Option<&mut AttribDict>;

    /// Add a new attribute. Fails if one with the same name already exists at `loc` or if the
    /// attribute size does not match the number of elements at `loc`.
    fn add_attrib(&mut self, loc: Location, name: &str, attrib: Attribute) -> Result<&mut Attribute> {
        check_size(&*self, loc, &attrib)?;
        let dict = self.attrib_dict_mut(loc).ok_or(Error::UnsupportedLocation)?;
        match dict.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(Error::AttribExists(name.to_owned())),
            Entry::Vacant(entry) => Ok(entry.insert(attrib)),
        }
    }

    /// Add a scalar attribute from a `Vec` of values.
    fn add_attrib_data<V: AttribValue>(
        &mut self,
        loc: Location,
        name: &str,
        data: Vec<V>,
    ) -> Result<&mut Attribute> {
        self.add_attrib(loc, name, Attribute::scalars(data))
    }

    /// Same as `add_attrib` but replaces any existing attribute with the same name.
    fn set_attrib(&mut self, loc: Location, name: &str, attrib: Attribute) -> Result<&mut Attribute> {
        check_size(&*self, loc, &attrib)?;
        let dict = self.attrib_dict_mut(loc).ok_or(Error::UnsupportedLocation)?;
        match dict.entry(name.to_owned()) {
            Entry::Occupied(mut entry) => {
                entry.insert(attrib);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => Ok(entry.insert(attrib)),
        }
    }

    /// Get the attribute named `name` at `loc`.
    fn attrib(&self, loc: Location, name: &str) -> Result<&Attribute> {
        self.attrib_dict(loc)
            .ok_or(Error::UnsupportedLocation)?
            .get(name)
            .ok_or_else(|| Error::AttribNotFound(name.to_owned()))
    }

    /// Typed view of the flat buffer of the attribute named `name` at `loc`.
    fn attrib_as_slice<V: AttribValue>(&self, loc: Location, name: &str) -> Result<&[V]> {
        self.attrib(loc, name)?.as_slice::<V>()
    }

    /// Returns `true` if an attribute named `name` exists at `loc`.
    fn attrib_exists(&self, loc: Location, name: &str) -> bool {
        self.attrib_dict(loc)
            .map_or(false, |dict| dict.contains_key(name))
    }

    /// Remove the attribute named `name` at `loc` and return it.
    fn remove_attrib(&mut self, loc: Location, name: &str) -> Result<Attribute> {
        self.attrib_dict_mut(loc)
            .ok_or(Error::UnsupportedLocation)?
            .remove(name)
            .ok_or_else(|| Error::AttribNotFound(name.to_owned()))
    }

    /// Find an attribute by name at any location, looking at vertices first.
    fn find_attrib(&self, name: &str) -> Option<&Attribute> {
        [Location::Vertex, Location::Cell]
            .into_iter()
            .filter_map(|loc| self.attrib_dict(loc))
            .find_map(|dict| dict.get(name))
    }
}

fn check_size<M: Attrib + ?Sized>(mesh: &M, loc: Location, attrib: &Attribute) -> Result<()> {
    let expected = mesh.attrib_size(loc).ok_or(Error::UnsupportedLocation)?;
    if attrib.len() != expected {
        return Err(Error::AttribSize {
            expected,
            given: attrib.len(),
        });
    }
    Ok(())
}
