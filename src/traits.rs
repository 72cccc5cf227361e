//! Capability traits that the rest of the crate dispatches on. Every generic component
//! (`DataSet`, the metrics, the kd-tree itself) is parameterised over an [`Element`] rather
//! than a concrete numeric type, so the core never special-cases a particular width or
//! signedness: fundamental numeric types satisfy every trait here with no extra code from the
//! caller.
use std::fmt::Debug;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};

/// The type that squared distances between two [`Element`] values are accumulated in.
///
/// For floating point element types this is the element type itself. For narrower integer
/// types a wider `Distance` avoids overflow when many squared per-axis differences are summed.
pub trait ElementDistance:
    Copy
    + Default
    + Debug
    + PartialOrd
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + Sum
    + Sync
    + Send
{
    /// The additive identity.
    fn zero() -> Self;
    /// The multiplicative identity.
    fn one() -> Self;
    /// The largest finite value representable, used to seed "worst distance so far" slots.
    fn max_value() -> Self;
    /// Absolute value.
    fn abs(self) -> Self;
    /// Multiplicative inverse, used by [`crate::symmetric_matrix::SymmetricMatrix::invert`].
    fn recip(self) -> Self;
    /// Whether this value is exactly zero; used by ignore-self leaf filtering.
    fn is_zero(self) -> bool {
        self == Self::zero()
    }
}

macro_rules! impl_element_distance_float {
    ($t:ty) => {
        impl ElementDistance for $t {
            #[inline]
            fn zero() -> Self {
                0.0
            }
            #[inline]
            fn one() -> Self {
                1.0
            }
            #[inline]
            fn max_value() -> Self {
                <$t>::MAX
            }
            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }
            #[inline]
            fn recip(self) -> Self {
                1.0 / self
            }
        }
    };
}

impl_element_distance_float!(f32);
impl_element_distance_float!(f64);

/// Per-element-type capabilities required by the core.
///
/// Fundamental numeric types implement this with raw memory semantics: equality and ordering
/// are the built-in ones, and serialization is a fixed-width encoding. A custom type plugging
/// into the library would implement this trait directly; the core never dispatches on *how* a
/// type implements it, only on the trait itself, so results are bit-identical regardless of
/// which concrete type is used.
pub trait Element: Copy + Default + Debug + PartialOrd + PartialEq + Sync + Send + 'static {
    /// The distance type paired with this element type.
    type Distance: ElementDistance;

    /// Computes `self - other` in the distance domain, widening if `Distance != Self`.
    fn sub_as_distance(self, other: Self) -> Self::Distance;

    /// Swaps this value's bytes in place, used when a serialized stream's endianness differs
    /// from the host's.
    fn endian_swap(&mut self);

    /// A short, platform-stable name used as the self-describing type tag in the binary
    /// format.
    fn type_tag() -> &'static str;

    /// Number of bytes this element occupies in the wire format.
    const WIRE_WIDTH: usize;

    /// Appends this value's wire representation (host-endianness raw bytes) to `buf`.
    fn write_wire(&self, buf: &mut Vec<u8>);

    /// Reads a value back from `bytes`, which must be exactly `WIRE_WIDTH` bytes, already in
    /// host endianness (the caller is responsible for any endian-swap pass).
    fn read_wire(bytes: &[u8]) -> Self;
}

macro_rules! impl_element_float {
    ($t:ty, $tag:literal, $width:literal) => {
        impl Element for $t {
            type Distance = $t;

            #[inline]
            fn sub_as_distance(self, other: Self) -> Self::Distance {
                self - other
            }

            #[inline]
            fn endian_swap(&mut self) {
                *self = <$t>::from_bits(self.to_bits().swap_bytes());
            }

            #[inline]
            fn type_tag() -> &'static str {
                $tag
            }

            const WIRE_WIDTH: usize = $width;

            #[inline]
            fn write_wire(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn read_wire(bytes: &[u8]) -> Self {
                let mut raw = [0u8; $width];
                raw.copy_from_slice(bytes);
                <$t>::from_ne_bytes(raw)
            }
        }
    };
}

impl_element_float!(f32, "f32", 4);
impl_element_float!(f64, "f64", 8);

macro_rules! impl_element_int {
    ($t:ty, $dist:ty, $tag:literal, $width:literal) => {
        impl Element for $t {
            type Distance = $dist;

            #[inline]
            fn sub_as_distance(self, other: Self) -> Self::Distance {
                (self as $dist) - (other as $dist)
            }

            #[inline]
            fn endian_swap(&mut self) {
                *self = self.swap_bytes();
            }

            #[inline]
            fn type_tag() -> &'static str {
                $tag
            }

            const WIRE_WIDTH: usize = $width;

            #[inline]
            fn write_wire(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn read_wire(bytes: &[u8]) -> Self {
                let mut raw = [0u8; $width];
                raw.copy_from_slice(bytes);
                <$t>::from_ne_bytes(raw)
            }
        }
    };
}

impl_element_int!(i32, f64, "i32", 4);
impl_element_int!(i64, f64, "i64", 8);
impl_element_int!(u32, f64, "u32", 4);
impl_element_int!(u64, f64, "u64", 8);

/// Optional capability: sampling a uniformly-distributed value in `[low, high)`.
///
/// Only needed by [`crate::dataset::DataSet::fill_random`] and test utilities, not by the tree
/// or search path.
pub trait RandomElement: Element {
    /// Draws a uniform sample in `[low, high)` using `rng`.
    fn sample_uniform<R: rand::Rng + ?Sized>(rng: &mut R, low: Self, high: Self) -> Self;
}

macro_rules! impl_random_float {
    ($t:ty) => {
        impl RandomElement for $t {
            fn sample_uniform<R: rand::Rng + ?Sized>(rng: &mut R, low: Self, high: Self) -> Self {
                rng.random_range(low..high)
            }
        }
    };
}

impl_random_float!(f32);
impl_random_float!(f64);

/// Optional capability: the arithmetic mean of a run of element values.
///
/// Used by [`crate::metrics::mahalanobis::Mahalanobis`] when estimating a training set's
/// per-dimension mean before computing sample covariance.
pub trait MeanElement: Element {
    /// Returns the mean of `values`. Returns `Self::default()` for an empty iterator.
    fn mean<I: ExactSizeIterator<Item = Self>>(values: I) -> Self;
}

macro_rules! impl_mean_float {
    ($t:ty) => {
        impl MeanElement for $t {
            fn mean<I: ExactSizeIterator<Item = Self>>(values: I) -> Self {
                let n = values.len();
                if n == 0 {
                    return <$t>::default();
                }
                values.sum::<$t>() / (n as $t)
            }
        }
    };
}

impl_mean_float!(f32);
impl_mean_float!(f64);
