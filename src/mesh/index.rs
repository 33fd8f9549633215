//! Index types for mesh elements.
//!
//! Vertices, half-edges, and triangles are referenced by dense zero-based
//! indices rather than pointers. Each index type is a `u32` newtype so the
//! compiler rejects mixing a vertex index where a half-edge index is expected.
//!
//! The all-ones bit pattern is reserved as the "none" sentinel, which keeps
//! element records flat, uniformly sized value types.

use std::fmt::{self, Debug};

const SENTINEL: u32 = u32::MAX;

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe half-edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId(u32);

/// A type-safe triangle index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TriangleId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            ///
            /// # Panics
            /// Panics in debug builds if the value collides with the sentinel.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < SENTINEL as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Create the "none" sentinel index.
            #[inline]
            pub fn none() -> Self {
                Self(SENTINEL)
            }

            /// Get the index as a usize for array access.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this is a real index rather than the sentinel.
            #[inline]
            pub fn is_some(self) -> bool {
                self.0 != SENTINEL
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_some() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(none)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::none()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(HalfEdgeId, "HE");
impl_index_type!(TriangleId, "T");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert!(v.is_some());

        let none = VertexId::none();
        assert!(!none.is_some());
    }

    #[test]
    fn test_type_safety() {
        // Distinct types with the same raw value
        let v = VertexId::new(0);
        let he = HalfEdgeId::new(0);
        let t = TriangleId::new(0);

        assert_eq!(v.index(), he.index());
        assert_eq!(he.index(), t.index());
    }

    #[test]
    fn test_default_is_none() {
        assert!(!HalfEdgeId::default().is_some());
    }

    #[test]
    fn test_debug_format() {
        let v = VertexId::new(42);
        assert_eq!(format!("{:?}", v), "V(42)");

        assert_eq!(format!("{:?}", HalfEdgeId::none()), "HE(none)");
    }
}
