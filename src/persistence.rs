//! Self-describing, endianness-aware binary serialization of a tree or a standalone data set
//! (spec §4.2, §6).
//!
//! Failures of any kind — short reads, header mismatches, a bad trailing signature — all
//! surface as a single [`DeserializationError`] variant per spec §4.2, and a failed
//! deserialization never touches the caller's existing object: every `deserialize_*` function
//! here builds a complete, independent value and only the caller decides whether/how to swap it
//! in (see [`crate::kdtree::KdTree::deserialize_into`]).
use crate::dataset::DataSet;
use crate::endian::{
    read_needs_swap, read_signature, read_type_tag, read_u32_host, read_version,
    write_endianness_tag, write_signature, write_type_tag, write_u32_host, write_version,
};
use crate::error::DeserializationError;
use crate::traits::Element;
use crate::tree::node::{KdLeaf, KdStem, TreeArena};
use crate::types::ChildRef;
use std::io::{self, Read, Write};

fn write_header<W: Write, T: Element>(out: &mut W, d: u32, n: u32) -> io::Result<()> {
    write_endianness_tag(out)?;
    write_version(out)?;
    write_type_tag(out, T::type_tag())?;
    write_u32_host(out, d)?;
    write_u32_host(out, n)
}

struct Header {
    needs_swap: bool,
    n: u32,
}

fn read_header<R: Read, T: Element>(
    input: &mut R,
    expected_d: u32,
) -> Result<Header, DeserializationError> {
    let needs_swap = read_needs_swap(input)?;
    read_version(input, needs_swap)?;
    read_type_tag(input, needs_swap, T::type_tag())?;
    let d = read_u32_host(input, needs_swap)?;
    if d != expected_d {
        return Err(DeserializationError::DimensionMismatch {
            found: d,
            expected: expected_d,
        });
    }
    let n = read_u32_host(input, needs_swap)?;
    if n == 0 {
        return Err(DeserializationError::EmptyElementCount(n));
    }
    Ok(Header { needs_swap, n })
}

fn write_permutation<W: Write>(out: &mut W, perm: &[u32]) -> io::Result<()> {
    for &p in perm {
        write_u32_host(out, p)?;
    }
    Ok(())
}

fn read_permutation<R: Read>(
    input: &mut R,
    needs_swap: bool,
    n: usize,
) -> Result<Vec<u32>, DeserializationError> {
    (0..n).map(|_| read_u32_host(input, needs_swap)).collect()
}

fn write_vectors<W: Write, T: Element, const D: usize>(
    out: &mut W,
    vectors: &[[T; D]],
) -> io::Result<()> {
    let mut buf = Vec::with_capacity(vectors.len() * D * T::WIRE_WIDTH);
    for v in vectors {
        for coord in v {
            coord.write_wire(&mut buf);
        }
    }
    out.write_all(&buf)
}

fn read_vectors<R: Read, T: Element, const D: usize>(
    input: &mut R,
    needs_swap: bool,
    n: usize,
) -> Result<Vec<[T; D]>, DeserializationError> {
    let mut out = Vec::with_capacity(n);
    let mut raw = vec![0u8; T::WIRE_WIDTH];
    for _ in 0..n {
        let mut point = [T::default(); D];
        for coord in point.iter_mut() {
            input
                .read_exact(&mut raw)
                .map_err(|_| DeserializationError::TruncatedStream {
                    read: 0,
                    needed: T::WIRE_WIDTH,
                })?;
            let mut value = T::read_wire(&raw);
            if needs_swap {
                value.endian_swap();
            }
            *coord = value;
        }
        out.push(point);
    }
    Ok(out)
}

/// Serializes a standalone [`DataSet`] (spec §6 items 1-7, tree structure omitted).
pub fn serialize_dataset<W: Write, T: Element, const D: usize>(
    out: &mut W,
    dataset: &DataSet<T, D>,
) -> io::Result<()> {
    write_header::<_, T>(out, D as u32, dataset.size() as u32)?;
    write_permutation(out, dataset.permutation())?;
    write_vectors(out, dataset.permuted_slice())?;
    write_signature(out)
}

/// Deserializes a standalone [`DataSet`] previously written by [`serialize_dataset`].
pub fn deserialize_dataset<R: Read, T: Element, const D: usize>(
    input: &mut R,
) -> Result<DataSet<T, D>, DeserializationError> {
    let header = read_header::<_, T>(input, D as u32)?;
    let perm = read_permutation(input, header.needs_swap, header.n as usize)?;
    let vectors: Vec<[T; D]> = read_vectors(input, header.needs_swap, header.n as usize)?;
    read_signature(input, header.needs_swap)?;
    Ok(DataSet::from_permuted(vectors, perm))
}

const LEFT_LEAF_BIT: u32 = 1 << 30;
const RIGHT_LEAF_BIT: u32 = 1 << 31;

fn write_tree_preorder<W: Write, T: Element>(
    out: &mut W,
    arena: &TreeArena<T>,
    node: ChildRef,
) -> io::Result<()> {
    match node {
        ChildRef::Leaf(i) => {
            let leaf = arena.leaves[i as usize];
            write_u32_host(out, leaf.first_index)?;
            write_u32_host(out, leaf.num_elements)
        }
        ChildRef::Stem(i) => {
            let stem = arena.stems[i as usize];
            let mut buf = Vec::with_capacity(T::WIRE_WIDTH);
            stem.split_value.write_wire(&mut buf);
            out.write_all(&buf)?;
            let mut packed = stem.axis;
            if matches!(stem.left_ref(), ChildRef::Leaf(_)) {
                packed |= LEFT_LEAF_BIT;
            }
            if matches!(stem.right_ref(), ChildRef::Leaf(_)) {
                packed |= RIGHT_LEAF_BIT;
            }
            write_u32_host(out, packed)?;
            write_tree_preorder(out, arena, stem.left_ref())?;
            write_tree_preorder(out, arena, stem.right_ref())
        }
    }
}

fn read_tree_preorder<R: Read, T: Element>(
    input: &mut R,
    needs_swap: bool,
    stems: &mut Vec<KdStem<T>>,
    leaves: &mut Vec<KdLeaf>,
    is_leaf: bool,
) -> Result<ChildRef, DeserializationError> {
    if is_leaf {
        let first_index = read_u32_host(input, needs_swap)?;
        let num_elements = read_u32_host(input, needs_swap)?;
        leaves.push(KdLeaf {
            first_index,
            num_elements,
        });
        return Ok(ChildRef::leaf((leaves.len() - 1) as u32));
    }

    let mut raw = vec![0u8; T::WIRE_WIDTH];
    input
        .read_exact(&mut raw)
        .map_err(|_| DeserializationError::TruncatedStream {
            read: 0,
            needed: T::WIRE_WIDTH,
        })?;
    let mut split_value = T::read_wire(&raw);
    if needs_swap {
        split_value.endian_swap();
    }
    let packed = read_u32_host(input, needs_swap)?;
    let axis = packed & !(LEFT_LEAF_BIT | RIGHT_LEAF_BIT);
    let left_is_leaf = packed & LEFT_LEAF_BIT != 0;
    let right_is_leaf = packed & RIGHT_LEAF_BIT != 0;

    // Reserve this stem's slot before recursing so preorder position is stable, then fill it
    // in once both children are known.
    let slot = stems.len();
    stems.push(KdStem {
        split_value,
        axis,
        left: 0,
        right: 0,
    });

    let left = read_tree_preorder(input, needs_swap, stems, leaves, left_is_leaf)?;
    let right = read_tree_preorder(input, needs_swap, stems, leaves, right_is_leaf)?;
    stems[slot].left = left.to_raw();
    stems[slot].right = right.to_raw();
    Ok(ChildRef::stem(slot as u32))
}

/// Serializes a full tree: data set (items 1-7) then tree topology (item 8) then signature.
pub fn serialize_tree<W: Write, T: Element, const D: usize>(
    out: &mut W,
    dataset: &DataSet<T, D>,
    arena: &TreeArena<T>,
) -> io::Result<()> {
    write_header::<_, T>(out, D as u32, dataset.size() as u32)?;
    write_permutation(out, dataset.permutation())?;
    write_vectors(out, dataset.permuted_slice())?;
    let root_is_leaf = matches!(arena.root_ref(), ChildRef::Leaf(_));
    out.write_all(&[root_is_leaf as u8])?;
    write_tree_preorder(out, arena, arena.root_ref())?;
    write_signature(out)
}

/// Deserializes a full tree previously written by [`serialize_tree`].
pub fn deserialize_tree<R: Read, T: Element, const D: usize>(
    input: &mut R,
) -> Result<(DataSet<T, D>, TreeArena<T>), DeserializationError> {
    let header = read_header::<_, T>(input, D as u32)?;
    let perm = read_permutation(input, header.needs_swap, header.n as usize)?;
    let vectors: Vec<[T; D]> = read_vectors(input, header.needs_swap, header.n as usize)?;
    let dataset = DataSet::from_permuted(vectors, perm);

    let mut root_is_leaf_byte = [0u8; 1];
    input
        .read_exact(&mut root_is_leaf_byte)
        .map_err(|_| DeserializationError::TruncatedStream { read: 0, needed: 1 })?;
    let root_is_leaf = root_is_leaf_byte[0] != 0;

    let mut stems = Vec::new();
    let mut leaves = Vec::new();
    let root = read_tree_preorder(input, header.needs_swap, &mut stems, &mut leaves, root_is_leaf)?;

    read_signature(input, header.needs_swap)?;

    let arena = TreeArena {
        stems,
        leaves,
        root: root.to_raw(),
    };
    Ok((dataset, arena))
}
