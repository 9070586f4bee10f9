//! The in-memory container tree built during one encode call, and the
//! flattening pass that serializes it.
//!
//! A collection's header must state its entry count before its contents,
//! which is only known once the whole subtree is built, so encoding is
//! two-phase: the engine appends fragments and nested containers into this
//! tree, and `flatten` walks the finished tree once to emit the final
//! contiguous bytes.

use mpack_buffers::Writer;

use crate::error::EncodeError;
use crate::path::{self, PathSegment};
use crate::wire;

/// One node of the encode tree.
pub(crate) enum Node {
    /// The finished bytes of one scalar.
    Fragment(Vec<u8>),
    /// An ordered sequence of child nodes.
    Seq(Vec<Node>),
    /// An ordered record of key/child pairs; keys are encoded as strings
    /// during the flattening pass.
    Map(Vec<(String, Node)>),
}

/// Serializes a finished tree into `w`, computing every length header.
pub(crate) fn flatten(
    node: &Node,
    w: &mut Writer,
    path: &mut Vec<PathSegment>,
) -> Result<(), EncodeError> {
    match node {
        Node::Fragment(bytes) => {
            w.buf(bytes);
            Ok(())
        }
        Node::Seq(elements) => {
            wire::write_array_header(w, elements.len()).map_err(|e| oversize(e, path))?;
            for (index, element) in elements.iter().enumerate() {
                path.push(PathSegment::Index(index));
                flatten(element, w, path)?;
                path.pop();
            }
            Ok(())
        }
        Node::Map(entries) => {
            wire::write_map_header(w, entries.len()).map_err(|e| oversize(e, path))?;
            for (key, value) in entries {
                path.push(PathSegment::Key(key.clone()));
                wire::write_str(w, key).map_err(|e| oversize(e, path))?;
                flatten(value, w, path)?;
                path.pop();
            }
            Ok(())
        }
    }
}

fn oversize(err: wire::Oversize, path: &[PathSegment]) -> EncodeError {
    EncodeError::LengthLimit {
        kind: err.kind,
        len: err.len,
        path: path::render(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(node: Node) -> Vec<u8> {
        let mut w = Writer::new();
        flatten(&node, &mut w, &mut Vec::new()).unwrap();
        w.into_bytes()
    }

    #[test]
    fn fragment_passes_through() {
        assert_eq!(flat(Node::Fragment(vec![0x2a])), vec![0x2a]);
    }

    #[test]
    fn empty_containers() {
        assert_eq!(flat(Node::Seq(Vec::new())), vec![0x90]);
        assert_eq!(flat(Node::Map(Vec::new())), vec![0x80]);
    }

    #[test]
    fn nested_tree_headers() {
        let node = Node::Map(vec![
            (
                "xs".to_string(),
                Node::Seq(vec![Node::Fragment(vec![0x01]), Node::Fragment(vec![0x02])]),
            ),
            ("ok".to_string(), Node::Fragment(vec![0xc3])),
        ]);
        assert_eq!(
            flat(node),
            vec![0x82, 0xa2, b'x', b's', 0x92, 0x01, 0x02, 0xa2, b'o', b'k', 0xc3]
        );
    }

    #[test]
    fn wide_sequence_gets_array16_header() {
        let elements = (0..16).map(|_| Node::Fragment(vec![0x00])).collect();
        let out = flat(Node::Seq(elements));
        assert_eq!(&out[..3], &[0xdc, 0x00, 0x10]);
        assert_eq!(out.len(), 3 + 16);
    }
}
