//! Binary Merkle tree over manifest leaves
//!
//! Leaf node: `H(p || content_digest)` where `p` is `0x01` for a present
//! artifact and `0x00` for an absent one. Parent: `H(left || right)` over the
//! raw 32-byte digests. A layer with an odd count carries its last node up
//! unchanged. No leaves at all gives `H("")`.

use crate::digest::Digest;

/// Node digest for one `(present, content_hash)` pair
pub fn leaf_node(present: bool, content_hash: &Digest) -> Digest {
    let mut bytes = Vec::with_capacity(33);
    bytes.push(u8::from(present));
    bytes.extend_from_slice(content_hash.as_bytes());
    Digest::of(&bytes)
}

fn parent(left: &Digest, right: &Digest) -> Digest {
    let mut bytes = Vec::with_capacity(64);
    bytes.extend_from_slice(left.as_bytes());
    bytes.extend_from_slice(right.as_bytes());
    Digest::of(&bytes)
}

/// Root over already-computed leaf nodes, in order
pub fn root_of_nodes(nodes: &[Digest]) -> Digest {
    if nodes.is_empty() {
        return Digest::of(b"");
    }
    let mut level = nodes.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => parent(left, right),
                [lone] => *lone,
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect();
    }
    level[0]
}

/// Root over ordered `(present, content_hash)` pairs
pub fn merkle_root<'a>(leaves: impl IntoIterator<Item = (bool, &'a Digest)>) -> Digest {
    let nodes: Vec<Digest> = leaves
        .into_iter()
        .map(|(present, hash)| leaf_node(present, hash))
        .collect();
    root_of_nodes(&nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(n: usize) -> Vec<Digest> {
        (0..n).map(|i| Digest::of(format!("artifact-{}", i).as_bytes())).collect()
    }

    #[test]
    fn test_single_leaf_root_is_leaf_node() {
        let h = Digest::of(b"x");
        assert_eq!(merkle_root([(true, &h)]), leaf_node(true, &h));
    }

    #[test]
    fn test_two_leaves() {
        let h = hashes(2);
        let expected = parent(&leaf_node(true, &h[0]), &leaf_node(false, &h[1]));
        assert_eq!(merkle_root([(true, &h[0]), (false, &h[1])]), expected);
    }

    #[test]
    fn test_odd_node_is_carried_unchanged() {
        let h = hashes(3);
        let n: Vec<Digest> = h.iter().map(|d| leaf_node(true, d)).collect();
        let expected = parent(&parent(&n[0], &n[1]), &n[2]);
        assert_eq!(root_of_nodes(&n), expected);

        let h = hashes(5);
        let n: Vec<Digest> = h.iter().map(|d| leaf_node(true, d)).collect();
        let left = parent(&parent(&n[0], &n[1]), &parent(&n[2], &n[3]));
        assert_eq!(root_of_nodes(&n), parent(&left, &n[4]));
    }

    #[test]
    fn test_presence_changes_root() {
        let empty = Digest::of(b"");
        assert_ne!(merkle_root([(true, &empty)]), merkle_root([(false, &empty)]));
    }

    #[test]
    fn test_order_matters() {
        let h = hashes(2);
        assert_ne!(
            merkle_root([(true, &h[0]), (true, &h[1])]),
            merkle_root([(true, &h[1]), (true, &h[0])])
        );
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(root_of_nodes(&[]), Digest::of(b""));
    }
}
