use super::{compare, Divergence, Internal, Node, Order};

/// A stored value together with the key bytes that are still unmatched when
/// the search reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Leaf<V> {
    pub(crate) segment: Vec<u8>,
    pub(crate) value: V,
}

impl<V> Leaf<V> {
    pub(crate) fn new(segment: Vec<u8>, value: V) -> Self {
        Leaf { segment, value }
    }
}

impl<V: Clone> Leaf<V> {
    pub(crate) fn upsert<F>(
        self,
        key: &[u8],
        depth: usize,
        value: V,
        combine: &mut F,
        order: Order,
    ) -> (Node<V>, bool)
    where
        F: FnMut(V, V) -> V,
    {
        let rest = &key[depth..];
        match compare(rest, &self.segment) {
            Divergence::Equal => {
                let value = order.apply(self.value, value, combine);
                (Node::Leaf(Leaf::new(self.segment, value)), false)
            }
            Divergence::SegmentIsPrefix => {
                // This leaf's key is a proper prefix of the new one.
                let child = Leaf::new(rest[self.segment.len()..].to_vec(), value);
                let node = Internal::with_leaves(self.segment, Some(self.value), [child]);
                (Node::internal(node), true)
            }
            Divergence::KeyIsPrefix => {
                let child = Leaf::new(self.segment[rest.len()..].to_vec(), self.value);
                let node = Internal::with_leaves(rest.to_vec(), Some(value), [child]);
                (Node::internal(node), true)
            }
            Divergence::At(common) => {
                let mut segment = self.segment;
                let existing = Leaf::new(segment.split_off(common), self.value);
                let incoming = Leaf::new(rest[common..].to_vec(), value);
                let node = Internal::with_leaves(segment, None, [existing, incoming]);
                (Node::internal(node), true)
            }
        }
    }
}
