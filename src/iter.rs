use crate::rbtree::RbTree;

/// Iterator over all keys in [`RbTree`], in ascending order. Walks
/// parent links, hence needs no auxiliary stack.
pub struct Iter<'a, K>
where
    K: Clone + Ord,
{
    tree: &'a RbTree<K>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, K> Iter<'a, K>
where
    K: Clone + Ord,
{
    pub(crate) fn new(
        tree: &'a RbTree<K>,
        front: Option<usize>,
        back: Option<usize>,
        remaining: usize,
    ) -> Iter<'a, K> {
        Iter {
            tree,
            front,
            back,
            remaining,
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K>
where
    K: Clone + Ord,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let at = self.front?;
        self.remaining -= 1;
        self.front = self.tree.successor(at);
        Some(self.tree.key_at(at))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K> DoubleEndedIterator for Iter<'a, K>
where
    K: Clone + Ord,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let at = self.back?;
        self.remaining -= 1;
        self.back = self.tree.predecessor(at);
        Some(self.tree.key_at(at))
    }
}

impl<'a, K> ExactSizeIterator for Iter<'a, K> where K: Clone + Ord {}

/// Iterator over a range of keys in [`RbTree`], in ascending order.
/// Use `rev()` to iterate from high to low.
pub struct Range<'a, K>
where
    K: Clone + Ord,
{
    tree: &'a RbTree<K>,
    front: Option<usize>, // first node yet to be visited.
    back: Option<usize>,  // last node yet to be visited.
}

impl<'a, K> Range<'a, K>
where
    K: Clone + Ord,
{
    pub(crate) fn new(
        tree: &'a RbTree<K>,
        front: Option<usize>,
        back: Option<usize>,
    ) -> Range<'a, K> {
        Range { tree, front, back }
    }

    // front and back met, range is exhausted.
    fn close(&mut self) {
        self.front = None;
        self.back = None;
    }
}

impl<'a, K> Iterator for Range<'a, K>
where
    K: Clone + Ord,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.front?;
        if self.back == Some(at) {
            self.close();
        } else {
            self.front = self.tree.successor(at);
        }
        Some(self.tree.key_at(at))
    }
}

impl<'a, K> DoubleEndedIterator for Range<'a, K>
where
    K: Clone + Ord,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let at = self.back?;
        if self.front == Some(at) {
            self.close();
        } else {
            self.back = self.tree.predecessor(at);
        }
        Some(self.tree.key_at(at))
    }
}
