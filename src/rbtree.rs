use std::{
    borrow::Borrow,
    cmp::{Ord, Ordering},
    mem,
    ops::{Bound, RangeBounds},
    sync::atomic::{self, AtomicU64},
};

use log::{debug, trace};
use rand::Rng;

use crate::depth::Depth;
use crate::error::Error;
use crate::iter::{Iter, Range};

// every tree instance gets a unique id, stamped into its handles.
static TREE_IDS: AtomicU64 = AtomicU64::new(1);

/// RbTree manage a single instance of in-memory index using
/// [red-black][rbtree] tree. Nodes live in an arena and link to their
/// parent and children by slot index, absent links stand in for the
/// nil sentinel and are always read as black.
///
/// Duplicate keys are allowed, on insert ties go to the right subtree.
///
/// [rbtree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
pub struct RbTree<K>
where
    K: Clone + Ord,
{
    name: String,
    tree_id: u64,
    slots: Vec<Slot<K>>,
    free: Vec<usize>, // released slots, ready for reuse.
    root: Option<usize>,
    n_count: usize, // number of entries in the tree.
}

/// Node color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Handle refers to a single node in a [`RbTree`] instance. Handles
/// are returned by the insert and lookup APIs and consumed by
/// [`RbTree::erase`]. A handle goes stale once its node is erased or
/// the tree is cleared, stale handles are rejected by the tree.
///
/// Handles do not carry over to clones, a cloned tree rejects handles
/// minted by the original and vice versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    tree: u64,
    slot: usize,
    generation: u64,
}

#[derive(Clone, Copy, PartialEq)]
enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    fn flip(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Different ways to construct a new RbTree instance.
impl<K> RbTree<K>
where
    K: Clone + Ord,
{
    /// Create an empty instance of RbTree, identified by `name`.
    /// Applications can choose unique names.
    pub fn new<S>(name: S) -> RbTree<K>
    where
        S: AsRef<str>,
    {
        let tree_id = TREE_IDS.fetch_add(1, atomic::Ordering::Relaxed);
        debug!("{}: new tree, id {}", name.as_ref(), tree_id);
        RbTree {
            name: name.as_ref().to_string(),
            tree_id,
            slots: Default::default(),
            free: Default::default(),
            root: Default::default(),
            n_count: Default::default(),
        }
    }

    /// Create a new instance of RbTree and load it with keys from
    /// `iter`. Duplicate keys are kept as separate entries.
    pub fn load_from<S, I>(name: S, iter: I) -> Result<RbTree<K>, Error<K>>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = K>,
    {
        let mut tree = RbTree::new(name);
        for key in iter {
            tree.insert_node(key)?;
        }
        Ok(tree)
    }
}

impl<K> Clone for RbTree<K>
where
    K: Clone + Ord,
{
    // clone gets its own id, slots and generations diverge from here on.
    fn clone(&self) -> RbTree<K> {
        let tree_id = TREE_IDS.fetch_add(1, atomic::Ordering::Relaxed);
        debug!("{}: cloned tree {} into {}", self.name, self.tree_id, tree_id);
        let mut free = Vec::with_capacity(self.slots.len());
        free.extend_from_slice(&self.free);
        RbTree {
            name: self.name.clone(),
            tree_id,
            slots: self.slots.clone(),
            free,
            root: self.root,
            n_count: self.n_count,
        }
    }
}

/// Maintenance API.
impl<K> RbTree<K>
where
    K: Clone + Ord,
{
    /// Identify this instance. Applications can choose unique names while
    /// creating RbTree instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return number of entries in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }

    /// Return quickly with basic statisics, only entries() method is valid
    /// with this statisics.
    pub fn stats(&self) -> Stats {
        Stats::new(self.n_count, mem::size_of::<Slot<K>>())
    }

    /// Release every node, children before their parent, leaving an
    /// empty tree behind. All outstanding handles go stale. Safe to call
    /// on an empty tree.
    pub fn clear(&mut self) {
        let mut stack: Vec<(usize, bool)> = vec![];
        stack.extend(self.root.map(|root| (root, false)));
        while let Some((at, visited)) = stack.pop() {
            if visited {
                self.release(at);
                continue;
            }
            stack.push((at, true));
            stack.extend(self.right_of(at).map(|right| (right, false)));
            stack.extend(self.left_of(at).map(|left| (left, false)));
        }
        debug!("{}: cleared {} entries", self.name, self.n_count);
        self.root = None;
        self.n_count = 0;
    }
}

/// Write operations on RbTree instance.
impl<K> RbTree<K>
where
    K: Clone + Ord,
{
    /// Insert `key` into the index and return handle to the root node,
    /// after the tree is rebalanced. If allocation fails the tree is
    /// left unchanged.
    pub fn insert(&mut self, key: K) -> Result<Handle, Error<K>> {
        let at = self.do_insert(key)?;
        Ok(self.handle(self.root.unwrap_or(at)))
    }

    /// Same as insert, but return handle to the newly inserted node.
    pub fn insert_node(&mut self, key: K) -> Result<Handle, Error<K>> {
        let at = self.do_insert(key)?;
        Ok(self.handle(at))
    }

    /// Erase the node referred by `handle` and return its key. Use
    /// [`RbTree::find`] to obtain a handle for a key.
    pub fn erase(&mut self, handle: Handle) -> Result<K, Error<K>> {
        let z = self.resolve(handle).ok_or(Error::InvalidHandle)?;

        let mut y_black = self.node(z).black;
        let (x, x_parent) = match (self.left_of(z), self.right_of(z)) {
            (None, right) => {
                let parent = self.parent_of(z);
                self.transplant(z, right);
                (right, parent)
            }
            (left, None) => {
                let parent = self.parent_of(z);
                self.transplant(z, left);
                (left, parent)
            }
            (Some(left), Some(right)) => {
                // splice out the in-order successor and move it into z's place.
                let y = self.minimum_from(right);
                y_black = self.node(y).black;
                let x = self.right_of(y);
                let x_parent = match self.parent_of(y) {
                    Some(parent) if parent == z => Some(y),
                    parent => {
                        self.transplant(y, x);
                        self.node_mut(y).right = Some(right);
                        self.node_mut(right).parent = Some(y);
                        parent
                    }
                };
                self.transplant(z, Some(y));
                self.node_mut(y).left = Some(left);
                self.node_mut(left).parent = Some(y);
                let z_black = self.node(z).black;
                self.node_mut(y).black = z_black;
                (x, x_parent)
            }
        };

        let key = self.release(z);
        self.n_count -= 1;
        debug!("{}: erased slot {}, {} entries left", self.name, z, self.n_count);

        if y_black {
            self.delete_fixup(x, x_parent);
        }
        Ok(key)
    }

    /// Validate red-black tree with following rules:
    ///
    /// * Root node is black.
    /// * From root to any leaf, no consecutive reds allowed in its path.
    /// * Number of blacks should be same under left child and right child.
    /// * Make sure keys are in sorted order.
    /// * Parent links point back to the node holding them as a child.
    ///
    /// Additionally return full statistics on the tree. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, Error<K>> {
        if self.is_red(self.root) {
            return Err(Error::RedRoot);
        }
        if let Some(root) = self.root {
            if let Some(parent) = self.parent_of(root) {
                let err = format!("root {} has parent {}", root, parent);
                return Err(Error::BrokenLink(err));
            }
        }

        let mut stats = Stats::new(self.n_count, mem::size_of::<Slot<K>>());
        stats.set_depths(Depth::new());
        let mut count = 0;
        let bounds = (Bound::Unbounded, Bound::Unbounded);
        let blacks = self.validate_tree(self.root, false, 0, 0, bounds, &mut count, &mut stats)?;
        if count != self.n_count {
            return Err(Error::CountMismatch(count, self.n_count));
        }
        stats.set_blacks(blacks);
        Ok(stats)
    }
}

/// Read operations on RbTree instance.
impl<K> RbTree<K>
where
    K: Clone + Ord,
{
    /// Return handle to the root node, None if tree is empty.
    pub fn root(&self) -> Option<Handle> {
        self.root.map(|root| self.handle(root))
    }

    /// Find a node holding `key`. Among duplicates, the first node met
    /// while descending from root is returned.
    pub fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.root;
        while let Some(at) = node {
            node = match self.key_at(at).borrow().cmp(key) {
                Ordering::Greater => self.left_of(at),
                Ordering::Less => self.right_of(at),
                Ordering::Equal => return Some(self.handle(at)),
            };
        }
        None
    }

    /// Check whether `key` is present in the index.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Return handle to the node holding the smallest key.
    pub fn minimum(&self) -> Result<Handle, Error<K>> {
        match self.root {
            Some(root) => Ok(self.handle(self.minimum_from(root))),
            None => Err(Error::EmptyTree),
        }
    }

    /// Return handle to the node holding the largest key.
    pub fn maximum(&self) -> Result<Handle, Error<K>> {
        match self.root {
            Some(root) => Ok(self.handle(self.maximum_from(root))),
            None => Err(Error::EmptyTree),
        }
    }

    /// Return the key held by node `handle`, None if handle is stale.
    pub fn key(&self, handle: Handle) -> Option<&K> {
        self.resolve(handle).map(|at| self.key_at(at))
    }

    /// Return the color of node `handle`, None if handle is stale.
    pub fn color(&self, handle: Handle) -> Option<Color> {
        self.resolve(handle).map(|at| match self.node(at).black {
            true => Color::Black,
            false => Color::Red,
        })
    }

    /// Copy keys in ascending order into `buf`, until either all keys are
    /// copied or `buf` is full. Return the number of keys copied.
    pub fn to_array(&self, buf: &mut [K]) -> usize {
        let mut n = 0;
        for (item, key) in buf.iter_mut().zip(self.iter()) {
            *item = key.clone();
            n += 1;
        }
        n
    }

    /// Return all keys in ascending order.
    pub fn to_vec(&self) -> Vec<K> {
        self.iter().cloned().collect()
    }

    /// Return a random entry from this index.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Option<K> {
        let mut at = self.root?;

        let mut at_depth = rng.gen::<u8>() % 40;
        loop {
            let next = match rng.gen::<u8>() % 2 {
                0 => self.left_of(at),
                _ => self.right_of(at),
            };
            match next {
                Some(next) if at_depth > 0 => {
                    at_depth -= 1;
                    at = next;
                }
                _ => break Some(self.key_at(at).clone()),
            }
        }
    }

    /// Return an iterator over all entries in ascending order. Iterate
    /// with `rev()` for descending order.
    pub fn iter(&self) -> Iter<K> {
        let front = self.root.map(|root| self.minimum_from(root));
        let back = self.root.map(|root| self.maximum_from(root));
        Iter::new(self, front, back, self.n_count)
    }

    /// Range over all entries from low to high.
    pub fn range<Q, R>(&self, range: R) -> Range<K>
    where
        K: Borrow<Q>,
        R: RangeBounds<Q>,
        Q: Ord + ?Sized,
    {
        let front = self.lower_bound(range.start_bound());
        let back = self.upper_bound(range.end_bound());
        match (front, back) {
            (Some(f), Some(b)) if self.key_at(f) <= self.key_at(b) => {
                Range::new(self, front, back)
            }
            _ => Range::new(self, None, None),
        }
    }
}

impl<K> RbTree<K>
where
    K: Clone + Ord,
{
    fn do_insert(&mut self, key: K) -> Result<usize, Error<K>> {
        let at = self.alloc(key)?;

        let (mut parent, mut side) = (None, Side::Left);
        let mut node = self.root;
        while let Some(cur) = node {
            parent = Some(cur);
            side = match self.key_at(at).cmp(self.key_at(cur)) {
                Ordering::Less => Side::Left,
                _ => Side::Right,
            };
            node = self.child(cur, side);
        }

        self.node_mut(at).parent = parent;
        match parent {
            None => self.root = Some(at),
            Some(parent) => self.set_child(parent, side, Some(at)),
        }
        self.n_count += 1;

        self.insert_fixup(at);
        Ok(at)
    }

    fn insert_fixup(&mut self, mut pt: usize) {
        while Some(pt) != self.root && self.is_red(Some(pt)) {
            let parent = match self.parent_of(pt) {
                Some(parent) if self.is_red(Some(parent)) => parent,
                _ => break,
            };
            // red parent is never the root.
            let grandparent = match self.parent_of(parent) {
                Some(grandparent) => grandparent,
                None => break,
            };

            let side = match self.left_of(grandparent) {
                Some(left) if left == parent => Side::Left,
                _ => Side::Right,
            };
            let uncle = self.child(grandparent, side.flip());

            if self.is_red(uncle) {
                trace!("{}: insert fixup, red uncle at {}", self.name, grandparent);
                self.set_black(Some(parent));
                self.set_black(uncle);
                self.set_red(grandparent);
                pt = grandparent;
                continue;
            }

            let mut parent = parent;
            if self.child(parent, side.flip()) == Some(pt) {
                trace!("{}: insert fixup, zig-zag at {}", self.name, parent);
                self.rotate(parent, side);
                mem::swap(&mut pt, &mut parent);
            }
            trace!("{}: insert fixup, straight line at {}", self.name, grandparent);
            self.rotate(grandparent, side.flip());
            self.set_black(Some(parent));
            self.set_red(grandparent);
            pt = parent;
        }
        self.set_black(self.root);
    }

    // `x` carries the extra blackness, `parent` is its parent. `x` can
    // be absent, hence parent is tracked separately.
    fn delete_fixup(&mut self, mut x: Option<usize>, mut parent: Option<usize>) {
        while x != self.root && self.is_black(x) {
            let p = match parent {
                Some(p) => p,
                None => break,
            };
            let side = match self.left_of(p) == x {
                true => Side::Left,
                false => Side::Right,
            };

            let mut w = self.sibling(p, side);
            if self.is_red(Some(w)) {
                trace!("{}: delete fixup, red sibling at {}", self.name, w);
                self.set_black(Some(w));
                self.set_red(p);
                self.rotate(p, side);
                w = self.sibling(p, side);
            }

            let (near, far) = (self.child(w, side), self.child(w, side.flip()));
            if self.is_black(near) && self.is_black(far) {
                trace!("{}: delete fixup, black nephews at {}", self.name, w);
                self.set_red(w);
                x = Some(p);
                parent = self.parent_of(p);
                continue;
            }

            if self.is_black(far) {
                trace!("{}: delete fixup, red near nephew at {}", self.name, w);
                self.set_black(near);
                self.set_red(w);
                self.rotate(w, side.flip());
                w = self.sibling(p, side);
            }

            trace!("{}: delete fixup, red far nephew at {}", self.name, w);
            let p_black = self.node(p).black;
            self.node_mut(w).black = p_black;
            self.set_black(Some(p));
            self.set_black(self.child(w, side.flip()));
            self.rotate(p, side);
            x = self.root;
            parent = None;
        }
        self.set_black(x);
    }

    // Rotate at `pivot` towards `side`, colors are left untouched.
    #[inline]
    fn rotate(&mut self, pivot: usize, side: Side) {
        match side {
            Side::Left => self.rotate_left(pivot),
            Side::Right => self.rotate_right(pivot),
        }
    }

    //              (i)                       (i)
    //               |                         |
    //             pivot                       x
    //              /  \                      / \
    //             /    \                    /   \
    //            /      \                  /     \
    //          left      x             pivot      xr
    //                   / \             /  \
    //                 xl   xr        left   xl
    //
    fn rotate_left(&mut self, pivot: usize) {
        let x = match self.right_of(pivot) {
            Some(x) => x,
            None => panic!("rotate_left(): rotating an absent link ? Call the programmer"),
        };

        let xl = self.left_of(x);
        self.node_mut(pivot).right = xl;
        if let Some(xl) = xl {
            self.node_mut(xl).parent = Some(pivot);
        }

        self.replace_child(pivot, x);
        self.node_mut(x).left = Some(pivot);
        self.node_mut(pivot).parent = Some(x);
    }

    //              (i)                       (i)
    //               |                         |
    //             pivot                       x
    //              /  \                      / \
    //             /    \                    /   \
    //            /      \                  /     \
    //           x      right             xl     pivot
    //          / \                               /  \
    //        xl   xr                            xr  right
    //
    fn rotate_right(&mut self, pivot: usize) {
        let x = match self.left_of(pivot) {
            Some(x) => x,
            None => panic!("rotate_right(): rotating an absent link ? Call the programmer"),
        };

        let xr = self.right_of(x);
        self.node_mut(pivot).left = xr;
        if let Some(xr) = xr {
            self.node_mut(xr).parent = Some(pivot);
        }

        self.replace_child(pivot, x);
        self.node_mut(x).right = Some(pivot);
        self.node_mut(pivot).parent = Some(x);
    }

    // hook `x` under the parent of `pivot`, or make it the root.
    fn replace_child(&mut self, pivot: usize, x: usize) {
        let parent = self.parent_of(pivot);
        self.node_mut(x).parent = parent;
        match parent {
            None => self.root = Some(x),
            Some(p) if self.left_of(p) == Some(pivot) => self.node_mut(p).left = Some(x),
            Some(p) => self.node_mut(p).right = Some(x),
        }
    }

    // Replace subtree at `u` with subtree at `v`, only the parent link
    // is updated.
    fn transplant(&mut self, u: usize, v: Option<usize>) {
        let parent = self.parent_of(u);
        match parent {
            None => self.root = v,
            Some(p) if self.left_of(p) == Some(u) => self.node_mut(p).left = v,
            Some(p) => self.node_mut(p).right = v,
        }
        if let Some(v) = v {
            self.node_mut(v).parent = parent;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_tree(
        &self,
        node: Option<usize>,
        fromred: bool,
        mut nb: usize,
        depth: usize,
        bounds: (Bound<&K>, Bound<&K>),
        count: &mut usize,
        stats: &mut Stats,
    ) -> Result<usize, Error<K>> {
        let at = match node {
            None => {
                stats.sample_depth(depth);
                return Ok(nb);
            }
            Some(at) => at,
        };
        *count += 1;

        let red = self.is_red(node);
        if fromred && red {
            return Err(Error::ConsecutiveReds);
        }
        if !red {
            nb += 1;
        }

        // rotations can carry a duplicate into the left subtree, so keys
        // are checked against inclusive bounds.
        let key = self.key_at(at);
        match bounds.0 {
            Bound::Included(low) if key < low => {
                return Err(Error::SortError(key.clone(), low.clone()));
            }
            _ => (),
        }
        match bounds.1 {
            Bound::Included(high) if key > high => {
                return Err(Error::SortError(key.clone(), high.clone()));
            }
            _ => (),
        }

        let (left, right) = (self.left_of(at), self.right_of(at));
        for child in left.iter().chain(right.iter()) {
            if self.parent_of(*child) != Some(at) {
                let err = format!("child {} of {} points to {:?}", child, at, self.parent_of(*child));
                return Err(Error::BrokenLink(err));
            }
        }

        let lbounds = (bounds.0, Bound::Included(key));
        let rbounds = (Bound::Included(key), bounds.1);
        let lblacks = self.validate_tree(left, red, nb, depth + 1, lbounds, count, stats)?;
        let rblacks = self.validate_tree(right, red, nb, depth + 1, rbounds, count, stats)?;
        if lblacks != rblacks {
            let err = format!("left: {} right: {}", lblacks, rblacks);
            return Err(Error::UnbalancedBlacks(err));
        }
        Ok(lblacks)
    }

    // first node, in sort order, that falls after `low`.
    fn lower_bound<Q>(&self, low: Bound<&Q>) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (mut node, mut found) = (self.root, None);
        while let Some(at) = node {
            let key: &Q = self.key_at(at).borrow();
            let ok = match low {
                Bound::Included(low) => key >= low,
                Bound::Excluded(low) => key > low,
                Bound::Unbounded => true,
            };
            node = match ok {
                true => {
                    found = Some(at);
                    self.left_of(at)
                }
                false => self.right_of(at),
            };
        }
        found
    }

    // last node, in sort order, that falls before `high`.
    fn upper_bound<Q>(&self, high: Bound<&Q>) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (mut node, mut found) = (self.root, None);
        while let Some(at) = node {
            let key: &Q = self.key_at(at).borrow();
            let ok = match high {
                Bound::Included(high) => key <= high,
                Bound::Excluded(high) => key < high,
                Bound::Unbounded => true,
            };
            node = match ok {
                true => {
                    found = Some(at);
                    self.right_of(at)
                }
                false => self.left_of(at),
            };
        }
        found
    }

    pub(crate) fn minimum_from(&self, mut at: usize) -> usize {
        while let Some(left) = self.left_of(at) {
            at = left;
        }
        at
    }

    pub(crate) fn maximum_from(&self, mut at: usize) -> usize {
        while let Some(right) = self.right_of(at) {
            at = right;
        }
        at
    }

    pub(crate) fn successor(&self, at: usize) -> Option<usize> {
        if let Some(right) = self.right_of(at) {
            return Some(self.minimum_from(right));
        }
        let (mut child, mut parent) = (at, self.parent_of(at));
        while let Some(p) = parent {
            if self.left_of(p) == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.parent_of(p);
        }
        None
    }

    pub(crate) fn predecessor(&self, at: usize) -> Option<usize> {
        if let Some(left) = self.left_of(at) {
            return Some(self.maximum_from(left));
        }
        let (mut child, mut parent) = (at, self.parent_of(at));
        while let Some(p) = parent {
            if self.right_of(p) == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.parent_of(p);
        }
        None
    }

    //--------- arena routines ----------------

    fn alloc(&mut self, key: K) -> Result<usize, Error<K>> {
        let node = Node::new(key);
        if let Some(at) = self.free.pop() {
            self.slots[at].node = Some(node);
            return Ok(at);
        }
        // free-list keeps room for every slot, release never allocates.
        let n = self.slots.len() + 1;
        if self.slots.try_reserve(1).is_err() || self.free.try_reserve(n).is_err() {
            return Err(Error::AllocFailed);
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        Ok(self.slots.len() - 1)
    }

    fn release(&mut self, at: usize) -> K {
        let slot = &mut self.slots[at];
        let node = match slot.node.take() {
            Some(node) => node,
            None => panic!("release(): double release of {} ? Call the programmer", at),
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(at);
        node.key
    }

    fn resolve(&self, handle: Handle) -> Option<usize> {
        if handle.tree != self.tree_id {
            return None;
        }
        match self.slots.get(handle.slot) {
            Some(slot) if slot.generation == handle.generation && slot.node.is_some() => {
                Some(handle.slot)
            }
            _ => None,
        }
    }

    #[inline]
    fn handle(&self, at: usize) -> Handle {
        Handle {
            tree: self.tree_id,
            slot: at,
            generation: self.slots[at].generation,
        }
    }

    #[inline]
    fn node(&self, at: usize) -> &Node<K> {
        match &self.slots[at].node {
            Some(node) => node,
            None => panic!("node(): dangling link {} ? Call the programmer", at),
        }
    }

    #[inline]
    fn node_mut(&mut self, at: usize) -> &mut Node<K> {
        match &mut self.slots[at].node {
            Some(node) => node,
            None => panic!("node_mut(): dangling link {} ? Call the programmer", at),
        }
    }

    #[inline]
    pub(crate) fn key_at(&self, at: usize) -> &K {
        &self.node(at).key
    }

    #[inline]
    fn parent_of(&self, at: usize) -> Option<usize> {
        self.node(at).parent
    }

    #[inline]
    fn left_of(&self, at: usize) -> Option<usize> {
        self.node(at).left
    }

    #[inline]
    fn right_of(&self, at: usize) -> Option<usize> {
        self.node(at).right
    }

    #[inline]
    fn child(&self, at: usize, side: Side) -> Option<usize> {
        match side {
            Side::Left => self.left_of(at),
            Side::Right => self.right_of(at),
        }
    }

    #[inline]
    fn set_child(&mut self, at: usize, side: Side, child: Option<usize>) {
        match side {
            Side::Left => self.node_mut(at).left = child,
            Side::Right => self.node_mut(at).right = child,
        }
    }

    // sibling of the node on `side` of `p`, present as long as the
    // black heights below `p` are balanced.
    fn sibling(&self, p: usize, side: Side) -> usize {
        match self.child(p, side.flip()) {
            Some(w) => w,
            None => panic!("sibling(): missing sibling under {} ? Call the programmer", p),
        }
    }

    // absent links are the nil sentinel, they are always black.
    #[inline]
    fn is_red(&self, at: Option<usize>) -> bool {
        at.map_or(false, |at| !self.node(at).black)
    }

    #[inline]
    fn is_black(&self, at: Option<usize>) -> bool {
        !self.is_red(at)
    }

    // writing through an absent link is a no-op, the sentinel stays black.
    #[inline]
    fn set_black(&mut self, at: Option<usize>) {
        if let Some(at) = at {
            self.node_mut(at).black = true
        }
    }

    #[inline]
    fn set_red(&mut self, at: usize) {
        self.node_mut(at).black = false
    }
}

#[derive(Clone)]
struct Slot<K>
where
    K: Clone + Ord,
{
    generation: u64,
    node: Option<Node<K>>, // None when slot is on the free-list.
}

/// Node corresponds to a single entry in RbTree instance.
#[derive(Clone)]
struct Node<K>
where
    K: Clone + Ord,
{
    key: K,
    black: bool,           // store: black or red
    parent: Option<usize>, // store: parent slot
    left: Option<usize>,   // store: left child slot
    right: Option<usize>,  // store: right child slot
}

impl<K> Node<K>
where
    K: Clone + Ord,
{
    // new nodes are born red.
    fn new(key: K) -> Node<K> {
        Node {
            key,
            black: false,
            parent: None,
            left: None,
            right: None,
        }
    }
}

/// Statistics on [`RbTree`] tree. Serves two purpose:
///
/// * To get partial but quick statistics via [`RbTree::stats`] method.
/// * To get full statisics via [`RbTree::validate`] method.
#[derive(Default, Debug)]
pub struct Stats {
    entries: usize, // number of entries in the tree.
    node_size: usize,
    blacks: Option<usize>,
    depths: Option<Depth>,
}

impl Stats {
    fn new(entries: usize, node_size: usize) -> Stats {
        Stats {
            entries,
            node_size,
            blacks: Default::default(),
            depths: Default::default(),
        }
    }

    #[inline]
    fn set_blacks(&mut self, blacks: usize) {
        self.blacks = Some(blacks)
    }

    #[inline]
    fn set_depths(&mut self, depths: Depth) {
        self.depths = Some(depths)
    }

    #[inline]
    fn sample_depth(&mut self, depth: usize) {
        if let Some(depths) = self.depths.as_mut() {
            depths.sample(depth)
        }
    }

    /// Return number entries in [`RbTree`] instance.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return node-size, including over-head for `RbTree<K>`. Although
    /// the node overhead is constant, the node size varies based on
    /// key type. EG:
    ///
    /// ```
    /// use rbtree_index::RbTree;
    /// let small: RbTree<u64> = RbTree::new("small");
    /// let large: RbTree<u128> = RbTree::new("large");
    ///
    /// // key size grows by 8 bytes, so does the node.
    /// assert!(large.stats().node_size() > small.stats().node_size());
    /// ```
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Return number of black nodes from root to leaf, on both left
    /// and right child.
    #[inline]
    pub fn blacks(&self) -> Option<usize> {
        self.blacks
    }

    /// Return [`Depth`] statistics.
    pub fn depths(&self) -> Option<Depth> {
        self.depths.as_ref().filter(|d| d.samples() > 0).cloned()
    }
}
