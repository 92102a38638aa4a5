use std::ops::Bound;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::prelude::random;
use rand::seq::SliceRandom;
use rand::{rngs::SmallRng, SeedableRng};
use simplelog::{Config, LevelFilter, SimpleLogger};

use crate::error::Error;
use crate::rbtree::{Color, RbTree};

#[test]
fn test_id() {
    let tree: RbTree<i64> = RbTree::new("test-rbtree");
    assert_eq!(tree.id(), "test-rbtree".to_string());
}

#[test]
fn test_empty() {
    let tree: RbTree<i64> = RbTree::new("test-rbtree");
    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert!(tree.find(&10).is_none());
    assert_eq!(tree.minimum(), Err(Error::EmptyTree));
    assert_eq!(tree.maximum(), Err(Error::EmptyTree));
    assert!(tree.iter().next().is_none());
    assert!(tree.range::<i64, _>(..).next().is_none());
    assert_eq!(tree.to_vec(), Vec::<i64>::new());

    let stats = tree.validate().unwrap();
    assert_eq!(stats.entries(), 0);
    assert_eq!(stats.blacks(), Some(0));
}

#[test]
fn test_insert() {
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");
    for key in [5, 4, 6, 3, 2, 1, 0].iter() {
        let root = tree.insert(*key).unwrap();
        assert_eq!(Some(root), tree.root());
        assert_eq!(tree.color(root), Some(Color::Black));
        assert!(tree.validate().is_ok());
    }

    assert_eq!(tree.len(), 7);
    assert_eq!(tree.to_vec(), vec![0, 1, 2, 3, 4, 5, 6]);

    let stats = tree.validate().unwrap();
    assert_eq!(stats.entries(), 7);
    let depths = stats.depths().unwrap();
    assert_eq!(depths.samples(), 8);
    assert!(depths.max() <= 6, "height {}", depths.max());

    for key in 0..7 {
        let handle = tree.find(&key).unwrap();
        assert_eq!(tree.key(handle), Some(&key));
    }
    assert!(tree.find(&7).is_none());
    assert!(tree.find(&-1).is_none());
}

#[test]
fn test_duplicates() {
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");
    let handles: Vec<_> = (0..3).map(|_| tree.insert_node(5).unwrap()).collect();

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.to_vec(), vec![5, 5, 5]);
    assert!(tree.validate().is_ok());
    assert_ne!(handles[0], handles[1]);
    assert_ne!(handles[1], handles[2]);
    assert_ne!(handles[0], handles[2]);
    for handle in handles.iter() {
        assert_eq!(tree.key(*handle), Some(&5));
    }

    let handle = tree.find(&5).unwrap();
    assert!(handles.contains(&handle));

    let mut n = 0;
    while let Some(handle) = tree.find(&5) {
        assert_eq!(tree.erase(handle), Ok(5));
        assert!(tree.validate().is_ok());
        n += 1;
    }
    assert_eq!(n, 3);
    assert!(tree.is_empty());
}

#[test]
fn test_find_erase() {
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");
    let mut refns = RefKeys::new(10);

    for key in [2, 1, 3, 6, 5, 4, 8, 0, 9, 7].iter() {
        assert!(tree.insert(*key).is_ok());
        refns.insert(*key);
    }
    assert_eq!(tree.len(), 10);
    assert!(tree.validate().is_ok());

    for key in [5, 0, 9, 2, 7, 1, 3, 8, 6, 4].iter() {
        let handle = tree.find(key).unwrap();
        assert_eq!(tree.erase(handle), Ok(*key));
        assert_eq!(refns.erase(*key), Some(*key));
        assert!(tree.find(key).is_none());
        assert!(tree.validate().is_ok());
        assert_eq!(tree.to_vec(), refns.iter().collect::<Vec<i64>>());
    }
    assert_eq!(tree.len(), 0);
    assert!(tree.root().is_none());
}

#[test]
fn test_invalid_handle() {
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");
    assert!(tree.insert(1).is_ok());

    let handle = tree.find(&1).unwrap();
    assert_eq!(tree.erase(handle), Ok(1));
    assert_eq!(tree.erase(handle), Err(Error::InvalidHandle));
    assert_eq!(tree.key(handle), None);
    assert_eq!(tree.color(handle), None);

    // released slot is reused, the old handle stays stale.
    let new_handle = tree.insert_node(2).unwrap();
    assert_ne!(new_handle, handle);
    assert_eq!(tree.erase(handle), Err(Error::InvalidHandle));
    assert_eq!(tree.key(new_handle), Some(&2));

    let mut other: RbTree<i64> = RbTree::new("other-rbtree");
    assert!(other.insert(2).is_ok());
    assert_eq!(other.erase(new_handle), Err(Error::InvalidHandle));
    assert_eq!(other.len(), 1);
    assert_eq!(tree.len(), 1);
    assert!(other.validate().is_ok());
}

#[test]
fn test_clone_handle() {
    let mut tree = RbTree::load_from("test-rbtree", vec![10_i64, 20, 30]).unwrap();
    let mut clone = tree.clone();
    assert_eq!(clone.to_vec(), vec![10, 20, 30]);
    assert!(clone.validate().is_ok());

    // handles minted before cloning stay with the original.
    let handle = tree.find(&20).unwrap();
    assert_eq!(clone.key(handle), None);
    assert_eq!(clone.erase(handle), Err(Error::InvalidHandle));
    assert_eq!(tree.erase(handle), Ok(20));
    let handle = clone.find(&20).unwrap();
    assert_eq!(clone.erase(handle), Ok(20));

    // both trees reuse the same released slot.
    let h1 = tree.insert_node(99).unwrap();
    let h2 = clone.insert_node(-7).unwrap();
    assert_ne!(h1, h2);
    assert_eq!(clone.erase(h1), Err(Error::InvalidHandle));
    assert_eq!(tree.erase(h2), Err(Error::InvalidHandle));
    assert_eq!(tree.to_vec(), vec![10, 30, 99]);
    assert_eq!(clone.to_vec(), vec![-7, 10, 30]);
    assert!(tree.validate().is_ok());
    assert!(clone.validate().is_ok());
}

#[test]
fn test_minimum_maximum() {
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");
    let mut refns = RefKeys::new(1000);

    for _ in 0..1000 {
        let key: i64 = random::<i64>() % 10_000;
        assert!(tree.insert(key).is_ok());
        refns.insert(key);

        let min = tree.minimum().unwrap();
        let max = tree.maximum().unwrap();
        assert_eq!(tree.key(min).cloned(), refns.iter().next());
        assert_eq!(tree.key(max).cloned(), refns.iter().last());
    }
}

#[test]
fn test_erase_root() {
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");
    for key in 0..100 {
        assert!(tree.insert(key).is_ok());
    }

    let mut n = 100;
    while let Some(root) = tree.root() {
        assert!(tree.erase(root).is_ok());
        n -= 1;
        assert_eq!(tree.len(), n);
        assert!(tree.validate().is_ok());
    }
    assert_eq!(n, 0);
    assert!(tree.is_empty());
    assert!(tree.validate().is_ok());
}

#[test]
fn test_to_array() {
    let mut rng = SmallRng::from_seed(make_seed().to_le_bytes());
    let mut keys: Vec<i64> = (0..10).collect();
    keys.shuffle(&mut rng);
    let tree = RbTree::load_from("test-rbtree", keys.into_iter()).unwrap();

    let mut buf = [0_i64; 4];
    assert_eq!(tree.to_array(&mut buf), 4);
    assert_eq!(buf, [0, 1, 2, 3]);

    let mut buf = [-1_i64; 20];
    assert_eq!(tree.to_array(&mut buf), 10);
    assert_eq!(&buf[..10], &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(buf[10], -1);

    let mut buf: [i64; 0] = [];
    assert_eq!(tree.to_array(&mut buf), 0);
}

#[test]
fn test_load_from() {
    let tree = RbTree::load_from("test-rbtree", vec![3, 1, 2, 1]).unwrap();
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.to_vec(), vec![1, 1, 2, 3]);
    assert!(tree.validate().is_ok());
}

#[test]
fn test_iter_range() {
    let mut keys: Vec<i64> = (0..10).collect();
    keys.push(5);
    let tree = RbTree::load_from("test-rbtree", keys).unwrap();

    let items: Vec<i64> = tree.iter().cloned().collect();
    assert_eq!(items, vec![0, 1, 2, 3, 4, 5, 5, 6, 7, 8, 9]);
    let items: Vec<i64> = tree.iter().rev().cloned().collect();
    assert_eq!(items, vec![9, 8, 7, 6, 5, 5, 4, 3, 2, 1, 0]);
    assert_eq!(tree.iter().len(), 11);

    let items: Vec<i64> = tree.range(3..7).cloned().collect();
    assert_eq!(items, vec![3, 4, 5, 5, 6]);
    let items: Vec<i64> = tree.range(3..7).rev().cloned().collect();
    assert_eq!(items, vec![6, 5, 5, 4, 3]);
    let items: Vec<i64> = tree.range(..=2).cloned().collect();
    assert_eq!(items, vec![0, 1, 2]);
    let range = (Bound::Excluded(5), Bound::Unbounded);
    let items: Vec<i64> = tree.range(range).cloned().collect();
    assert_eq!(items, vec![6, 7, 8, 9]);
    let items: Vec<i64> = tree.range(5..=5).cloned().collect();
    assert_eq!(items, vec![5, 5]);
    assert!(tree.range(8..3).next().is_none());
    assert!(tree.range(10..).next().is_none());

    // both ends meet in the middle.
    let mut range = tree.range(0..10);
    let mut items = vec![];
    loop {
        match (range.next(), range.next_back()) {
            (Some(a), Some(b)) => {
                items.push(*a);
                items.push(*b);
            }
            (Some(a), None) | (None, Some(a)) => items.push(*a),
            (None, None) => break,
        }
    }
    items.sort();
    assert_eq!(items, vec![0, 1, 2, 3, 4, 5, 5, 6, 7, 8, 9]);
}

#[test]
fn test_clear() {
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");
    tree.clear();
    assert!(tree.is_empty());

    let handles: Vec<_> = (0..100)
        .map(|_| tree.insert_node(random::<i64>() % 100).unwrap())
        .collect();
    assert_eq!(tree.len(), 100);

    tree.clear();
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert!(tree.validate().is_ok());
    for handle in handles.into_iter() {
        assert_eq!(tree.erase(handle), Err(Error::InvalidHandle));
    }

    for key in 0..10 {
        assert!(tree.insert(key).is_ok());
    }
    assert_eq!(tree.to_vec(), (0..10).collect::<Vec<i64>>());
    assert!(tree.validate().is_ok());
    tree.clear();
    tree.clear();
    assert!(tree.is_empty());
}

#[test]
fn test_random() {
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");
    let mut rng = SmallRng::from_seed(make_seed().to_le_bytes());

    assert_eq!(tree.random(&mut rng), None);

    assert!(tree.insert(0).is_ok());
    assert_eq!(tree.random(&mut rng), Some(0));
    assert_eq!(tree.random(&mut rng), Some(0));

    for key in 1..100_000 {
        assert!(tree.insert(key).is_ok());
    }
    for _i in 0..200_000 {
        let key = tree.random(&mut rng).unwrap();
        assert!(key >= 0 && key < 100_000);
    }
}

#[test]
fn test_stats() {
    let n = 10_000;
    let tree = RbTree::load_from("test-rbtree", 0..n).unwrap();

    let stats = tree.validate().unwrap();
    assert_eq!(stats.entries(), n as usize);
    assert_eq!(stats.node_size(), tree.stats().node_size());
    assert!(stats.blacks().unwrap() > 0);

    let depths = stats.depths().unwrap();
    assert_eq!(depths.samples(), (n + 1) as usize);
    let limit = 2.0 * ((n + 1) as f64).log2();
    assert!((depths.max() as f64) <= limit, "{} {}", depths.max(), limit);
    assert!(depths.min() <= depths.mean() && depths.mean() <= depths.max());
    assert!(tree.stats().depths().is_none());
}

#[test]
fn test_round_trip() {
    let size = 1000;
    let mut rng = SmallRng::from_seed(make_seed().to_le_bytes());
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");

    let mut keys: Vec<i64> = (0..size).map(|_| random::<i64>() % 500).collect();
    for key in keys.iter() {
        assert!(tree.insert(*key).is_ok());
        assert!(tree.validate().is_ok());
    }
    assert_eq!(tree.len(), size);

    keys.shuffle(&mut rng);
    for key in keys.iter() {
        let handle = tree.find(key).unwrap();
        assert_eq!(tree.erase(handle), Ok(*key));
        assert!(tree.validate().is_ok());
    }
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
}

#[test]
fn test_crud() {
    let _ = SimpleLogger::init(LevelFilter::Warn, Config::default());

    let size = 1000;
    let mut tree: RbTree<i64> = RbTree::new("test-rbtree");
    let mut refns = RefKeys::new(size);

    for _ in 0..50_000 {
        let key: i64 = (random::<i64>() % (size as i64)).abs();
        let op: i64 = (random::<i64>() % 4).abs();
        match op {
            0 => {
                assert!(tree.insert(key).is_ok());
                refns.insert(key);
            }
            1 => {
                let val = tree.find(&key).map(|h| tree.erase(h).unwrap());
                let refval = refns.erase(key);
                assert_eq!(val, refval);
            }
            2 => {
                assert_eq!(tree.contains(&key), refns.contains(key));
                if let Some(handle) = tree.find(&key) {
                    assert_eq!(tree.key(handle), Some(&key));
                }
            }
            3 => {
                let min = tree.minimum().ok().and_then(|h| tree.key(h).cloned());
                let max = tree.maximum().ok().and_then(|h| tree.key(h).cloned());
                assert_eq!(min, refns.iter().next());
                assert_eq!(max, refns.iter().last());
            }
            op => panic!("unreachable {}", op),
        };

        assert!(tree.validate().is_ok());
        assert_eq!(tree.len(), refns.len());
    }

    println!("index-length {}", tree.len());

    // test iter
    let (mut iter, mut iter_ref) = (tree.iter(), refns.iter());
    loop {
        match (iter.next(), iter_ref.next()) {
            (Some(item), Some(ref_item)) => assert_eq!(*item, ref_item),
            (None, None) => break,
            (_, _) => panic!("invalid"),
        }
    }

    // ranges and reverses
    for _ in 0..1_000 {
        let (low, high) = random_low_high(size);

        let items: Vec<i64> = tree.range((low, high)).cloned().collect();
        let ref_items: Vec<i64> = refns.range(low, high).collect();
        assert_eq!(items, ref_items, "{:?} {:?}", low, high);

        let items: Vec<i64> = tree.range((low, high)).rev().cloned().collect();
        let ref_items: Vec<i64> = refns.range(low, high).rev().collect();
        assert_eq!(items, ref_items, "{:?} {:?}", low, high);
    }
}

#[test]
fn test_error_display() {
    assert_eq!(Error::<i64>::EmptyTree.to_string(), "empty tree");
    assert_eq!(
        Error::<i64>::SortError(2, 1).to_string(),
        "sort error 2 1".to_string()
    );
    assert_eq!(
        Error::<i64>::CountMismatch(3, 4).to_string(),
        "count mismatch 3 != 4".to_string()
    );
}

fn make_seed() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

include!("./ref_test.rs");
