//! Property tests for the intrusive list against a `VecDeque` model.

use std::collections::VecDeque;

use proptest::prelude::*;
use stratum_alloc::{BlockId, Pool, PoolBuilder};
use stratum_collections::{Index, List, linked};

#[derive(Debug)]
struct Node {
    value: u32,
    next: u32,
    prev: u32,
}

linked!(Node, u32);

// Vec<Node> is indexed by usize; wrap it to exercise u32 links.
struct Nodes(Vec<Node>);

impl stratum_collections::Storage<Node> for Nodes {
    type Index = u32;

    fn get(&self, index: u32) -> Option<&Node> {
        self.0.get(index as usize)
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut Node> {
        self.0.get_mut(index as usize)
    }

    unsafe fn get_unchecked(&self, index: u32) -> &Node {
        unsafe { self.0.get_unchecked(index as usize) }
    }

    unsafe fn get_unchecked_mut(&mut self, index: u32) -> &mut Node {
        unsafe { self.0.get_unchecked_mut(index as usize) }
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

fn nodes(n: usize) -> Nodes {
    Nodes(
        (0..n as u32)
            .map(|value| Node {
                value,
                next: u32::NONE,
                prev: u32::NONE,
            })
            .collect(),
    )
}

fn collect(list: &List<u32>, storage: &Nodes) -> Vec<u32> {
    list.iter(storage).map(|n| n.value).collect()
}

#[derive(Debug, Clone)]
enum Op {
    PushFront,
    PushBack,
    PushNext(usize),
    PushPrev(usize),
    PopFront,
    PopBack,
    PopCurrent(usize),
    PopNext(usize),
    PopPrev(usize),
    Reverse,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::PushFront),
        3 => Just(Op::PushBack),
        2 => any::<usize>().prop_map(Op::PushNext),
        2 => any::<usize>().prop_map(Op::PushPrev),
        2 => Just(Op::PopFront),
        2 => Just(Op::PopBack),
        2 => any::<usize>().prop_map(Op::PopCurrent),
        1 => any::<usize>().prop_map(Op::PopNext),
        1 => any::<usize>().prop_map(Op::PopPrev),
        1 => Just(Op::Reverse),
    ]
}

const NODES: usize = 64;

proptest! {
    /// push_back/pop_front is FIFO and len() tracks pushes minus pops.
    #[test]
    fn fifo_order(k in 0usize..NODES, j in 0usize..NODES) {
        let j = j.min(k);
        let mut storage = nodes(NODES);
        let mut list = List::new();

        for idx in 0..k as u32 {
            list.push_back(&mut storage, idx);
        }
        for expected in 0..j as u32 {
            prop_assert_eq!(list.pop_front(&mut storage), Some(expected));
        }

        prop_assert_eq!(list.len(&storage), k - j);
        prop_assert_eq!(list.check_links(&storage), Ok(k - j));
        prop_assert_eq!(list.is_empty(), k == j);
    }

    /// reverse twice restores the original order.
    #[test]
    fn reverse_is_involution(order in Just((0..NODES as u32).collect::<Vec<_>>()).prop_shuffle(), n in 0usize..NODES) {
        let mut storage = nodes(NODES);
        let mut list = List::from_keys(&mut storage, order[..n].iter().copied());
        let before = collect(&list, &storage);

        list.reverse(&mut storage);
        let mut reversed = before.clone();
        reversed.reverse();
        prop_assert_eq!(collect(&list, &storage), reversed);

        list.reverse(&mut storage);
        prop_assert_eq!(collect(&list, &storage), before);
        prop_assert_eq!(list.check_links(&storage), Ok(n));
    }

    /// Any operation sequence matches a VecDeque model and keeps the links sound.
    #[test]
    fn matches_model(ops in prop::collection::vec(op(), 0..200)) {
        let mut storage = nodes(NODES);
        let mut list = List::new();
        let mut model: VecDeque<u32> = VecDeque::new();
        let mut free: Vec<u32> = (0..NODES as u32).rev().collect();

        for op in ops {
            match op {
                Op::PushFront => if let Some(idx) = free.pop() {
                    list.push_front(&mut storage, idx);
                    model.push_front(idx);
                },
                Op::PushBack => if let Some(idx) = free.pop() {
                    list.push_back(&mut storage, idx);
                    model.push_back(idx);
                },
                Op::PushNext(at) if !model.is_empty() => if let Some(idx) = free.pop() {
                    let pos = at % model.len();
                    list.push_next(&mut storage, model[pos], idx);
                    model.insert(pos + 1, idx);
                },
                Op::PushPrev(at) if !model.is_empty() => if let Some(idx) = free.pop() {
                    let pos = at % model.len();
                    list.push_prev(&mut storage, model[pos], idx);
                    model.insert(pos, idx);
                },
                Op::PopFront => {
                    let popped = list.pop_front(&mut storage);
                    prop_assert_eq!(popped, model.pop_front());
                    free.extend(popped);
                }
                Op::PopBack => {
                    let popped = list.pop_back(&mut storage);
                    prop_assert_eq!(popped, model.pop_back());
                    free.extend(popped);
                }
                Op::PopCurrent(at) if !model.is_empty() => {
                    let pos = at % model.len();
                    let base = model.remove(pos).unwrap();
                    prop_assert_eq!(list.pop_current(&mut storage, base), base);
                    free.push(base);
                }
                Op::PopNext(at) if !model.is_empty() => {
                    let pos = at % model.len();
                    let expected = if pos + 1 < model.len() { model.remove(pos + 1) } else { None };
                    let popped = list.pop_next(&mut storage, model[pos]);
                    prop_assert_eq!(popped, expected);
                    free.extend(popped);
                }
                Op::PopPrev(at) if !model.is_empty() => {
                    let pos = at % model.len();
                    let base = model[pos];
                    let expected = if pos > 0 { model.remove(pos - 1) } else { None };
                    prop_assert_eq!(list.pop_prev(&mut storage, base), expected);
                    free.extend(expected);
                }
                Op::Reverse => {
                    list.reverse(&mut storage);
                    model.make_contiguous().reverse();
                }
                _ => {}
            }

            prop_assert_eq!(list.check_links(&storage), Ok(model.len()));
            prop_assert_eq!(list.front(), model.front().copied());
            prop_assert_eq!(list.back(), model.back().copied());
        }

        prop_assert_eq!(collect(&list, &storage), Vec::from(model.clone()));
        let backwards: Vec<u32> = list.keys(&storage).rev().collect();
        prop_assert_eq!(backwards, model.iter().rev().copied().collect::<Vec<_>>());

        // Unlinked nodes have clear links
        for idx in free {
            let node = &storage.0[idx as usize];
            prop_assert!(node.next.is_none() && node.prev.is_none());
        }
    }
}

#[test]
fn pop_current_sole_element_empties_list() {
    let mut storage = nodes(4);
    let mut list = List::new();
    list.push_front(&mut storage, 2);

    assert_eq!(list.pop_current(&mut storage, 2), 2);
    assert_eq!(list.front(), None);
    assert_eq!(list.back(), None);
    assert!(list.is_empty());
}

#[derive(Debug)]
struct Session {
    user: u64,
    lru_next: BlockId,
    lru_prev: BlockId,
}

linked!(Session, BlockId, lru_next, lru_prev);

#[test]
fn lru_over_pool() {
    const CAPACITY: usize = 8;

    let mut pool: Pool<Session> = PoolBuilder::default()
        .blocks_per_chunk(CAPACITY)
        .max_chunks(1)
        .build()
        .unwrap();
    let mut lru: List<BlockId> = List::new();

    let touch = |pool: &mut Pool<Session>, lru: &mut List<BlockId>, id: BlockId| {
        lru.pop_current(pool, id);
        lru.push_front(pool, id);
    };

    let mut ids = Vec::new();
    for user in 0..CAPACITY as u64 {
        let id = pool
            .create(Session {
                user,
                lru_next: BlockId::NONE,
                lru_prev: BlockId::NONE,
            })
            .unwrap();
        lru.push_front(&mut pool, id);
        ids.push(id);
    }

    // Pool is full; evict least recently used after touching user 0
    touch(&mut pool, &mut lru, ids[0]);
    let victim = lru.pop_back(&mut pool).unwrap();
    assert_eq!(pool.take(victim).map(|s| s.user), Some(1));

    let id = pool
        .create(Session {
            user: 100,
            lru_next: BlockId::NONE,
            lru_prev: BlockId::NONE,
        })
        .unwrap();
    assert_eq!(id, victim);
    lru.push_front(&mut pool, id);

    let order: Vec<_> = lru.iter(&pool).map(|s| s.user).collect();
    assert_eq!(order, [100, 0, 7, 6, 5, 4, 3, 2]);
    assert_eq!(lru.check_links(&pool), Ok(CAPACITY));
}
