// ==============================================
// GROUPED CACHE INVARIANT TESTS (integration)
// ==============================================
//
// End-to-end behavior of the public API: capacity handling, FIFO order,
// lazy order-log cleanup and the generic trait surface.

use std::ops::ControlFlow;

use cappedcache::policy::grouped_fifo::{CappedGroupedCache, CappedGroupedCacheBuilder};
use cappedcache::traits::{ConcurrentCache, GroupedCache};

#[derive(Debug, Clone, PartialEq)]
struct Member {
    guild_id: u64,
    user_id: u64,
    nick: Option<String>,
}

fn member(guild_id: u64, user_id: u64) -> Member {
    Member {
        guild_id,
        user_id,
        nick: None,
    }
}

// ==============================================
// Capacity-0 Behavior
// ==============================================

mod zero_capacity {
    use super::*;

    #[test]
    fn capacity_zero_is_honored() {
        let cache: CappedGroupedCache<u64, u64, Member> = CappedGroupedCache::new(0);
        assert_eq!(cache.capacity(), 0);
    }

    #[test]
    fn put_is_evicted_immediately() {
        let cache: CappedGroupedCache<u64, u64, Member> = CappedGroupedCache::new(0);
        for i in 0..10 {
            assert_eq!(cache.put(1, i, member(1, i)), None);
            assert!(cache.is_empty());
        }
        assert_eq!(cache.group_count(), 0);
        assert!(cache.order_len() <= 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn load_into_zero_capacity_is_empty() {
        let cache: CappedGroupedCache<u64, u64, Member> = CappedGroupedCache::new(0);
        let loaded = cache.load(vec![member(1, 1), member(1, 2)], |m| (m.guild_id, m.user_id));
        assert_eq!(loaded, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn fallible_constructors_reject_zero() {
        assert!(CappedGroupedCache::<u64, u64, Member>::try_new(0).is_err());
        assert!(
            CappedGroupedCacheBuilder::new(0)
                .try_build::<u64, u64, Member>()
                .is_err()
        );
    }
}

// ==============================================
// FIFO eviction
// ==============================================

mod fifo_eviction {
    use super::*;

    #[test]
    fn oldest_insert_goes_first() {
        let cache = CappedGroupedCache::new(100);
        for i in 1..=101u64 {
            cache.put(1u64, i, member(1, i));
        }

        assert_eq!(cache.len(), 100);
        assert!(cache.get(&1, &1).is_none());
        assert!(cache.get(&1, &2).is_some());
        assert!(cache.get(&1, &101).is_some());
    }

    #[test]
    fn eviction_crosses_groups_in_insertion_order() {
        let cache = CappedGroupedCache::new(3);
        cache.put(1u64, 1u64, member(1, 1));
        cache.put(2, 1, member(2, 1));
        cache.put(1, 2, member(1, 2));
        cache.put(3, 1, member(3, 1));

        assert!(!cache.contains(&1, &1));
        assert!(cache.contains(&2, &1));
        assert_eq!(cache.group_len(&1), 1);

        cache.put(3, 2, member(3, 2));
        assert!(!cache.contains(&2, &1));
        assert_eq!(cache.group_count(), 2);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn overwrite_does_not_reset_age() {
        let cache = CappedGroupedCache::new(2);
        cache.put(1u64, 1u64, member(1, 1));
        cache.put(1, 2, member(1, 2));

        let mut renamed = member(1, 1);
        renamed.nick = Some("renamed".into());
        assert_eq!(cache.put(1, 1, renamed).map(|m| m.nick), Some(None));
        assert_eq!(cache.len(), 2);

        cache.put(1, 3, member(1, 3));
        assert!(cache.get(&1, &1).is_none());
        assert!(cache.get(&1, &2).is_some());
    }

    #[test]
    fn removals_leave_stale_slots_that_are_skipped() {
        let cache = CappedGroupedCache::new(10);
        for i in 1..=10u64 {
            cache.put(1u64, i, member(1, i));
        }
        cache.remove(&1, &3);
        cache.remove(&1, &5);
        assert_eq!(cache.len(), 8);

        // Two free slots: 11 and 12 fit without eviction.
        cache.put(1, 11, member(1, 11));
        cache.put(1, 12, member(1, 12));
        assert!(cache.contains(&1, &1));
        assert_eq!(cache.len(), 10);

        // 13 evicts 1, 14 evicts 2, 15 skips stale 3 and evicts 4.
        cache.put(1, 13, member(1, 13));
        assert!(!cache.contains(&1, &1));
        cache.put(1, 14, member(1, 14));
        assert!(!cache.contains(&1, &2));
        cache.put(1, 15, member(1, 15));
        assert!(!cache.contains(&1, &4));

        assert_eq!(cache.len(), 10);
        let mut remaining: Vec<u64> = cache.read().group_iter(&1).map(|m| m.user_id).collect();
        remaining.sort_unstable();
        assert_eq!(remaining, (6..=15).collect::<Vec<_>>());
        cache.check_invariants().unwrap();
    }

    #[test]
    fn order_log_stays_bounded_under_churn() {
        let capacity = 64;
        let cache = CappedGroupedCache::new(capacity);
        for i in 0..50_000u64 {
            cache.put(i % 3, i, member(i % 3, i));
            assert!(cache.order_len() <= capacity * 2 + 1);
        }
        assert_eq!(cache.len(), capacity);
    }
}

// ==============================================
// Grouped removal
// ==============================================

mod grouped_removal {
    use super::*;

    #[test]
    fn group_remove_isolated_from_other_groups() {
        let cache = CappedGroupedCache::new(100);
        cache.put(1u64, 10u64, member(1, 10));
        cache.put(1, 11, member(1, 11));
        cache.put(2, 20, member(2, 20));

        assert_eq!(cache.group_remove(&1), 2);
        assert_eq!(cache.len(), 1);

        let mut groups = Vec::new();
        let _ = cache.all(|g, _| {
            groups.push(*g);
            ControlFlow::<()>::Continue(())
        });
        assert_eq!(groups, vec![2]);
    }

    #[test]
    fn remove_if_with_nick_predicate() {
        let cache = CappedGroupedCache::new(100);
        for i in 0..10u64 {
            let mut m = member(i % 2, i);
            if i % 3 == 0 {
                m.nick = Some(format!("n{i}"));
            }
            cache.put(i % 2, i, m);
        }

        let removed = cache.remove_if(|_, m| m.nick.is_some());
        assert_eq!(removed, 4);
        assert_eq!(cache.len(), 6);
        assert_eq!(cache.remove_if(|_, m| m.nick.is_some()), 0);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn group_remove_if_scoped_to_group() {
        let cache = CappedGroupedCache::new(100);
        cache.put(1u64, 1u64, member(1, 1));
        cache.put(2, 1, member(2, 1));

        assert_eq!(cache.group_remove_if(&1, |_, _| true), 1);
        assert_eq!(cache.group_len(&1), 0);
        assert_eq!(cache.group_len(&2), 1);
    }
}

// ==============================================
// Trait surface
// ==============================================

mod trait_surface {
    use super::*;

    fn evict_guild<C>(cache: &C, guild: u64) -> usize
    where
        C: GroupedCache<u64, u64, Member> + ConcurrentCache,
    {
        cache.group_remove(&guild)
    }

    fn count_named<C: GroupedCache<u64, u64, Member>>(cache: &C, guild: u64) -> usize {
        let mut named = 0;
        let _ = cache.group_all(&guild, |m| {
            if m.nick.is_some() {
                named += 1;
            }
            ControlFlow::<()>::Continue(())
        });
        named
    }

    #[test]
    fn generic_callers_work_through_trait() {
        let cache: CappedGroupedCache<u64, u64, Member> = CappedGroupedCache::new(10);
        let mut named = member(5, 1);
        named.nick = Some("nick".into());
        GroupedCache::put(&cache, 5, 1, named);
        GroupedCache::put(&cache, 5, 2, member(5, 2));

        assert_eq!(count_named(&cache, 5), 1);
        assert_eq!(GroupedCache::group_len(&cache, &5), 2);
        assert_eq!(evict_guild(&cache, 5), 2);
        assert!(GroupedCache::is_empty(&cache));
    }
}
