#![no_main]

use std::ops::ControlFlow;

use cappedcache::policy::grouped_fifo::GroupedFifoCore;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on GroupedFifoCore
//
// First byte picks the capacity, then each byte triple is (op, group, id).
// After every step the store, order log and size counter must agree.
fuzz_target!(|data: &[u8]| {
    let Some((&cap, ops)) = data.split_first() else {
        return;
    };
    let capacity = usize::from(cap % 32);
    let mut core: GroupedFifoCore<u8, u8, u16> = GroupedFifoCore::new(capacity);

    for triple in ops.chunks_exact(3) {
        let op = triple[0] % 8;
        let group = triple[1] % 8;
        let id = triple[2];
        let value = u16::from(group) << 8 | u16::from(id);

        match op {
            0 | 1 => {
                let existed = core.contains(&group, &id);
                let old_len = core.len();
                let previous = core.put(group, id, value);
                assert_eq!(previous.is_some(), existed);
                if existed {
                    assert_eq!(core.len(), old_len);
                    assert_eq!(core.get(&group, &id), Some(&value));
                }
            },
            2 => {
                let old_len = core.len();
                if core.remove(&group, &id).is_some() {
                    assert_eq!(core.len(), old_len - 1);
                }
                assert!(!core.contains(&group, &id));
            },
            3 => {
                let expected = core.group_len(&group);
                assert_eq!(core.group_remove(&group), expected);
                assert_eq!(core.group_len(&group), 0);
            },
            4 => {
                let old_len = core.len();
                let removed = core.remove_if(|g, v| (*g ^ (*v as u8)) % 3 == 0);
                assert_eq!(core.len(), old_len - removed);
            },
            5 => {
                core.group_remove_if(&group, |_, v| v % 2 == 0);
                assert!(core.group_iter(&group).all(|v| v % 2 == 1));
            },
            6 => {
                let mut seen = 0usize;
                let _ = core.all(|_, _| {
                    seen += 1;
                    ControlFlow::<()>::Continue(())
                });
                assert_eq!(seen, core.len());
            },
            _ => {
                let items = core.snapshot();
                let before = core.len();
                let loaded = core.load(items, |v| ((*v >> 8) as u8, *v as u8));
                assert_eq!(loaded, before);
            },
        }

        assert!(core.len() <= capacity);
        core.check_invariants().unwrap();
    }
});
