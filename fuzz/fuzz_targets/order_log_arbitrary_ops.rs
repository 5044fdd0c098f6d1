#![no_main]

use std::collections::VecDeque;

use cappedcache::ds::OrderLog;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on OrderLog
//
// Mirrors every push/pop against a VecDeque and checks that compaction
// never reorders or drops pending keys.
fuzz_target!(|data: &[u8]| {
    let mut log: OrderLog<u16> = OrderLog::new();
    let mut model: VecDeque<u16> = VecDeque::new();

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 4;
        let key = u16::from(pair[1]);

        match op {
            0 | 1 => {
                log.push(key);
                model.push_back(key);
            },
            2 => {
                assert_eq!(log.pop_front(), model.pop_front());
            },
            _ => {
                let before = log.len();
                let reclaimed = log.maybe_compact();
                assert_eq!(log.len(), before - reclaimed);
                assert!(reclaimed == 0 || log.head() == 0);
            },
        }

        assert_eq!(log.pending(), model.len());
        assert!(log.iter_pending().copied().eq(model.iter().copied()));
        log.check_invariants().unwrap();
    }
});
