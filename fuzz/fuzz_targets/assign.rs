#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

use stepmap::IntervalMap as TestMap;

const BASE: u8 = 0;

#[derive(Debug, Arbitrary)]
enum Command {
    Assign { begin: u8, end: u8, value: Value },
    Lookup { key: u8 },
    GetIndex { index: usize },
    Runs,
    Clear,
    Clone,
    CloneFrom { assigns: Vec<(u8, u8, Value)> },
}

/// Small alphabet so that neighbouring runs often collide.
#[derive(Debug, Clone, Copy, Arbitrary)]
enum Value {
    A,
    B,
    C,
}

impl From<Value> for u8 {
    fn from(v: Value) -> u8 {
        match v {
            Value::A => BASE,
            Value::B => 1,
            Value::C => 2,
        }
    }
}

/// One slot per key: `u8` keys make the whole domain fit.
struct Oracle([u8; 256]);

impl Oracle {
    fn assign(&mut self, begin: u8, end: u8, value: u8) {
        for k in begin..end {
            self.0[k as usize] = value;
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    let commands = match Vec::<Command>::arbitrary(&mut unstructured) {
        Ok(c) => c,
        Err(_) => return,
    };

    let mut map: TestMap<u8, u8> = TestMap::with_node_capacity(BASE, 4);
    let mut oracle = Oracle([BASE; 256]);
    let mut cloned_map;

    for command in commands {
        if std::env::var("RUST_BACKTRACE").is_ok() {
            println!("{command:?}");
        }

        match command {
            Command::Assign { begin, end, value } => {
                map.assign(begin, end, value.into());
                oracle.assign(begin, end, value.into());
            }
            Command::Lookup { key } => {
                assert_eq!(map[&key], oracle.0[key as usize]);
            }
            Command::GetIndex { index } => {
                assert_eq!(map.get_index(index), map.iter().nth(index));
            }
            Command::Runs => {
                let runs: Vec<_> = map.runs().collect();
                assert_eq!(runs.len(), map.len() + 1);
                for run in runs {
                    let start = run.start.copied().unwrap_or(u8::MIN);
                    let end = run.end.map_or(256, |&k| k as usize);
                    assert!(oracle.0[start as usize..end].iter().all(|v| v == run.value));
                }
            }
            Command::Clear => {
                map.clear();
                oracle = Oracle([BASE; 256]);
                assert!(map.is_empty());
            }
            Command::Clone => {
                cloned_map = map.clone();
                assert!(cloned_map.iter().eq(map.iter()));
            }
            Command::CloneFrom { assigns } => {
                let mut source_map = TestMap::new(BASE);
                let mut source_oracle = Oracle([BASE; 256]);
                for (b, e, v) in assigns {
                    source_map.assign(b, e, v.into());
                    source_oracle.assign(b, e, v.into());
                }
                map.clone_from(&source_map);
                oracle = source_oracle;
            }
        }

        // Final consistency check
        map.check_invariants().unwrap();
        for k in 0..=u8::MAX {
            assert_eq!(*map.lookup(&k), oracle.0[k as usize], "key {k}");
        }
    }
});
