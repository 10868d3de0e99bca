#![no_main]
use keyrank::dimensions::Dimensions;
use keyrank::rank::{rank, rank_all_weights, rank_low_mem};
use keyrank::weights::WeightTable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (Vec<u8>, u8)| {
    let (raw, target_seed) = data;

    // two 4-bit vectors need 32 weight entries
    if raw.len() < 32 {
        return;
    }
    let dims = Dimensions::uniform(2, 4).unwrap();
    let weights: Vec<u64> = raw[..32].iter().map(|&b| u64::from(b % 16)).collect();
    let table = WeightTable::with_weights(dims, weights).unwrap();

    let max_weight = table.maximum_weight();
    if max_weight == 0 {
        return;
    }
    let target = (u64::from(target_seed) % max_weight) + 1;

    // the two exact algorithms must agree on every input
    let full: u64 = rank(target, &table).unwrap();
    let low: u64 = rank_low_mem(target, &table).unwrap();
    assert_eq!(full, low);

    // and the cumulative distribution must agree slot by slot
    let all: Vec<u64> = rank_all_weights(target, &table).unwrap();
    assert_eq!(all[target as usize - 1], full);

    // counts never decrease as the budget grows
    assert!(all.windows(2).all(|pair| pair[0] <= pair[1]));
});
