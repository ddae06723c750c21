mod common;

use common::{assert_well_formed, init_tracing};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use roaring_art::{
    high_bytes, low_part,
    tests_common::{generate_keys_fixed, generate_keys_sequential},
    visitor::TreeStatsCollector,
    Art, Container, Containers, Key,
};

fn shuffled(mut keys: Vec<Key>, seed: u64) -> Vec<Key> {
    let mut rng = StdRng::seed_from_u64(seed);
    keys.shuffle(&mut rng);
    keys
}

fn insert_with_containers(art: &mut Art, containers: &mut Containers, keys: &[Key]) {
    for key in keys {
        let idx = containers
            .add(Container::Array(vec![u16::from(key[0])]))
            .unwrap();
        art.insert(*key, idx);
    }
}

#[test]
fn insertion_order_does_not_change_the_tree() {
    init_tracing();
    let keys: Vec<Key> = generate_keys_fixed(4).collect();

    let mut sorted = Art::new();
    for key in &keys {
        sorted.insert(*key, 0);
    }

    for seed in 0..4 {
        let mut art = Art::new();
        for key in shuffled(keys.clone(), seed) {
            art.insert(key, 0);
        }
        assert_well_formed(&art);
        assert_eq!(art, sorted);
        assert!(art.iter().map(|leaf| leaf.key()).eq(keys.iter().copied()));
    }
}

#[test]
fn removal_in_random_order_empties_both_structures() {
    init_tracing();
    let keys: Vec<Key> = generate_keys_sequential(0xFF_00, 2_000)
        .chain(generate_keys_fixed(2))
        .collect();
    let keys = shuffled(keys, 7);

    let mut art = Art::new();
    let mut containers = Containers::new();
    insert_with_containers(&mut art, &mut containers, &keys);
    assert_eq!(containers.container_size(), keys.len() as u64);

    let removal = shuffled(keys.clone(), 8);
    for (removed, key) in removal.iter().enumerate() {
        let idx = art.remove(key).unwrap();
        assert!(containers.remove(idx).is_some());
        assert_eq!(art.find_by_key(key), None);

        if removed % 250 == 0 {
            assert_well_formed(&art);
        }
    }

    assert!(art.is_empty());
    assert_eq!(art.key_size(), 0);
    assert!(containers.is_empty());
    assert_eq!(containers.iter().count(), 0);
}

#[test]
fn key_iterator_drains_values() {
    init_tracing();
    let values: Vec<u64> = (0..500u64).map(|n| n * 0x1_0000 + (n % 13)).collect();

    let mut art = Art::new();
    let mut containers = Containers::new();
    for value in shuffled(values.iter().map(|value| high_bytes(*value)).collect(), 3) {
        let idx = containers.add(Container::Array(vec![])).unwrap();
        art.insert(value, idx);
    }
    for value in &values {
        let idx = art.find_by_value(*value).unwrap();
        if let Some(Container::Array(lows)) = containers.get_mut(idx) {
            lows.push(low_part(*value));
        }
    }

    let stats = TreeStatsCollector::collect(&art);
    assert_eq!(stats.leaf_count(), 500);

    let mut seen = Vec::new();
    let mut keys = art.key_iterator(Some(&mut containers));
    while let Some(key) = keys.next() {
        seen.push(key);
        assert!(keys.remove().is_some());
    }

    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(seen.len(), values.len());
    assert!(art.is_empty());
    assert!(containers.is_empty());
}

#[test]
fn registry_round_trip_after_random_removals() {
    init_tracing();
    let keys: Vec<Key> = generate_keys_sequential(0, 300).collect();
    let mut art = Art::new();
    let mut containers = Containers::new();
    insert_with_containers(&mut art, &mut containers, &keys);

    for key in shuffled(keys, 11).iter().take(120) {
        let idx = art.remove(key).unwrap();
        containers.remove(idx);
    }

    let mut buf = Vec::new();
    art.serialize(&mut buf).unwrap();
    containers.serialize(&mut buf).unwrap();

    let (art_copy, read) = Art::deserialize_from_slice(&buf).unwrap();
    let (containers_copy, _) = Containers::deserialize_from_slice(&buf[read..]).unwrap();

    assert_eq!(art_copy, art);
    assert_eq!(containers_copy.container_size(), 180);
    for leaf in art_copy.iter() {
        assert_eq!(
            containers_copy.get(leaf.container_idx()),
            containers.get(leaf.container_idx())
        );
    }
}
