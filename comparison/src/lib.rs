#![cfg(test)]

use proptest::{num, prelude::*, test_runner::TestCaseResult};
use std::hash::Hasher as _;

use siphash24::{Engine, SipHash24, KEY_LENGTH};
use siphasher::sip::SipHasher24 as Reference;

proptest! {
    #[test]
    fn oneshot_same_as_reference(key: [u8; KEY_LENGTH], data: Vec<u8>) {
        oneshot_impl(&key, &data)?;
    }

    #[test]
    fn oneshot_same_as_reference_with_an_offset(key: [u8; KEY_LENGTH], (data, offset) in vec_and_index()) {
        oneshot_impl(&key, &data[offset..])?;
    }

    #[test]
    fn streaming_one_chunk_same_as_reference(key: [u8; KEY_LENGTH], data: Vec<u8>) {
        streaming_one_chunk_impl(&key, &data)?;
    }

    #[test]
    fn oneshot_same_as_many_chunks(key: [u8; KEY_LENGTH], (data, chunks) in data_and_chunks()) {
        oneshot_same_as_many_chunks_impl(&key, &data, &chunks)?;
    }

    #[test]
    fn range_same_as_copied_slice(key: [u8; KEY_LENGTH], (data, offset, count) in vec_and_range()) {
        range_same_as_copied_slice_impl(&key, &data, offset, count)?;
    }

    #[test]
    fn out_of_bounds_range_is_rejected(key: [u8; KEY_LENGTH], data: Vec<u8>, extra in 1..64_usize) {
        let engine = Engine::from_key(&key);
        prop_assert!(engine.compute_range(&data, 0, data.len() + extra).is_err());
        prop_assert!(engine.compute_range(&data, data.len() + extra, 0).is_err());
    }

    #[test]
    fn key_round_trips(key: [u8; KEY_LENGTH]) {
        prop_assert_eq!(Engine::from_key(&key).key(), key);
        prop_assert_eq!(Engine::new(&key), Ok(Engine::from_key(&key)));
    }
}

fn oneshot_impl(key: &[u8; KEY_LENGTH], data: &[u8]) -> TestCaseResult {
    let reference = {
        let mut hasher = Reference::new_with_key(key);
        hasher.write(data);
        hasher.finish()
    };
    let ours = Engine::from_key(key).compute(data);

    prop_assert_eq!(reference, ours);
    Ok(())
}

fn streaming_one_chunk_impl(key: &[u8; KEY_LENGTH], data: &[u8]) -> TestCaseResult {
    let reference = {
        let mut hasher = Reference::new_with_key(key);
        hasher.write(data);
        hasher.finish()
    };

    let ours = {
        let mut hasher = SipHash24::with_key(key);
        hasher.write(data);
        hasher.finish()
    };

    prop_assert_eq!(reference, ours);
    Ok(())
}

fn oneshot_same_as_many_chunks_impl(
    key: &[u8; KEY_LENGTH],
    data: &[u8],
    chunks: &[Vec<u8>],
) -> TestCaseResult {
    let oneshot = SipHash24::oneshot(key, data);
    let many_chunks = {
        let mut hasher = SipHash24::with_key(key);
        for chunk in chunks {
            hasher.write(chunk);
        }
        hasher.finish()
    };

    prop_assert_eq!(oneshot, many_chunks);
    Ok(())
}

fn range_same_as_copied_slice_impl(
    key: &[u8; KEY_LENGTH],
    data: &[u8],
    offset: usize,
    count: usize,
) -> TestCaseResult {
    let engine = Engine::from_key(key);

    let copied = data[offset..][..count].to_vec();
    let expected = engine.compute(&copied);

    prop_assert_eq!(engine.compute_range(data, offset, count), Ok(expected));
    Ok(())
}

fn vec_and_index() -> impl Strategy<Value = (Vec<u8>, usize)> {
    prop::collection::vec(num::u8::ANY, 0..=32 * 1024).prop_flat_map(|vec| {
        let len = vec.len();
        (Just(vec), 0..=len)
    })
}

fn vec_and_range() -> impl Strategy<Value = (Vec<u8>, usize, usize)> {
    prop::collection::vec(num::u8::ANY, 0..=1024).prop_flat_map(|vec| {
        let len = vec.len();
        (Just(vec), 0..=len).prop_flat_map(|(vec, offset)| {
            let count = vec.len() - offset;
            (Just(vec), Just(offset), 0..=count)
        })
    })
}

fn data_and_chunks() -> impl Strategy<Value = (Vec<u8>, Vec<Vec<u8>>)> {
    prop::collection::vec(prop::collection::vec(num::u8::ANY, 0..100), 0..100).prop_map(|vs| {
        let data = vs.iter().flatten().copied().collect();
        (data, vs)
    })
}
