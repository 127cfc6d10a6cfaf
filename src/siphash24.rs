//! The implementation of SipHash-2-4.

use core::{
    fmt,
    hash::{BuildHasher, Hasher},
    mem,
};

use crate::IntoU64;

// The first two words of "somepseudorandomlygeneratedbytes".
const INIT_0: u64 = 0x736f_6d65_7073_6575;
const INIT_1: u64 = 0x646f_7261_6e64_6f6d;

// The third and fourth words ("lygenera" and "tedbytes") XORed with
// the first and second, so that v2 and v3 can be derived from the
// keyed words the engine already holds.
const INIT_2_FROM_0: u64 = 0x1f16_0a00_1e16_1714;
const INIT_3_FROM_1: u64 = 0x100a_1603_1710_0a1e;

const _: () = assert!(INIT_0 ^ INIT_2_FROM_0 == 0x6c79_6765_6e65_7261);
const _: () = assert!(INIT_1 ^ INIT_3_FROM_1 == 0x7465_6462_7974_6573);

const COMPRESSION_ROUNDS: usize = 2;
const FINALIZATION_ROUNDS: usize = 4;

const BYTES_IN_BLOCK: usize = mem::size_of::<u64>();
type Block = [u8; BYTES_IN_BLOCK];

/// The number of bytes in a key.
pub const KEY_LENGTH: usize = 16;
type Key = [u8; KEY_LENGTH];

/// The four working words, v0 through v3.
#[derive(Copy, Clone, PartialEq)]
struct Words([u64; 4]);

impl Words {
    const fn new(base0: u64, base1: u64) -> Self {
        Self([
            base0,
            base1,
            base0 ^ INIT_2_FROM_0,
            base1 ^ INIT_3_FROM_1,
        ])
    }

    // The rotation amounts and the order of operations define
    // SipHash; changing either produces a different function.
    #[inline(always)]
    fn round(&mut self) {
        let [mut v0, mut v1, mut v2, mut v3] = self.0;

        v0 = v0.wrapping_add(v1);
        v2 = v2.wrapping_add(v3);
        v1 = v1.rotate_left(13);
        v3 = v3.rotate_left(16);
        v1 ^= v0;
        v3 ^= v2;
        v0 = v0.rotate_left(32);

        v2 = v2.wrapping_add(v1);
        v0 = v0.wrapping_add(v3);
        v1 = v1.rotate_left(17);
        v3 = v3.rotate_left(21);
        v1 ^= v2;
        v3 ^= v0;
        v2 = v2.rotate_left(32);

        self.0 = [v0, v1, v2, v3];
    }

    #[inline(always)]
    fn compress(&mut self, block: u64) {
        self.0[3] ^= block;
        for _ in 0..COMPRESSION_ROUNDS {
            self.round();
        }
        self.0[0] ^= block;
    }

    /// Absorbs every complete block and returns the trailing bytes.
    #[inline]
    fn write_many<'d>(&mut self, mut data: &'d [u8]) -> &'d [u8] {
        while let Some((block, rest)) = data.split_first_chunk::<BYTES_IN_BLOCK>() {
            self.compress(u64::from_le_bytes(*block));
            data = rest;
        }
        data
    }

    #[inline]
    fn finish(mut self, length: u64, remaining: &[u8]) -> u64 {
        self.compress(final_block(length, remaining));

        self.0[2] ^= 0xff;
        for _ in 0..FINALIZATION_ROUNDS {
            self.round();
        }

        let [v0, v1, v2, v3] = self.0;
        (v0 ^ v1) ^ (v2 ^ v3)
    }
}

/// Builds the last block: the message length modulo 256 in the top
/// byte, and the 0 to 7 trailing bytes in little-endian order below
/// it.
#[inline]
fn final_block(length: u64, remaining: &[u8]) -> u64 {
    debug_assert!(remaining.len() < BYTES_IN_BLOCK);

    let length_byte = length % 256;

    remaining
        .iter()
        .enumerate()
        .fold(length_byte << 56, |block, (i, &byte)| {
            block | (byte.into_u64() << (8 * i))
        })
}

/// Decodes one half of the key as a little-endian word.
const fn key_word(key: &Key, half: usize) -> u64 {
    let start = half * BYTES_IN_BLOCK;

    let mut word = 0;
    let mut i = BYTES_IN_BLOCK;
    while i > 0 {
        i -= 1;
        word = (word << 8) | key[start + i] as u64;
    }
    word
}

/// Holds the words derived from a 128-bit key and computes SipHash-2-4
/// tags with them.
///
/// An `Engine` never changes after construction, so one instance can
/// be shared freely between threads. Each call to
/// [`compute`][Self::compute] works on its own copy of the state.
///
/// The engine is also a [`BuildHasher`][], producing [`SipHash24`][]
/// instances that share its key.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Engine {
    base0: u64,
    base1: u64,
}

impl Default for Engine {
    /// An engine with the all-zero key.
    fn default() -> Self {
        Self::from_key(&[0; KEY_LENGTH])
    }
}

impl Engine {
    /// Constructs an engine from a key that must be exactly
    /// [`KEY_LENGTH`][] bytes long.
    ///
    /// A key of any other length is rejected; it is never truncated
    /// or padded.
    pub fn new(key: &[u8]) -> Result<Self, InvalidKeyLength> {
        let len = key.len();
        let key = <&Key>::try_from(key).map_err(|_| InvalidKeyLength { len })?;
        Ok(Self::from_key(key))
    }

    /// Constructs an engine from the [`KEY_LENGTH`][] bytes of `buffer`
    /// starting at `offset`.
    pub fn with_key_at(buffer: &[u8], offset: usize) -> Result<Self, InvalidKeyLength> {
        let available = buffer.get(offset..).unwrap_or_default();
        let key = available
            .first_chunk::<KEY_LENGTH>()
            .ok_or(InvalidKeyLength {
                len: available.len(),
            })?;
        Ok(Self::from_key(key))
    }

    /// Constructs an engine from a key.
    #[must_use]
    pub const fn from_key(key: &[u8; KEY_LENGTH]) -> Self {
        Self {
            base0: INIT_0 ^ key_word(key, 0),
            base1: INIT_1 ^ key_word(key, 1),
        }
    }

    /// Recovers the key this engine was constructed with.
    #[must_use]
    pub fn key(&self) -> [u8; KEY_LENGTH] {
        let k0 = self.base0 ^ INIT_0;
        let k1 = self.base1 ^ INIT_1;

        let mut key = [0; KEY_LENGTH];
        let (lo, hi) = key.split_at_mut(BYTES_IN_BLOCK);
        lo.copy_from_slice(&k0.to_le_bytes());
        hi.copy_from_slice(&k1.to_le_bytes());
        key
    }

    /// Computes the tag of `data`.
    #[must_use]
    #[inline]
    pub fn compute(&self, data: &[u8]) -> u64 {
        let mut words = self.words();
        let remaining = words.write_many(data);
        words.finish(data.len().into_u64(), remaining)
    }

    /// Computes the tag of the `count` bytes of `data` starting at
    /// `offset`.
    ///
    /// The range is validated before anything is hashed.
    #[inline]
    pub fn compute_range(
        &self,
        data: &[u8],
        offset: usize,
        count: usize,
    ) -> Result<u64, InvalidRange> {
        let range = offset
            .checked_add(count)
            .and_then(|end| data.get(offset..end))
            .ok_or(InvalidRange {
                offset,
                count,
                len: data.len(),
            })?;

        Ok(self.compute(range))
    }

    const fn words(&self) -> Words {
        Words::new(self.base0, self.base1)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The words are the key in disguise.
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl BuildHasher for Engine {
    type Hasher = SipHash24;

    fn build_hasher(&self) -> Self::Hasher {
        SipHash24::with_engine(*self)
    }
}

/// The key was not [`KEY_LENGTH`][] bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InvalidKeyLength {
    len: usize,
}

impl core::error::Error for InvalidKeyLength {}

impl fmt::Display for InvalidKeyLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the key must be {KEY_LENGTH} bytes, but {} bytes were provided",
            self.len,
        )
    }
}

/// The requested range does not lie within the buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InvalidRange {
    offset: usize,
    count: usize,
    len: usize,
}

impl core::error::Error for InvalidRange {}

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { offset, count, len } = self;
        write!(
            f,
            "{count} bytes starting at offset {offset} do not fit in a buffer of {len} bytes",
        )
    }
}

#[derive(Clone)]
struct Buffer {
    offset: usize,
    data: Block,
}

// Bytes past `offset` are stale and do not take part in comparisons.
impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.remaining() == other.remaining()
    }
}

impl Buffer {
    const fn new() -> Self {
        Self {
            offset: 0,
            data: [0; BYTES_IN_BLOCK],
        }
    }

    /// Tops up a partially-filled buffer, returning the completed
    /// block (if any) and the bytes that were not needed.
    fn extend<'d>(&mut self, data: &'d [u8]) -> (Option<u64>, &'d [u8]) {
        if self.offset == 0 {
            return (None, data);
        };

        debug_assert!(self.offset < self.data.len());

        let empty = &mut self.data[self.offset..];
        let n_to_copy = usize::min(empty.len(), data.len());

        let (src, rest) = data.split_at(n_to_copy);
        empty[..n_to_copy].copy_from_slice(src);
        self.offset += n_to_copy;

        if self.offset == self.data.len() {
            self.offset = 0;
            (Some(u64::from_le_bytes(self.data)), rest)
        } else {
            (None, rest)
        }
    }

    fn set(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        debug_assert_eq!(self.offset, 0);
        debug_assert!(data.len() < self.data.len());

        self.data[..data.len()].copy_from_slice(data);
        self.offset = data.len();
    }

    fn remaining(&self) -> &[u8] {
        &self.data[..self.offset]
    }
}

/// Calculates SipHash-2-4 incrementally.
///
/// Writing a message in any number of pieces produces the same tag as
/// [`Engine::compute`][] over the whole message. Calling
/// [`finish`][Hasher::finish] does not disturb the hasher, so more
/// data may be written afterwards.
#[derive(Clone, PartialEq)]
pub struct SipHash24 {
    engine: Engine,
    words: Words,
    buffer: Buffer,
    length: u64,
}

impl Default for SipHash24 {
    /// A hasher with the all-zero key.
    fn default() -> Self {
        Self::with_engine(Engine::default())
    }
}

impl SipHash24 {
    /// Hash all data at once. If you can use this function, you may
    /// see noticable speed gains for certain types of input.
    #[must_use]
    #[inline]
    pub fn oneshot(key: &[u8; KEY_LENGTH], data: &[u8]) -> u64 {
        Engine::from_key(key).compute(data)
    }

    /// Constructs the hasher with the given key.
    #[must_use]
    pub const fn with_key(key: &[u8; KEY_LENGTH]) -> Self {
        Self::with_engine(Engine::from_key(key))
    }

    /// Constructs the hasher from an existing engine.
    #[must_use]
    pub const fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            words: engine.words(),
            buffer: Buffer::new(),
            length: 0,
        }
    }

    /// The engine holding this hasher's key.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Hasher for SipHash24 {
    #[inline]
    fn write(&mut self, data: &[u8]) {
        let len = data.len();

        let (buffered_block, data) = self.buffer.extend(data);

        if let Some(block) = buffered_block {
            self.words.compress(block);
        }

        let data = self.words.write_many(data);

        self.buffer.set(data);

        // Only the low byte survives into the final block.
        self.length = self.length.wrapping_add(len.into_u64());
    }

    #[must_use]
    #[inline]
    fn finish(&self) -> u64 {
        self.words.finish(self.length, self.buffer.remaining())
    }
}

impl fmt::Debug for SipHash24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SipHash24")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "random")]
#[cfg_attr(docsrs, doc(cfg(feature = "random")))]
mod random_impl {
    use super::*;

    /// Constructs a randomized key and reuses it for multiple hasher
    /// instances.
    #[derive(Clone)]
    pub struct RandomState(Engine);

    impl Default for RandomState {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RandomState {
        fn new() -> Self {
            Self(Engine::from_key(&rand::random()))
        }

        /// The engine holding the generated key.
        #[must_use]
        pub fn engine(&self) -> &Engine {
            &self.0
        }
    }

    impl BuildHasher for RandomState {
        type Hasher = SipHash24;

        fn build_hasher(&self) -> Self::Hasher {
            self.0.build_hasher()
        }
    }

    impl fmt::Debug for RandomState {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("RandomState").finish_non_exhaustive()
        }
    }

    #[cfg(test)]
    mod test {
        use std::collections::HashMap;

        use super::*;

        #[test]
        fn can_be_used_in_a_hashmap_with_a_random_key() {
            let mut hash: HashMap<_, _, RandomState> = Default::default();
            hash.insert(42, "the answer");
            assert_eq!(hash.get(&42), Some(&"the answer"));
        }

        #[test]
        fn hashers_from_one_state_share_a_key() {
            let state = RandomState::default();

            let mut a = state.build_hasher();
            a.write(b"same input");
            let mut b = state.build_hasher();
            b.write(b"same input");

            assert_eq!(a.finish(), b.finish());
            assert_eq!(a.finish(), state.engine().compute(b"same input"));
        }
    }
}

#[cfg(feature = "random")]
#[cfg_attr(docsrs, doc(cfg(feature = "random")))]
pub use random_impl::*;

#[cfg(feature = "serialize")]
#[cfg_attr(docsrs, doc(cfg(feature = "serialize")))]
mod serialize_impl {
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct EngineShim {
        key: Key,
    }

    impl Serialize for Engine {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let shim = EngineShim { key: self.key() };
            shim.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Engine {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let EngineShim { key } = EngineShim::deserialize(deserializer)?;
            Ok(Self::from_key(&key))
        }
    }

    #[derive(Serialize, Deserialize)]
    struct HasherShim {
        key: Key,
        words: [u64; 4],
        buffer: Block,
        buffer_usage: usize,
        length: u64,
    }

    impl Serialize for SipHash24 {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let shim = HasherShim {
                key: self.engine.key(),
                words: self.words.0,
                buffer: self.buffer.data,
                buffer_usage: self.buffer.offset,
                length: self.length,
            };

            shim.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for SipHash24 {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let shim = HasherShim::deserialize(deserializer)?;

            if shim.buffer_usage >= BYTES_IN_BLOCK {
                return Err(D::Error::custom(
                    "buffer_usage must be smaller than one block",
                ));
            }

            Ok(Self {
                engine: Engine::from_key(&shim.key),
                words: Words(shim.words),
                buffer: Buffer {
                    offset: shim.buffer_usage,
                    data: shim.buffer,
                },
                length: shim.length,
            })
        }
    }

}
