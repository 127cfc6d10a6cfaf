//! A Rust implementation of the [SipHash][] keyed hash function,
//! using the standard 2-4 parameters (two compression rounds per
//! block, four finalization rounds).
//!
//! SipHash maps a 128-bit secret key and an arbitrary byte message to
//! a 64-bit tag. Without the key, an attacker cannot predict tags or
//! engineer collisions, which makes it a good fit for seeding hash
//! tables that are exposed to untrusted input.
//!
//! [SipHash]: https://www.aumasson.jp/siphash/siphash.pdf
//!
//! ## Hashing a complete buffer with a fixed key
//!
//! ```rust
//! use siphash24::Engine;
//!
//! let key = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
//! let engine = Engine::from_key(&key);
//!
//! assert_eq!(engine.compute(b""), 0x726f_db47_dd0e_0e31);
//! assert_eq!(engine.compute(&[0]), 0x74f8_39c5_93dc_67fd);
//! ```
//!
//! ## Hashing a sub-range of a larger buffer
//!
//! ```rust
//! use siphash24::Engine;
//!
//! let engine = Engine::default();
//! let packet = b"header:payload";
//!
//! let tag = engine.compute_range(packet, 7, 7)?;
//! assert_eq!(tag, engine.compute(b"payload"));
//! # Ok::<(), siphash24::InvalidRange>(())
//! ```
//!
//! ## Hashing incrementally
//!
//! ```rust
//! use core::hash::Hasher as _;
//! use siphash24::SipHash24;
//!
//! let key = [7; 16];
//!
//! let mut hasher = SipHash24::with_key(&key);
//! hasher.write(b"Hello, ");
//! hasher.write(b"world!");
//!
//! assert_eq!(hasher.finish(), SipHash24::oneshot(&key, b"Hello, world!"));
//! ```
//!
//! ## In a `HashMap` with a random key
//!
//! ```rust
//! # #[cfg(feature = "random")]
//! # {
//! use std::collections::HashMap;
//! use siphash24::RandomState;
//!
//! let mut hash = HashMap::<_, _, RandomState>::default();
//! hash.insert(42, "the answer");
//! assert_eq!(hash.get(&42), Some(&"the answer"));
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | name      | description                                                          |
//! |-----------|----------------------------------------------------------------------|
//! | random    | Create random keys for the hasher using the `rand` crate (default). |
//! | serialize | Implement `serde`'s Serialize and Deserialize traits.                |

#![no_std]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![deny(unnameable_types)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(test)]
extern crate std;

pub mod siphash24;

#[doc(inline)]
pub use crate::siphash24::{Engine, InvalidKeyLength, InvalidRange, SipHash24, KEY_LENGTH};

#[cfg(feature = "random")]
#[doc(inline)]
pub use crate::siphash24::RandomState;

trait IntoU64 {
    fn into_u64(self) -> u64;
}

impl IntoU64 for u8 {
    fn into_u64(self) -> u64 {
        self.into()
    }
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl IntoU64 for usize {
    fn into_u64(self) -> u64 {
        self as u64
    }
}
