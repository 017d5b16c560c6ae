//! Spool - The thread supply for Filament.
//!
//! This crate holds the small set of collection types and helpers that every
//! other Filament crate winds from, so that the workspace agrees on one hasher,
//! one inline string type and one arena key flavour.
//!
//! # Example
//!
//! ```
//! use filament_spool::{CompactString, FxHashMap};
//!
//! let mut attrs: FxHashMap<CompactString, i64> = FxHashMap::default();
//! attrs.insert("count".into(), 3);
//! assert_eq!(attrs.get("count"), Some(&3));
//! ```

pub mod fingerprint;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export slotmap for generational arenas
pub use slotmap::{new_key_type, Key, SecondaryMap, SlotMap};

pub use fingerprint::{fingerprint, fingerprint_hex};
