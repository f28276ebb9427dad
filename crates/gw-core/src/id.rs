use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner shared by every id kind: cheap `Copy` handles,
/// O(1) equality and hashing.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

fn next_serial() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $sigil:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing handle.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &'static str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a unique id with a prefix (e.g. `obj_12`).
            pub fn with_prefix(prefix: &str) -> Self {
                Self::intern(&format!("{prefix}_{}", next_serial()))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($sigil, "{}"), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a placed object or token.
    EntityId,
    "#"
);

interned_id!(
    /// Identifier of a library asset.
    AssetId,
    "asset:"
);

interned_id!(
    /// Identifier of a map layer.
    LayerId,
    "layer:"
);

impl EntityId {
    pub fn new_object() -> Self {
        Self::with_prefix("obj")
    }

    pub fn new_token() -> Self {
        Self::with_prefix("tok")
    }
}

impl LayerId {
    /// The pseudo-layer that tokens live on. Tokens are a single flat list;
    /// selecting this layer switches marquee selection to tokens.
    pub fn tokens() -> Self {
        Self::intern("tokens")
    }

    pub fn is_tokens(&self) -> bool {
        *self == Self::tokens()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = EntityId::intern("goblin_1");
        let b = EntityId::intern("goblin_1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "goblin_1");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(EntityId::new_object(), EntityId::new_object());
        assert_ne!(EntityId::new_token(), EntityId::new_object());
    }

    #[test]
    fn kinds_share_text_but_not_type() {
        let layer = LayerId::intern("floor");
        let asset = AssetId::intern("floor");
        assert_eq!(layer.as_str(), asset.as_str());
        assert_eq!(format!("{layer:?}"), "layer:floor");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = AssetId::intern("oak_tree");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"oak_tree\"");
        let back: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
