//! Type-safe identifier wrappers for cubes and grounds.
//!
//! Scene files and clients address entities by free-form uuid strings, so
//! the wrappers hold the text as given. Identifiers minted by the server
//! (children born during the simulation) are random UUID v4 strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around a uuid string with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Mint a fresh identifier from a random UUID v4.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Borrow the identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is the empty string (no entity).
            pub const fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id.to_string())
            }
        }
    };
}

define_id! {
    /// Stable identifier of a cube for its whole lifetime.
    CubeUuid
}

define_id! {
    /// Identifier of a ground (playfield tile).
    GroundUuid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct_uuids() {
        let a = CubeUuid::generate();
        let b = CubeUuid::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = GroundUuid::from("ground-0");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"ground-0\"");
    }

    #[test]
    fn empty_id_means_no_entity() {
        assert!(CubeUuid::default().is_empty());
        assert!(!CubeUuid::from("abc").is_empty());
    }
}
