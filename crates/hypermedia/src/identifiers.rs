//! Newtype identifiers for the hypermedia model.
//!
//! Names that must never be empty (field names, HTTP methods) are distinct
//! newtypes so an empty value is rejected at construction time rather than
//! discovered while a request is being built.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Name of a link parameter, as declared by a [`crate::Field`].
    FieldName
}

string_id! {
    /// HTTP method of a link, stored as written in the document (usually
    /// lowercase, e.g. `"get"`, `"post"`).
    Method
}

impl Method {
    /// The default link method.
    pub fn get() -> Self {
        Self("get".to_owned())
    }

    /// Returns the method in the uppercase form used on the wire.
    pub fn to_uppercase(&self) -> String {
        self.0.to_ascii_uppercase()
    }

    /// Returns `true` for methods exempt from CSRF protection
    /// (`GET`, `HEAD`, `OPTIONS`, `TRACE`).
    pub fn is_csrf_safe(&self) -> bool {
        matches!(
            self.to_uppercase().as_str(),
            "GET" | "HEAD" | "OPTIONS" | "TRACE"
        )
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::get()
    }
}

// ---------------------------------------------------------------------------
// UUID-backed identifiers
// ---------------------------------------------------------------------------

/// Identifies a single `action` invocation.
///
/// Generated fresh for every request and recorded on its tracing span so the
/// request and response events of one call can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_names_are_rejected() {
        assert!(FieldName::new("").is_none());
        assert!(Method::new("").is_none());
        assert_eq!(FieldName::new("id").unwrap().as_str(), "id");
    }

    #[test]
    fn csrf_safe_methods_ignore_case() {
        for safe in ["get", "HEAD", "Options", "trace"] {
            assert!(Method::new(safe).unwrap().is_csrf_safe(), "{safe}");
        }
        for unsafe_method in ["post", "PUT", "patch", "delete"] {
            assert!(!Method::new(unsafe_method).unwrap().is_csrf_safe());
        }
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::new_random(), RequestId::new_random());
    }
}
