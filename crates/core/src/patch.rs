//! Three-state field for partial updates.
//!
//! A JSON body distinguishes an omitted key from an explicit `null`; a plain
//! `Option<T>` cannot. Fields of type `Patch<T>` annotated with
//! `#[serde(default)]` deserialize as:
//!
//! | JSON            | Value             |
//! |-----------------|-------------------|
//! | key omitted     | `Patch::Unset`    |
//! | `"key": null`   | `Patch::Null`     |
//! | `"key": v`      | `Patch::Value(v)` |

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Unset,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    pub fn is_set(&self) -> bool {
        !self.is_unset()
    }

    /// The explicit value, if any. `Unset` and `Null` both yield `None`.
    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Clone> Patch<T> {
    /// The value this field will hold after the patch is applied to `current`.
    pub fn resolved(&self, current: Option<&T>) -> Option<T> {
        match self {
            Patch::Unset => current.cloned(),
            Patch::Null => None,
            Patch::Value(v) => Some(v.clone()),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|opt| match opt {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}
