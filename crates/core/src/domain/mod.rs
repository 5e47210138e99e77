pub mod behavior;
pub mod product;

use serde::Deserialize;

/// Identifier as it appears in snapshot files: fixtures mix `"1"` and `1`.
#[derive(Deserialize)]
#[serde(untagged)]
#[doc(hidden)]
pub enum WireId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<WireId> for String {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Text(text) => text,
            WireId::Signed(number) => number.to_string(),
            WireId::Unsigned(number) => number.to_string(),
        }
    }
}
