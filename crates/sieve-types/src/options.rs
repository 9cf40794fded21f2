use serde::{Deserialize, Serialize};

/// Options applied to every routine produced by one compiler instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Treat `""` as `null` whenever a field value is (re)defined.
    pub convert_empty_strings_to_null: bool,
}
