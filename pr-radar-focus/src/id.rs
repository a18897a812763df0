//! Stable `focus_id` derivation.

use sha2::{Digest, Sha256};

use crate::model::FocusType;

/// Widened to 16 hex chars per the spec's Open Question allowance (§9):
/// the original's 8-char prefix is collision-prone on adversarial inputs.
const FOCUS_ID_HEX_LEN: usize = 16;

/// Hex SHA-256 prefix of `file_path|hunk_index|start_line|end_line|focus_type`.
/// Bitwise stable across runs, platforms, and execution orders (§8 property
/// "focus-id stability") since it depends only on these five fields.
pub fn focus_id(
    file_path: &str,
    hunk_index: usize,
    start_line: u32,
    end_line: u32,
    focus_type: FocusType,
) -> String {
    let kind = match focus_type {
        FocusType::File => "file",
        FocusType::Method => "method",
    };
    let key = format!("{file_path}|{hunk_index}|{start_line}|{end_line}|{kind}");
    let digest = Sha256::digest(key.as_bytes());
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    hex[..FOCUS_ID_HEX_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_stable_for_identical_inputs() {
        let a = focus_id("foo.rs", 0, 1, 5, FocusType::File);
        let b = focus_id("foo.rs", 0, 1, 5, FocusType::File);
        assert_eq!(a, b);
        assert_eq!(a.len(), FOCUS_ID_HEX_LEN);
    }

    #[test]
    fn differs_by_focus_type() {
        let file_id = focus_id("foo.rs", 0, 1, 5, FocusType::File);
        let method_id = focus_id("foo.rs", 0, 1, 5, FocusType::Method);
        assert_ne!(file_id, method_id);
    }
}
