//! Ion 1.0 system symbols.

use crate::symbols::Sid;

pub const ION: &str = "$ion";
pub const ION_1_0: &str = "$ion_1_0";
pub const ION_SYMBOL_TABLE: &str = "$ion_symbol_table";
pub const NAME: &str = "name";
pub const VERSION: &str = "version";
pub const IMPORTS: &str = "imports";
pub const SYMBOLS: &str = "symbols";
pub const MAX_ID: &str = "max_id";
pub const ION_SHARED_SYMBOL_TABLE: &str = "$ion_shared_symbol_table";

/// System symbol texts in SID order; `SYSTEM_SYMBOLS[0]` has SID 1.
pub const SYSTEM_SYMBOLS: [&str; 9] = [
    ION,
    ION_1_0,
    ION_SYMBOL_TABLE,
    NAME,
    VERSION,
    IMPORTS,
    SYMBOLS,
    MAX_ID,
    ION_SHARED_SYMBOL_TABLE,
];

pub const ION_SID: Sid = 1;
pub const ION_1_0_SID: Sid = 2;
pub const ION_SYMBOL_TABLE_SID: Sid = 3;
pub const NAME_SID: Sid = 4;
pub const VERSION_SID: Sid = 5;
pub const IMPORTS_SID: Sid = 6;
pub const SYMBOLS_SID: Sid = 7;
pub const MAX_ID_SID: Sid = 8;
pub const ION_SHARED_SYMBOL_TABLE_SID: Sid = 9;

/// Highest SID defined by the Ion 1.0 system symbol table.
pub const SYSTEM_MAX_ID: Sid = 9;

fn version_marker_regex() -> &'static regex::Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^\$ion_([0-9]+)_([0-9]+)$").unwrap())
}

/// Major and minor version of an Ion version marker symbol such as `$ion_1_0`.
///
/// `None` when `text` is not marker-shaped; `Some(None)` when it is but the
/// numbers do not fit in a `u32`.
pub fn version_marker(text: &str) -> Option<Option<(u32, u32)>> {
    let caps = version_marker_regex().captures(text)?;
    Some(caps[1].parse().ok().zip(caps[2].parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_marker_matrix() {
        assert_eq!(version_marker("$ion_1_0"), Some(Some((1, 0))));
        assert_eq!(version_marker("$ion_2_13"), Some(Some((2, 13))));
        assert_eq!(version_marker("$ion_99999999999_0"), Some(None));
        assert_eq!(version_marker("$ion_1_99999999999"), Some(None));
        assert_eq!(version_marker("$ion_1"), None);
        assert_eq!(version_marker("$ion_symbol_table"), None);
        assert_eq!(version_marker("x$ion_1_0"), None);
    }

    #[test]
    fn system_symbol_sids_follow_order() {
        assert_eq!(SYSTEM_SYMBOLS[(ION_SYMBOL_TABLE_SID - 1) as usize], ION_SYMBOL_TABLE);
        assert_eq!(SYSTEM_SYMBOLS[(MAX_ID_SID - 1) as usize], MAX_ID);
        assert_eq!(SYSTEM_SYMBOLS.len() as Sid, SYSTEM_MAX_ID);
    }
}
