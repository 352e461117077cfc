//! Small shared helpers

use std::collections::HashMap;

/// Remove duplicates from a list, ignoring case.
///
/// First-occurrence order is preserved while the casing of the last
/// occurrence wins, so `["CVE-1", "cve-2", "cve-1"]` keeps slot one but
/// reports it as `"cve-1"`.
pub fn dedupe_case_insensitive<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let key = item.to_lowercase();
        match slots.get(&key) {
            Some(&idx) => out[idx] = item,
            None => {
                slots.insert(key, out.len());
                out.push(item);
            }
        }
    }
    out
}
