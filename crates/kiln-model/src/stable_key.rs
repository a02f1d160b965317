//! Stable keys identify one field instance inside a repeated row.
//!
//! A stable key has the shape `{container_key}-{group_id}-{child_uuid}`.
//! Nested repeaters get their own container key per parent row:
//! `{parent_key}-{parent_group_id}-{nested_uuid}`.
//!
//! Group ids are opaque and may contain hyphens, so decoding needs the set
//! of child uuids the container declares. When more than one child uuid is
//! a suffix of the key, the longest one wins.

/// Separator between key segments.
pub const SEPARATOR: char = '-';

/// Build the stable key of `child_uuid` inside row `group_id` of
/// `container_key`.
pub fn encode(container_key: &str, group_id: &str, child_uuid: &str) -> String {
    format!("{container_key}{SEPARATOR}{group_id}{SEPARATOR}{child_uuid}")
}

/// Container key of a repeater nested inside row `group_id` of `parent_key`.
pub fn nested_container_key(parent_key: &str, group_id: &str, nested_uuid: &str) -> String {
    encode(parent_key, group_id, nested_uuid)
}

/// Prefix shared by every key of one row.
pub fn row_prefix(container_key: &str, group_id: &str) -> String {
    format!("{container_key}{SEPARATOR}{group_id}{SEPARATOR}")
}

/// Result of decoding a stable key against a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedKey<'a> {
    pub group_id: &'a str,
    pub child_uuid: &'a str,
}

/// Decode `key` against `container_key` and the container's child uuids.
///
/// Returns `None` when the key does not start with the container prefix,
/// when no child uuid is a suffix, or when the group id would be empty.
pub fn decode<'k, 'u, I>(key: &'k str, container_key: &str, child_uuids: I) -> Option<DecodedKey<'k>>
where
    I: IntoIterator<Item = &'u str>,
{
    let mut uuids: Vec<&str> = child_uuids.into_iter().collect();
    sort_longest_first(&mut uuids);
    decode_sorted(key, container_key, &uuids)
}

fn sort_longest_first(uuids: &mut Vec<&str>) {
    uuids.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    uuids.dedup();
}

fn decode_sorted<'k>(key: &'k str, container_key: &str, uuids: &[&str]) -> Option<DecodedKey<'k>> {
    let rest = key
        .strip_prefix(container_key)?
        .strip_prefix(SEPARATOR)?;
    for &uuid in uuids {
        if uuid.is_empty() {
            continue;
        }
        let Some(head) = rest.strip_suffix(uuid) else {
            continue;
        };
        let Some(group_id) = head.strip_suffix(SEPARATOR) else {
            continue;
        };
        if group_id.is_empty() {
            continue;
        }
        let child_uuid = &rest[rest.len() - uuid.len()..];
        return Some(DecodedKey {
            group_id,
            child_uuid,
        });
    }
    None
}

/// Decoder bound to one container instance, reused across a state scan.
#[derive(Debug, Clone)]
pub struct StableKeyDecoder<'a> {
    container_key: &'a str,
    prefix: String,
    uuids: Vec<&'a str>,
}

impl<'a> StableKeyDecoder<'a> {
    pub fn new<I>(container_key: &'a str, child_uuids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut uuids: Vec<&'a str> = child_uuids.into_iter().collect();
        sort_longest_first(&mut uuids);
        Self {
            container_key,
            prefix: format!("{container_key}{SEPARATOR}"),
            uuids,
        }
    }

    pub fn container_key(&self) -> &str {
        self.container_key
    }

    /// Cheap prefix test before a full decode.
    pub fn owns(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }

    pub fn decode<'k>(&self, key: &'k str) -> Option<DecodedKey<'k>> {
        decode_sorted(key, self.container_key, &self.uuids)
    }

    /// Group id of a key that belongs to any row of this container, found
    /// either by decoding or by matching the `-{nested_uuid}-` marker of a
    /// nested repeater instance.
    pub fn group_of<'k>(&self, key: &'k str, nested_uuids: &[&str]) -> Option<&'k str> {
        if let Some(decoded) = self.decode(key) {
            return Some(decoded.group_id);
        }
        let rest = key.strip_prefix(self.prefix.as_str())?;
        nested_uuids.iter().find_map(|nested| {
            let marker = format!("{SEPARATOR}{nested}{SEPARATOR}");
            rest.find(&marker)
                .map(|pos| &rest[..pos])
                .filter(|group| !group.is_empty())
        })
    }
}
