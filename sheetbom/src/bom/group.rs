use std::collections::HashMap;

use crate::bom::item::{BomItem, GroupedBomItem};

/// Group raw items by `(footprint, name, dnp)`, in first-seen order.
///
/// The first item of a group supplies its display fields; every member's
/// reference is appended, empty ones included.
pub fn group_bom_items<'a, I>(items: I) -> Vec<GroupedBomItem>
where
    I: IntoIterator<Item = &'a BomItem>,
{
    let mut groups: Vec<GroupedBomItem> = Vec::new();
    let mut index: HashMap<(&'a str, &'a str, bool), usize> = HashMap::new();

    for item in items {
        let key = (item.footprint.as_str(), item.name.as_str(), item.dnp);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(GroupedBomItem::from_item(item));
            groups.len() - 1
        });
        groups[slot].add_reference(item.reference.as_str());
    }

    groups
}
