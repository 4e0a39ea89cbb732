//! Page-tree helpers shared by the renderer and the merge compiler.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// Page attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// US Letter, used when no MediaBox is found anywhere in the tree.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Guard against cyclic `/Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Object id of the page at a 0-based index.
pub fn page_id_at(doc: &Document, page_index: usize) -> Option<ObjectId> {
    // get_pages is keyed by 1-based page number
    let page_number = u32::try_from(page_index).ok()?.checked_add(1)?;
    doc.get_pages().get(&page_number).copied()
}

/// Look up an attribute on a page, walking up `/Parent` links if the page
/// does not define it itself.
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }

        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent_id).ok()?;
    }

    None
}

/// Effective geometry of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// MediaBox as `[llx, lly, urx, ury]`.
    pub media_box: [f32; 4],
    /// Clockwise rotation, normalised to 0, 90, 180 or 270.
    pub rotate: i64,
}

impl PageGeometry {
    /// Resolve geometry for a page, applying inheritance and defaults.
    pub fn of(doc: &Document, page_id: ObjectId) -> Self {
        let Ok(page) = doc.get_dictionary(page_id) else {
            return Self {
                media_box: DEFAULT_MEDIA_BOX,
                rotate: 0,
            };
        };

        let media_box = inherited_attribute(doc, page, b"MediaBox")
            .and_then(|obj| resolve(doc, obj).as_array().ok())
            .and_then(|array| rectangle(doc, array))
            .unwrap_or(DEFAULT_MEDIA_BOX);

        let rotate = inherited_attribute(doc, page, b"Rotate")
            .and_then(|obj| resolve(doc, obj).as_i64().ok())
            .map(|degrees| degrees.rem_euclid(360) / 90 * 90)
            .unwrap_or(0);

        Self { media_box, rotate }
    }

    /// Width and height in points as displayed, after rotation.
    pub fn display_size(&self) -> (f32, f32) {
        let [llx, lly, urx, ury] = self.media_box;
        let width = (urx - llx).abs();
        let height = (ury - lly).abs();

        if self.rotate == 90 || self.rotate == 270 {
            (height, width)
        } else {
            (width, height)
        }
    }
}

fn rectangle(doc: &Document, array: &[Object]) -> Option<[f32; 4]> {
    if array.len() != 4 {
        return None;
    }

    let mut rect = [0.0; 4];
    for (slot, value) in rect.iter_mut().zip(array) {
        *slot = resolve(doc, value).as_float().ok()?;
    }
    Some(rect)
}

/// Follow a single indirect reference, returning the object itself otherwise.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Check whether `obj` is a node of a page tree (`/Type /Page` or `/Pages`).
pub fn is_page_tree_node(obj: &Object) -> bool {
    obj.as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"Page" || name == b"Pages")
}

/// Copy the objects referenced by `obj` from `source` into `target`.
///
/// Walks the structure recursively and inserts every referenced object that
/// `target` does not already contain, keeping its id. References to ids in
/// `stop` are left in place but not followed; callers pass the source's page
/// tree so that links to other pages never drag those pages in.
///
/// Returns the number of objects inserted.
pub fn copy_references(
    target: &mut Document,
    source: &Document,
    obj: &Object,
    stop: &HashSet<ObjectId>,
) -> usize {
    match obj {
        Object::Reference(ref_id) => {
            if stop.contains(ref_id) || target.objects.contains_key(ref_id) {
                return 0;
            }
            let Ok(referenced) = source.get_object(*ref_id) else {
                return 0;
            };
            target.objects.insert(*ref_id, referenced.clone());
            1 + copy_references(target, source, referenced, stop)
        }
        Object::Dictionary(dict) => dict
            .iter()
            .map(|(_, value)| copy_references(target, source, value, stop))
            .sum(),
        Object::Array(items) => items
            .iter()
            .map(|item| copy_references(target, source, item, stop))
            .sum(),
        Object::Stream(stream) => stream
            .dict
            .iter()
            .map(|(_, value)| copy_references(target, source, value, stop))
            .sum(),
        _ => 0,
    }
}

/// Remove references to the ids in `dangling` from `obj`.
///
/// A dictionary entry that is such a reference, or an explicit destination
/// (`[page /Fit]` and friends) aimed at one, is removed. Inside other arrays
/// the reference becomes `null`.
///
/// Returns the number of references removed.
pub fn drop_references(obj: &mut Object, dangling: &HashSet<ObjectId>) -> usize {
    match obj {
        Object::Dictionary(dict) => drop_dictionary_references(dict, dangling),
        Object::Stream(stream) => drop_dictionary_references(&mut stream.dict, dangling),
        Object::Array(items) => items
            .iter_mut()
            .map(|item| {
                if points_into(item, dangling) {
                    *item = Object::Null;
                    1
                } else {
                    drop_references(item, dangling)
                }
            })
            .sum(),
        _ => 0,
    }
}

fn drop_dictionary_references(dict: &mut Dictionary, dangling: &HashSet<ObjectId>) -> usize {
    let doomed: Vec<Vec<u8>> = dict
        .iter()
        .filter(|(_, value)| points_into(value, dangling) || is_destination_into(value, dangling))
        .map(|(key, _)| key.clone())
        .collect();

    for key in &doomed {
        dict.remove(key);
    }

    doomed.len()
        + dict
            .iter_mut()
            .map(|(_, value)| drop_references(value, dangling))
            .sum::<usize>()
}

fn points_into(obj: &Object, ids: &HashSet<ObjectId>) -> bool {
    matches!(obj, Object::Reference(id) if ids.contains(id))
}

fn is_destination_into(obj: &Object, ids: &HashSet<ObjectId>) -> bool {
    match obj {
        Object::Array(items) => items.first().is_some_and(|first| points_into(first, ids)),
        _ => false,
    }
}

/// Format a byte count as a human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
