//! Ordered PDF merge
//!
//! Appends the pages of additional PDFs after the pages of a base PDF.

use crate::error::MergeError;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Merged bytes plus the number of pages they hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutput {
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

/// Merge `additional` after `base`, preserving the order given
///
/// The algorithm:
/// 1. Load the base and flatten its page tree into one `Kids` list
/// 2. For each additional source, in order:
///    a. Offset its object IDs past the destination's highest ID
///    b. Import every object with references remapped
///    c. Pin inherited attributes onto each page and reparent it
/// 3. Rewrite `Kids`/`Count` and check the page total against the sources
/// 4. Compress and serialize
pub fn merge_ordered<S: AsRef<[u8]>>(
    base: &[u8],
    additional: &[S],
) -> Result<MergeOutput, MergeError> {
    let mut dest = load(base, "base")?;
    let pages_id = page_tree_root(&dest)?;

    let mut page_refs: Vec<ObjectId> = dest.get_pages().into_values().collect();
    for &page_id in &page_refs {
        adopt_page(&mut dest, page_id, pages_id);
    }
    let mut expected = page_refs.len();
    let mut dest_max_id = dest.max_id;

    for (i, bytes) in additional.iter().enumerate() {
        let source = load(bytes.as_ref(), &format!("file {}", i + 1))?;
        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        expected += source_pages.len();

        let id_offset = dest_max_id;
        for (old_id, object) in source.objects {
            dest.objects
                .insert((old_id.0 + id_offset, old_id.1), remap_object_refs(object, id_offset));
        }

        for old_page_ref in source_pages {
            let new_page_ref = (old_page_ref.0 + id_offset, old_page_ref.1);
            adopt_page(&mut dest, new_page_ref, pages_id);
            page_refs.push(new_page_ref);
        }

        dest_max_id = (source.max_id + id_offset).max(dest_max_id);
        debug!(source = i + 1, id_offset, "imported source objects");
    }

    update_page_tree(&mut dest, pages_id, &page_refs)?;
    dest.max_id = dest_max_id;

    let page_count = dest.get_pages().len();
    if page_count != expected {
        return Err(MergeError::MergeFailed(format!(
            "merged document has {} pages, expected {}",
            page_count, expected
        )));
    }

    // Source catalogs and page tree roots are unreachable once pages are adopted
    let pruned = dest.prune_objects();
    debug!(pruned = pruned.len(), "dropped unreferenced objects");
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| MergeError::MergeFailed(format!("Failed to save merged PDF: {}", e)))?;

    Ok(MergeOutput {
        bytes: buffer,
        page_count: page_count as u32,
    })
}

fn load(bytes: &[u8], label: &str) -> Result<Document, MergeError> {
    Document::load_mem(bytes)
        .map_err(|e| MergeError::MergeFailed(format!("Failed to load {}: {}", label, e)))
}

/// The catalog's `Pages` node
fn page_tree_root(doc: &Document) -> Result<ObjectId, MergeError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| MergeError::MergeFailed("No Root reference in trailer".into()))?;

    doc.get_dictionary(catalog_id)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|_| MergeError::MergeFailed("No Pages reference in catalog".into()))
}

/// Make `page_id` a direct child of `pages_id` without losing inherited attributes
fn adopt_page(doc: &mut Document, page_id: ObjectId, pages_id: ObjectId) {
    let inherited = inherited_attributes(doc, page_id);

    if let Some(Object::Dictionary(page)) = doc.objects.get_mut(&page_id) {
        for (key, value) in inherited {
            page.set(key, value);
        }
        page.set("Parent", Object::Reference(pages_id));
    }
}

/// Inheritable attributes the page lacks, taken from the nearest ancestor that has them
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut found = Vec::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        if missing.is_empty() {
            break;
        }
        let Some(node) = parent.and_then(|id| doc.get_dictionary(id).ok()) else {
            break;
        };

        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    found
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

fn update_page_tree(
    doc: &mut Document,
    pages_id: ObjectId,
    page_refs: &[ObjectId],
) -> Result<(), MergeError> {
    let Some(Object::Dictionary(pages_dict)) = doc.objects.get_mut(&pages_id) else {
        return Err(MergeError::MergeFailed("Invalid pages dictionary".into()));
    };

    let kids = page_refs
        .iter()
        .map(|&id| Object::Reference(id))
        .collect::<Vec<_>>();
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(page_refs.len() as i64));

    Ok(())
}
