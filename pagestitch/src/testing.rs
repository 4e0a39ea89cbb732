//! In-memory PDF fixtures for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Build a document with `pages` pages. Page `i` shows the text `{label}-{i}`.
///
/// Resources and MediaBox live on the Pages node so pages have to inherit
/// them.
pub(crate) fn pdf_document(label: &str, pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(pages);
    for i in 0..pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("{label}-{i}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Serialized form of [`pdf_document`].
pub(crate) fn pdf_bytes(label: &str, pages: usize) -> Vec<u8> {
    let mut doc = pdf_document(label, pages);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Text shown on each page of a serialized document, in page order.
pub(crate) fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();

    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .find(|op| op.operator == "Tj")
                .and_then(|op| op.operands.first())
                .and_then(|text| text.as_str().ok())
                .map(|text| String::from_utf8_lossy(text).into_owned())
                .unwrap_or_default()
        })
        .collect()
}

/// Two-page document whose first page carries a link to the second page and
/// a text-field widget.
pub(crate) fn pdf_with_link_and_field(label: &str) -> Vec<u8> {
    let mut doc = pdf_document(label, 2);
    let pages: Vec<_> = doc.get_pages().into_values().collect();
    let (first, second) = (pages[0], pages[1]);

    let link_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![72.into(), 600.into(), 200.into(), 620.into()],
        "Dest" => vec![second.into(), "Fit".into()],
    });
    let field_id = doc.new_object_id();
    let widget_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Rect" => vec![72.into(), 500.into(), 300.into(), 520.into()],
        "Parent" => field_id,
        "P" => first,
    });
    doc.objects.insert(
        field_id,
        Object::Dictionary(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("name"),
            "Kids" => vec![widget_id.into()],
        }),
    );

    doc.get_dictionary_mut(first)
        .unwrap()
        .set("Annots", vec![Object::from(link_id), widget_id.into()]);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Every reference in `doc` whose target object does not exist.
pub(crate) fn dangling_references(doc: &Document) -> Vec<lopdf::ObjectId> {
    fn walk(doc: &Document, obj: &Object, found: &mut Vec<lopdf::ObjectId>) {
        match obj {
            Object::Reference(id) => {
                if !doc.objects.contains_key(id) {
                    found.push(*id);
                }
            }
            Object::Array(items) => items.iter().for_each(|item| walk(doc, item, found)),
            Object::Dictionary(dict) => dict.iter().for_each(|(_, value)| walk(doc, value, found)),
            Object::Stream(stream) => stream
                .dict
                .iter()
                .for_each(|(_, value)| walk(doc, value, found)),
            _ => {}
        }
    }

    let mut found = Vec::new();
    for obj in doc.objects.values() {
        walk(doc, obj, &mut found);
    }
    for (_, value) in doc.trailer.iter() {
        walk(doc, value, &mut found);
    }
    found
}
