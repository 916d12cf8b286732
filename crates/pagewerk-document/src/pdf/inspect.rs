// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF inspector — read back a produced document with `lopdf` to check page
// count, page sizes, and where images were drawn.

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use pagewerk_core::error::{PagewerkError, Result};
use tracing::{debug, instrument};

/// An image drawn on a page, in page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// XObject resource name used by the `Do` operator.
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Read-only view over an existing PDF.
pub struct PdfInspector {
    document: Document,
}

impl PdfInspector {
    /// Load a PDF already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PagewerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded for inspection");
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height in points of a page (1-indexed), from its MediaBox.
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        let page_id = self.page_id(page_number)?;
        let media_box = self.inherited(page_id, b"MediaBox").ok_or_else(|| {
            PagewerkError::PdfError(format!("page {} has no MediaBox", page_number))
        })?;

        let values: Vec<f32> = self
            .resolve(media_box)
            .as_array()
            .map_err(|err| PagewerkError::PdfError(format!("MediaBox is not an array: {}", err)))?
            .iter()
            .map(|v| self.resolve(v).as_float())
            .collect::<std::result::Result<_, _>>()
            .map_err(|err| PagewerkError::PdfError(format!("MediaBox is not numeric: {}", err)))?;

        match values.as_slice() {
            [x0, y0, x1, y1] => Ok(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => Err(PagewerkError::PdfError(format!(
                "MediaBox has {} entries",
                values.len()
            ))),
        }
    }

    /// Images drawn on a page (1-indexed), with the transformation in effect
    /// at each `Do` applied to the unit square.
    pub fn image_placements(&self, page_number: u32) -> Result<Vec<ImagePlacement>> {
        let page_id = self.page_id(page_number)?;
        let content = self.document.get_page_content(page_id).map_err(|err| {
            PagewerkError::PdfError(format!("cannot read page {} content: {}", page_number, err))
        })?;
        let content = Content::decode(&content).map_err(|err| {
            PagewerkError::PdfError(format!("cannot decode page {} content: {}", page_number, err))
        })?;

        let mut ctm = Matrix::IDENTITY;
        let mut stack: Vec<Matrix> = Vec::new();
        let mut placements = Vec::new();

        for operation in &content.operations {
            match operation.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => ctm = stack.pop().unwrap_or(Matrix::IDENTITY),
                "cm" => {
                    let m: Vec<f32> = operation
                        .operands
                        .iter()
                        .filter_map(|o| o.as_float().ok())
                        .collect();
                    if let [a, b, c, d, e, f] = m.as_slice() {
                        ctm = Matrix([*a, *b, *c, *d, *e, *f]).then(&ctm);
                    }
                }
                "Do" => {
                    let name = operation
                        .operands
                        .first()
                        .and_then(|o| o.as_name().ok())
                        .map(|n| String::from_utf8_lossy(n).into_owned())
                        .unwrap_or_default();
                    let [a, b, c, d, e, f] = ctm.0;
                    placements.push(ImagePlacement {
                        name,
                        x: e,
                        y: f,
                        width: a.hypot(b),
                        height: c.hypot(d),
                    });
                }
                _ => {}
            }
        }

        Ok(placements)
    }

    // -- Helpers --------------------------------------------------------------

    fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            PagewerkError::PdfError(format!(
                "page {} not found (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }

    /// Look up `key` on a page dictionary, walking /Parent for inherited
    /// attributes.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current: &Dictionary = self.document.get_dictionary(page_id).ok()?;
        // Page trees are shallow; the bound guards against /Parent cycles.
        for _ in 0..32 {
            if let Ok(value) = current.get(key) {
                return Some(value);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.document.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }
}

/// Affine transform `[a b c d e f]` as used by the `cm` operator.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Self) -> Self {
        let [a, b, c, d, e, f] = self.0;
        let [oa, ob, oc, od, oe, of] = other.0;
        Self([
            a * oa + b * oc,
            a * ob + b * od,
            c * oa + d * oc,
            c * ob + d * od,
            e * oa + f * oc + oe,
            e * ob + f * od + of,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{Stream, dictionary};

    fn single_page(operations: Vec<Operation>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    #[test]
    fn media_box_is_inherited_from_page_tree() {
        let pdf = single_page(Vec::new());
        let inspector = PdfInspector::from_bytes(&pdf).unwrap();
        assert_eq!(inspector.page_count(), 1);
        assert_eq!(inspector.page_size(1).unwrap(), (595.0, 842.0));
        assert!(inspector.page_size(2).is_err());
    }

    #[test]
    fn composed_transforms_give_image_rect() {
        let pdf = single_page(vec![
            op("q", vec![]),
            op("cm", vec![1.into(), 0.into(), 0.into(), 1.into(), 10.into(), 20.into()]),
            op("cm", vec![300.into(), 0.into(), 0.into(), 150.into(), 0.into(), 0.into()]),
            op("Do", vec![Object::Name(b"Im1".to_vec())]),
            op("Q", vec![]),
            op("q", vec![]),
            op("cm", vec![50.into(), 0.into(), 0.into(), 40.into(), 5.into(), 6.into()]),
            op("Do", vec![Object::Name(b"Im2".to_vec())]),
            op("Q", vec![]),
        ]);
        let placements = PdfInspector::from_bytes(&pdf)
            .unwrap()
            .image_placements(1)
            .unwrap();

        assert_eq!(
            placements,
            vec![
                ImagePlacement {
                    name: "Im1".into(),
                    x: 10.0,
                    y: 20.0,
                    width: 300.0,
                    height: 150.0,
                },
                ImagePlacement {
                    name: "Im2".into(),
                    x: 5.0,
                    y: 6.0,
                    width: 50.0,
                    height: 40.0,
                },
            ]
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(PdfInspector::from_bytes(b"nope").is_err());
    }
}
