// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF optimiser — structural size reduction of an assembled document using
// the `lopdf` crate.
//
// The pass re-parses the document, removes zero-length streams and every
// reference to them, folds byte-identical streams into a single shared
// object, drops objects nothing references, renumbers, Flate-compresses every
// unfiltered stream, and writes the result with object streams and a
// cross-reference stream. Rendered content is unchanged.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use lopdf::{Document, Object, ObjectId, SaveOptions, Stream};
use pagewerk_core::error::{PagewerkError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

/// Post-processing pass applied to an assembled PDF.
///
/// Failures are recoverable: the caller keeps the unoptimised document.
pub trait DocumentOptimizer: Send + Sync {
    fn optimize(&self, raw: &[u8]) -> Result<Vec<u8>>;
}

/// Stream deduplication, pruning, and compression via lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralOptimizer;

impl DocumentOptimizer for StructuralOptimizer {
    #[instrument(skip_all, fields(bytes_len = raw.len()))]
    fn optimize(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(raw).map_err(|err| {
            PagewerkError::Optimization(format!("failed to parse document: {}", err))
        })?;

        let pages = doc.get_pages().len();
        if pages == 0 {
            return Err(PagewerkError::Optimization("document has no pages".into()));
        }

        let objects_before = doc.objects.len();
        let emptied = doc.delete_zero_length_streams().len();
        let merged = deduplicate_streams(&mut doc);
        let pruned = doc.prune_objects().len();
        doc.renumber_objects();
        doc.compress();

        let mut output = Vec::new();
        doc.save_with_options(&mut output, save_options()).map_err(|err| {
            PagewerkError::Optimization(format!("failed to serialise optimised PDF: {}", err))
        })?;

        debug!(objects_before, emptied, merged, pruned, pages, "Structural pass complete");

        if output.len() >= raw.len() {
            info!(
                original = raw.len(),
                optimised = output.len(),
                "Optimisation did not reduce size, keeping input"
            );
            return Ok(raw.to_vec());
        }

        info!(original = raw.len(), optimised = output.len(), "PDF optimised");
        Ok(output)
    }
}

/// Pack non-stream objects into compressed object streams.
fn save_options() -> SaveOptions {
    SaveOptions::builder()
        .use_object_streams(true)
        .use_xref_streams(true)
        .compression_level(6)
        .build()
}

/// Fold streams with identical dictionaries and content into one object.
///
/// Returns the number of duplicate objects removed.
fn deduplicate_streams(doc: &mut Document) -> usize {
    let mut canonical: HashMap<String, ObjectId> = HashMap::new();
    let mut remap: HashMap<ObjectId, ObjectId> = HashMap::new();

    // `objects` is ordered, so the lowest id of each group is kept.
    for (&id, object) in &doc.objects {
        if let Object::Stream(stream) = object {
            match canonical.entry(stream_fingerprint(stream)) {
                Entry::Occupied(existing) => {
                    remap.insert(id, *existing.get());
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }
    }

    if remap.is_empty() {
        return 0;
    }

    for object in doc.objects.values_mut() {
        rewrite_references(object, &remap);
    }
    for (_, value) in doc.trailer.iter_mut() {
        rewrite_references(value, &remap);
    }
    for duplicate in remap.keys() {
        doc.objects.remove(duplicate);
    }

    remap.len()
}

/// SHA-256 over the stream dictionary and raw content, as lowercase hex.
fn stream_fingerprint(stream: &Stream) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", stream.dict).as_bytes());
    hasher.update(&stream.content);
    hex::encode(hasher.finalize())
}

fn rewrite_references(object: &mut Object, remap: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(target) = remap.get(id) {
                *id = *target;
            }
        }
        Object::Array(items) => {
            for item in items {
                rewrite_references(item, remap);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                rewrite_references(value, remap);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                rewrite_references(value, remap);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::inspect::PdfInspector;
    use lopdf::dictionary;

    /// A two-page document whose pages draw the same large image, stored
    /// twice as separate objects.
    fn document_with_duplicate_images() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let pixels: Vec<u8> = (0..64 * 64 * 3).map(|i| (i % 7) as u8).collect();

        let mut kids = Vec::new();
        for _ in 0..2 {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 64,
                    "Height" => 64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                pixels.clone(),
            ));
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                b"q 64 0 0 64 0 0 cm /Im0 Do Q".to_vec(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
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

    fn image_count(pdf: &[u8]) -> usize {
        let doc = Document::load_mem(pdf).unwrap();
        doc.objects
            .values()
            .filter(|object| match object {
                Object::Stream(stream) => stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name())
                    .map(|name| name == b"Image")
                    .unwrap_or(false),
                _ => false,
            })
            .count()
    }

    #[test]
    fn duplicate_streams_are_shared() {
        let raw = document_with_duplicate_images();
        assert_eq!(image_count(&raw), 2);

        let optimised = StructuralOptimizer.optimize(&raw).unwrap();
        assert!(optimised.len() < raw.len());
        assert_eq!(image_count(&optimised), 1);

        let inspector = PdfInspector::from_bytes(&optimised).unwrap();
        assert_eq!(inspector.page_count(), 2);
        assert_eq!(inspector.image_placements(2).unwrap().len(), 1);
    }

    /// The duplicate-image document with a zero-length XObject added to the
    /// first page's resources.
    fn document_with_empty_stream() -> Vec<u8> {
        let mut doc = Document::load_mem(&document_with_duplicate_images()).unwrap();
        let blank_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Form" },
            Vec::new(),
        ));
        let first_page = doc.get_pages()[&1];
        doc.get_dictionary_mut(first_page)
            .unwrap()
            .get_mut(b"Resources")
            .and_then(Object::as_dict_mut)
            .unwrap()
            .get_mut(b"XObject")
            .and_then(Object::as_dict_mut)
            .unwrap()
            .set("Blank", blank_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn first_page_xobjects(doc: &Document) -> Vec<Vec<u8>> {
        let first_page = doc.get_pages()[&1];
        doc.get_dictionary(first_page)
            .unwrap()
            .get(b"Resources")
            .and_then(Object::as_dict)
            .unwrap()
            .get(b"XObject")
            .and_then(Object::as_dict)
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    #[test]
    fn zero_length_streams_and_their_references_are_removed() {
        let raw = document_with_empty_stream();
        let before = Document::load_mem(&raw).unwrap();
        assert_eq!(first_page_xobjects(&before), [b"Im0".to_vec(), b"Blank".to_vec()]);

        let optimised = StructuralOptimizer.optimize(&raw).unwrap();
        let after = Document::load_mem(&optimised).unwrap();

        let empty_streams = after
            .objects
            .values()
            .filter(|object| matches!(object, Object::Stream(stream) if stream.content.is_empty()))
            .count();
        assert_eq!(empty_streams, 0);
        assert_eq!(first_page_xobjects(&after), [b"Im0".to_vec()]);

        let inspector = PdfInspector::from_bytes(&optimised).unwrap();
        assert_eq!(inspector.page_count(), 2);
        assert_eq!(inspector.image_placements(1).unwrap().len(), 1);
    }

    #[test]
    fn output_uses_object_streams() {
        let raw = document_with_duplicate_images();
        assert!(!raw.windows(7).any(|window| window == b"/ObjStm"));

        let optimised = StructuralOptimizer.optimize(&raw).unwrap();
        assert!(optimised.windows(7).any(|window| window == b"/ObjStm"));
        assert!(optimised.windows(5).any(|window| window == b"/XRef"));

        let inspector = PdfInspector::from_bytes(&optimised).unwrap();
        assert_eq!(inspector.page_count(), 2);
        assert_eq!(inspector.image_placements(1).unwrap().len(), 1);
        assert_eq!(inspector.image_placements(2).unwrap().len(), 1);
    }

    #[test]
    fn malformed_input_is_an_optimisation_error() {
        let err = StructuralOptimizer.optimize(b"%PDF-1.7\nnot really").unwrap_err();
        assert!(matches!(err, PagewerkError::Optimization(_)));
    }

    #[test]
    fn empty_input_is_an_optimisation_error() {
        assert!(StructuralOptimizer.optimize(&[]).is_err());
    }
}
