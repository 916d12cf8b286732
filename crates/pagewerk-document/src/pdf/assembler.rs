// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler — one image per page using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: each page is a `PdfPage` holding a
// `Vec<Op>`, images are registered once as XObjects, and the whole document
// is serialised by `PdfDocument::save()`.

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{PageSize, Quality};
use printpdf::{
    ImageCompression, ImageOptimizationOptions, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions,
    PdfWarnMsg, Pt, RawImage, RawImageData, RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use super::layout::PageRect;

/// Points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

/// At 72 DPI one image pixel is one point, so the rect size is the scale.
const NATIVE_DPI: f32 = 72.0;

/// An encoded image and where it goes on its page.
#[derive(Debug, Clone, Copy)]
pub struct PlacedImage<'a> {
    pub bytes: &'a [u8],
    pub rect: PageRect,
}

/// Builds a PDF with one centred image per page.
pub struct PageAssembler {
    /// Size shared by every page.
    page_size: PageSize,
    /// JPEG quality for embedded images.
    embed_quality: Quality,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PageAssembler {
    pub fn new(page_size: PageSize, embed_quality: Quality) -> Self {
        Self {
            page_size: whole_points(page_size),
            embed_quality,
            title: "Pagewerk Document".to_owned(),
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Page size as written to each MediaBox. Lay pages out against this,
    /// not the nominal format size.
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Page dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        (
            Mm(self.page_size.width_pt / PT_PER_MM),
            Mm(self.page_size.height_pt / PT_PER_MM),
        )
    }

    /// Assemble `images` into a PDF, one page each, in the order given.
    ///
    /// Fails if the list is empty or any image cannot be decoded; no partial
    /// document is ever returned.
    #[instrument(skip_all, fields(pages = images.len(), quality = self.embed_quality.percent()))]
    pub fn assemble(&self, images: &[PlacedImage<'_>]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(PagewerkError::Assembly("no pages to assemble".into()));
        }

        let (page_w, page_h) = self.page_dimensions();
        let mut doc = PdfDocument::new(&self.title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());

        for (index, placed) in images.iter().enumerate() {
            let raw = decode_raw(placed.bytes).map_err(|err| {
                PagewerkError::Assembly(format!("page {}: {}", index + 1, err))
            })?;
            let (img_w, img_h) = (raw.width as f32, raw.height as f32);
            let xobject_id = doc.add_image(&raw);

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(placed.rect.x)),
                    translate_y: Some(Pt(placed.rect.y)),
                    scale_x: Some(placed.rect.width / img_w),
                    scale_y: Some(placed.rect.height / img_h),
                    dpi: Some(NATIVE_DPI),
                    rotate: None,
                },
            }];
            pages.push(PdfPage::new(page_w, page_h, ops));

            debug!(
                page = index + 1,
                width = placed.rect.width,
                height = placed.rect.height,
                "Image placed on page"
            );
        }

        doc.with_pages(pages);

        let options = PdfSaveOptions {
            image_optimization: Some(ImageOptimizationOptions {
                quality: Some(self.embed_quality.as_fraction()),
                format: Some(ImageCompression::Jpeg),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&options, &mut warnings);

        if output.is_empty() {
            return Err(PagewerkError::Assembly("serialiser produced no output".into()));
        }

        info!(
            pages = images.len(),
            bytes_len = output.len(),
            warnings = warnings.len(),
            "PDF assembled"
        );
        Ok(output)
    }
}

/// printpdf writes MediaBox entries as whole points.
fn whole_points(page: PageSize) -> PageSize {
    PageSize {
        width_pt: page.width_pt.round(),
        height_pt: page.height_pt.round(),
    }
}

/// Decode encoded image bytes into printpdf's RGB8 raw image.
fn decode_raw(bytes: &[u8]) -> Result<RawImage> {
    let dynamic_image = ::image::load_from_memory(bytes)
        .map_err(|err| PagewerkError::ImageError(format!("failed to decode image for PDF: {}", err)))?;

    let width = dynamic_image.width() as usize;
    let height = dynamic_image.height() as usize;
    if width == 0 || height == 0 {
        return Err(PagewerkError::ImageError("image has no pixels".into()));
    }

    let rgb_image = dynamic_image.to_rgb8();
    Ok(RawImage {
        pixels: RawImageData::U8(rgb_image.into_raw()),
        width,
        height,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    })
}
