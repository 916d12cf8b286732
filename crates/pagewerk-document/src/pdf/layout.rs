// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry — fit an image onto a page and centre it.
//
// One image pixel maps to one PostScript point. Images are only ever scaled
// down, never up.

use pagewerk_core::types::{PageSize, PixelSize};
use serde::{Deserialize, Serialize};

/// Placement of an image on a page, in points from the page origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageRect {
    /// Whether the image was shrunk to fit.
    pub fn is_scaled(&self, image: PixelSize) -> bool {
        self.width < image.width as f32 || self.height < image.height as f32
    }
}

/// Place an `img_width` × `img_height` image centred on a
/// `page_width` × `page_height` page.
pub fn layout(page_width: f32, page_height: f32, img_width: f32, img_height: f32) -> PageRect {
    let (width, height) = if img_width > page_width || img_height > page_height {
        let ratio = (page_width / img_width).min(page_height / img_height);
        (img_width * ratio, img_height * ratio)
    } else {
        (img_width, img_height)
    };

    PageRect {
        x: (page_width - width) / 2.0,
        y: (page_height - height) / 2.0,
        width,
        height,
    }
}

/// [`layout`] for typed page and image sizes.
pub fn place(page: PageSize, image: PixelSize) -> PageRect {
    layout(
        page.width_pt,
        page.height_pt,
        image.width as f32,
        image.height as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewerk_core::types::{Orientation, PageFormat};

    fn a4_portrait() -> PageSize {
        PageSize::for_format(PageFormat::A4, Orientation::Portrait)
    }

    #[test]
    fn fitting_image_keeps_native_size_and_is_centred() {
        let rect = layout(600.0, 800.0, 200.0, 100.0);
        assert_eq!(rect, PageRect { x: 200.0, y: 350.0, width: 200.0, height: 100.0 });
    }

    #[test]
    fn never_upscales() {
        let page = a4_portrait();
        for (w, h) in [(1, 1), (100, 841), (595, 841), (500, 500), (10, 800)] {
            let rect = place(page, PixelSize::new(w, h));
            assert_eq!((rect.width, rect.height), (w as f32, h as f32));
            assert!(!rect.is_scaled(PixelSize::new(w, h)));
        }
    }

    #[test]
    fn wide_image_is_limited_by_width() {
        let page = a4_portrait();
        let image = PixelSize::new(2000, 1000);
        let rect = place(page, image);

        let ratio = page.width_pt / 2000.0;
        assert!(rect.is_scaled(image));
        assert!((rect.width - page.width_pt).abs() < 1e-3);
        assert!((rect.height - 1000.0 * ratio).abs() < 1e-3);
        assert!(rect.x.abs() < 1e-3);
        assert!((rect.y - (page.height_pt - rect.height) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn tall_image_is_limited_by_height() {
        let rect = layout(600.0, 800.0, 400.0, 1600.0);
        assert_eq!(rect.height, 800.0);
        assert_eq!(rect.width, 200.0);
        assert_eq!(rect.x, 200.0);
        assert_eq!(rect.y, 0.0);
    }

    #[test]
    fn overflow_on_one_axis_scales_both() {
        // Fits vertically but not horizontally.
        let rect = layout(600.0, 800.0, 1200.0, 100.0);
        assert_eq!(rect.width, 600.0);
        assert_eq!(rect.height, 50.0);
    }

    #[test]
    fn scaled_rect_stays_on_page() {
        let page = PageSize::for_format(PageFormat::A5, Orientation::Landscape);
        for (w, h) in [(4000, 3000), (1920, 1080), (300, 9000), (9000, 300)] {
            let rect = place(page, PixelSize::new(w, h));
            assert!(rect.x >= -1e-3 && rect.y >= -1e-3);
            assert!(rect.x + rect.width <= page.width_pt + 1e-3);
            assert!(rect.y + rect.height <= page.height_pt + 1e-3);
        }
    }
}
