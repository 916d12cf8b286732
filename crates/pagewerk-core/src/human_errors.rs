// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how a front end presents it.

use crate::error::PagewerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth trying again as-is.
    Transient,
    /// The user must change their input or settings first.
    ActionRequired,
    /// Cannot be fixed by retrying, e.g. a damaged file.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying without changes may succeed.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `PagewerkError` into a `HumanError`.
pub fn humanize_error(err: &PagewerkError) -> HumanError {
    match err {
        // -- Pre-flight validation --
        PagewerkError::EmptyInput => HumanError {
            message: "There are no images to convert.".into(),
            suggestion: "Please add at least one image, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PagewerkError::InvalidName(_) => HumanError {
            message: "The file name is empty.".into(),
            suggestion: "Type a name for the PDF, for example \"holiday-photos\".".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PagewerkError::InvalidQuality(value) => HumanError {
            message: "That quality setting isn't supported.".into(),
            suggestion: format!("Choose a quality between 10% and 100% (you chose {value}%)."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PagewerkError::InvalidIndex { .. } => HumanError {
            message: "That image position doesn't exist.".into(),
            suggestion: "Refresh the image list and try moving the image again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Pipeline stages --
        PagewerkError::Compression(_) | PagewerkError::Optimization(_) => HumanError {
            message: "Part of the file couldn't be made smaller.".into(),
            suggestion: "Your PDF was still created, it may just be a little larger than expected.".into(),
            retriable: false,
            severity: Severity::Transient,
        },

        PagewerkError::Assembly(_) => HumanError {
            message: "An error occurred while converting images to PDF.".into(),
            suggestion: "One of the images may be damaged or in an unusual format. Try removing it, or save it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PagewerkError::Delivery(_) => HumanError {
            message: "The PDF was created but couldn't be saved.".into(),
            suggestion: "Check there is enough free space and that you can write to the output folder, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Codec errors --
        PagewerkError::ImageError(_) => HumanError {
            message: "One of the images couldn't be read.".into(),
            suggestion: "Open it in an image viewer to check it isn't damaged, or re-save it as PNG or JPEG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PagewerkError::PdfError(_) => HumanError {
            message: "The finished PDF couldn't be read back.".into(),
            suggestion: "The file may be damaged. Try converting the images again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Storage --
        PagewerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "An image file is missing.".into(),
                suggestion: "Check the path is spelled correctly and the file still exists.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Pagewerk doesn't have permission to use that file.".into(),
                suggestion: "Check you can read the images and write to the output folder.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Reading or writing a file failed.".into(),
                suggestion: "Try again. If this keeps happening, your storage may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        PagewerkError::Serialization(_) => HumanError {
            message: "The saved settings couldn't be read.".into(),
            suggestion: "Default settings will be used. Save your settings again to replace the damaged file.".into(),
            retriable: false,
            severity: Severity::Transient,
        },
    }
}
