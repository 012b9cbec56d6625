// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: reading, page copying, merging, and composing PDFs.

pub mod merge;
pub mod reader;
pub mod writer;

pub use merge::PdfMerger;
pub use reader::PdfReader;
pub use writer::PdfWriter;
