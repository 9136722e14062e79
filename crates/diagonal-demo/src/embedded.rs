#![forbid(unsafe_code)]

//! Corpus compiled into the binary.
//!
//! The code panel scrolls Diagonal's own sources; the writing panel scrolls
//! the samples under `assets/writing`.

use diagonal_core::{Corpus, Document};

const CODE: &[(&str, &str)] = &[
    (
        "diagonal-core/src/window.rs",
        include_str!("../../diagonal-core/src/window.rs"),
    ),
    (
        "diagonal-core/src/document.rs",
        include_str!("../../diagonal-core/src/document.rs"),
    ),
    (
        "diagonal-core/src/corpus.rs",
        include_str!("../../diagonal-core/src/corpus.rs"),
    ),
    (
        "diagonal-render/src/reconcile.rs",
        include_str!("../../diagonal-render/src/reconcile.rs"),
    ),
    (
        "diagonal-render/src/layout.rs",
        include_str!("../../diagonal-render/src/layout.rs"),
    ),
    (
        "diagonal-runtime/src/schedule.rs",
        include_str!("../../diagonal-runtime/src/schedule.rs"),
    ),
    (
        "diagonal-runtime/src/driver.rs",
        include_str!("../../diagonal-runtime/src/driver.rs"),
    ),
    (
        "diagonal-runtime/src/animator.rs",
        include_str!("../../diagonal-runtime/src/animator.rs"),
    ),
];

const WRITING: &[(&str, &str)] = &[
    ("margins", include_str!("../assets/writing/margins.txt")),
    ("tide", include_str!("../assets/writing/tide.txt")),
    ("lanterns", include_str!("../assets/writing/lanterns.txt")),
    ("letters", include_str!("../assets/writing/letters.txt")),
];

fn seeded(seed: Option<u64>) -> Corpus {
    match seed {
        Some(seed) => Corpus::with_seed(seed),
        None => Corpus::new(),
    }
}

/// Rust sources, one document per file.
pub fn code_corpus(seed: Option<u64>) -> Corpus {
    seeded(seed).with_source(
        "rust",
        CODE.iter()
            .map(|(name, text)| Document::from_code(*name, text)),
    )
}

/// Prose samples, one document per file.
pub fn writing_corpus(seed: Option<u64>) -> Corpus {
    // Distinct stream per panel.
    seeded(seed.map(|s| s.wrapping_add(1))).with_source(
        "samples",
        WRITING
            .iter()
            .map(|(name, text)| Document::from_prose(*name, text)),
    )
}
