// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// k-nearest-neighbour classification against the reference store.

use glyphscan_core::error::{GlyphscanError, Result};
use glyphscan_core::{ExampleCollection, Label, LabeledExample};
use tracing::{debug, instrument};

use crate::recognize::store::ReferenceStore;

/// Classify one glyph example.
///
/// Distances are squared Euclidean over the feature vectors of every stored
/// glyph. Neighbours are ordered by a stable sort, so equal distances keep
/// store order. The most frequent label among the first `k` wins; a tie in
/// votes goes to the label that appears first in that ordering.
pub fn classify(store: &ReferenceStore, query: &LabeledExample, k: usize) -> Result<Label> {
    if k == 0 {
        return Err(GlyphscanError::Unclassifiable("k must be at least 1".into()));
    }
    let Some(features) = &query.features else {
        return Err(GlyphscanError::Unclassifiable(
            "query has no feature vector".into(),
        ));
    };

    let mut neighbours: Vec<(f64, u8)> = store
        .iter()
        .filter_map(|example| match (example.label, &example.features) {
            (Label::Char(c), Some(stored)) => Some((stored.squared_distance(features), c)),
            _ => None,
        })
        .collect();
    if neighbours.is_empty() {
        return Err(GlyphscanError::Unclassifiable(
            "reference store is empty".into(),
        ));
    }

    neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));
    neighbours.truncate(k);

    // (label, votes) in first-seen order.
    let mut tally: Vec<(u8, usize)> = Vec::with_capacity(neighbours.len());
    for &(_, label) in &neighbours {
        match tally.iter_mut().find(|(l, _)| *l == label) {
            Some((_, votes)) => *votes += 1,
            None => tally.push((label, 1)),
        }
    }

    let mut winner = tally[0];
    for &candidate in &tally[1..] {
        if candidate.1 > winner.1 {
            winner = candidate;
        }
    }
    Ok(Label::Char(winner.0))
}

/// Resolve every unlabeled glyph in `set`. Labeled glyphs and markers pass
/// through unchanged.
#[instrument(skip_all, fields(examples = set.len(), k = k))]
pub fn label_all(
    store: &ReferenceStore,
    set: &ExampleCollection,
    k: usize,
) -> Result<ExampleCollection> {
    let mut classified = 0usize;
    let labeled = set
        .iter()
        .map(|example| {
            if example.label != Label::Unlabeled {
                return Ok(example.clone());
            }
            classified += 1;
            let label = classify(store, example, k)?;
            Ok(LabeledExample {
                label,
                features: example.features,
            })
        })
        .collect::<Result<ExampleCollection>>()?;
    debug!(classified, "Classification complete");
    Ok(labeled)
}

/// Classify `set` and render it as text: glyph labels as their characters,
/// space and newline markers as `' '` and `'\n'`.
pub fn classify_all(store: &ReferenceStore, set: &ExampleCollection, k: usize) -> Result<String> {
    Ok(label_all(store, set, k)?
        .iter()
        .filter_map(|example| example.label.as_char())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphscan_core::{FEATURE_VECTOR_LEN, FeatureVector};

    fn vector(fill: f64) -> FeatureVector {
        FeatureVector::new([fill; FEATURE_VECTOR_LEN])
    }

    fn store_of(entries: &[(f64, u8)]) -> ReferenceStore {
        let mut store = ReferenceStore::new();
        for &(fill, label) in entries {
            store
                .add_example(LabeledExample::glyph(Label::Char(label), vector(fill)))
                .expect("add");
        }
        store
    }

    fn query(fill: f64) -> LabeledExample {
        LabeledExample::glyph(Label::Unlabeled, vector(fill))
    }

    #[test]
    fn nearest_neighbour_wins_with_k_one() {
        let store = store_of(&[(0.1, b'a'), (0.5, b'b'), (0.9, b'c')]);
        assert_eq!(classify(&store, &query(0.55), 1).expect("classify"), Label::Char(b'b'));
    }

    #[test]
    fn majority_of_k_nearest() {
        let store = store_of(&[(0.50, b'x'), (0.40, b'y'), (0.41, b'y'), (0.9, b'x')]);
        // Nearest three to 0.48: x(0.50), y(0.41), y(0.40).
        assert_eq!(classify(&store, &query(0.48), 3).expect("classify"), Label::Char(b'y'));
    }

    #[test]
    fn equal_distances_keep_store_order() {
        let store = store_of(&[(0.2, b'p'), (0.2, b'q')]);
        assert_eq!(classify(&store, &query(0.2), 1).expect("classify"), Label::Char(b'p'));
        // One vote each: the first in sorted order wins.
        assert_eq!(classify(&store, &query(0.2), 2).expect("classify"), Label::Char(b'p'));
    }

    #[test]
    fn k_larger_than_store_uses_everything() {
        let store = store_of(&[(0.1, b'm'), (0.8, b'n'), (0.9, b'n')]);
        assert_eq!(classify(&store, &query(0.1), 10).expect("classify"), Label::Char(b'n'));
    }

    #[test]
    fn misuse_is_unclassifiable() {
        let store = store_of(&[(0.1, b'a')]);
        let cases = [
            classify(&store, &query(0.1), 0),
            classify(&ReferenceStore::new(), &query(0.1), 1),
            classify(&store, &LabeledExample::space(), 1),
        ];
        for result in cases {
            assert!(matches!(result, Err(GlyphscanError::Unclassifiable(_))));
        }
    }

    #[test]
    fn classify_all_renders_markers_and_keeps_labels() {
        let store = store_of(&[(0.1, b'o'), (0.9, b'k')]);
        let set: ExampleCollection = [
            query(0.15),
            LabeledExample::glyph(Label::Char(b'!'), vector(0.9)),
            LabeledExample::space(),
            query(0.85),
            LabeledExample::newline(),
        ]
        .into_iter()
        .collect();

        assert_eq!(classify_all(&store, &set, 1).expect("classify"), "o! k\n");
    }

    #[test]
    fn fully_labeled_set_needs_no_store() {
        let set: ExampleCollection = [
            LabeledExample::glyph(Label::Char(b'h'), vector(0.3)),
            LabeledExample::newline(),
        ]
        .into_iter()
        .collect();
        assert_eq!(classify_all(&ReferenceStore::new(), &set, 0).expect("classify"), "h\n");
    }
}
