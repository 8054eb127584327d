use proptest::prelude::*;
use rulewright_core::{
    extract_phrases, rank_fields, select_snippets, similarity_matrix, Embedding, FieldCatalog,
    MappingThresholds,
};

const DIMS: usize = 8;

fn embedding() -> impl Strategy<Value = Embedding> {
    prop::collection::vec(-1.0f32..1.0, DIMS)
}

proptest! {
    #[test]
    fn phrases_never_empty(prompt in ".{0,120}") {
        prop_assert!(!extract_phrases(&prompt).is_empty());
    }

    #[test]
    fn phrases_are_trimmed(prompt in "[a-z ,.]{0,80}") {
        for phrase in extract_phrases(&prompt) {
            prop_assert_eq!(phrase.trim(), phrase.as_str());
        }
    }

    #[test]
    fn similarity_dimensions_match_inputs(
        a in prop::collection::vec(embedding(), 0..5),
        b in prop::collection::vec(embedding(), 0..5),
    ) {
        let m = similarity_matrix(&a, &b);
        prop_assert_eq!(m.rows(), a.len());
        prop_assert_eq!(m.cols(), b.len());
        for r in 0..m.rows() {
            for &s in m.row(r) {
                prop_assert!(s.is_finite());
                prop_assert!((-1.0001..=1.0001).contains(&s));
            }
        }
    }

    #[test]
    fn candidates_are_catalog_fields_backed_by_mappings(
        phrase_embeddings in prop::collection::vec(embedding(), 1..5),
        seed in prop::collection::vec(embedding(), 20),
    ) {
        let catalog = FieldCatalog::builtin().unwrap();
        let field_embeddings: Vec<Embedding> = seed.into_iter().take(catalog.len()).collect();
        let phrases: Vec<String> =
            (0..phrase_embeddings.len()).map(|i| format!("phrase {i}")).collect();
        let thresholds = MappingThresholds::default();

        let mapping = rank_fields(
            &phrases,
            &phrase_embeddings,
            &catalog,
            &field_embeddings,
            &thresholds,
        );

        let mut seen = std::collections::HashSet::new();
        for field in &mapping.candidate_fields {
            prop_assert!(catalog.contains(field));
            prop_assert!(seen.insert(field.clone()));
            prop_assert!(mapping
                .mappings
                .iter()
                .any(|m| &m.mapped_field == field && m.similarity >= thresholds.relaxed));
        }

        prop_assert!(mapping.max_similarity >= 0.0);
        prop_assert!(mapping.mappings.len() <= phrases.len() * thresholds.fields_per_phrase);
        prop_assert!(mapping
            .mappings
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn confidence_is_bounded_mean_of_top_window(
        phrase_embeddings in prop::collection::vec(embedding(), 1..4),
        seed in prop::collection::vec(embedding(), 20),
    ) {
        let catalog = FieldCatalog::builtin().unwrap();
        let field_embeddings: Vec<Embedding> = seed.into_iter().take(catalog.len()).collect();
        let phrases: Vec<String> =
            (0..phrase_embeddings.len()).map(|i| format!("p{i}")).collect();
        let thresholds = MappingThresholds::default();

        let mapping = rank_fields(
            &phrases,
            &phrase_embeddings,
            &catalog,
            &field_embeddings,
            &thresholds,
        );
        let confidence = mapping.confidence(thresholds.confidence_window);
        prop_assert!((0.0..=1.0).contains(&confidence));

        let top: Vec<f32> = mapping
            .mappings
            .iter()
            .take(thresholds.confidence_window)
            .map(|m| m.similarity)
            .collect();
        let mean = top.iter().sum::<f32>() / top.len() as f32;
        prop_assert!((confidence - mean.clamp(0.0, 1.0)).abs() < 1e-5);
    }

    #[test]
    fn retriever_returns_min_of_three_and_total(
        query in embedding(),
        documents in prop::collection::vec(embedding(), 0..8),
    ) {
        let texts: Vec<String> = (0..documents.len()).map(|i| format!("doc {i}")).collect();
        let selected = select_snippets(&query, &texts, &documents, 3);
        prop_assert_eq!(selected.len(), documents.len().min(3));
    }
}

#[test]
fn verbatim_labels_become_candidates() {
    let catalog = FieldCatalog::builtin().unwrap();
    let dims = catalog.len();
    let field_embeddings: Vec<Embedding> = (0..dims)
        .map(|i| {
            let mut v = vec![0.0; dims];
            v[i] = 1.0;
            v
        })
        .collect();

    // A phrase that names a field verbatim embeds onto that field's vector.
    let phrases: Vec<String> = catalog.fields().iter().map(|f| f.label.clone()).collect();
    let mapping = rank_fields(
        &phrases,
        &field_embeddings,
        &catalog,
        &field_embeddings,
        &MappingThresholds::default(),
    );

    for value in catalog.values() {
        assert!(mapping.candidate_fields.iter().any(|c| c == value));
    }
}
