//! Retrieval tests against the in-memory store

#[cfg(test)]
mod retrieval_tests {
    use crate::{
        Category, Error, LocalVectorStore, QaRecord, QueryConfig, QueryHit, Result,
        SimilarityRetriever, VectorStore,
    };
    use async_trait::async_trait;
    use insta::assert_yaml_snapshot;
    use std::sync::Arc;

    fn record(category: &str, question: &str, answer: &str) -> QaRecord {
        QaRecord {
            category: category.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    fn program_records() -> Vec<QaRecord> {
        vec![
            record(
                "Application Process",
                "What GRE score do I need to apply?",
                "The GRE is optional; competitive applicants often submit scores above 310.",
            ),
            record(
                "International Students",
                "Do international students need the TOEFL?",
                "Yes, a minimum TOEFL score of 92 is required.",
            ),
            record(
                "Tuition & Costs",
                "How much is tuition for the program?",
                "Tuition is charged per unit.",
            ),
            record(
                "Curriculum",
                "Which programming languages are taught?",
                "Python, SQL and R.",
            ),
        ]
    }

    async fn indexed_retriever() -> SimilarityRetriever {
        let store: Arc<dyn VectorStore> = Arc::new(LocalVectorStore::new("test_qa"));
        let retriever = SimilarityRetriever::new(store);
        retriever.index(&program_records()).await.unwrap();
        retriever
    }

    /// Store whose every call fails
    struct BrokenStore;

    #[async_trait]
    impl VectorStore for BrokenStore {
        async fn reset_collection(&self) -> Result<()> {
            Err(Error::VectorStore("connection refused".to_string()))
        }

        async fn add(&self, _records: &[QaRecord]) -> Result<usize> {
            Err(Error::VectorStore("connection refused".to_string()))
        }

        async fn query(&self, _text: &str, _config: &QueryConfig) -> Result<Vec<QueryHit>> {
            Err(Error::VectorStore("connection refused".to_string()))
        }

        async fn count(&self) -> Result<usize> {
            Ok(3)
        }

        fn collection_name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_empty_source_returns_nothing() {
        let store: Arc<dyn VectorStore> = Arc::new(LocalVectorStore::new("empty"));
        let retriever = SimilarityRetriever::new(store);
        assert_eq!(retriever.index(&[]).await.unwrap(), 0);

        let retrieval = retriever
            .retrieve("What GRE score do I need?", &[Category::ApplicationProcess])
            .await
            .unwrap();

        assert!(retrieval.questions.is_empty());
        assert!(retrieval.answers.is_empty());
        assert_eq!(retrieval.best_similarity, 0.0);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let retriever = SimilarityRetriever::new(Arc::new(BrokenStore));

        let err = retriever
            .retrieve("tuition", &[Category::Other])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
    }

    #[tokio::test]
    async fn test_unrelated_questions_stay_below_threshold() {
        let store: Arc<dyn VectorStore> = Arc::new(LocalVectorStore::new("tuition_only"));
        let retriever = SimilarityRetriever::new(store);
        retriever
            .index(&[record(
                "Tuition & Costs",
                "What is the tuition for the MSDS program?",
                "Tuition is charged per unit.",
            )])
            .await
            .unwrap();

        for unrelated in ["what is the weather for the weekend?", "what is the name of the dean?"] {
            let retrieval = retriever.retrieve(unrelated, &[Category::Other]).await.unwrap();
            assert!(retrieval.is_empty(), "{} matched", unrelated);
        }

        let related = retriever
            .retrieve("how much is msds tuition?", &[Category::Other])
            .await
            .unwrap();
        assert_eq!(related.len(), 1);
    }

    #[tokio::test]
    async fn test_similarities_respect_threshold_and_bounds() {
        let retriever = indexed_retriever().await;

        for threshold in [0.0, 0.3, 0.6, 0.95] {
            let retriever = SimilarityRetriever::new(Arc::new(LocalVectorStore::new("t")))
                .with_threshold(threshold);
            retriever.index(&program_records()).await.unwrap();

            let retrieval = retriever
                .retrieve("what gre score do i need to apply", &[Category::Other])
                .await
                .unwrap();

            for similarity in &retrieval.similarities {
                assert!(*similarity >= threshold);
                assert!((0.0..=1.0).contains(similarity));
            }
            assert!(retrieval.best_similarity <= 1.0);
        }

        let exact = retriever
            .retrieve("What GRE score do I need to apply?", &[Category::Other])
            .await
            .unwrap();
        assert_eq!(exact.questions[0], "What GRE score do I need to apply?");
        assert!((exact.best_similarity - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_category_filter_limits_matches() {
        let retriever = indexed_retriever().await.with_threshold(0.0);

        let retrieval = retriever
            .retrieve(
                "what gre score do i need as an international student",
                &[Category::ApplicationProcess, Category::InternationalStudents],
            )
            .await
            .unwrap();

        assert!(!retrieval.is_empty());
        assert!(retrieval
            .categories
            .iter()
            .all(|c| c == "Application Process" || c == "International Students"));
        assert_eq!(retrieval.categories[0], "Application Process");
    }

    #[tokio::test]
    async fn test_exact_match_snapshot() {
        let retriever = indexed_retriever().await.with_threshold(0.9);

        let retrieval = retriever
            .retrieve("How much is tuition for the program?", &[Category::TuitionAndCosts])
            .await
            .unwrap();

        assert_yaml_snapshot!(retrieval, {
            ".similarities[]" => "[similarity]",
            ".best_similarity" => "[similarity]",
        }, @r###"
        ---
        questions:
          - How much is tuition for the program?
        answers:
          - Tuition is charged per unit.
        categories:
          - Tuition & Costs
        similarities:
          - "[similarity]"
        best_similarity: "[similarity]"
        "###);
    }
}
