//! End-to-end turn tests with a scripted model

#[cfg(test)]
mod turn_tests {
    use crate::{
        ChatAssistant, JsonFileConversationStore, MemoryConversationStore, ReferenceContext,
        SessionState, APOLOGY, EMPTY_INPUT_REPLY, QA_SECTION_HEADING,
    };
    use async_trait::async_trait;
    use gradchat_core::{
        Category, ConversationId, ConversationStore, ConversationTurn, Error, Feedback,
        FeedbackKind, FeedbackType, GenerationConfig, GenerationResult, IssueType, LLMProvider,
        NewConversationTurn, QaRecord, QueryConfig, QueryHit, Result, VectorStore,
    };
    use gradchat_rag::{LocalVectorStore, SimilarityRetriever};
    use insta::assert_yaml_snapshot;
    use std::sync::{Arc, Mutex};

    /// Answers categorization prompts with `categories` and everything else with `answer`
    struct ScriptedModel {
        categories: Option<String>,
        answer: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(categories: Option<&str>, answer: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                categories: categories.map(str::to_string),
                answer: answer.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedModel {
        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
            self.generate_with_config(prompt, &GenerationConfig::default()).await
        }

        async fn generate_with_config(
            &self,
            prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<GenerationResult> {
            self.prompts.lock().unwrap().push(prompt.to_string());

            let reply = if prompt.contains("Your question:") {
                &self.categories
            } else {
                &self.answer
            };

            reply
                .clone()
                .map(|text| GenerationResult {
                    text,
                    model_id: "scripted".to_string(),
                    tokens_used: None,
                })
                .ok_or_else(|| Error::LLMProvider("model unavailable".to_string()))
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    /// Store that refuses every write
    struct ReadOnlyStore;

    #[async_trait]
    impl ConversationStore for ReadOnlyStore {
        async fn insert(&self, _turn: NewConversationTurn) -> Result<ConversationId> {
            Err(Error::Store("disk full".to_string()))
        }

        async fn update_feedback(&self, _id: &ConversationId, _feedback: Feedback) -> Result<()> {
            Err(Error::Store("disk full".to_string()))
        }

        async fn get(&self, _id: &ConversationId) -> Result<Option<ConversationTurn>> {
            Ok(None)
        }
    }

    /// Index whose searches always fail
    struct UnreachableIndex;

    #[async_trait]
    impl VectorStore for UnreachableIndex {
        async fn reset_collection(&self) -> Result<()> {
            Ok(())
        }

        async fn add(&self, records: &[QaRecord]) -> Result<usize> {
            Ok(records.len())
        }

        async fn query(&self, _text: &str, _config: &QueryConfig) -> Result<Vec<QueryHit>> {
            Err(Error::VectorStore("connection refused".to_string()))
        }

        async fn count(&self) -> Result<usize> {
            Ok(3)
        }

        fn collection_name(&self) -> &str {
            "unreachable"
        }
    }

    fn records() -> Vec<QaRecord> {
        [
            (
                "Application Process",
                "What GRE score do I need to apply?",
                "The GRE is optional for the MSDS program.",
            ),
            (
                "International Students",
                "What TOEFL score do international students need?",
                "A TOEFL score of 92 or higher.",
            ),
            (
                "Curriculum",
                "Which programming languages are taught?",
                "Python, SQL and R.",
            ),
        ]
        .into_iter()
        .map(|(category, question, answer)| QaRecord {
            category: category.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
        })
        .collect()
    }

    fn reference() -> Arc<ReferenceContext> {
        Arc::new(
            ReferenceContext::from_parts(
                r#"{
                    "Application Process": {"deadline": "Rolling admissions"},
                    "International Students": {"english": "TOEFL 92"}
                }"#,
                "The MSDS program is located in downtown San Francisco.",
            )
            .unwrap(),
        )
    }

    async fn assistant_with(
        model: Arc<ScriptedModel>,
        store: Arc<dyn ConversationStore>,
    ) -> ChatAssistant {
        let retriever = SimilarityRetriever::new(Arc::new(LocalVectorStore::new("turn_tests")));
        retriever.index(&records()).await.unwrap();
        ChatAssistant::new(model, retriever, reference(), store).unwrap()
    }

    #[tokio::test]
    async fn test_gre_question_end_to_end() {
        let model = ScriptedModel::new(
            Some("Application Process, International Students"),
            Some("<div>The GRE is optional.</div>"),
        );
        let store = Arc::new(MemoryConversationStore::new());
        let assistant = assistant_with(model.clone(), store.clone()).await;

        let mut session = SessionState::with_id("20261017-100000");
        session.record_turn("Hi", "Hello! Ask me about the MSDS program.", None);

        let outcome = assistant
            .handle_turn(&mut session, "What GRE score do I need to apply?")
            .await;

        let categorization = outcome.categorization.clone().unwrap();
        assert_eq!(categorization.primary, Category::ApplicationProcess);
        assert_eq!(
            categorization.categories,
            vec![Category::ApplicationProcess, Category::InternationalStudents]
        );
        assert!(outcome.notices.is_empty());
        assert_eq!(outcome.response, "The GRE is optional.");
        assert_eq!(
            outcome.retrieval.questions[0],
            "What GRE score do I need to apply?"
        );

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2, "one categorization and one generation call");
        let prompt = &prompts[1];
        assert!(prompt.contains("Recent conversation history:\nUser: Hi\n"));
        assert!(prompt.contains("\"deadline\": \"Rolling admissions\""));
        assert!(prompt.contains(QA_SECTION_HEADING));
        assert!(prompt.contains("Primary Category: Application Process"));

        let id = outcome.conversation_id.unwrap();
        let saved = store.get(&id).await.unwrap().unwrap();
        assert_eq!(saved.bot_response, "<div>The GRE is optional.</div>");
        assert!(saved.response_time_seconds >= 0.0);
        assert!(saved.similarity_score > 0.9);
        assert!(saved.matched_question.starts_with("1. What GRE score do I need to apply?"));

        assert_eq!(session.turn_count(), 2);
        assert_eq!(session.conversation_id(1), Some(&id));
        assert_eq!(
            session.debug.category,
            "Application Process (Related: International Students)"
        );
    }

    #[tokio::test]
    async fn test_international_gre_question_stays_in_detected_categories() {
        let model = ScriptedModel::new(
            Some("Application Process, International Students"),
            Some("International applicants may submit GRE scores; they are optional."),
        );
        let store = Arc::new(MemoryConversationStore::new());
        let assistant = assistant_with(model, store.clone()).await;
        let mut session = SessionState::with_id("20261017-110000");

        let outcome = assistant
            .handle_turn(
                &mut session,
                "What GRE score do I need as an international student?",
            )
            .await;

        assert!(outcome.notices.is_empty());
        let categorization = outcome.categorization.clone().unwrap();
        assert_eq!(categorization.categories[0], Category::ApplicationProcess);
        assert_eq!(
            categorization.categories,
            vec![Category::ApplicationProcess, Category::InternationalStudents]
        );

        let retrieval = &outcome.retrieval;
        assert!(!retrieval.is_empty());
        assert_eq!(retrieval.questions[0], "What GRE score do I need to apply?");
        for category in &retrieval.categories {
            assert!(
                category == "Application Process" || category == "International Students",
                "{} was not detected",
                category
            );
        }
        assert!(!retrieval
            .questions
            .contains(&"Which programming languages are taught?".to_string()));

        let saved = store
            .get(&outcome.conversation_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(!saved.bot_response.trim().is_empty());
        assert_eq!(saved.bot_response, outcome.raw_response);
        assert_eq!(
            saved.response_time_seconds,
            outcome.response_time.as_secs_f64()
        );
    }

    #[tokio::test]
    async fn test_unreachable_index_still_answers() {
        let model = ScriptedModel::new(Some("Curriculum"), Some("Python, SQL and R."));
        let store = Arc::new(MemoryConversationStore::new());
        let retriever = SimilarityRetriever::new(Arc::new(UnreachableIndex));
        let assistant = ChatAssistant::new(model.clone(), retriever, reference(), store.clone())
            .unwrap();
        let mut session = SessionState::with_id("s");

        let outcome = assistant
            .handle_turn(&mut session, "Which languages are taught?")
            .await;

        assert_eq!(outcome.notices.len(), 1);
        assert!(outcome.notices[0].starts_with("Error finding similar questions"));
        assert!(outcome.retrieval.is_empty());
        assert_eq!(outcome.response, "Python, SQL and R.");
        assert!(!model.prompts()[1].contains(QA_SECTION_HEADING));
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_model_outage_degrades_every_stage() {
        let model = ScriptedModel::new(None, None);
        let store = Arc::new(MemoryConversationStore::new());
        let assistant = assistant_with(model, store.clone()).await;
        let mut session = SessionState::with_id("s");

        let outcome = assistant
            .handle_turn(&mut session, "Which programming languages are taught?")
            .await;

        assert_eq!(outcome.response, APOLOGY);
        assert_eq!(
            outcome.categorization.unwrap().categories,
            vec![Category::Other]
        );
        assert_eq!(outcome.notices.len(), 2);
        assert!(outcome.notices[0].starts_with("Error categorizing query"));
        assert!(outcome.notices[1].starts_with("Error generating response"));

        // Other disables the filter, so the curriculum record is still found
        assert_eq!(
            outcome.retrieval.questions[0],
            "Which programming languages are taught?"
        );
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_input_is_not_a_turn() {
        let model = ScriptedModel::new(Some("Curriculum"), Some("answer"));
        let store = Arc::new(MemoryConversationStore::new());
        let assistant = assistant_with(model.clone(), store.clone()).await;
        let mut session = SessionState::with_id("s");

        let outcome = assistant.handle_turn(&mut session, "   ").await;

        assert_eq!(outcome.response, EMPTY_INPUT_REPLY);
        assert!(model.prompts().is_empty());
        assert!(store.all().await.is_empty());
        assert_eq!(session.turn_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_feedback_aligned() {
        let model = ScriptedModel::new(Some("Curriculum"), Some("Python, SQL and R."));
        let assistant = assistant_with(model, Arc::new(ReadOnlyStore)).await;
        let mut session = SessionState::with_id("s");

        let outcome = assistant
            .handle_turn(&mut session, "Which languages are taught?")
            .await;

        assert!(outcome.conversation_id.is_none());
        assert!(outcome.notices[0].starts_with("Error saving conversation"));
        assert_eq!(session.turn_count(), 1);

        let err = assistant
            .submit_feedback(&session, 0, FeedbackKind::ThumbsUp)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_feedback_on_turns() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            JsonFileConversationStore::open(dir.path().join("conversations.json"))
                .await
                .unwrap(),
        );
        let model = ScriptedModel::new(Some("Curriculum"), Some("Python, SQL and R."));
        let assistant = assistant_with(model, store.clone()).await;
        let mut session = SessionState::with_id("s");

        assistant.handle_turn(&mut session, "first question").await;
        assistant.handle_turn(&mut session, "second question").await;

        let second = assistant
            .submit_feedback(
                &session,
                1,
                FeedbackKind::Report {
                    issue_type: IssueType::MissingInformation,
                    description: "no tuition numbers".to_string(),
                },
            )
            .await
            .unwrap();

        let stored = store.get(&second).await.unwrap().unwrap();
        assert_eq!(stored.user_message, "second question");
        assert_yaml_snapshot!(stored.feedback, {
            ".timestamp" => "[timestamp]",
        }, @r###"
        ---
        feedback_type: report
        reaction: report
        issue_type: Missing Information
        description: no tuition numbers
        timestamp: "[timestamp]"
        "###);

        let first = session.conversation_id(0).unwrap();
        assert!(store.get(first).await.unwrap().unwrap().feedback.is_none());

        let missing = assistant
            .submit_feedback(&session, 2, FeedbackKind::ThumbsDown)
            .await;
        assert!(missing.is_err());

        assistant
            .submit_feedback(&session, 1, FeedbackKind::ThumbsDown)
            .await
            .unwrap();
        let stored = store.get(&second).await.unwrap().unwrap();
        assert_eq!(stored.feedback.unwrap().feedback_type, FeedbackType::Negative);
        assert!(stored.last_updated.is_some());
    }
}
