//! Integration tests for the conversation orchestrator
//!
//! Drives `Chatbot` end to end with deterministic model doubles: validation,
//! windowing, summary, clear/export, failure mapping and per-session
//! serialization.

use std::sync::Arc;
use std::time::Duration;

use membot::chat::{Chatbot, ErrorKind};
use membot::config::{Config, MemoryConfig};
use membot::llm::{ChatModel, Summarizer};
use membot::memory::{NO_HISTORY_SUMMARY, Role};
use membot::testing::{EchoModel, FailingModel, FailingSummarizer, MockSummarizer, SlowModel};

// =============================================================================
// Test Fixtures
// =============================================================================

fn config_with_window(window_size: usize) -> Config {
    Config {
        memory: MemoryConfig {
            window_size,
            ..MemoryConfig::default()
        },
        ..Config::default()
    }
}

fn chatbot_with(model: Arc<dyn ChatModel>, summarizer: Arc<dyn Summarizer>) -> Chatbot {
    Chatbot::new(&Config::default(), model, summarizer)
}

fn echo_chatbot() -> Chatbot {
    chatbot_with(Arc::new(EchoModel::new()), Arc::new(MockSummarizer::new()))
}

// =============================================================================
// Input Validation
// =============================================================================

#[tokio::test]
async fn test_greeting_then_oversized_input() {
    let bot = echo_chatbot();

    let outcome = bot.chat("Hello, how are you?").await;
    assert!(outcome.success);
    assert!(!outcome.response.is_empty());
    assert_eq!(outcome.memory_stats.unwrap().total_messages, 2);

    let outcome = bot.chat(&"a".repeat(1200)).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::InvalidInput));
    assert!(outcome.memory_stats.is_none());

    assert_eq!(bot.stats().await.total_messages, 2);
}

#[tokio::test]
async fn test_denylisted_input_is_not_stored() {
    let model = Arc::new(EchoModel::new());
    let bot = chatbot_with(model.clone(), Arc::new(MockSummarizer::new()));

    let outcome = bot.chat("<script>alert('x')</script>").await;

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::InvalidInput));
    assert!(bot.window().await.is_empty());
    assert_eq!(bot.stats().await.conversation_metadata.message_count, 0);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_blank_input_is_rejected() {
    let bot = echo_chatbot();
    let outcome = bot.chat("   \n\t ").await;

    assert_eq!(outcome.error, Some(ErrorKind::InvalidInput));
    assert!(bot.window().await.is_empty());
}

#[tokio::test]
async fn test_input_at_limit_is_accepted() {
    let bot = echo_chatbot();
    let outcome = bot.chat(&"b".repeat(1000)).await;
    assert!(outcome.success);
}

// =============================================================================
// Windowing and Summary
// =============================================================================

#[tokio::test]
async fn test_window_length_tracks_exchanges() {
    let window_size = 4;
    let bot = Chatbot::new(
        &config_with_window(window_size),
        Arc::new(EchoModel::new()),
        Arc::new(MockSummarizer::new()),
    );

    for k in 1..=5usize {
        let outcome = bot.chat(&format!("question {k}")).await;
        assert!(outcome.success);
        assert_eq!(
            outcome.memory_stats.unwrap().total_messages,
            (2 * k).min(window_size)
        );
    }

    let window = bot.window().await;
    assert_eq!(window.first().unwrap().content, "question 4");
    assert_eq!(window.last().unwrap().content, "Echo: question 5");

    let stats = bot.stats().await;
    assert_eq!(stats.conversation_metadata.message_count, 10);
}

#[tokio::test]
async fn test_default_window_keeps_ten_exchanges() {
    let bot = echo_chatbot();

    for k in 1..=10 {
        assert!(bot.chat(&format!("question {k}")).await.success);
    }

    let window = bot.window().await;
    assert_eq!(window.len(), 20);
    assert_eq!(window[0].content, "question 1");
    assert_eq!(bot.history().await.len(), 10);

    bot.chat("question 11").await;
    let window = bot.window().await;
    assert_eq!(window.len(), 20);
    assert_eq!(window[0].content, "question 2");
}

#[tokio::test]
async fn test_model_sees_window_including_new_turn() {
    let model = Arc::new(EchoModel::new());
    let bot = chatbot_with(model.clone(), Arc::new(MockSummarizer::new()));

    bot.chat("one").await;
    bot.chat("two").await;

    assert_eq!(model.window_lengths(), vec![1, 3]);
}

#[tokio::test]
async fn test_summary_covers_evicted_turns() {
    let bot = Chatbot::new(
        &config_with_window(2),
        Arc::new(EchoModel::new()),
        Arc::new(MockSummarizer::new()),
    );

    bot.chat("My name is Sam").await;
    bot.chat("I like Rust").await;
    let outcome = bot.chat("What do I like?").await;

    assert_eq!(
        outcome.conversation_summary.unwrap(),
        "My name is Sam | I like Rust | What do I like?"
    );
    assert_eq!(bot.window().await.len(), 2);
}

#[tokio::test]
async fn test_oversized_reply_is_not_stored() {
    let model = Arc::new(EchoModel::with_reply("z".repeat(1500)));
    let bot = chatbot_with(model, Arc::new(MockSummarizer::new()));

    let outcome = bot.chat("say a lot").await;

    assert!(outcome.success);
    assert_eq!(outcome.response.len(), 1500);
    let window = bot.window().await;
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].role, Role::Human);
}

// =============================================================================
// Clear, Export, Describe
// =============================================================================

#[tokio::test]
async fn test_clear_resets_session() {
    let bot = echo_chatbot();
    bot.chat("Remember this").await;
    let before = bot.stats().await.conversation_metadata.start_time;

    assert!(bot.clear().await);

    let stats = bot.stats().await;
    assert_eq!(stats.total_messages, 0);
    assert_eq!(stats.conversation_metadata.message_count, 0);
    assert_eq!(stats.conversation_metadata.total_tokens, 0);
    assert!(stats.conversation_metadata.start_time > before);
    assert!(!stats.has_summary);
    assert_eq!(bot.summary().await, NO_HISTORY_SUMMARY);

    // Idempotent
    assert!(bot.clear().await);
    assert!(bot.window().await.is_empty());
}

#[tokio::test]
async fn test_export_roles_alternate() {
    let bot = echo_chatbot();
    for q in ["first", "second", "third"] {
        assert!(bot.chat(q).await.success);
    }

    let export = bot.export().await;

    assert_eq!(export.messages.len(), 6);
    for (i, message) in export.messages.iter().enumerate() {
        let expected = if i % 2 == 0 { Role::Human } else { Role::Assistant };
        assert_eq!(message.role, expected);
    }
    assert_eq!(export.metadata.message_count, 6);
    assert_eq!(export.summary, "first | second | third");
}

#[tokio::test]
async fn test_save_export_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let bot = echo_chatbot();
    bot.chat("Hello").await;

    let path = bot.save_export(dir.path()).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["messages"][0]["type"], "human");
    assert_eq!(json["messages"][1]["type"], "ai");
    assert_eq!(json["messages"][1]["content"], "Echo: Hello");
}

#[tokio::test]
async fn test_history_pairs_exchanges() {
    let bot = echo_chatbot();
    bot.chat("q1").await;
    bot.chat("q2").await;

    let history = bot.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].human, "q2");
    assert_eq!(history[1].ai, "Echo: q2");
}

#[tokio::test]
async fn test_describe_is_idempotent() {
    let bot = echo_chatbot();
    let first = bot.describe();
    bot.chat("changes state").await;
    let second = bot.describe();

    assert_eq!(first, second);
    assert_eq!(first.name, "MemoryBot");
}

// =============================================================================
// Failure Mapping
// =============================================================================

#[tokio::test]
async fn test_provider_failure_is_internal() {
    let bot = chatbot_with(Arc::new(FailingModel), Arc::new(MockSummarizer::new()));

    let outcome = bot.chat("Hello").await;

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::Internal));
    assert!(!outcome.response.contains("500"));
    assert_eq!(outcome.response, ErrorKind::Internal.user_message());
}

#[tokio::test]
async fn test_summarizer_failure_still_delivers_reply() {
    let bot = chatbot_with(Arc::new(EchoModel::new()), Arc::new(FailingSummarizer));

    let outcome = bot.chat("Hello").await;

    assert!(outcome.success);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.response, "Echo: Hello");
    assert_eq!(outcome.conversation_summary.unwrap(), NO_HISTORY_SUMMARY);
    assert!(!outcome.memory_stats.unwrap().has_summary);

    // The stored reply is the one the caller saw
    let window = bot.window().await;
    assert_eq!(window.len(), 2);
    assert_eq!(window[1].role, Role::Assistant);
    assert_eq!(window[1].content, outcome.response);
}

#[tokio::test]
async fn test_generation_timeout() {
    let bot = chatbot_with(
        Arc::new(SlowModel::new(Duration::from_millis(500))),
        Arc::new(MockSummarizer::new()),
    )
    .with_external_timeout(Duration::from_millis(50));

    let outcome = bot.chat("Are you there?").await;

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(ErrorKind::ExternalTimeout));
    assert!(!bot.is_processing());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_same_session_calls_are_serialized() {
    let model = Arc::new(SlowModel::new(Duration::from_millis(100)));
    let bot = Arc::new(chatbot_with(model.clone(), Arc::new(MockSummarizer::new())));

    let first = tokio::spawn({
        let bot = bot.clone();
        async move { bot.chat("first").await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = tokio::spawn({
        let bot = bot.clone();
        async move { bot.chat("second").await }
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(bot.is_processing());
    assert_eq!(model.started(), 1);

    assert!(first.await.unwrap().success);
    assert!(second.await.unwrap().success);

    let contents: Vec<String> = bot.window().await.into_iter().map(|t| t.content).collect();
    assert_eq!(
        contents,
        vec!["first", "Echo: first", "second", "Echo: second"]
    );
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let a = echo_chatbot();
    let b = echo_chatbot();

    a.chat("only in a").await;
    a.chat("also in a").await;
    b.chat("only in b").await;

    assert_eq!(a.stats().await.total_messages, 4);
    assert_eq!(b.stats().await.total_messages, 2);

    a.clear().await;
    assert_eq!(b.stats().await.total_messages, 2);
    assert_eq!(b.summary().await, "only in b");
}

#[tokio::test]
async fn test_sessions_run_in_parallel() {
    let model = Arc::new(SlowModel::new(Duration::from_millis(150)));
    let a = Arc::new(chatbot_with(model.clone(), Arc::new(MockSummarizer::new())));
    let b = Arc::new(chatbot_with(model.clone(), Arc::new(MockSummarizer::new())));

    let started = std::time::Instant::now();
    let (ra, rb) = tokio::join!(a.chat("a"), b.chat("b"));

    assert!(ra.success && rb.success);
    assert!(started.elapsed() < Duration::from_millis(290));
}
