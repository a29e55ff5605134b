use std::sync::Arc;

use gemchat::llm::ContextTurn;
use gemchat::{
    ChatError, Conversation, Locale, LlmClient, MockBackend, MockReply, RequestConfig, Role,
};

fn conversation(backend: &MockBackend, project: &str, locale: Locale) -> Conversation {
    let llm = LlmClient::new(Arc::new(backend.clone()), locale.fallback_reply());
    Conversation::new(llm, RequestConfig::new(project, "us-central1"), locale)
}

fn snapshot(conversation: &Conversation) -> Vec<(Role, String)> {
    conversation
        .session()
        .all()
        .iter()
        .map(|t| (t.role(), t.content().to_string()))
        .collect()
}

#[tokio::test]
async fn first_round_against_mock_backend() {
    let backend = MockBackend::new();
    backend.push_reply(MockReply::content("Hello!"));
    let mut chat = conversation(&backend, "my-project", Locale::En);

    let reply = chat.submit("Hi").await.unwrap();

    assert_eq!(reply.as_deref(), Some("Hello!"));
    assert_eq!(
        snapshot(&chat),
        vec![
            (Role::Assistant, "How can I help you?".to_string()),
            (Role::User, "Hi".to_string()),
            (Role::Assistant, "Hello!".to_string()),
        ]
    );
}

#[tokio::test]
async fn empty_project_makes_no_call() {
    let backend = MockBackend::new();
    let mut chat = conversation(&backend, "", Locale::En);

    let err = chat.submit("Hi").await.unwrap_err();

    assert!(matches!(err, ChatError::MissingConfiguration));
    assert_eq!(chat.describe_error(&err), "Please add your Google Cloud Project ID to continue.");
    assert!(backend.calls().is_empty());
    assert_eq!(backend.connect_count(), 0);
    assert_eq!(chat.session().len(), 1);
}

#[tokio::test]
async fn session_grows_by_two_on_success_and_one_on_call_failure() {
    let backend = MockBackend::new();
    let script = [
        MockReply::content("a"),
        MockReply::Fail("deadline exceeded".to_string()),
        MockReply::content("b"),
        MockReply::Fail("permission denied".to_string()),
        MockReply::Fail("quota".to_string()),
        MockReply::content("c"),
    ];
    for reply in script.iter().cloned() {
        backend.push_reply(reply);
    }
    let mut chat = conversation(&backend, "p", Locale::En);

    for (i, scripted) in script.iter().enumerate() {
        let before = chat.session().len();
        let outcome = chat.submit(&format!("prompt {i}")).await;
        let grown = chat.session().len() - before;

        match scripted {
            MockReply::Fail(_) => {
                assert!(outcome.unwrap_err().is_call_failure());
                assert_eq!(grown, 1);
            }
            _ => {
                assert!(outcome.is_ok());
                assert_eq!(grown, 2);
            }
        }
    }
    assert_eq!(backend.calls().len(), script.len());
}

#[tokio::test]
async fn missing_content_becomes_fallback_turn() {
    let backend = MockBackend::new();
    backend.push_reply(MockReply::Empty);
    backend.push_reply(MockReply::Empty);

    let mut chat = conversation(&backend, "p", Locale::En);
    chat.submit("Hi").await.unwrap();
    assert_eq!(chat.session().last().unwrap().content(), "No response");

    let mut chat = conversation(&backend, "p", Locale::Es);
    chat.submit("Hola").await.unwrap();
    assert_eq!(chat.session().last().unwrap().content(), "Sin respuesta");
}

#[tokio::test]
async fn context_of_nth_call_is_prior_turns_plus_new_prompt() {
    let backend = MockBackend::new();
    let mut chat = conversation(&backend, "p", Locale::En);
    let prompts = ["first", "second", "third", "fourth"];

    for prompt in prompts {
        let before: Vec<ContextTurn> = chat
            .session()
            .all()
            .iter()
            .map(ContextTurn::from)
            .collect();
        chat.submit(prompt).await.unwrap();

        let call = backend.calls().pop().unwrap();
        let mut expected = before;
        expected.push(ContextTurn {
            role: Role::User,
            content: prompt.to_string(),
        });

        assert_eq!(call.request.prompt(), Some(prompt));
        assert_eq!(call.request.context(), expected.as_slice());
    }
}

#[tokio::test]
async fn generation_parameters_are_fixed() {
    let backend = MockBackend::new();
    let mut chat = conversation(&backend, "p", Locale::En);
    chat.submit("Hi").await.unwrap();

    let params = backend.calls()[0].request.parameters;
    assert_eq!(params.temperature, 0.7);
    assert_eq!(params.max_output_tokens, 256);
    assert_eq!(params.top_k, 40);
    assert_eq!(params.top_p, 0.8);
}

#[tokio::test]
async fn bad_region_fails_before_any_mutation() {
    let backend = MockBackend::new();
    let mut chat = conversation(&backend, "p", Locale::En);
    chat.set_region("Not A Region");

    let err = chat.submit("Hi").await.unwrap_err();
    assert!(matches!(err, ChatError::ClientInitialization(_)));
    assert_eq!(chat.session().len(), 1);
    assert!(backend.calls().is_empty());
}
