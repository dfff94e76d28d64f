//! Turn execution against a scripted provider.

mod common;

use common::*;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use weather_agent::prelude::*;
use weather_agent::runner::MAX_TOOL_ITERATIONS;
use weather_agent::tools::lookup_weather;

async fn collect(runner: &Runner, query: &str) -> Vec<Result<Event>> {
    runner
        .run(USER, SESSION, Content::user(query))
        .unwrap()
        .collect()
        .await
}

fn payloads(items: Vec<Result<Event>>) -> Vec<EventPayload> {
    items.into_iter().map(|e| e.unwrap().payload).collect()
}

#[tokio::test]
async fn plain_text_turn_streams_partials_then_final() {
    let provider = ScriptedProvider::new(vec![text_round("Hello there")]);
    let (runner, sessions) = weather_runner(provider.clone());

    let events: Vec<Event> = collect(&runner, "Hi")
        .await
        .into_iter()
        .map(|e| e.unwrap())
        .collect();

    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.invocation_id == events[0].invocation_id));
    assert_eq!(events.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(events.iter().all(|e| e.author == "weather_agent"));
    assert!(!events[0].is_terminal());

    let last = events.last().unwrap();
    let EventPayload::FinalResponse { content, usage } = &last.payload else {
        panic!("expected final response, got {:?}", last.payload);
    };
    assert_eq!(content.text(), "Hello there");
    assert_eq!(usage.total_tokens, 15);

    let history = sessions.get(&session_key()).unwrap().history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].text(), "Hi");
    assert_eq!(history[1].role, Role::Agent);
    assert_eq!(history[1].text(), "Hello there");
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn weather_tool_round_trip() {
    let provider = ScriptedProvider::new(vec![
        call_round("call_1", "get_weather", serde_json::json!({"city": "London"})),
        text_round("It's cloudy in London with 15°C."),
    ]);
    let (runner, sessions) = weather_runner(provider.clone());

    let payloads = payloads(collect(&runner, "What is the weather in London?").await);

    let EventPayload::ToolCall { call } = &payloads[0] else {
        panic!("expected tool call, got {:?}", payloads[0]);
    };
    assert_eq!(call.name, "get_weather");
    assert_eq!(
        payloads[1],
        EventPayload::ToolResult {
            call_id: "call_1".into(),
            name: "get_weather".into(),
            result: lookup_weather("London"),
        }
    );
    let EventPayload::FinalResponse { content, .. } = payloads.last().unwrap() else {
        panic!("expected final response");
    };
    assert_eq!(content.text(), "It's cloudy in London with 15°C.");

    let history = sessions.get(&session_key()).unwrap().history;
    let roles: Vec<Role> = history.iter().map(|c| c.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Agent, Role::Tool, Role::Agent]);
    assert_eq!(history[1].tool_calls().len(), 1);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let first = &requests[0];
    assert!(first
        .system_instruction
        .as_deref()
        .is_some_and(|s| s.contains("get_weather")));
    let tools = first.tools.as_ref().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "get_weather");
    assert_eq!(first.messages.len(), 1);

    let Part::FunctionResponse(response) = &requests[1].messages[2].parts[0] else {
        panic!("expected a function response in the second request");
    };
    assert_eq!(response.call_id, "call_1");
    assert_eq!(response.response["status"], "success");
}

#[tokio::test]
async fn unsupported_city_is_reported_not_escalated() {
    let provider = ScriptedProvider::new(vec![
        call_round("call_1", "get_weather", serde_json::json!({"city": "Paris"})),
        text_round("I don't have weather for Paris."),
    ]);
    let (runner, _) = weather_runner(provider);

    let payloads = payloads(collect(&runner, "Weather in Paris?").await);
    let EventPayload::ToolResult { result, .. } = &payloads[1] else {
        panic!("expected tool result");
    };
    assert_eq!(
        result,
        &ToolResult::error("Sorry, I don't have weather information for 'Paris'.")
    );
    assert!(matches!(payloads.last(), Some(EventPayload::FinalResponse { .. })));
}

#[tokio::test]
async fn string_encoded_arguments_are_decoded() {
    let provider = ScriptedProvider::new(vec![
        call_round(
            "call_1",
            "get_weather",
            serde_json::Value::String(r#"{"city":"Tokyo"}"#.into()),
        ),
        text_round("Tokyo is sunny."),
    ]);
    let (runner, _) = weather_runner(provider);

    let payloads = payloads(collect(&runner, "Tokyo?").await);
    let EventPayload::ToolResult { result, .. } = &payloads[1] else {
        panic!("expected tool result");
    };
    assert!(!result.is_error());
}

#[tokio::test]
async fn unknown_tool_escalates() {
    let provider = ScriptedProvider::new(vec![call_round(
        "call_1",
        "get_time",
        serde_json::json!({}),
    )]);
    let (runner, _) = weather_runner(provider.clone());

    let payloads = payloads(collect(&runner, "What time is it?").await);
    assert_eq!(payloads.len(), 2);
    assert!(matches!(payloads[0], EventPayload::ToolCall { .. }));
    assert_eq!(
        payloads[1],
        EventPayload::Escalation {
            reason: Some("Unknown tool: get_time".into())
        }
    );
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn content_filter_escalates() {
    let provider = ScriptedProvider::new(vec![finish_round(FinishReason::ContentFilter)]);
    let (runner, sessions) = weather_runner(provider);

    let payloads = payloads(collect(&runner, "something blocked").await);
    assert_eq!(payloads.len(), 1);
    assert!(matches!(&payloads[0], EventPayload::Escalation { reason: Some(_) }));
    assert_eq!(sessions.get(&session_key()).unwrap().history.len(), 1);
}

#[tokio::test]
async fn missing_session_fails_before_streaming() {
    let provider = ScriptedProvider::new(vec![]);
    let (runner, _) = weather_runner(provider.clone());

    let Err(err) = runner.run(USER, "no_such_session", Content::user("Hi")) else {
        panic!("expected run to fail for an unknown session");
    };
    assert!(matches!(err, AgentError::SessionNotFound(_)));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn backend_failure_ends_the_stream_with_an_error() {
    let provider = ScriptedProvider::new(vec![Round::Fail(AgentError::api(500, "boom"))]);
    let (runner, sessions) = weather_runner(provider);

    let items = collect(&runner, "Hi").await;
    assert_eq!(items.len(), 1);
    let err = items.into_iter().next().unwrap().unwrap_err();
    assert!(err.is_backend());
    assert!(matches!(err, AgentError::Api { status: 500, .. }));
    assert_eq!(sessions.get(&session_key()).unwrap().history.len(), 1);
}

#[tokio::test]
async fn mid_stream_error_follows_partials() {
    let provider = ScriptedProvider::new(vec![Round::Deltas(vec![
        Ok(TextStreamDelta::text("par")),
        Err(AgentError::Stream("connection reset".into())),
    ])]);
    let (runner, _) = weather_runner(provider);

    let mut items = collect(&runner, "Hi").await.into_iter();
    let first = items.next().unwrap().unwrap();
    assert_eq!(first.payload, EventPayload::PartialResponse { text: "par".into() });
    assert!(matches!(items.next(), Some(Err(AgentError::Stream(_)))));
    assert!(items.next().is_none());
}

#[tokio::test]
async fn endless_tool_calls_hit_the_iteration_limit() {
    let rounds = (0..MAX_TOOL_ITERATIONS)
        .map(|i| call_round(&format!("call_{i}"), "get_weather", serde_json::json!({"city": "Tokyo"})))
        .collect();
    let provider = ScriptedProvider::new(rounds);
    let (runner, _) = weather_runner(provider.clone());

    let payloads = payloads(collect(&runner, "loop").await);
    assert_eq!(
        payloads.last(),
        Some(&EventPayload::Escalation {
            reason: Some("tool loop exceeded max iterations".into())
        })
    );
    assert_eq!(provider.request_count(), MAX_TOOL_ITERATIONS);
    assert_eq!(payloads.iter().filter(|p| is_terminal(p)).count(), 1);
}

fn is_terminal(payload: &EventPayload) -> bool {
    matches!(
        payload,
        EventPayload::FinalResponse { .. } | EventPayload::Escalation { .. }
    )
}

#[tokio::test]
async fn second_turn_sees_first_turn_history() {
    let provider = ScriptedProvider::new(vec![text_round("first"), text_round("second")]);
    let (runner, sessions) = weather_runner(provider.clone());

    collect(&runner, "one").await;
    collect(&runner, "two").await;

    let requests = provider.requests();
    assert_eq!(requests[1].messages.len(), 3);
    assert_eq!(requests[1].messages[2].text(), "two");
    assert_eq!(sessions.get(&session_key()).unwrap().history.len(), 4);
}

#[tokio::test]
async fn stream_is_lazy_until_polled() {
    let provider = ScriptedProvider::new(vec![text_round("hi")]);
    let (runner, sessions) = weather_runner(provider.clone());

    let stream = runner.run(USER, SESSION, Content::user("Hi")).unwrap();
    assert_eq!(provider.request_count(), 0);
    assert!(sessions.get(&session_key()).unwrap().history.is_empty());
    drop(stream);
}

/// Roles and tool-call counts of a request's messages.
fn shape(messages: &[Content]) -> Vec<(Role, usize)> {
    messages.iter().map(|c| (c.role, c.tool_calls().len())).collect()
}

#[tokio::test]
async fn escalated_turn_leaves_no_unanswered_call() {
    let provider = ScriptedProvider::new(vec![
        call_round("call_1", "get_time", serde_json::json!({})),
        text_round("Ask me about the weather."),
    ]);
    let (runner, sessions) = weather_runner(provider.clone());

    let first = payloads(collect(&runner, "What time is it?").await);
    assert!(matches!(first.last(), Some(EventPayload::Escalation { .. })));
    collect(&runner, "weather?").await;

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(shape(&requests[1].messages), vec![(Role::User, 0), (Role::User, 0)]);
    assert_eq!(
        shape(&sessions.get(&session_key()).unwrap().history),
        vec![(Role::User, 0), (Role::User, 0), (Role::Agent, 0)]
    );
}

#[tokio::test]
async fn unknown_call_in_a_batch_runs_no_tools() {
    let provider = ScriptedProvider::new(vec![Round::Deltas(vec![
        Ok(TextStreamDelta::tool_call(weather_agent::types::ToolCall {
            id: "a".into(),
            name: "get_weather".into(),
            arguments: serde_json::json!({"city": "London"}),
        })),
        Ok(TextStreamDelta::tool_call(weather_agent::types::ToolCall {
            id: "b".into(),
            name: "get_time".into(),
            arguments: serde_json::json!({}),
        })),
        Ok(TextStreamDelta::done(Some(FinishReason::ToolCalls), None)),
    ])]);
    let (runner, sessions) = weather_runner(provider);

    let payloads = payloads(collect(&runner, "London weather and time?").await);
    assert_eq!(payloads.len(), 2);
    let EventPayload::ToolCall { call } = &payloads[0] else {
        panic!("expected tool call, got {:?}", payloads[0]);
    };
    assert_eq!(call.name, "get_time");
    assert_eq!(
        payloads[1],
        EventPayload::Escalation {
            reason: Some("Unknown tool: get_time".into())
        }
    );
    assert_eq!(sessions.get(&session_key()).unwrap().history.len(), 1);
}

#[tokio::test]
async fn empty_reply_is_not_recorded() {
    let provider = ScriptedProvider::new(vec![finish_round(FinishReason::Stop), text_round("ok")]);
    let (runner, sessions) = weather_runner(provider.clone());

    let items = payloads(collect(&runner, "Hi").await);
    let EventPayload::FinalResponse { content, .. } = &items[0] else {
        panic!("expected final response, got {:?}", items[0]);
    };
    assert!(content.parts.is_empty());
    assert_eq!(sessions.get(&session_key()).unwrap().history.len(), 1);

    collect(&runner, "Hello?").await;
    assert!(provider.requests()[1]
        .messages
        .iter()
        .all(|c| !c.parts.is_empty()));
}

#[tokio::test]
async fn error_delta_becomes_stream_error() {
    let provider = ScriptedProvider::new(vec![Round::Deltas(vec![
        Ok(TextStreamDelta::text("Look")),
        Ok(TextStreamDelta::error("UNAVAILABLE: model overloaded")),
        Ok(TextStreamDelta::text("ignored")),
    ])]);
    let (runner, sessions) = weather_runner(provider);

    let items = collect(&runner, "Hi").await;
    assert_eq!(items.len(), 2);
    let Some(Err(AgentError::Stream(message))) = items.last() else {
        panic!("expected a stream error, got {:?}", items.last());
    };
    assert_eq!(message, "UNAVAILABLE: model overloaded");
    assert_eq!(sessions.get(&session_key()).unwrap().history.len(), 1);
}
