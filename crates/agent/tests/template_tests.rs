//! Tests for the Naive template

use kotto_agent::template::block_quote;
use kotto_agent::{Naive, ParseError, StructuredCall, Template};
use kotto_prompts::{DeclarationGraph, DeclarationNode, NodeFormat, NodeKind};
use serde_json::json;

fn call() -> StructuredCall {
    StructuredCall::new("setData", vec![json!({"first_name": "Ada"}), json!(3)])
        .with_reasoning("the user gave their name")
}

#[test]
fn test_parse_direct_json() {
    let parsed = Naive
        .parse_response(r#"{"name":"echo","arguments":["hi"]}"#)
        .unwrap();
    assert_eq!(parsed, StructuredCall::new("echo", vec![json!("hi")]));
}

#[test]
fn test_parse_round_trip() {
    let c = call();
    let text = serde_json::to_string(&c).unwrap();
    assert_eq!(Naive.parse_response(&text).unwrap(), c);
}

#[test]
fn test_parse_fenced_block() {
    let c = call();
    let text = format!(
        "Sure, here is my answer:\n\n{}\n\nHope that helps.",
        block_quote(&serde_json::to_string_pretty(&c).unwrap(), "json")
    );
    assert_eq!(Naive.parse_response(&text).unwrap(), c);
}

#[test]
fn test_parse_fenced_block_without_language() {
    let text = "```\n{\"name\":\"builtins.exit\",\"arguments\":[\"done\"]}\n```";
    let parsed = Naive.parse_response(text).unwrap();
    assert_eq!(parsed.name, "builtins.exit");
    assert_eq!(parsed.arguments, vec![json!("done")]);
}

#[test]
fn test_parse_skips_unrelated_blocks() {
    let text = "```ts\nconst x = 1;\n```\n```json\n{\"name\":\"ask\"}\n```";
    assert_eq!(Naive.parse_response(text).unwrap().name, "ask");
}

#[test]
fn test_parse_failure_keeps_text() {
    let err: ParseError = Naive.parse_response("I think I should greet").unwrap_err();
    assert_eq!(err.text, "I think I should greet");
    assert!(err.to_string().contains("I think I should greet"));
}

#[test]
fn test_render_error_restates_format() {
    let err = Naive.parse_response("nope").unwrap_err();
    let rendered = Naive.render_error(&err);
    assert!(rendered.starts_with("error: "));
    assert!(rendered.contains("nope"));
    assert!(rendered.contains("\"name\": \"the name of the function you want to call\""));
    assert!(rendered.contains("```json"));
}

#[test]
fn test_render_output() {
    assert_eq!(
        Naive.render_output(&json!({"a": 1})),
        "```json\n{\"a\":1}\n```"
    );
}

#[test]
fn test_render_context_lists_only_typescript_nodes() {
    let graph = DeclarationGraph::new(vec![
        DeclarationNode::new(
            NodeKind::FnDecl,
            "greet#1",
            "function greet(name: string): string;",
        ),
        DeclarationNode::new(NodeKind::FnDecl, "notes#2", "free text notes")
            .with_format(NodeFormat::PlainText),
    ])
    .unwrap();
    let mut scope = graph.scope();
    scope.add_by_pattern("fn_decl", &[r"\w+#\d+"]).unwrap();
    assert_eq!(scope.len(), 2);

    let context = Naive.render_context(&scope);
    assert!(context.starts_with("You are the runtime of a JavaScript program"));
    assert!(context.contains("```TypeScript\nfunction greet(name: string): string;\n```"));
    assert!(!context.contains("free text notes"));
    assert!(context.ends_with("Let's begin!"));
}

#[test]
fn test_render_context_is_deterministic() {
    let graph = DeclarationGraph::new(vec![
        DeclarationNode::new(NodeKind::FnDecl, "a#1", "function a(): void;"),
        DeclarationNode::new(NodeKind::FnDecl, "b#2", "function b(): void;"),
    ])
    .unwrap();

    let render = || {
        let mut scope = graph.scope();
        scope.add_by_pattern("fn_decl", &[r"\w+#\d+"]).unwrap();
        Naive.render_context(&scope)
    };
    assert_eq!(render(), render());
    assert!(render().contains("function a(): void;\n\nfunction b(): void;"));
}
