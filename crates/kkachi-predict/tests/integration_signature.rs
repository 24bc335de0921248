// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Integration tests for signature system

use kkachi_predict::*;

#[test]
fn test_signature_creation_from_string() {
    let sig = Signature::parse("question, context -> answer").unwrap();

    assert_eq!(sig.input_fields.len(), 2);
    assert_eq!(sig.output_fields.len(), 1);
    assert_eq!(sig.input_fields[0].name, "question");
    assert_eq!(sig.input_fields[1].name, "context");
    assert_eq!(sig.output_fields[0].name, "answer");
    assert!(sig.fields().all(|f| f.desc.is_empty()));
    assert_eq!(
        sig.instructions,
        "Given the fields `question`, `context`, produce the fields `answer`."
    );
}

#[test]
fn test_signature_builder() {
    let sig = SignatureBuilder::new("Classify the text")
        .input(InputField::create("text", "Input text"))
        .unwrap()
        .input(InputField::create("labels", "Possible labels"))
        .unwrap()
        .output(OutputField::create("classification", "The classification"))
        .unwrap()
        .build();

    assert_eq!(sig.instructions, "Classify the text");
    assert_eq!(sig.input_fields.len(), 2);
    assert_eq!(sig.output_fields.len(), 1);
}

#[test]
fn test_structured_signature_used_unchanged() {
    let sig = SignatureBuilder::new("Summarize")
        .input(InputField::create("document", "Full text"))
        .unwrap()
        .output(OutputField::create("summary", "Two sentences"))
        .unwrap()
        .build();

    let predict = Predict::new(sig.clone()).unwrap();
    assert_eq!(predict.signature(), &sig);
    assert_eq!(predict.signature().instructions, "Summarize");
}

#[test]
fn test_signature_to_string() {
    let sig = Signature::parse("q, ctx -> a, confidence").unwrap();
    assert_eq!(sig.to_string_format(), "q, ctx -> a, confidence");
    assert_eq!(sig.to_string(), "q, ctx -> a, confidence");

    let reparsed: Signature = sig.to_string().parse().unwrap();
    assert_eq!(reparsed, sig);
}

#[test]
fn test_signature_field_inference() {
    let sig = Signature::parse("userQuery -> system_response").unwrap();

    assert_eq!(sig.input_fields[0].prefix, "User Query:");
    assert_eq!(sig.output_fields[0].prefix, "System Response:");
}

#[test]
fn test_signature_with_custom_fields() {
    let input_field = InputField::create("query", "User query")
        .with_prefix("Q:")
        .with_format("lowercase");

    let sig = SignatureBuilder::new("Process query")
        .input(input_field)
        .unwrap()
        .output(OutputField::create("result", "Result"))
        .unwrap()
        .build();

    assert_eq!(sig.input_fields[0].prefix, "Q:");
    assert_eq!(sig.input_fields[0].format.as_deref(), Some("lowercase"));
}

#[test]
fn test_signature_error_handling() {
    // Missing arrow
    assert!(matches!(
        Signature::parse("input output"),
        Err(Error::Signature(SignatureError::Syntax(_)))
    ));

    // Multiple arrows
    assert!(Signature::parse("input -> output -> extra").is_err());

    // Multi-token field name
    let err = Signature::parse("the question -> answer").unwrap_err();
    assert_eq!(err.category(), "signature");

    // Empty side
    assert!(Signature::parse(" -> answer").is_err());
}

#[test]
fn test_signature_duplicate_names() {
    assert!(matches!(
        Signature::parse("a, a -> b"),
        Err(Error::Signature(SignatureError::DuplicateField(ref name))) if name == "a"
    ));
    assert!(matches!(
        Signature::parse("a -> a"),
        Err(Error::Signature(SignatureError::DuplicateField(_)))
    ));
}

#[test]
fn test_signature_serde() {
    let sig = Signature::parse("question -> answer").unwrap();
    let json = serde_json::to_string(&sig).unwrap();
    let back: Signature = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sig);
}
