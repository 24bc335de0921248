// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Benchmarks for the invocation pipeline with mock models.
//!
//! These measure the overhead of the library itself (signature parsing,
//! request formatting, output parsing, a full forward call) without any
//! model latency.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kkachi_predict::lm::shared;
use kkachi_predict::{
    field_map, Adapter, AdapterGenerator, CallArgs, ChatAdapter, Config, Example, JSONAdapter,
    LanguageModel, LmConfig, LmRequest, Predict, Result, Signature,
};

/// Model without call history, so long runs do not accumulate memory.
struct Fixed {
    kwargs: Config,
    output: &'static str,
}

impl Fixed {
    fn new(output: &'static str) -> Self {
        Self {
            kwargs: LmConfig::default().with_model("fixed").to_kwargs(),
            output,
        }
    }
}

impl LanguageModel for Fixed {
    fn kwargs(&self) -> &Config {
        &self.kwargs
    }

    fn call(&self, _request: &LmRequest, overrides: &Config) -> Result<Vec<String>> {
        let n = overrides.n().or_else(|| self.kwargs.n()).unwrap_or(1);
        Ok((0..n).map(|_| self.output.to_string()).collect())
    }
}

fn demos(n: usize) -> Vec<Example> {
    (0..n)
        .map(|i| {
            Example::new()
                .with("question", format!("{}+{}?", i, i))
                .with("answer", (2 * i).to_string())
        })
        .collect()
}

fn bench_signature(c: &mut Criterion) {
    c.bench_function("signature_parse_small", |b| {
        b.iter(|| Signature::parse(black_box("question -> answer")))
    });

    c.bench_function("signature_parse_wide", |b| {
        b.iter(|| {
            Signature::parse(black_box(
                "question, context, userHistory, retrievedDocs -> reasoning, answer, confidence",
            ))
        })
    });
}

fn bench_adapters(c: &mut Criterion) {
    let sig = Signature::parse("question -> reasoning, answer").unwrap();
    let demos = demos(8);
    let inputs = field_map([("question", "3+3?")]);

    let chat = ChatAdapter::default();
    c.bench_function("chat_format_8_demos", |b| {
        b.iter(|| chat.format(&sig, black_box(&demos), &inputs))
    });

    let chat_output = "Reasoning: three plus three\nis six\nAnswer: 6";
    c.bench_function("chat_parse", |b| {
        b.iter(|| chat.parse(&sig, black_box(chat_output)))
    });

    let json = JSONAdapter::default();
    c.bench_function("json_format_8_demos", |b| {
        b.iter(|| json.format(&sig, black_box(&demos), &inputs))
    });

    let json_output = "```json\n{\"reasoning\": \"three plus three\", \"answer\": 6}\n```";
    c.bench_function("json_parse", |b| {
        b.iter(|| json.parse(&sig, black_box(json_output)))
    });
}

fn bench_forward(c: &mut Criterion) {
    let lm = shared(Fixed::new("Answer: 6"));
    let chat = Predict::new("question -> answer")
        .unwrap()
        .with_lm(lm)
        .with_demos(demos(4));

    c.bench_function("forward_chat_bound_lm", |b| {
        b.iter(|| chat.forward(CallArgs::new().input("question", "3+3?")))
    });

    let lm = shared(Fixed::new(r#"{"answer": "6"}"#));
    let json = Predict::with_generator(
        "question -> answer",
        AdapterGenerator::new(JSONAdapter::default()),
    )
    .unwrap()
    .with_lm(lm);

    c.bench_function("forward_json_n2", |b| {
        b.iter(|| {
            json.forward(
                CallArgs::new()
                    .input("question", "3+3?")
                    .config(Config::new().with("n", 2)),
            )
        })
    });
}

criterion_group!(benches, bench_signature, bench_adapters, bench_forward);
criterion_main!(benches);
