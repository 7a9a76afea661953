//! Canned OpenAI-style wire bodies

use serde_json::{Value, json};

pub fn chat_completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12 }
    })
}

pub fn embedding_body(embedding: &[f32]) -> Value {
    json!({
        "object": "list",
        "model": "test-embedding",
        "data": [{ "object": "embedding", "index": 0, "embedding": embedding }],
        "usage": { "prompt_tokens": 4, "total_tokens": 4 }
    })
}

pub fn models_body() -> Value {
    json!({ "object": "list", "data": [{ "id": "test-model", "object": "model" }] })
}

/// SSE body streaming `pieces` as deltas, then `[DONE]`
pub fn sse_body(pieces: &[&str]) -> String {
    let mut body = String::new();
    for piece in pieces {
        let chunk = json!({
            "model": "test-model",
            "choices": [{ "index": 0, "delta": { "content": piece }, "finish_reason": null }]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    let last = json!({
        "model": "test-model",
        "choices": [{ "index": 0, "delta": {}, "finish_reason": "stop" }]
    });
    body.push_str(&format!("data: {}\n\n", last));
    body.push_str("data: [DONE]\n\n");
    body
}
