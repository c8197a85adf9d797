//! Scripted inference client for stage and pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use reqminer_inference::InferenceClient;
use reqminer_shared::{ReqMinerError, Result};

/// One recorded `generate` call.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub prompt: String,
    pub system: Option<String>,
}

/// Replays queued responses in order and records every call.
/// `Err` entries become transport errors; an exhausted queue answers "".
#[derive(Default)]
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = std::result::Result<S, S>>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(Into::into).map_err(Into::into))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl InferenceClient for ScriptedClient {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            system: system.map(String::from),
        });
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ReqMinerError::Inference(message)),
            None => Ok(String::new()),
        }
    }
}
