pub mod document;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod sanitize;
pub mod structuring;

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::extraction::ExtractedText;
    use crate::parsing::errors::ParseError;
    use crate::parsing::models::RawCandidate;
    use crate::parsing::structuring::Structurer;

    /// Replays scripted results in order; once the script runs out, the
    /// fallback (if any) is returned forever.
    pub(crate) struct ScriptedStructurer {
        script: Mutex<VecDeque<Result<RawCandidate, ParseError>>>,
        fallback: Option<Result<RawCandidate, ParseError>>,
        calls: AtomicU32,
        last_text: Mutex<Option<String>>,
    }

    impl ScriptedStructurer {
        pub(crate) fn new(script: Vec<Result<RawCandidate, ParseError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback: None,
                calls: AtomicU32::new(0),
                last_text: Mutex::new(None),
            }
        }

        pub(crate) fn succeeding(raw: RawCandidate) -> Self {
            Self {
                fallback: Some(Ok(raw)),
                ..Self::new(Vec::new())
            }
        }

        pub(crate) fn failing(err: ParseError) -> Self {
            Self {
                fallback: Some(Err(err)),
                ..Self::new(Vec::new())
            }
        }

        pub(crate) fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn last_text(&self) -> Option<String> {
            self.last_text.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Structurer for ScriptedStructurer {
        async fn structure(&self, text: &ExtractedText) -> Result<RawCandidate, ParseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_text.lock().unwrap() = Some(text.as_str().to_string());
            let next = self.script.lock().unwrap().pop_front();
            next.or_else(|| self.fallback.clone())
                .unwrap_or_else(|| Err(ParseError::model_unavailable()))
        }
    }
}
