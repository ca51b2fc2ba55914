#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use exams_core::EmitMessage;
use exams_engine::{EventSink, FetchSettings};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Settings that keep retries and politeness spacing out of the way of tests.
pub fn fast_settings() -> FetchSettings {
    FetchSettings {
        request_timeout: Duration::from_secs(5),
        backoff_unit: Duration::from_millis(5),
        min_request_spacing: Duration::ZERO,
        ..FetchSettings::default()
    }
}

#[derive(Default, Clone)]
pub struct CollectingSink {
    messages: Arc<Mutex<Vec<EmitMessage>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EmitMessage> {
        self.messages.lock().unwrap().drain(..).collect()
    }

    pub fn texts(&self, kind: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|message| message.kind() == kind)
            .filter_map(|message| message.text().map(str::to_string))
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, message: EmitMessage) {
        self.messages.lock().unwrap().push(message);
    }
}
