// Console output port
//
// The engine console is an external collaborator; detection only needs a
// line-oriented sink for its human-readable summary.

/// Line-oriented text sink
pub trait ConsoleSink: Send + Sync {
    fn print_line(&self, line: &str);
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Captures every printed line for assertions
    #[derive(Default)]
    pub struct RecordingConsoleSink {
        lines: Mutex<Vec<String>>,
    }

    impl RecordingConsoleSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl ConsoleSink for RecordingConsoleSink {
        fn print_line(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }
}
