//! Output sinks for the script `print` statement.

/// Receives each message produced by a `print` statement.
pub trait LogSink {
    fn log(&mut self, message: &str);
}

impl<F: FnMut(&str)> LogSink for F {
    fn log(&mut self, message: &str) {
        self(message)
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl LogSink for NullLog {
    fn log(&mut self, _message: &str) {}
}

/// Accumulates messages into a single buffer, one per line.
#[derive(Debug, Default, Clone)]
pub struct MultilineLog {
    buf: String,
}

impl MultilineLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything logged so far, joined with `\n`.
    pub fn output(&self) -> &str {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl LogSink for MultilineLog {
    fn log(&mut self, message: &str) {
        if !self.buf.is_empty() {
            self.buf.push('\n');
        }
        self.buf.push_str(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_joins_with_newlines() {
        let mut log = MultilineLog::new();
        log.log("a");
        log.log("b");
        assert_eq!(log.output(), "a\nb");
        log.clear();
        assert_eq!(log.output(), "");
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |m: &str| seen.push(m.to_string());
            sink.log("hi");
        }
        assert_eq!(seen, ["hi"]);
    }
}
