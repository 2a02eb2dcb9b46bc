/// Sink for API call logging.
///
/// Receives one pre-formatted line per completed call carrying the method,
/// request URL, status and raw body text when present. Invoked only when the
/// client's debug flag is set or the call failed.
pub trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

/// Any `Fn(&str)` closure can serve as a logger.
impl<F> Logger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}
