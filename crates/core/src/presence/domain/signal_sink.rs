use super::signal::Signal;

/// Destination for protocol signals.
///
/// Each emitted signal must be visible to the consumer before `emit`
/// returns. A failure is final; callers stop emitting after the first error.
pub trait SignalSink: Send {
    fn emit(&mut self, signal: &Signal) -> std::io::Result<()>;
}
