/// Fuente de tiempo inyectable para que la cuenta regresiva sea testeable
pub trait Clock {
    /// Segundos epoch actuales
    fn now_epoch(&self) -> i64;
}

/// Reloj real basado en chrono
pub struct UtcClock;

impl Clock for UtcClock {
    fn now_epoch(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}
