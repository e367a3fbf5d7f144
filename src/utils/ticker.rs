// ============================================================================
// TICKER - Tarea repetitiva cancelable de 1 segundo
// ============================================================================
// El handle es dueño del timer: soltarlo cancela el tick. SessionAuthority
// lo guarda mientras está autenticada y lo suelta en logout/teardown.
// Un timer sin cancelar después del logout es un defecto de corrección.
// ============================================================================

/// Handle de una cuenta regresiva en marcha; cancelación por Drop
pub trait TickerHandle {}

/// Planificador del tick de sesión (Interval real en wasm, manual en tests)
pub trait Ticker {
    /// Programar `callback` una vez por segundo hasta soltar el handle
    fn every_second(&self, callback: Box<dyn Fn()>) -> Box<dyn TickerHandle>;
}

#[cfg(target_arch = "wasm32")]
pub use interval::IntervalTicker;

#[cfg(target_arch = "wasm32")]
mod interval {
    use super::{Ticker, TickerHandle};
    use gloo_timers::callback::Interval;

    /// Ticker real sobre gloo_timers - el Interval se cancela al soltarse
    pub struct IntervalTicker;

    struct IntervalHandle {
        _interval: Interval,
    }

    impl TickerHandle for IntervalHandle {}

    impl Ticker for IntervalTicker {
        fn every_second(&self, callback: Box<dyn Fn()>) -> Box<dyn TickerHandle> {
            let interval = Interval::new(1_000, move || callback());
            Box::new(IntervalHandle {
                _interval: interval,
            })
        }
    }
}
