pub mod guard;

pub use guard::*;

/// Destino de los redirects del guard y del logout forzado
pub trait Navigator {
    fn redirect(&self, path: &str);
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserNavigator;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::Navigator;

    /// Navegación real sobre window.location
    pub struct BrowserNavigator;

    impl Navigator for BrowserNavigator {
        fn redirect(&self, path: &str) {
            if let Some(window) = web_sys::window() {
                if window.location().set_href(path).is_err() {
                    log::error!("❌ No se pudo redirigir a {}", path);
                }
            }
        }
    }
}
