// ============================================================================
// COOKIES - Acceso a document.cookie detrás de un trait
// ============================================================================
// Las cookies son la única escritura observable externamente de la sesión:
// el guard las lee de forma síncrona antes de renderizar.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;

/// Almacén de cookies inyectable (navegador en wasm, memoria en tests)
pub trait CookieStore {
    fn get(&self, nombre: &str) -> Option<String>;
    fn set(&self, nombre: &str, valor: &str);
    fn remove(&self, nombre: &str);
}

/// Implementación en memoria - usada en tests y como fallback fuera del DOM
#[derive(Default)]
pub struct MemoryCookies {
    valores: RefCell<HashMap<String, String>>,
}

impl MemoryCookies {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookies {
    fn get(&self, nombre: &str) -> Option<String> {
        self.valores.borrow().get(nombre).cloned()
    }

    fn set(&self, nombre: &str, valor: &str) {
        self.valores
            .borrow_mut()
            .insert(nombre.to_string(), valor.to_string());
    }

    fn remove(&self, nombre: &str) {
        self.valores.borrow_mut().remove(nombre);
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserCookies;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::CookieStore;
    use wasm_bindgen::JsCast;
    use web_sys::HtmlDocument;

    /// Cookies reales sobre document.cookie
    pub struct BrowserCookies;

    impl BrowserCookies {
        fn documento() -> Option<HtmlDocument> {
            web_sys::window()?
                .document()?
                .dyn_into::<HtmlDocument>()
                .ok()
        }
    }

    impl CookieStore for BrowserCookies {
        fn get(&self, nombre: &str) -> Option<String> {
            let doc = Self::documento()?;
            let todas = doc.cookie().ok()?;
            for par in todas.split(';') {
                let par = par.trim();
                if let Some((clave, valor)) = par.split_once('=') {
                    if clave == nombre {
                        let decodificado = js_sys::decode_uri_component(valor)
                            .ok()
                            .map(|v| String::from(v));
                        return decodificado.or_else(|| Some(valor.to_string()));
                    }
                }
            }
            None
        }

        fn set(&self, nombre: &str, valor: &str) {
            if let Some(doc) = Self::documento() {
                let codificado = js_sys::encode_uri_component(valor);
                let cookie = format!("{}={}; path=/; SameSite=Lax", nombre, codificado);
                if doc.set_cookie(&cookie).is_err() {
                    log::error!("❌ No se pudo escribir la cookie {}", nombre);
                }
            }
        }

        fn remove(&self, nombre: &str) {
            if let Some(doc) = Self::documento() {
                let cookie = format!("{}=; path=/; Max-Age=0", nombre);
                let _ = doc.set_cookie(&cookie);
            }
        }
    }
}
