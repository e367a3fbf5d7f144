// ============================================================================
// PANEL CULTIVO - NÚCLEO DEL TABLERO DE INSTALACIONES (RUST PURO)
// ============================================================================
// Tres piezas sostienen el tablero:
// - SessionAuthority: token, cuenta regresiva y rol activo (state/)
// - RouteGuard: autorización síncrona previa al render (routing/)
// - DeviceCommandCoordinator: escritura optimista con rollback (services/)
// El núcleo es portable; el pegamento de navegador vive tras cfg(wasm32).
// ============================================================================

pub mod error;
pub mod models;
pub mod routing;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(target_arch = "wasm32")]
mod boot {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use wasm_logger::Config;

    use crate::routing::{self, BrowserNavigator, GuardDecision, GuardInput, Navigator};
    use crate::services::ApiClient;
    use crate::state::AppState;
    use crate::utils::clock::UtcClock;
    use crate::utils::cookies::BrowserCookies;
    use crate::utils::ticker::IntervalTicker;

    // Instancia única del runtime, viva mientras dure la página
    thread_local! {
        static APP: RefCell<Option<Rc<AppState>>> = RefCell::new(None);
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        wasm_logger::init(Config::default());
        log::info!("🚀 Panel Cultivo - núcleo del tablero");

        let cookies = Rc::new(BrowserCookies);
        let navigator = Rc::new(BrowserNavigator);

        // El guard corre ANTES de construir nada: denegar es redirect, no
        // render parcial
        if let Some(window) = web_sys::window() {
            let path = window.location().pathname().unwrap_or_default();
            let input = GuardInput::from_cookies(&path, cookies.as_ref());
            if let GuardDecision::Redirect(destino) = routing::evaluate(&input) {
                log::info!("🔐 Guard: {} → {}", path, destino);
                navigator.redirect(&destino);
                return Ok(());
            }
        }

        let api = Rc::new(ApiClient::new());
        let estado = Rc::new(AppState::new(
            Rc::new(UtcClock),
            cookies,
            navigator,
            Rc::new(IntervalTicker),
            api.clone(),
            api.clone(),
            api,
        ));
        estado.initialize();

        // Roles/módulos se refrescan en segundo plano; el fallo no es fatal
        if estado.session.is_authenticated() {
            let sesion = estado.session.clone();
            spawn_local(async move {
                let _ = sesion.refresh_user().await;
            });
        }

        APP.with(|celda| {
            *celda.borrow_mut() = Some(estado);
        });

        Ok(())
    }

    /// Cerrar sesión desde JavaScript (botón de logout)
    #[wasm_bindgen]
    pub fn logout() {
        APP.with(|celda| {
            if let Some(estado) = celda.borrow().as_ref() {
                estado.session.logout();
                BrowserNavigator.redirect(crate::utils::constants::RUTA_LOGIN);
            }
        });
    }
}
