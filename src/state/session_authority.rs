// ============================================================================
// SESSION AUTHORITY - Fuente única de verdad de la autenticación
// ============================================================================
// Dueña del token, su cuenta regresiva y la selección de rol. Escribe las
// cookies que RouteGuard lee: sin ventana de deriva mayor a una escritura.
// Existe exactamente UNA por runtime, construida y dispuesta por AppState
// (inyectada a los consumidores, nunca accedida como global ambiente).
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::SesionError;
use crate::models::token::decode_claims;
use crate::models::user::{Rol, Usuario};
use crate::routing::Navigator;
use crate::services::remote::UserReader;
use crate::utils::clock::Clock;
use crate::utils::constants::{
    COOKIE_MODULOS, COOKIE_ROLES, COOKIE_ROL_ACTIVO, COOKIE_TOKEN, RUTA_LOGIN,
    UMBRAL_EXPIRACION_SEG,
};
use crate::utils::cookies::CookieStore;
use crate::utils::ticker::{Ticker, TickerHandle};

/// Fases del ciclo de vida de la sesión.
/// Expired y Unauthenticated son el mismo estado terminal alcanzado por
/// caminos distintos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    Loading,
    AuthenticatedNoRole,
    RoleSelected,
    /// Quedan menos de UMBRAL_EXPIRACION_SEG segundos
    Expiring,
    /// Transitoria por construcción: el tick que llega a cero la fija y el
    /// logout() forzado que sigue en el mismo paso la colapsa en
    /// Unauthenticated, así que ningún lector la observa
    Expired,
}

pub struct SessionAuthority {
    phase: Cell<SessionPhase>,
    token: RefCell<Option<String>>,
    expiry_epoch: Cell<i64>,
    /// Derivado: siempre max(0, expiry - now); nunca se muta por separado
    time_left: Cell<i64>,
    user: RefCell<Option<Usuario>>,
    selected_role: RefCell<Option<Rol>>,
    is_loading: Cell<bool>,
    initialized: Cell<bool>,
    /// Dueña del tick: soltar el handle cancela el timer
    ticker_handle: RefCell<Option<Box<dyn TickerHandle>>>,
    logout_subscribers: RefCell<Vec<Rc<dyn Fn()>>>,

    clock: Rc<dyn Clock>,
    cookies: Rc<dyn CookieStore>,
    navigator: Rc<dyn Navigator>,
    ticker: Rc<dyn Ticker>,
    user_reader: Rc<dyn UserReader>,
}

impl SessionAuthority {
    pub fn new(
        clock: Rc<dyn Clock>,
        cookies: Rc<dyn CookieStore>,
        navigator: Rc<dyn Navigator>,
        ticker: Rc<dyn Ticker>,
        user_reader: Rc<dyn UserReader>,
    ) -> Self {
        Self {
            phase: Cell::new(SessionPhase::Unauthenticated),
            token: RefCell::new(None),
            expiry_epoch: Cell::new(0),
            time_left: Cell::new(0),
            user: RefCell::new(None),
            selected_role: RefCell::new(None),
            is_loading: Cell::new(false),
            initialized: Cell::new(false),
            ticker_handle: RefCell::new(None),
            logout_subscribers: RefCell::new(Vec::new()),
            clock,
            cookies,
            navigator,
            ticker,
            user_reader,
        }
    }

    // ------------------------------------------------------------------
    // Arranque
    // ------------------------------------------------------------------

    /// Cargar la sesión persistida. Idempotente: corre una sola vez.
    /// Falla cerrado: cualquier error de decodificación deja Unauthenticated,
    /// jamás una sesión parcial o adivinada.
    pub fn initialize(self: &Rc<Self>) {
        if self.initialized.get() {
            return;
        }
        self.initialized.set(true);
        self.phase.set(SessionPhase::Loading);
        self.is_loading.set(true);

        let Some(token) = self.cookies.get(COOKIE_TOKEN) else {
            log::info!("🔐 Sin token persistido, sesión no autenticada");
            self.phase.set(SessionPhase::Unauthenticated);
            self.is_loading.set(false);
            return;
        };

        match decode_claims(&token) {
            Err(_) => {
                // nunca se muestra como texto: se resuelve con fallback
                log::warn!("🔐 Token ilegible, descartando sesión persistida");
                self.fail_closed();
            }
            Ok(claims) => {
                let restante = claims.exp - self.clock.now_epoch();
                if restante <= 0 {
                    log::info!("🔐 Token persistido ya expirado");
                    self.fail_closed();
                } else {
                    *self.token.borrow_mut() = Some(token);
                    self.expiry_epoch.set(claims.exp);
                    self.time_left.set(restante);
                    self.phase.set(if restante < UMBRAL_EXPIRACION_SEG {
                        SessionPhase::Expiring
                    } else {
                        SessionPhase::AuthenticatedNoRole
                    });
                    self.start_countdown();
                    log::info!("✅ Sesión restaurada: {}s restantes", restante);
                }
            }
        }
        self.is_loading.set(false);
    }

    fn fail_closed(&self) {
        for cookie in [COOKIE_TOKEN, COOKIE_ROLES, COOKIE_MODULOS, COOKIE_ROL_ACTIVO] {
            self.cookies.remove(cookie);
        }
        self.phase.set(SessionPhase::Unauthenticated);
        self.is_loading.set(false);
    }

    /// Programar el tick de 1s. El handle queda en poder de la autoridad.
    fn start_countdown(self: &Rc<Self>) {
        let debil = Rc::downgrade(self);
        let handle = self.ticker.every_second(Box::new(move || {
            if let Some(autoridad) = debil.upgrade() {
                autoridad.tick();
            }
        }));
        *self.ticker_handle.borrow_mut() = Some(handle);
    }

    // ------------------------------------------------------------------
    // Cuenta regresiva
    // ------------------------------------------------------------------

    /// Recalcular el tiempo restante. Al llegar a 0 fuerza exactamente un
    /// logout + redirect; ticks repetidos en cero son no-ops.
    pub fn tick(&self) {
        if !self.is_authenticated() {
            return;
        }

        let restante = (self.expiry_epoch.get() - self.clock.now_epoch()).max(0);
        self.time_left.set(restante);

        if restante == 0 {
            log::warn!("⏳ Sesión expirada, forzando logout");
            self.phase.set(SessionPhase::Expired);
            self.logout();
            // sin contenido autenticado residual después del redirect
            self.navigator.redirect(RUTA_LOGIN);
        } else if restante < UMBRAL_EXPIRACION_SEG
            && self.phase.get() != SessionPhase::Expiring
        {
            log::warn!("⏳ Sesión por expirar: {}s restantes", restante);
            self.phase.set(SessionPhase::Expiring);
        }
    }

    // ------------------------------------------------------------------
    // Roles y usuario
    // ------------------------------------------------------------------

    /// Seleccionar un rol del conjunto del usuario actual. Un rol ajeno se
    /// rechaza con InvalidRoleSelection y el estado no cambia.
    pub fn select_role(&self, rol: &Rol) -> Result<(), SesionError> {
        if !self.is_authenticated() {
            return Err(SesionError::InvalidRoleSelection);
        }
        let pertenece = self
            .user
            .borrow()
            .as_ref()
            .map(|u| u.tiene_rol(rol))
            .unwrap_or(false);
        if !pertenece {
            return Err(SesionError::InvalidRoleSelection);
        }

        *self.selected_role.borrow_mut() = Some(rol.clone());
        self.cookies.set(COOKIE_ROL_ACTIVO, &rol.nombre);
        if self.phase.get() == SessionPhase::AuthenticatedNoRole {
            self.phase.set(SessionPhase::RoleSelected);
        }
        log::info!("👤 Rol activo: {}", rol.nombre);
        Ok(())
    }

    /// Re-fetch asíncrono de roles/módulos. El fallo no es fatal: se
    /// conservan los datos previos, el error vuelve al caller para mostrar
    /// y la máquina de estados no retrocede.
    pub async fn refresh_user(&self) -> Result<(), SesionError> {
        self.is_loading.set(true);
        let resultado = self.user_reader.fetch_current().await;
        self.is_loading.set(false);

        // la sesión pudo cerrarse durante el viaje: una respuesta tardía no
        // debe reescribir cookies ni repoblar el usuario tras el logout
        if !self.is_authenticated() && self.phase.get() != SessionPhase::Loading {
            log::info!("🔐 Respuesta de usuario tardía con sesión cerrada, descartada");
            return Ok(());
        }

        match resultado {
            Ok(usuario) => {
                self.write_authz_cookies(&usuario);
                log::info!(
                    "✅ Usuario refrescado: {} roles, {} módulos",
                    usuario.roles.len(),
                    usuario.modulos.len()
                );
                *self.user.borrow_mut() = Some(usuario);
                if self.phase.get() == SessionPhase::Loading {
                    self.phase.set(SessionPhase::AuthenticatedNoRole);
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("⚠️ No se pudieron refrescar roles/módulos: {}", e);
                Err(SesionError::RefreshFailure(e))
            }
        }
    }

    /// Reescribir las cookies de autorización que consume RouteGuard
    fn write_authz_cookies(&self, usuario: &Usuario) {
        let roles = serde_json::to_string(&usuario.nombres_roles())
            .unwrap_or_else(|_| "[]".to_string());
        let modulos =
            serde_json::to_string(&usuario.modulos).unwrap_or_else(|_| "[]".to_string());
        self.cookies.set(COOKIE_ROLES, &roles);
        self.cookies.set(COOKIE_MODULOS, &modulos);
    }

    // ------------------------------------------------------------------
    // Cierre
    // ------------------------------------------------------------------

    /// Cerrar sesión. Siempre sucede de forma síncrona para el caller:
    /// limpia token/rol/módulos, cancela el tick y avisa a los suscriptores
    /// (el wipe de la caché de dispositivos cuelga de aquí).
    pub fn logout(&self) {
        log::info!("👋 Logout - limpiando sesión");

        // cancelar el tick ANTES de tocar el resto: un timer vivo después
        // del logout puede disparar sobre estado ya limpiado
        self.ticker_handle.borrow_mut().take();

        *self.token.borrow_mut() = None;
        *self.user.borrow_mut() = None;
        *self.selected_role.borrow_mut() = None;
        self.expiry_epoch.set(0);
        self.time_left.set(0);
        self.is_loading.set(false);
        self.phase.set(SessionPhase::Unauthenticated);

        for cookie in [COOKIE_TOKEN, COOKIE_ROLES, COOKIE_MODULOS, COOKIE_ROL_ACTIVO] {
            self.cookies.remove(cookie);
        }

        let suscriptores: Vec<Rc<dyn Fn()>> = self.logout_subscribers.borrow().clone();
        for callback in suscriptores {
            callback();
        }
    }

    /// Suscribirse al logout (regla unidireccional: logout limpia la caché)
    pub fn on_logout<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.logout_subscribers.borrow_mut().push(Rc::new(callback));
    }

    /// Teardown explícito: garantiza la cancelación del timer
    pub fn dispose(&self) {
        self.ticker_handle.borrow_mut().take();
    }

    // ------------------------------------------------------------------
    // Lectura
    // ------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase.get()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.phase.get(),
            SessionPhase::AuthenticatedNoRole
                | SessionPhase::RoleSelected
                | SessionPhase::Expiring
        )
    }

    pub fn time_left_seconds(&self) -> i64 {
        self.time_left.get()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.get()
    }

    pub fn user(&self) -> Option<Usuario> {
        self.user.borrow().clone()
    }

    pub fn selected_role(&self) -> Option<Rol> {
        self.selected_role.borrow().clone()
    }

    #[cfg(test)]
    fn has_ticker(&self) -> bool {
        self.ticker_handle.borrow().is_some()
    }
}
