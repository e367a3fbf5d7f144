// ============================================================================
// APP STATE - Raíz de composición del runtime
// ============================================================================
// Construye la autoridad de sesión, la caché de dispositivos y los servicios
// que las consumen, y cablea la única regla que los cruza: logout limpia la
// caché. La dependencia es unidireccional; la caché no sabe de sesiones.
// ============================================================================

use std::rc::Rc;

use crate::routing::Navigator;
use crate::services::command_service::DeviceCommandCoordinator;
use crate::services::device_service::DeviceSyncService;
use crate::services::remote::{ActuatorExecutor, DeviceReader, UserReader};
use crate::state::device_cache::DeviceCacheStore;
use crate::state::session_authority::SessionAuthority;
use crate::utils::clock::Clock;
use crate::utils::cookies::CookieStore;
use crate::utils::ticker::Ticker;

pub struct AppState {
    pub session: Rc<SessionAuthority>,
    pub devices: Rc<DeviceCacheStore>,
    pub commands: DeviceCommandCoordinator,
    pub device_sync: DeviceSyncService,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: Rc<dyn Clock>,
        cookies: Rc<dyn CookieStore>,
        navigator: Rc<dyn Navigator>,
        ticker: Rc<dyn Ticker>,
        user_reader: Rc<dyn UserReader>,
        device_reader: Rc<dyn DeviceReader>,
        executor: Rc<dyn ActuatorExecutor>,
    ) -> Self {
        let session = Rc::new(SessionAuthority::new(
            clock,
            cookies,
            navigator,
            ticker,
            user_reader,
        ));
        let devices = Rc::new(DeviceCacheStore::new());

        let devices_al_logout = devices.clone();
        session.on_logout(move || {
            log::info!("🗑️ Logout detectado, limpiando caché de dispositivos");
            devices_al_logout.wipe();
        });

        let commands = DeviceCommandCoordinator::new(devices.clone(), executor);
        let device_sync = DeviceSyncService::new(devices.clone(), device_reader);

        Self {
            session,
            devices,
            commands,
            device_sync,
        }
    }

    /// Arranque: restaurar la sesión persistida y activar la cuenta regresiva
    pub fn initialize(&self) {
        self.session.initialize();
    }

    /// Teardown explícito del runtime
    pub fn dispose(&self) {
        self.session.dispose();
    }
}
