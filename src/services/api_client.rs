// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP (Stateless)
// ============================================================================
// NO tiene lógica de negocio, solo hace requests HTTP contra el backend.
// El núcleo habla con los traits de `remote`; este módulo (solo wasm) les
// pone gloo_net detrás.
// ============================================================================

use gloo_net::http::Request;

use crate::error::CommandFailed;
use crate::models::device::{ComandoActuador, Dispositivo, DispositivoId, SalaId};
use crate::models::user::Usuario;
use crate::services::remote::{ActuatorExecutor, DeviceReader, LocalFuture, UserReader};
use crate::utils::constants::BACKEND_URL;

/// Cliente API - SOLO comunicación HTTP (stateless)
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            base_url: BACKEND_URL.to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, String> {
        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;
        if !response.ok() {
            return Err(format!(
                "HTTP {}: {}",
                response.status(),
                response.status_text()
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| format!("Parse error: {}", e))
    }

    /// Enviar un comando de actuador al backend
    async fn post_comando(&self, comando: ComandoActuador) -> Result<(), CommandFailed> {
        let url = format!(
            "{}/v1/actuadores/{}/comandos",
            self.base_url, comando.actuador_id
        );

        log::info!(
            "⚡ Enviando comando al actuador {}: {:?}",
            comando.actuador_id,
            comando.accion
        );

        let response = Request::post(&url)
            .json(&comando)
            .map_err(|e| CommandFailed(format!("Serialization error: {}", e)))?
            .send()
            .await
            .map_err(|e| CommandFailed(format!("Network error: {}", e)))?;

        if response.ok() {
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(CommandFailed(format!("HTTP error {}: {}", status, error_text)))
        }
    }
}

impl ActuatorExecutor for ApiClient {
    fn execute(&self, comando: ComandoActuador) -> LocalFuture<'_, Result<(), CommandFailed>> {
        Box::pin(self.post_comando(comando))
    }
}

impl DeviceReader for ApiClient {
    fn fetch_dispositivo(
        &self,
        id: DispositivoId,
    ) -> LocalFuture<'_, Result<Dispositivo, String>> {
        let url = format!("{}/v1/dispositivos/{}", self.base_url, id);
        Box::pin(self.get_json(url))
    }

    fn fetch_por_usuario(
        &self,
        usuario_id: &str,
    ) -> LocalFuture<'_, Result<Vec<Dispositivo>, String>> {
        let url = format!("{}/v1/usuarios/{}/dispositivos", self.base_url, usuario_id);
        Box::pin(self.get_json(url))
    }

    fn fetch_por_sala(&self, sala_id: SalaId) -> LocalFuture<'_, Result<Vec<Dispositivo>, String>> {
        let url = format!("{}/v1/salas/{}/dispositivos", self.base_url, sala_id);
        Box::pin(self.get_json(url))
    }
}

impl UserReader for ApiClient {
    /// Roles y módulos vigentes del usuario autenticado (cookie de sesión)
    fn fetch_current(&self) -> LocalFuture<'_, Result<Usuario, String>> {
        let url = format!("{}/v1/usuarios/me", self.base_url);
        Box::pin(self.get_json(url))
    }
}
