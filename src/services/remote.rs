// ============================================================================
// COLABORADORES REMOTOS - Traits de los lectores/ejecutores externos
// ============================================================================
// El transporte es un detalle externo: el núcleo depende de estos traits y
// el cliente HTTP real (api_client, solo wasm) los implementa con gloo_net.
// Futuros locales (sin Send): ejecución cooperativa de un solo hilo.
// ============================================================================

use std::future::Future;
use std::pin::Pin;

use crate::error::CommandFailed;
use crate::models::device::{ComandoActuador, Dispositivo, DispositivoId, SalaId};
use crate::models::user::Usuario;

pub type LocalFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Ejecutor remoto de comandos de actuador.
/// Rechazo y fallo de red colapsan en `CommandFailed`.
pub trait ActuatorExecutor {
    fn execute(&self, comando: ComandoActuador) -> LocalFuture<'_, Result<(), CommandFailed>>;
}

/// Lector del agregado de dispositivos, usado para repoblar las cachés
/// después de una invalidación.
pub trait DeviceReader {
    fn fetch_dispositivo(&self, id: DispositivoId)
        -> LocalFuture<'_, Result<Dispositivo, String>>;
    fn fetch_por_usuario(
        &self,
        usuario_id: &str,
    ) -> LocalFuture<'_, Result<Vec<Dispositivo>, String>>;
    fn fetch_por_sala(&self, sala_id: SalaId) -> LocalFuture<'_, Result<Vec<Dispositivo>, String>>;
}

/// Lector de roles/módulos actuales del usuario autenticado
pub trait UserReader {
    fn fetch_current(&self) -> LocalFuture<'_, Result<Usuario, String>>;
}
