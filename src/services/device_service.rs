// ============================================================================
// REFETCH DE DISPOSITIVOS - Repoblar las cachés tras una invalidación
// ============================================================================
// Cada carga registra un ticket cancelable: si un comando optimista cancela
// el refetch mientras la respuesta viaja, esa respuesta se descarta en vez
// de pisar la escritura optimista.
// ============================================================================

use std::rc::Rc;

use crate::models::device::{DispositivoId, SalaId};
use crate::services::remote::DeviceReader;
use crate::state::device_cache::{CachePartition, DeviceCacheStore};

pub struct DeviceSyncService {
    cache: Rc<DeviceCacheStore>,
    reader: Rc<dyn DeviceReader>,
}

impl DeviceSyncService {
    pub fn new(cache: Rc<DeviceCacheStore>, reader: Rc<dyn DeviceReader>) -> Self {
        Self { cache, reader }
    }

    /// Recargar la vista de detalle de un dispositivo
    pub async fn load_dispositivo(&self, id: DispositivoId) -> Result<(), String> {
        let ticket = self.cache.begin_refetch(CachePartition::Detalle);
        let dispositivo = self.reader.fetch_dispositivo(id).await?;
        if ticket.is_cancelled() {
            log::debug!("Refetch de detalle {} cancelado, respuesta descartada", id);
            return Ok(());
        }
        self.cache.insert_detalle(dispositivo);
        Ok(())
    }

    /// Recargar la vista de lista de un usuario propietario
    pub async fn load_por_usuario(&self, usuario_id: &str) -> Result<(), String> {
        let ticket = self.cache.begin_refetch(CachePartition::PorUsuario);
        let dispositivos = self.reader.fetch_por_usuario(usuario_id).await?;
        if ticket.is_cancelled() {
            log::debug!(
                "Refetch por usuario {} cancelado, respuesta descartada",
                usuario_id
            );
            return Ok(());
        }
        self.cache
            .insert_por_usuario(usuario_id.to_string(), dispositivos);
        Ok(())
    }

    /// Recargar la vista agregada de una sala
    pub async fn load_por_sala(&self, sala_id: SalaId) -> Result<(), String> {
        let ticket = self.cache.begin_refetch(CachePartition::PorSala);
        let dispositivos = self.reader.fetch_por_sala(sala_id).await?;
        if ticket.is_cancelled() {
            log::debug!("Refetch por sala {} cancelado, respuesta descartada", sala_id);
            return Ok(());
        }
        self.cache.insert_por_sala(sala_id, dispositivos);
        Ok(())
    }
}
