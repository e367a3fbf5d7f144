// ============================================================================
// DEVICE CACHE - Tres vistas denormalizadas del mismo dispositivo
// ============================================================================
// El mismo agregado lógico vive bajo tres particiones independientes:
// detalle (por id), lista (por usuario propietario) y agregada (por sala).
// Son réplicas de lectura de UNA fuente de verdad, no entidades aparte.
// El índice de ubicaciones responde "qué claves pueden contener este
// actuador" para que el parche optimista no se difunda a ciegas.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::models::device::{ActuadorId, Dispositivo, DispositivoId, SalaId, UsuarioId};

/// Partición de caché que puede contener datos de dispositivos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePartition {
    Detalle,
    PorUsuario,
    PorSala,
}

/// Clave concreta dentro de una partición
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Detalle(DispositivoId),
    PorUsuario(UsuarioId),
    PorSala(SalaId),
}

impl CacheKey {
    pub fn partition(&self) -> CachePartition {
        match self {
            CacheKey::Detalle(_) => CachePartition::Detalle,
            CacheKey::PorUsuario(_) => CachePartition::PorUsuario,
            CacheKey::PorSala(_) => CachePartition::PorSala,
        }
    }
}

/// Registro de deshacer de UN comando en vuelo: clave + estado previo del
/// actuador objetivo en esa clave. La granularidad es el booleano, no la
/// vista completa: restaurar no puede pisar escrituras concurrentes sobre
/// OTROS actuadores de la misma vista.
/// `prior: None` significa que el actuador no estaba en esa clave.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub key: CacheKey,
    pub prior: Option<bool>,
}

/// Dónde puede vivir un actuador dentro de las tres particiones
#[derive(Debug, Clone, Default)]
struct ActuadorUbicacion {
    dispositivo: Option<DispositivoId>,
    usuario: Option<UsuarioId>,
    sala: Option<SalaId>,
}

struct Entry<T> {
    value: T,
    stale: bool,
}

impl<T> Entry<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            stale: false,
        }
    }
}

/// Ticket de un refetch en vuelo. El coordinador lo cancela antes de
/// aplicar un parche optimista para que una respuesta concurrente del
/// servidor no pise la escritura.
pub struct RefetchTicket {
    cancelado: Rc<Cell<bool>>,
}

impl RefetchTicket {
    pub fn is_cancelled(&self) -> bool {
        self.cancelado.get()
    }
}

/// Almacén único de las vistas cacheadas de dispositivos
#[derive(Default)]
pub struct DeviceCacheStore {
    detalle: RefCell<HashMap<DispositivoId, Entry<Dispositivo>>>,
    por_usuario: RefCell<HashMap<UsuarioId, Entry<Vec<Dispositivo>>>>,
    por_sala: RefCell<HashMap<SalaId, Entry<Vec<Dispositivo>>>>,
    ubicaciones: RefCell<HashMap<ActuadorId, ActuadorUbicacion>>,
    refetches: RefCell<Vec<(CachePartition, Rc<Cell<bool>>)>>,
}

impl DeviceCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Población (la hace el servicio de refetch tras leer del backend)
    // ------------------------------------------------------------------

    pub fn insert_detalle(&self, dispositivo: Dispositivo) {
        self.index_dispositivo(&dispositivo);
        self.detalle
            .borrow_mut()
            .insert(dispositivo.id, Entry::fresh(dispositivo));
    }

    pub fn insert_por_usuario(&self, usuario_id: UsuarioId, dispositivos: Vec<Dispositivo>) {
        for d in &dispositivos {
            self.index_dispositivo(d);
        }
        self.por_usuario
            .borrow_mut()
            .insert(usuario_id, Entry::fresh(dispositivos));
    }

    pub fn insert_por_sala(&self, sala_id: SalaId, dispositivos: Vec<Dispositivo>) {
        for d in &dispositivos {
            self.index_dispositivo(d);
        }
        self.por_sala
            .borrow_mut()
            .insert(sala_id, Entry::fresh(dispositivos));
    }

    /// Mapear cada actuador del agregado a las claves que pueden contenerlo
    fn index_dispositivo(&self, dispositivo: &Dispositivo) {
        let mut ubicaciones = self.ubicaciones.borrow_mut();
        for actuador_id in dispositivo.actuador_ids() {
            let entrada = ubicaciones.entry(actuador_id).or_default();
            entrada.dispositivo = Some(dispositivo.id);
            if dispositivo.usuario_id.is_some() {
                entrada.usuario = dispositivo.usuario_id.clone();
            }
            if dispositivo.sala_id.is_some() {
                entrada.sala = dispositivo.sala_id;
            }
        }
    }

    // ------------------------------------------------------------------
    // Lectura
    // ------------------------------------------------------------------

    pub fn get_detalle(&self, id: DispositivoId) -> Option<Dispositivo> {
        self.detalle.borrow().get(&id).map(|e| e.value.clone())
    }

    pub fn get_por_usuario(&self, usuario_id: &str) -> Option<Vec<Dispositivo>> {
        self.por_usuario
            .borrow()
            .get(usuario_id)
            .map(|e| e.value.clone())
    }

    pub fn get_por_sala(&self, sala_id: SalaId) -> Option<Vec<Dispositivo>> {
        self.por_sala.borrow().get(&sala_id).map(|e| e.value.clone())
    }

    /// Estado del actuador visto desde una clave concreta (para converger)
    pub fn actuador_estado(&self, key: &CacheKey, actuador_id: ActuadorId) -> Option<bool> {
        match key {
            CacheKey::Detalle(id) => self
                .detalle
                .borrow()
                .get(id)
                .and_then(|e| e.value.actuador(actuador_id).map(|a| a.estado)),
            CacheKey::PorUsuario(uid) => self.por_usuario.borrow().get(uid).and_then(|e| {
                e.value
                    .iter()
                    .find_map(|d| d.actuador(actuador_id).map(|a| a.estado))
            }),
            CacheKey::PorSala(sid) => self.por_sala.borrow().get(sid).and_then(|e| {
                e.value
                    .iter()
                    .find_map(|d| d.actuador(actuador_id).map(|a| a.estado))
            }),
        }
    }

    pub fn is_stale(&self, key: &CacheKey) -> Option<bool> {
        match key {
            CacheKey::Detalle(id) => self.detalle.borrow().get(id).map(|e| e.stale),
            CacheKey::PorUsuario(uid) => self.por_usuario.borrow().get(uid).map(|e| e.stale),
            CacheKey::PorSala(sid) => self.por_sala.borrow().get(sid).map(|e| e.stale),
        }
    }

    /// Claves que PUEDEN contener el actuador según el índice de ubicaciones.
    /// Desconocido → vacío (nada que parchear ni deshacer).
    pub fn affected_keys(&self, actuador_id: ActuadorId) -> Vec<CacheKey> {
        let ubicaciones = self.ubicaciones.borrow();
        let Some(u) = ubicaciones.get(&actuador_id) else {
            return Vec::new();
        };
        let mut keys = Vec::with_capacity(3);
        if let Some(d) = u.dispositivo {
            keys.push(CacheKey::Detalle(d));
        }
        if let Some(uid) = &u.usuario {
            keys.push(CacheKey::PorUsuario(uid.clone()));
        }
        if let Some(s) = u.sala {
            keys.push(CacheKey::PorSala(s));
        }
        keys
    }

    // ------------------------------------------------------------------
    // Snapshot / parche / restauración (un comando = un registro de deshacer)
    // ------------------------------------------------------------------

    /// Capturar el estado previo del actuador en cada clave
    pub fn snapshot_actuador(
        &self,
        keys: &[CacheKey],
        actuador_id: ActuadorId,
    ) -> Vec<CacheSnapshot> {
        keys.iter()
            .map(|key| CacheSnapshot {
                key: key.clone(),
                prior: self.actuador_estado(key, actuador_id),
            })
            .collect()
    }

    /// Aplicar el booleano objetivo al actuador en cada clave, sin verificar
    /// presencia primero: la ausencia en una partición es un no-op (decisión
    /// documentada, no un bug a "arreglar").
    pub fn apply_estado(&self, keys: &[CacheKey], actuador_id: ActuadorId, estado: bool) {
        for key in keys {
            match key {
                CacheKey::Detalle(id) => {
                    if let Some(entry) = self.detalle.borrow_mut().get_mut(id) {
                        entry.value.set_actuador_estado(actuador_id, estado);
                    }
                }
                CacheKey::PorUsuario(uid) => {
                    if let Some(entry) = self.por_usuario.borrow_mut().get_mut(uid) {
                        for d in &mut entry.value {
                            d.set_actuador_estado(actuador_id, estado);
                        }
                    }
                }
                CacheKey::PorSala(sid) => {
                    if let Some(entry) = self.por_sala.borrow_mut().get_mut(sid) {
                        for d in &mut entry.value {
                            d.set_actuador_estado(actuador_id, estado);
                        }
                    }
                }
            }
        }
    }

    /// Restaurar el booleano previo del actuador en cada snapshot: todo o
    /// nada sobre las claves de UN comando, sin tocar ningún otro campo ni
    /// actuador. Un prior ausente es un no-op (el parche tampoco lo tocó).
    pub fn restore_actuador(&self, actuador_id: ActuadorId, snapshots: Vec<CacheSnapshot>) {
        for snap in snapshots {
            if let Some(previo) = snap.prior {
                self.apply_estado(std::slice::from_ref(&snap.key), actuador_id, previo);
            }
        }
    }

    /// Marcar claves obsoletas: la próxima lectura re-sincroniza desde la
    /// fuente de verdad (red de seguridad para campos derivados no parcheados)
    pub fn mark_stale(&self, keys: &[CacheKey]) {
        for key in keys {
            match key {
                CacheKey::Detalle(id) => {
                    if let Some(e) = self.detalle.borrow_mut().get_mut(id) {
                        e.stale = true;
                    }
                }
                CacheKey::PorUsuario(uid) => {
                    if let Some(e) = self.por_usuario.borrow_mut().get_mut(uid) {
                        e.stale = true;
                    }
                }
                CacheKey::PorSala(sid) => {
                    if let Some(e) = self.por_sala.borrow_mut().get_mut(sid) {
                        e.stale = true;
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Refetches en vuelo
    // ------------------------------------------------------------------

    /// Registrar un refetch en vuelo para una partición
    pub fn begin_refetch(&self, partition: CachePartition) -> RefetchTicket {
        let flag = Rc::new(Cell::new(false));
        let mut refetches = self.refetches.borrow_mut();
        // barrer tickets ya terminados (solo el registro conserva el Rc)
        refetches.retain(|(_, f)| Rc::strong_count(f) > 1);
        refetches.push((partition, flag.clone()));
        RefetchTicket { cancelado: flag }
    }

    /// Cancelar todo refetch en vuelo de las particiones dadas
    pub fn cancel_refetches(&self, partitions: &[CachePartition]) {
        let mut refetches = self.refetches.borrow_mut();
        for (particion, flag) in refetches.iter() {
            if partitions.contains(particion) {
                flag.set(true);
            }
        }
        refetches.retain(|(p, _)| !partitions.contains(p));
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Vaciar todas las particiones y cancelar refetches. Lo dispara logout.
    pub fn wipe(&self) {
        self.cancel_refetches(&[
            CachePartition::Detalle,
            CachePartition::PorUsuario,
            CachePartition::PorSala,
        ]);
        self.detalle.borrow_mut().clear();
        self.por_usuario.borrow_mut().clear();
        self.por_sala.borrow_mut().clear();
        self.ubicaciones.borrow_mut().clear();
        log::info!("🗑️ Caché de dispositivos vaciada");
    }
}
