// ============================================================================
// MODELO DE DISPOSITIVO - Agregado de gpios con sensores y actuadores
// ============================================================================
// Esquema exhaustivo y versionado por serde: la lógica de parcheo optimista
// no puede saltarse silenciosamente un cambio de forma.
// ============================================================================

use serde::{Deserialize, Serialize};

pub type DispositivoId = i64;
pub type SalaId = i64;
pub type ActuadorId = i64;
pub type UsuarioId = String;

/// Agregado principal: árbol de gpios con sensores y actuadores.
/// La misma entidad lógica vive cacheada en tres particiones (detalle,
/// por usuario, por sala) como réplicas de lectura denormalizadas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dispositivo {
    pub id: DispositivoId,
    pub nombre: String,
    /// Usuario propietario (vista de lista)
    pub usuario_id: Option<UsuarioId>,
    /// Sala contenedora (vista agregada)
    pub sala_id: Option<SalaId>,
    pub gpios: Vec<Gpio>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Gpio {
    pub id: i64,
    pub pin: u8,
    pub sensores: Vec<Sensor>,
    pub actuadores: Vec<Actuador>,
}

/// Entrada de solo lectura - este núcleo nunca la muta
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sensor {
    pub id: i64,
    pub nombre: String,
    pub tipo: String,
    #[serde(default)]
    pub ultima_lectura: Option<f64>,
}

/// Salida controlable con estado booleano encendido/apagado.
/// `estado` es el ÚNICO campo que el coordinador muta optimistamente.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actuador {
    pub id: ActuadorId,
    pub nombre: String,
    pub estado: bool,
}

impl Dispositivo {
    /// Buscar un actuador por id en todo el árbol de gpios
    pub fn actuador(&self, actuador_id: ActuadorId) -> Option<&Actuador> {
        self.gpios
            .iter()
            .flat_map(|g| g.actuadores.iter())
            .find(|a| a.id == actuador_id)
    }

    /// Parchear in-place el estado de un actuador. Devuelve true si existía.
    /// Ausencia es un no-op: la partición que no lo contiene no cambia.
    pub fn set_actuador_estado(&mut self, actuador_id: ActuadorId, estado: bool) -> bool {
        for gpio in &mut self.gpios {
            for act in &mut gpio.actuadores {
                if act.id == actuador_id {
                    act.estado = estado;
                    return true;
                }
            }
        }
        false
    }

    /// Ids de todos los actuadores del agregado (para indexar ubicaciones)
    pub fn actuador_ids(&self) -> Vec<ActuadorId> {
        self.gpios
            .iter()
            .flat_map(|g| g.actuadores.iter().map(|a| a.id))
            .collect()
    }
}

/// Acción sobre un actuador. En el cable viaja como "encender"/"apagar".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccionActuador {
    Encender,
    Apagar,
}

impl AccionActuador {
    /// Estado booleano que la acción deja en el actuador
    pub fn estado_objetivo(self) -> bool {
        matches!(self, AccionActuador::Encender)
    }
}

/// Comando efímero hacia el ejecutor remoto - no se persiste
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComandoActuador {
    pub actuador_id: ActuadorId,
    pub accion: AccionActuador,
}
