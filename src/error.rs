// ============================================================================
// ERRORES - Taxonomía de fallos del núcleo
// ============================================================================
// Fallos de autorización (DecodeFailure) se resuelven con fallback/redirect,
// nunca se muestran como texto. Fallos de datos (RefreshFailure, CommandFailed)
// se devuelven a la capa UI para mensajería.
// ============================================================================

use thiserror::Error;

/// Errores del ciclo de vida de la sesión
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SesionError {
    /// Token ilegible o sin claim de expiración - se cae a Unauthenticated
    #[error("token ilegible: no se pudo decodificar la expiración")]
    DecodeFailure,

    /// El rol seleccionado no pertenece al usuario actual
    #[error("el rol seleccionado no pertenece al usuario")]
    InvalidRoleSelection,

    /// Falló el re-fetch de roles/módulos - no fatal, se conservan los previos
    #[error("no se pudieron refrescar roles/módulos: {0}")]
    RefreshFailure(String),
}

/// Comando al actuador rechazado por el ejecutor remoto o inalcanzable.
/// Rechazo remoto y fallo de red colapsan en este único resultado.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("comando al actuador falló: {0}")]
pub struct CommandFailed(pub String);
