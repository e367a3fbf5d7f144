use serde::{Deserialize, Serialize};

use crate::models::device::UsuarioId;

/// Paquete de permisos administrativos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rol {
    pub id: i64,
    pub nombre: String,
}

/// Usuario autenticado con su conjunto de roles y el conjunto derivado
/// de módulos (áreas del panel a las que da acceso).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usuario {
    pub id: UsuarioId,
    pub nombre: String,
    #[serde(default)]
    pub email: Option<String>,
    pub roles: Vec<Rol>,
    pub modulos: Vec<String>,
}

impl Usuario {
    pub fn tiene_rol(&self, rol: &Rol) -> bool {
        self.roles.iter().any(|r| r.id == rol.id)
    }

    /// Nombres de roles tal como se serializan en la cookie que lee el guard
    pub fn nombres_roles(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.nombre.clone()).collect()
    }
}
