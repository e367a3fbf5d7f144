// ============================================================================
// TOKEN DE SESIÓN - Decodificación del claim de expiración
// ============================================================================
// El token es opaco y lo emite el proveedor de autenticación; aquí solo se
// extrae el claim `exp` del segundo segmento (base64url sin padding).
// Cualquier fallo de decodificación cierra la sesión: nunca se adivina.
// ============================================================================

use base64::Engine;
use serde::Deserialize;

use crate::error::SesionError;

/// Claims que este núcleo entiende. El resto del payload se ignora.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiración en segundos epoch
    pub exp: i64,
    /// Sujeto (id de usuario), si el proveedor lo incluye
    #[serde(default)]
    pub sub: Option<String>,
}

/// Decodificar los claims del token. Falla cerrado con `DecodeFailure`.
pub fn decode_claims(token: &str) -> Result<TokenClaims, SesionError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or(SesionError::DecodeFailure)?;

    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| SesionError::DecodeFailure)?;

    serde_json::from_slice(&bytes).map_err(|_| SesionError::DecodeFailure)
}

#[cfg(test)]
pub mod test_util {
    use base64::Engine;

    /// Construir un token de prueba con el claim exp dado (firma ficticia)
    pub fn token_con_exp(exp: i64) -> String {
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(format!("{{\"exp\":{},\"sub\":\"u-1\"}}", exp));
        format!("cabecera.{}.firma", payload)
    }
}
