// ============================================================================
// ROUTE GUARD - Autorización síncrona previa al render
// ============================================================================
// Se evalúa en cada navegación, sin puntos de suspensión: solo lee la
// presencia del token y las listas de roles/módulos serializadas en cookies,
// nunca el objeto de usuario completo (eso exigiría red antes de renderizar).
// Cookies malformadas degradan a conjuntos vacíos: falla cerrado, jamás
// concede admin por un error de parseo.
// ============================================================================

use std::collections::HashSet;

use crate::utils::constants::{
    COOKIE_MODULOS, COOKIE_ROLES, COOKIE_TOKEN, HOME_ADMIN, HOME_DEFECTO, MODULO_TABLERO,
    PREFIJO_ADMIN, ROL_ADMIN, RUTA_LOGIN, RUTA_RECUPERAR, RUTA_TABLERO,
};
use crate::utils::cookies::CookieStore;

/// Entrada del guard: snapshot síncrono de la navegación
#[derive(Debug, Clone)]
pub struct GuardInput {
    pub path: String,
    pub has_token: bool,
    /// Cookie `roles` cruda (array JSON de nombres), si existe
    pub roles_cookie: Option<String>,
    /// Cookie `modulos` cruda (array JSON de nombres), si existe
    pub modules_cookie: Option<String>,
}

impl GuardInput {
    /// Construir la entrada leyendo el almacén de cookies
    pub fn from_cookies(path: &str, cookies: &dyn CookieStore) -> Self {
        Self {
            path: path.to_string(),
            has_token: cookies.get(COOKIE_TOKEN).is_some(),
            roles_cookie: cookies.get(COOKIE_ROLES),
            modules_cookie: cookies.get(COOKIE_MODULOS),
        }
    }
}

/// Veredicto del guard. Denegar es un redirect, nunca una excepción.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Decidir la navegación. Gana la primera regla que aplica:
/// 1. Ruta pública: permitir, salvo login con token → home según rol.
/// 2. Sin token en ruta privada → login.
/// 3. Prefijo admin sin rol admin → home no-admin.
/// 4. Tablero raíz sin el módulo requerido → home no-admin.
/// 5. Permitir.
pub fn evaluate(input: &GuardInput) -> GuardDecision {
    let roles = parse_name_set(input.roles_cookie.as_deref());
    let modulos = parse_name_set(input.modules_cookie.as_deref());
    let path = input.path.as_str();

    if is_public_path(path) {
        if input.has_token && path == RUTA_LOGIN {
            return GuardDecision::Redirect(role_home(&roles).to_string());
        }
        return GuardDecision::Allow;
    }

    if !input.has_token {
        return GuardDecision::Redirect(RUTA_LOGIN.to_string());
    }

    if under_admin_prefix(path) && !roles.contains(ROL_ADMIN) {
        return GuardDecision::Redirect(HOME_DEFECTO.to_string());
    }

    if path == RUTA_TABLERO && !modulos.contains(MODULO_TABLERO) {
        return GuardDecision::Redirect(HOME_DEFECTO.to_string());
    }

    GuardDecision::Allow
}

/// Parsear una cookie de nombres. Cualquier payload ilegible → conjunto vacío.
fn parse_name_set(raw: Option<&str>) -> HashSet<String> {
    raw.and_then(|v| serde_json::from_str::<Vec<String>>(v).ok())
        .map(|nombres| nombres.into_iter().collect())
        .unwrap_or_default()
}

/// Login, recuperación de contraseña y cualquier ruta con extensión de archivo
fn is_public_path(path: &str) -> bool {
    if path == RUTA_LOGIN || path == RUTA_RECUPERAR {
        return true;
    }
    path.rsplit('/').next().is_some_and(|seg| seg.contains('.'))
}

fn under_admin_prefix(path: &str) -> bool {
    path == PREFIJO_ADMIN || path.starts_with("/admin/")
}

/// Home según el conjunto de roles: admins van a su área, el resto a salas
fn role_home(roles: &HashSet<String>) -> &'static str {
    if roles.contains(ROL_ADMIN) {
        HOME_ADMIN
    } else {
        HOME_DEFECTO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entrada(path: &str, token: bool, roles: Option<&str>, modulos: Option<&str>) -> GuardInput {
        GuardInput {
            path: path.to_string(),
            has_token: token,
            roles_cookie: roles.map(String::from),
            modules_cookie: modulos.map(String::from),
        }
    }

    #[test]
    fn admin_navega_a_tablero_y_area_admin() {
        // Escenario A: roles=["admin"], modulos=["dispositivos"]
        let roles = Some(r#"["admin"]"#);
        let modulos = Some(r#"["dispositivos"]"#);

        assert_eq!(
            evaluate(&entrada("/", true, roles, modulos)),
            GuardDecision::Allow
        );
        assert_eq!(
            evaluate(&entrada("/admin/usuarios", true, roles, modulos)),
            GuardDecision::Allow
        );
    }

    #[test]
    fn operador_sin_modulos_cae_a_salas() {
        // Escenario B: roles=["operador"], modulos=[]
        let roles = Some(r#"["operador"]"#);
        let modulos = Some(r#"[]"#);

        assert_eq!(
            evaluate(&entrada("/", true, roles, modulos)),
            GuardDecision::Redirect("/salas".to_string())
        );
        assert_eq!(
            evaluate(&entrada("/admin", true, roles, modulos)),
            GuardDecision::Redirect("/salas".to_string())
        );
    }

    #[test]
    fn cookies_malformadas_degradan_a_conjuntos_vacios() {
        // P2: JSON ilegible nunca lanza ni concede admin
        for basura in [
            Some("{no-es-json"),
            Some(r#"{"roles":"admin"}"#),
            Some("[\"admin\""),
            None,
        ] {
            assert_eq!(
                evaluate(&entrada("/admin", true, basura, basura)),
                GuardDecision::Redirect("/salas".to_string())
            );
            assert_eq!(
                evaluate(&entrada("/", true, basura, basura)),
                GuardDecision::Redirect("/salas".to_string())
            );
        }
    }

    #[test]
    fn sin_token_las_rutas_privadas_van_a_login() {
        assert_eq!(
            evaluate(&entrada("/", false, None, None)),
            GuardDecision::Redirect("/login".to_string())
        );
        assert_eq!(
            evaluate(&entrada("/salas", false, None, None)),
            GuardDecision::Redirect("/login".to_string())
        );
    }

    #[test]
    fn rutas_publicas_se_permiten_sin_token() {
        assert_eq!(
            evaluate(&entrada("/login", false, None, None)),
            GuardDecision::Allow
        );
        assert_eq!(
            evaluate(&entrada("/recuperar", false, None, None)),
            GuardDecision::Allow
        );
        // cualquier ruta con extensión de archivo es un asset estático
        assert_eq!(
            evaluate(&entrada("/assets/logo.svg", false, None, None)),
            GuardDecision::Allow
        );
    }

    #[test]
    fn login_con_token_redirige_al_home_del_rol() {
        assert_eq!(
            evaluate(&entrada("/login", true, Some(r#"["admin"]"#), None)),
            GuardDecision::Redirect("/admin".to_string())
        );
        assert_eq!(
            evaluate(&entrada("/login", true, Some(r#"["operador"]"#), None)),
            GuardDecision::Redirect("/salas".to_string())
        );
    }

    #[test]
    fn rutas_intermedias_con_token_se_permiten() {
        assert_eq!(
            evaluate(&entrada("/salas", true, Some(r#"["operador"]"#), Some("[]"))),
            GuardDecision::Allow
        );
    }

    #[test]
    fn entrada_desde_cookie_store() {
        use crate::utils::cookies::{CookieStore, MemoryCookies};

        let cookies = MemoryCookies::new();
        cookies.set("token", "abc");
        cookies.set("roles", r#"["admin"]"#);

        let input = GuardInput::from_cookies("/admin", &cookies);
        assert!(input.has_token);
        assert_eq!(evaluate(&input), GuardDecision::Allow);
    }
}
