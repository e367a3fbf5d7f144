/// URL base del backend
/// Configurada en tiempo de compilación:
/// - Desarrollo: http://localhost:3000 (por defecto)
/// - Producción: via BACKEND_URL env var (ver build.rs)
pub const BACKEND_URL: &str = match option_env!("BACKEND_URL") {
    Some(url) => url,
    None => "http://localhost:3000",
};

// Cookies que escribe SessionAuthority y lee RouteGuard
pub const COOKIE_TOKEN: &str = "token";
pub const COOKIE_ROLES: &str = "roles";
pub const COOKIE_MODULOS: &str = "modulos";
pub const COOKIE_ROL_ACTIVO: &str = "rol_activo";

// Rutas
pub const RUTA_LOGIN: &str = "/login";
pub const RUTA_RECUPERAR: &str = "/recuperar";
pub const PREFIJO_ADMIN: &str = "/admin";
pub const HOME_ADMIN: &str = "/admin";
pub const HOME_DEFECTO: &str = "/salas";
pub const RUTA_TABLERO: &str = "/";

/// Módulo que habilita el tablero raíz de dispositivos
pub const MODULO_TABLERO: &str = "dispositivos";
/// Rol que habilita el área de administración
pub const ROL_ADMIN: &str = "admin";

/// Segundos restantes bajo los cuales la sesión entra en Expiring
pub const UMBRAL_EXPIRACION_SEG: i64 = 300;
