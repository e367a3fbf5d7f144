#[cfg(target_arch = "wasm32")]
pub mod api_client;
pub mod command_service;
pub mod device_service;
pub mod remote;

#[cfg(target_arch = "wasm32")]
pub use api_client::ApiClient;
pub use command_service::DeviceCommandCoordinator;
pub use device_service::DeviceSyncService;
pub use remote::{ActuatorExecutor, DeviceReader, LocalFuture, UserReader};
