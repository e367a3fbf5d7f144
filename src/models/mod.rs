pub mod device;
pub mod token;
pub mod user;

pub use device::*;
pub use token::*;
pub use user::*;
