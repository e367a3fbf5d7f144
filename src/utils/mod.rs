pub mod clock;
pub mod constants;
pub mod cookies;
pub mod ticker;

pub use clock::*;
pub use constants::*;
pub use cookies::*;
pub use ticker::*;
