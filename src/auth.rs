pub mod guard;
pub mod hash;
pub mod token;

pub use guard::authorize;
