pub mod cluster;
pub mod function;
pub mod secret;
pub mod validation;

pub use cluster::*;
pub use function::*;
pub use secret::*;
pub use validation::*;
