mod declaration;
mod review;
mod signature;

pub use declaration::*;
pub use review::*;
pub use signature::*;
