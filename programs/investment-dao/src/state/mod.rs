pub mod dao;
pub mod membership;
pub mod proposal;
pub mod release;

pub use dao::*;
pub use membership::*;
pub use proposal::*;
pub use release::*;
