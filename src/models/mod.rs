// Models module - game API data structures

pub mod company;
pub mod vessel;
pub mod anchor;
pub mod hijacking;
pub mod messenger;
pub mod alliance;
pub mod coop;
pub mod port;
pub mod staff;
pub mod responses;

// Re-export all models for easier imports
pub use company::*;
pub use vessel::*;
pub use anchor::*;
pub use hijacking::*;
pub use messenger::*;
pub use alliance::*;
pub use coop::*;
pub use port::*;
pub use staff::*;
pub use responses::*;
