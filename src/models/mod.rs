pub mod alias;
pub mod company;
pub mod metrics;
pub mod usage;

pub use alias::*;
pub use company::*;
pub use metrics::*;
pub use usage::*;
