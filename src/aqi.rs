mod breakpoint;
mod category;
mod correction;

pub use breakpoint::*;
pub use category::*;
pub use correction::*;
