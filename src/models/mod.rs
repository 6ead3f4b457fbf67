pub mod enums;
pub mod observation;
pub mod profile;
pub mod report;

pub use enums::*;
pub use observation::*;
pub use profile::*;
pub use report::*;
