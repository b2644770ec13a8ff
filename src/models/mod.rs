pub mod assessment;
pub mod enums;
pub mod filters;
pub mod follow_up;
pub mod indicator;
pub mod patient;
pub mod user;

pub use assessment::*;
pub use enums::*;
pub use filters::*;
pub use follow_up::*;
pub use indicator::*;
pub use patient::*;
pub use user::*;
