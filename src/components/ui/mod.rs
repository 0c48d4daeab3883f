pub mod alert;
pub mod button;
pub mod card;
pub mod modal;
pub mod spinner;
pub mod tooltip;

// Re-export component symbols so callers can `use crate::components::ui::Button` etc.
pub use alert::*;
pub use button::*;
pub use card::*;
pub use modal::*;
pub use spinner::*;
pub use tooltip::*;
