pub mod layout;
pub mod trader;

pub use layout::LayoutState;
pub use trader::{Trader, TraderPage};
