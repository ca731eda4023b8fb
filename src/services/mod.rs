pub mod count_debouncer;

pub use count_debouncer::{run_count_debouncer, CountUpdate, TraderCounter};
