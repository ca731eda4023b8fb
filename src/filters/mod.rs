pub mod codec;
pub mod condition;
pub mod fields;

pub use codec::{dedup_rows, parse_list, parse_params, stringify_list, stringify_params};
pub use condition::{Condition, ConditionRow, ConditionType};
pub use fields::{default_filters, FieldKind, FilterField};
