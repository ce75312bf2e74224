mod format;
mod parse;
mod planner;
mod rates;
mod types;

pub use format::{plan_line, plan_summary, rate_line};
pub use parse::parse_amount;
pub use planner::{QuickEstimate, allocate, quick_estimate};
pub use rates::quote;
pub use types::{Catalog, ExchangeConfig, Item, Plan, PlanLine, Scenario, YieldQuote};
