//! Generated meal plan — day model, tolerant response parser, pager, and
//! prompt builders for the text-generation service.

pub mod model;
pub mod pager;
pub mod parser;
pub mod prompts;

pub use model::{DayPlan, MealSlot};
pub use pager::PlanPager;
pub use parser::parse_plan_response;
