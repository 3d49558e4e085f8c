//! Pager over a loaded day-plan sequence.

use crate::error::PlanError;
use crate::plan::model::DayPlan;

/// Holds a generated ordered sequence of day plans and serves page
/// navigation with clamping boundary semantics.
///
/// Navigation clamps rather than errors because button availability is
/// gated by the renderer, but a stale or duplicate press can still arrive
/// after the cursor has reached a boundary. Such a press is a no-op that
/// re-serves the boundary page.
#[derive(Debug, Clone, Default)]
pub struct PlanPager {
    plan: Option<Vec<DayPlan>>,
    page_index: usize,
}

impl PlanPager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any existing plan and reset the cursor to page 0.
    ///
    /// A zero-length plan is rejected before storage; a previously loaded
    /// plan is left undisturbed by the failed load.
    pub fn load(&mut self, plan: Vec<DayPlan>) -> Result<(), PlanError> {
        if plan.is_empty() {
            return Err(PlanError::EmptyPlan);
        }
        self.plan = Some(plan);
        self.page_index = 0;
        Ok(())
    }

    /// Drop the loaded plan and reset the cursor.
    pub fn clear(&mut self) {
        self.plan = None;
        self.page_index = 0;
    }

    pub fn is_loaded(&self) -> bool {
        self.plan.is_some()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Number of days in the loaded plan, or 0 when none is loaded.
    pub fn len(&self) -> usize {
        self.plan.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_prev(&self) -> bool {
        self.is_loaded() && self.page_index > 0
    }

    pub fn has_next(&self) -> bool {
        self.plan
            .as_ref()
            .is_some_and(|p| self.page_index + 1 < p.len())
    }

    pub fn current(&self) -> Result<&DayPlan, PlanError> {
        let plan = self.plan.as_ref().ok_or(PlanError::NoPlanLoaded)?;
        Ok(&plan[self.page_index])
    }

    /// Move forward one page, clamping at the last page.
    pub fn advance(&mut self) -> Result<&DayPlan, PlanError> {
        let plan = self.plan.as_ref().ok_or(PlanError::NoPlanLoaded)?;
        self.page_index = (self.page_index + 1).min(plan.len() - 1);
        Ok(&plan[self.page_index])
    }

    /// Move back one page, clamping at the first page.
    pub fn retreat(&mut self) -> Result<&DayPlan, PlanError> {
        let plan = self.plan.as_ref().ok_or(PlanError::NoPlanLoaded)?;
        self.page_index = self.page_index.saturating_sub(1);
        Ok(&plan[self.page_index])
    }
}
