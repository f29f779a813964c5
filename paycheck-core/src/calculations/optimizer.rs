//! Greedy allocation of annual HSA and 401(k) room across jobs.
//!
//! Two budgets are opened once per call and drawn down job by job, in the
//! order the jobs are given:
//!
//! | Budget | Starts at | Drawn down by |
//! |--------|-----------|---------------|
//! | HSA | the HSA target (default: family limit) | `hsa_per_check * paycheck_count` |
//! | 401(k) | employee deferral limit | `traditional_pct * gross * paycheck_count` |
//!
//! Balances already contributed this year ([`StartingYtd`]) come off the top:
//! starting HSA from the HSA budget, starting traditional and Roth from the
//! 401(k) budget. Neither budget goes below zero.
//!
//! Per job, HSA room is spread evenly over that job's paychecks and capped by
//! the job's per-paycheck HSA allowance. Traditional deferrals start at the
//! match-capturing threshold and are raised to consume the remaining 401(k)
//! room, never beyond the job's traditional ceiling.
//!
//! Allocation is first-come-first-served. Earlier jobs get priority access to
//! shared room and nothing is revisited once allocated.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use paycheck_core::JobDescriptor;
//! use paycheck_core::calculations::{Optimizer, reference_limits};
//!
//! let mut job = JobDescriptor::new("Acme", dec!(4000), 26);
//! job.hsa_allowed = dec!(150);
//! job.match_threshold_pct = dec!(5);
//! job.max_traditional_pct = dec!(50);
//!
//! let limits = reference_limits();
//! let jobs = [job];
//! let optimized = Optimizer::new(&jobs, &limits).optimize();
//!
//! assert_eq!(optimized[0].contribution_input.hsa_pct, dec!(3.75));
//! assert_eq!(optimized[0].contribution_input.traditional_pct, dec!(22.12));
//! ```

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::common::{as_percent_of, non_negative, percent_of, round_half_up};
use crate::models::{
    ContributionInput, ContributionLimits, JobDescriptor, OptimizedJob, StartingYtd,
};

/// Proposes contribution percentages for a list of jobs.
#[derive(Debug, Clone)]
pub struct Optimizer<'a> {
    jobs: &'a [JobDescriptor],
    limits: &'a ContributionLimits,
    hsa_target: Decimal,
    catch_up_eligible: bool,
    starting_ytd: StartingYtd,
}

/// Running budgets for one `optimize` call.
#[derive(Debug, Clone, Copy)]
struct RemainingRoom {
    hsa: Decimal,
    employee_401k: Decimal,
}

impl<'a> Optimizer<'a> {
    pub fn new(
        jobs: &'a [JobDescriptor],
        limits: &'a ContributionLimits,
    ) -> Self {
        Self {
            jobs,
            limits,
            hsa_target: limits.hsa_family_limit,
            catch_up_eligible: false,
            starting_ytd: StartingYtd::default(),
        }
    }

    /// Overrides the household HSA target.
    pub fn with_hsa_target(
        mut self,
        hsa_target: Decimal,
    ) -> Self {
        self.hsa_target = hsa_target;
        self
    }

    /// Adds the catch-up contribution to the 401(k) budget.
    pub fn with_catch_up(
        mut self,
        catch_up_eligible: bool,
    ) -> Self {
        self.catch_up_eligible = catch_up_eligible;
        self
    }

    /// Balances contributed before the jobs' first paychecks.
    pub fn with_starting_ytd(
        mut self,
        starting_ytd: StartingYtd,
    ) -> Self {
        self.starting_ytd = starting_ytd;
        self
    }

    pub fn hsa_target(&self) -> Decimal {
        self.hsa_target
    }

    fn deferral_budget(&self) -> Decimal {
        if self.catch_up_eligible {
            self.limits.employee_deferral_limit + self.limits.catch_up_contribution
        } else {
            self.limits.employee_deferral_limit
        }
    }

    /// Allocates room to every job, returning one [`OptimizedJob`] per input
    /// job in input order.
    pub fn optimize(&self) -> Vec<OptimizedJob> {
        let mut room = RemainingRoom {
            hsa: non_negative(self.hsa_target - self.starting_ytd.hsa),
            employee_401k: non_negative(
                self.deferral_budget() - self.starting_ytd.elective_deferrals(),
            ),
        };

        let optimized: Vec<OptimizedJob> = self
            .jobs
            .iter()
            .map(|job| Self::allocate(job, &mut room))
            .collect();

        debug!(
            jobs = optimized.len(),
            remaining_hsa = %round_half_up(room.hsa),
            remaining_401k = %round_half_up(room.employee_401k),
            "optimized contribution allocation"
        );

        optimized
    }

    fn allocate(
        job: &JobDescriptor,
        room: &mut RemainingRoom,
    ) -> OptimizedJob {
        let count = Decimal::from(job.paycheck_count);
        let schedule_gross = job.schedule_gross();

        if schedule_gross <= Decimal::ZERO {
            warn!(
                job = %job.name,
                paycheck_count = job.paycheck_count,
                gross = %job.gross_per_paycheck,
                "job has no pay to allocate against"
            );
        }

        // HSA: spread remaining room across this job's paychecks.
        let hsa_per_check = if schedule_gross > Decimal::ZERO {
            non_negative((room.hsa / count).min(job.hsa_allowed))
        } else {
            Decimal::ZERO
        };
        room.hsa -= hsa_per_check * count;

        // Traditional: match threshold first, then fill remaining 401(k) room.
        let mut traditional_pct = job.match_threshold_pct.min(job.max_traditional_pct);
        if room.employee_401k > Decimal::ZERO && schedule_gross > Decimal::ZERO {
            let room_pct =
                as_percent_of(room.employee_401k, schedule_gross).min(job.max_traditional_pct);
            traditional_pct = traditional_pct.max(room_pct);
            room.employee_401k -= percent_of(traditional_pct, schedule_gross);
        }

        let roth_pct = if job.allow_roth {
            job.preferred_roth_pct
        } else {
            Decimal::ZERO
        };
        let after_tax_pct = if job.allow_after_tax {
            job.preferred_after_tax_pct
        } else {
            Decimal::ZERO
        };
        let hsa_pct = as_percent_of(hsa_per_check, job.gross_per_paycheck);

        debug!(
            job = %job.name,
            %hsa_per_check,
            %traditional_pct,
            remaining_hsa = %room.hsa,
            remaining_401k = %room.employee_401k,
            "allocated job"
        );

        OptimizedJob {
            job_name: job.name.clone(),
            contribution_input: ContributionInput::new(
                round_half_up(traditional_pct),
                round_half_up(roth_pct),
                round_half_up(after_tax_pct),
                round_half_up(hsa_pct),
            ),
            notes: Self::notes(job),
        }
    }

    fn notes(job: &JobDescriptor) -> Vec<String> {
        let pacing = if job.true_up {
            "True-up allows safe front-loading"
        } else {
            "Per-paycheck match preserved"
        };
        let after_tax = if job.allow_after_tax {
            "After-tax allowed"
        } else {
            "After-tax not allowed"
        };

        vec![
            format!(
                "Match threshold {}% applied",
                job.match_threshold_pct.normalize()
            ),
            pacing.to_string(),
            after_tax.to_string(),
        ]
    }
}
