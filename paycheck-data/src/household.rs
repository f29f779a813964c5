//! Runs the engine over every job loaded from a file.
//!
//! The jobs of one file are treated as one participant: their paychecks are
//! combined for the limit check and they share the optimizer's annual room.
//! Each job's starting year-to-date balances count toward both.

use paycheck_core::{
    ContributionPlan, HsaCoverage, LimitChecker, LimitResult, OptimizedJob, Optimizer,
    PaycheckResult, StartingYtd, TaxYearConfig,
};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::jobs::JobSpec;

/// Projected paychecks for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProjection {
    pub name: String,
    pub paychecks: Vec<PaycheckResult>,
}

impl JobProjection {
    pub fn last(&self) -> Option<&PaycheckResult> {
        self.paychecks.last()
    }

    pub fn total_net_cash(&self) -> Decimal {
        self.paychecks.iter().map(|p| p.net_cash).sum()
    }
}

/// Every job's projection plus the combined limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseholdProjection {
    pub jobs: Vec<JobProjection>,
    pub limits: LimitResult,
}

impl HouseholdProjection {
    pub fn paychecks(&self) -> impl Iterator<Item = (&str, &[PaycheckResult])> {
        self.jobs
            .iter()
            .map(|job| (job.name.as_str(), job.paychecks.as_slice()))
    }
}

/// Options that apply to every job in a household run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HouseholdOptions {
    pub hsa_coverage: HsaCoverage,
    pub catch_up_eligible: bool,
}

/// Balances every job had already contributed before its first paycheck.
pub fn combined_starting_ytd(jobs: &[JobSpec]) -> StartingYtd {
    jobs.iter().map(|job| job.plan.starting_ytd).sum()
}

/// Projects each job's paychecks for `config.tax_year` and checks the
/// combined totals against the year's limits.
pub fn project_household(
    jobs: &[JobSpec],
    config: &TaxYearConfig,
    options: HouseholdOptions,
) -> HouseholdProjection {
    let projections: Vec<JobProjection> = jobs
        .iter()
        .map(|job| {
            let dates = job.paycheck_dates(config.tax_year);
            let paychecks =
                ContributionPlan::new(job.plan.clone(), config).process_paychecks(&dates);
            debug!(job = %job.name, paychecks = paychecks.len(), "projected job");
            JobProjection {
                name: job.name.clone(),
                paychecks,
            }
        })
        .collect();

    let combined: Vec<PaycheckResult> = projections
        .iter()
        .flat_map(|job| job.paychecks.iter().cloned())
        .collect();
    let limits = LimitChecker::new(&combined, &config.limits)
        .with_hsa_coverage(options.hsa_coverage)
        .with_catch_up(options.catch_up_eligible)
        .with_starting_ytd(combined_starting_ytd(jobs))
        .validate();

    info!(
        tax_year = config.tax_year,
        jobs = projections.len(),
        within_limits = limits.within_limits,
        "household projection complete"
    );

    HouseholdProjection {
        jobs: projections,
        limits,
    }
}

/// Proposes elections for every job, sharing annual room in file order.
pub fn optimize_household(
    jobs: &[JobSpec],
    config: &TaxYearConfig,
    hsa_target: Option<Decimal>,
    options: HouseholdOptions,
) -> Vec<OptimizedJob> {
    let descriptors: Vec<_> = jobs
        .iter()
        .map(|job| job.descriptor(config.tax_year))
        .collect();

    let optimizer = Optimizer::new(&descriptors, &config.limits)
        .with_catch_up(options.catch_up_eligible)
        .with_starting_ytd(combined_starting_ytd(jobs));
    let optimizer = match hsa_target {
        Some(target) => optimizer.with_hsa_target(target),
        None => match options.hsa_coverage {
            HsaCoverage::Family => optimizer,
            HsaCoverage::Individual => {
                optimizer.with_hsa_target(config.limits.hsa_individual_limit)
            }
        },
    };

    optimizer.optimize()
}

/// Jobs with their elections replaced by the optimizer's proposals.
///
/// Jobs and proposals are paired by position.
pub fn apply_optimized(
    jobs: &[JobSpec],
    optimized: &[OptimizedJob],
) -> Vec<JobSpec> {
    jobs.iter()
        .zip(optimized)
        .map(|(job, proposal)| JobSpec {
            plan: job.plan.with_contributions(proposal.contribution_input),
            ..job.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use paycheck_core::calculations::reference_config;
    use paycheck_core::{ContributionInput, ContributionPlanInput, PayFrequency, PaycheckSchedule};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn job(
        name: &str,
        gross: Decimal,
        input: ContributionInput,
    ) -> JobSpec {
        let first = NaiveDate::from_ymd_opt(2026, 1, 9).expect("valid date");
        job_from(name, first, gross, input)
    }

    fn job_from(
        name: &str,
        first: NaiveDate,
        gross: Decimal,
        input: ContributionInput,
    ) -> JobSpec {
        JobSpec {
            name: name.to_string(),
            schedule: PaycheckSchedule::with_frequency(first, PayFrequency::Biweekly),
            plan: ContributionPlanInput::new(gross, input, dec!(0.5), dec!(6)),
            hsa_allowed: dec!(150),
            match_threshold_pct: dec!(6),
            max_traditional_pct: dec!(100),
            allow_roth: false,
            allow_after_tax: false,
            true_up: false,
            preferred_roth_pct: dec!(0),
            preferred_after_tax_pct: dec!(0),
        }
    }

    #[test]
    fn test_project_household_checks_combined_totals() {
        let config = reference_config();
        // 12% of 4000 = 480 per paycheck, 12480 for the year; two jobs exceed 23000.
        let twelve_pct = ContributionInput::new(dec!(12), dec!(0), dec!(0), dec!(0));
        let jobs = [
            job("First", dec!(4000), twelve_pct),
            job("Second", dec!(4000), twelve_pct),
        ];

        let projection = project_household(&jobs, &config, HouseholdOptions::default());

        assert_eq!(projection.jobs.len(), 2);
        assert_eq!(projection.jobs[0].paychecks.len(), 26);
        assert_eq!(
            projection.jobs[0].last().map(|p| p.ytd_employee_401k),
            Some(dec!(12480))
        );
        assert_eq!(
            projection.limits.warnings,
            vec!["Employee 401(k) limit exceeded by $1960.00".to_string()]
        );
    }

    #[test]
    fn test_project_household_single_job_within_limits() {
        let config = reference_config();
        let jobs = [job(
            "Only",
            dec!(4000),
            ContributionInput::new(dec!(12), dec!(0), dec!(0), dec!(0)),
        )];

        let projection = project_household(&jobs, &config, HouseholdOptions::default());

        assert!(projection.limits.within_limits);
        assert_eq!(projection.paychecks().count(), 1);
    }

    #[test]
    fn test_optimize_household_uses_individual_target_for_individual_coverage() {
        let config = reference_config();
        let mut generous = job("Generous", dec!(5000), ContributionInput::default());
        generous.hsa_allowed = dec!(1000);
        let jobs = [generous];
        let options = HouseholdOptions {
            hsa_coverage: HsaCoverage::Individual,
            catch_up_eligible: false,
        };

        let optimized = optimize_household(&jobs, &config, None, options);

        // 4150 / 26 = 159.62 per check, 3.19% of 5000
        assert_eq!(optimized[0].contribution_input.hsa_pct, dec!(3.19));
    }

    #[test]
    fn test_optimize_household_explicit_target_wins() {
        let config = reference_config();
        let jobs = [job("Acme", dec!(4000), ContributionInput::default())];

        let optimized = optimize_household(
            &jobs,
            &config,
            Some(dec!(1300)),
            HouseholdOptions::default(),
        );

        // 1300 / 26 = 50 per check
        assert_eq!(optimized[0].contribution_input.hsa_pct, dec!(1.25));
    }

    #[test]
    fn test_apply_optimized_replaces_elections_only() {
        let config = reference_config();
        let jobs = [job("Acme", dec!(5000), ContributionInput::default())];
        let optimized = optimize_household(&jobs, &config, None, HouseholdOptions::default());

        let applied = apply_optimized(&jobs, &optimized);

        assert_eq!(
            applied[0].plan.contribution_input,
            optimized[0].contribution_input
        );
        assert_eq!(applied[0].plan.gross_per_paycheck, dec!(5000));
        assert_eq!(applied[0].schedule, jobs[0].schedule);

        let projection = project_household(&applied, &config, HouseholdOptions::default());
        assert!(projection.limits.within_limits, "{:?}", projection.limits.warnings);
    }

    fn mid_year_job() -> JobSpec {
        let first = NaiveDate::from_ymd_opt(2026, 7, 3).expect("valid date");
        let mut job = job_from(
            "MidYear",
            first,
            dec!(4000),
            ContributionInput::new(dec!(10), dec!(0), dec!(0), dec!(5)),
        );
        job.hsa_allowed = dec!(200);
        job.match_threshold_pct = dec!(3);
        job.plan = job.plan.with_starting_ytd(StartingYtd {
            traditional: dec!(20400),
            hsa: dec!(7000),
            ..StartingYtd::default()
        });
        job
    }

    #[test]
    fn test_project_household_counts_starting_balances() {
        let config = reference_config();
        let jobs = [mid_year_job()];

        let projection = project_household(&jobs, &config, HouseholdOptions::default());

        // 13 paychecks from July 3: 5200 traditional, 2600 HSA on top of the balances
        let last = projection.jobs[0].last().expect("paychecks");
        assert_eq!(last.ytd_employee_401k, dec!(25600));
        assert_eq!(last.ytd_hsa, dec!(9600));
        assert_eq!(
            projection.limits.warnings,
            vec![
                "Employee 401(k) limit exceeded by $2600.00".to_string(),
                "HSA family limit exceeded by $1300.00".to_string(),
            ]
        );
    }

    #[test]
    fn test_optimize_household_leaves_only_remaining_room() {
        let config = reference_config();
        let jobs = [mid_year_job()];

        let optimized = optimize_household(&jobs, &config, None, HouseholdOptions::default());

        let input = optimized[0].contribution_input;
        // (8300 - 7000) / 13 = 100 per check
        assert_eq!(input.hsa_pct, dec!(2.5));
        // (23000 - 20400) / (4000 * 13)
        assert_eq!(input.traditional_pct, dec!(5));

        let applied = apply_optimized(&jobs, &optimized);
        let projection = project_household(&applied, &config, HouseholdOptions::default());
        let last = projection.jobs[0].last().expect("paychecks");
        assert_eq!(last.ytd_employee_401k, dec!(23000));
        assert_eq!(last.ytd_hsa, dec!(8300));
        assert!(projection.limits.within_limits, "{:?}", projection.limits.warnings);
    }
}
