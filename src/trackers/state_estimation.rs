use crate::detectors::Detection;
use crate::trackers::{Propagated, PropagationContext, PropagationStrategy};
use crate::utils::frame::Frame;
use crate::utils::kalman::kalman_2d_point_bank::{KalmanBank, KalmanBankOptions};
use crate::utils::pyrlk::{PyrLkFlow, PyrLkOptions};
use crate::Errors;
use anyhow::Result;

#[derive(Clone, Copy, Debug)]
pub struct StateEstimationOptions {
    pub bank: KalmanBankOptions,
    pub flow: PyrLkOptions,
    /// Ground truth is fed to the filter bank only on ticks where
    /// `tick % correction_period == 0`; other ticks dead-reckon.
    pub correction_period: usize,
}

impl Default for StateEstimationOptions {
    fn default() -> Self {
        Self {
            bank: KalmanBankOptions::default(),
            flow: PyrLkOptions::default(),
            correction_period: 1,
        }
    }
}

/// Per-slot linear state estimation over a Kalman filter bank.
///
/// An internal optical-flow tracker supplies the ground-truth measurements;
/// they are fed into the bank on the configured correction schedule. The
/// strategy yields the bank's predictions as the current feature set and the
/// flow output as ground truth - the engine carries the latter forward, so
/// the flow chain is never contaminated by filter estimates.
#[derive(Debug)]
pub struct StateEstimationPropagation {
    bank: KalmanBank,
    ground_truth_flow: PyrLkFlow,
    correction_period: usize,
}

impl StateEstimationPropagation {
    pub fn new(n_points: usize, opts: StateEstimationOptions) -> Result<Self> {
        if opts.correction_period == 0 {
            return Err(Errors::ZeroCorrectionPeriod.into());
        }
        Ok(Self {
            bank: KalmanBank::new(n_points, opts.bank)?,
            ground_truth_flow: PyrLkFlow::new(opts.flow),
            correction_period: opts.correction_period,
        })
    }
}

impl PropagationStrategy for StateEstimationPropagation {
    fn begin_cycle(&mut self, _frame: &Frame, detection: &Detection) -> Result<()> {
        self.bank.reset(&detection.points);
        Ok(())
    }

    fn propagate(&mut self, ctx: &PropagationContext<'_>) -> Result<Propagated> {
        let (ground_truth, _status) =
            self.ground_truth_flow
                .track(ctx.prev_frame, ctx.frame, ctx.prev_points);

        let correct = ctx.tick % self.correction_period == 0;
        let points = self.bank.predict(correct.then_some(&ground_truth));

        Ok(Propagated {
            points,
            ground_truth: Some(ground_truth),
            matches: None,
        })
    }
}
