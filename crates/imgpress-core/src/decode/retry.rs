//! Progressive decode retry under memory pressure.
//!
//! [`DecodeRetryController`] is an explicit state machine over a strictly descending list
//! of resolution caps. Each step decodes at the next cap; a failure discards that cap and
//! leaves the controller pending until the list runs out. Halving the cap cuts the
//! decoded pixel memory by four, so constrained callers get more chances to succeed.

use std::collections::VecDeque;

use super::{DecodeError, DecodedFrame, RasterDecoder};
use crate::config::validate_caps;
use crate::error::PipelineError;
use crate::scale::ScalingPolicy;
use crate::types::Dimensions;

/// Result of one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Dimensions of the produced buffer.
    Success(Dimensions),
    Failure(DecodeError),
}

/// Record of one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeAttempt {
    pub cap_dimension: u32,
    pub target: Dimensions,
    pub outcome: AttemptOutcome,
}

/// Controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeState {
    /// Caps not yet tried, largest first.
    Pending(VecDeque<ScalingPolicy>),
    Succeeded(DecodedFrame),
    /// Every cap failed; holds the most recent error.
    Exhausted(DecodeError),
}

impl DecodeState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DecodeState::Pending(_))
    }
}

/// Drives decode attempts across descending resolution caps.
pub struct DecodeRetryController<'a, D: RasterDecoder + ?Sized> {
    decoder: &'a D,
    bytes: &'a [u8],
    source: Dimensions,
    state: DecodeState,
    attempts: Vec<DecodeAttempt>,
}

impl<'a, D: RasterDecoder + ?Sized> DecodeRetryController<'a, D> {
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidConfig` if `caps` is empty, contains zero, or is not
    /// strictly descending.
    pub fn new(
        decoder: &'a D,
        bytes: &'a [u8],
        source: Dimensions,
        caps: &[u32],
    ) -> Result<Self, PipelineError> {
        validate_caps(caps)?;
        let policies = caps
            .iter()
            .map(|&cap| ScalingPolicy::new(cap))
            .collect::<Result<VecDeque<_>, _>>()?;

        Ok(Self {
            decoder,
            bytes,
            source,
            state: DecodeState::Pending(policies),
            attempts: Vec::with_capacity(caps.len()),
        })
    }

    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    /// Attempts made so far, in order.
    pub fn attempts(&self) -> &[DecodeAttempt] {
        &self.attempts
    }

    /// Try the next cap. A no-op once the controller is terminal.
    pub fn step(&mut self) -> &DecodeState {
        let next = match &mut self.state {
            DecodeState::Pending(remaining) => remaining.pop_front(),
            _ => None,
        };
        let Some(policy) = next else {
            return &self.state;
        };

        let cap = policy.max_dimension();
        let target = policy.apply(self.source);

        match self.decoder.decode_at(self.bytes, self.source, target) {
            Ok(pixels) => {
                self.attempts.push(DecodeAttempt {
                    cap_dimension: cap,
                    target,
                    outcome: AttemptOutcome::Success(pixels.dimensions()),
                });
                self.state = DecodeState::Succeeded(DecodedFrame {
                    source: self.source,
                    cap,
                    pixels,
                });
            }
            Err(err) => {
                log::warn!(
                    "Decode at cap {} ({} -> {}) failed: {}",
                    cap,
                    self.source,
                    target,
                    err
                );
                self.attempts.push(DecodeAttempt {
                    cap_dimension: cap,
                    target,
                    outcome: AttemptOutcome::Failure(err.clone()),
                });
                let exhausted = matches!(
                    &self.state,
                    DecodeState::Pending(remaining) if remaining.is_empty()
                );
                if exhausted {
                    self.state = DecodeState::Exhausted(err);
                }
            }
        }

        &self.state
    }

    /// Step until terminal and return the frame or the last decode error.
    pub fn run(self) -> Result<DecodedFrame, DecodeError> {
        self.run_with_history().0
    }

    /// Like [`run`](Self::run), also returning every attempt made.
    pub fn run_with_history(mut self) -> (Result<DecodedFrame, DecodeError>, Vec<DecodeAttempt>) {
        while !self.step().is_terminal() {}

        let result = match self.state {
            DecodeState::Succeeded(frame) => Ok(frame),
            DecodeState::Exhausted(err) => Err(err),
            // step() only leaves Pending while caps remain
            DecodeState::Pending(_) => Err(DecodeError::InvalidFormat),
        };
        (result, self.attempts)
    }
}
