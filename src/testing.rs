//! Scripted flight services for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::services::{Effect, Land, Navigate, SetEffect, TargetPose, Telemetry, TelemetrySample};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Navigate(TargetPose),
    Land,
    SetEffect(Effect),
    Telemetry(String),
}

/// Answers telemetry from a script, repeating the last sample once the script runs out.
/// Records every call in order.
pub(crate) struct FakeServices {
    calls: Mutex<Vec<Call>>,
    script: Mutex<VecDeque<TelemetrySample>>,
    last: Mutex<TelemetrySample>,
}

impl FakeServices {
    /// Always on target and disarmed
    pub(crate) fn arrived() -> Self {
        Self::scripted(Vec::new())
    }

    pub(crate) fn scripted(samples: Vec<TelemetrySample>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(samples.into()),
            last: Mutex::new(TelemetrySample::default()),
        }
    }

    /// Samples at the given distances from the target, armed
    pub(crate) fn distances(distances: &[f32]) -> Self {
        Self::scripted(
            distances
                .iter()
                .map(|d| TelemetrySample { x: *d, armed: true, ..Default::default() })
                .collect(),
        )
    }

    /// Absolute samples with the given arming states
    pub(crate) fn armed_states(states: &[bool]) -> Self {
        Self::scripted(
            states
                .iter()
                .map(|armed| TelemetrySample { armed: *armed, ..Default::default() })
                .collect(),
        )
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn navigations(&self) -> Vec<TargetPose> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Navigate(pose) => Some(pose),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn effects(&self) -> Vec<Effect> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetEffect(effect) => Some(effect),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl Navigate for FakeServices {
    async fn navigate(&self, target: &TargetPose) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Navigate(target.clone()));
        Ok(())
    }
}

#[async_trait]
impl Telemetry for FakeServices {
    async fn get_telemetry(&self, frame: &str) -> Result<TelemetrySample> {
        self.calls.lock().unwrap().push(Call::Telemetry(frame.to_owned()));
        let mut last = self.last.lock().unwrap();
        if let Some(sample) = self.script.lock().unwrap().pop_front() {
            *last = sample;
        }
        Ok(*last)
    }
}

#[async_trait]
impl Land for FakeServices {
    async fn land(&self) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Land);
        Ok(())
    }
}

#[async_trait]
impl SetEffect for FakeServices {
    async fn set_effect(&self, effect: &Effect) -> Result<()> {
        self.calls.lock().unwrap().push(Call::SetEffect(effect.clone()));
        Ok(())
    }
}
