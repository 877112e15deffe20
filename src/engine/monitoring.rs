//! Scoped start/stop of condition monitoring.

use crate::core::SharedCondition;
use crate::engine::waiter::ConditionWait;
use std::sync::Arc;
use tracing::trace;

/// Calls `on_start_monitoring` on creation and `on_stop_monitoring` exactly
/// once, either through [`MonitoringScope::stop`] or on drop.
pub(crate) struct MonitoringScope {
    conditions: Vec<SharedCondition>,
    monitoring: bool,
}

impl MonitoringScope {
    pub fn start(waits: &[ConditionWait]) -> Self {
        let conditions: Vec<SharedCondition> =
            waits.iter().map(|w| Arc::clone(w.condition())).collect();
        for condition in &conditions {
            condition.on_start_monitoring();
        }
        trace!(count = conditions.len(), "monitoring started");
        Self {
            conditions,
            monitoring: true,
        }
    }

    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.monitoring {
            return;
        }
        self.monitoring = false;
        for condition in self.conditions.iter().rev() {
            condition.on_stop_monitoring();
        }
        trace!(count = self.conditions.len(), "monitoring stopped");
    }
}

impl Drop for MonitoringScope {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Condition, ConditionStatus};
    use crate::engine::waiter::OriginTag;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Condition for Recorder {
        fn description(&self) -> String {
            self.name.to_string()
        }

        fn check(&self) -> ConditionStatus {
            ConditionStatus::fulfilled()
        }

        fn on_start_monitoring(&self) {
            self.log.lock().unwrap().push(format!("start {}", self.name));
        }

        fn on_stop_monitoring(&self) {
            self.log.lock().unwrap().push(format!("stop {}", self.name));
        }
    }

    fn waits(log: &Arc<Mutex<Vec<String>>>) -> Vec<ConditionWait> {
        ["a", "b"]
            .into_iter()
            .map(|name| {
                ConditionWait::new(
                    Arc::new(Recorder {
                        name,
                        log: Arc::clone(log),
                    }),
                    OriginTag::Enter,
                )
            })
            .collect()
    }

    #[test]
    fn stop_releases_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scope = MonitoringScope::start(&waits(&log));
        scope.stop();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["start a", "start b", "stop b", "stop a"]
        );
    }

    #[test]
    fn drop_releases_exactly_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let _scope = MonitoringScope::start(&waits(&log));
        }

        let stops = log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with("stop"))
            .count();
        assert_eq!(stops, 2);
    }
}
