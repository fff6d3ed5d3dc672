use serde::{Deserialize, Serialize};

/// Lifecycle of one voice call attempt.
///
/// Exactly one status holds at any time; it is the sole gate for which
/// commands are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// No attempt in flight. Initial state, and the landing state for
    /// failed or cancelled attempts.
    Inactive,
    /// A start command was issued; waiting for the channel's call-start.
    Connecting,
    /// The call is live.
    Active,
    /// The attempt ended normally. A new start re-enters `Connecting`.
    Finished,
}

/// Everything that can move a session between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTrigger {
    /// Caller-issued start command.
    Start,
    /// Caller-issued disconnect.
    Stop,
    /// The channel reported the call went live.
    CallStarted,
    /// The channel reported the call ended.
    CallEnded,
    /// The channel reported a failure, or rejected the start command.
    ChannelFailed,
}

impl CallStatus {
    /// The closed transition table. `None` means the trigger is ignored in
    /// this status; no transition outside this table is reachable.
    pub fn transition(self, trigger: CallTrigger) -> Option<CallStatus> {
        use CallStatus::*;
        use CallTrigger::*;

        match (self, trigger) {
            (Inactive | Finished, Start) => Some(Connecting),
            (Connecting, CallStarted) => Some(Active),
            (Active, Stop) => Some(Finished),
            // Stopping a pending attempt cancels it: the call never reached
            // a clean end, so it is not recorded as finished.
            (Connecting, Stop) => Some(Inactive),
            (Active, CallEnded) => Some(Finished),
            // Mid-flight failures land in Inactive, not Finished; the
            // session must not count as completed.
            (Connecting | Active, ChannelFailed) => Some(Inactive),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CallStatus::*;
    use super::CallTrigger::*;
    use super::*;

    const STATUSES: [CallStatus; 4] = [Inactive, Connecting, Active, Finished];
    const TRIGGERS: [CallTrigger; 5] = [Start, Stop, CallStarted, CallEnded, ChannelFailed];

    #[test]
    fn test_transition_table_is_exhaustive() {
        // Every (status, trigger) pair either appears here or is ignored.
        let table = [
            (Inactive, Start, Connecting),
            (Finished, Start, Connecting),
            (Connecting, CallStarted, Active),
            (Connecting, Stop, Inactive),
            (Connecting, ChannelFailed, Inactive),
            (Active, Stop, Finished),
            (Active, CallEnded, Finished),
            (Active, ChannelFailed, Inactive),
        ];

        for status in STATUSES {
            for trigger in TRIGGERS {
                let expected = table
                    .iter()
                    .find(|(s, t, _)| *s == status && *t == trigger)
                    .map(|(_, _, next)| *next);
                assert_eq!(
                    status.transition(trigger),
                    expected,
                    "{:?} x {:?}",
                    status,
                    trigger
                );
            }
        }
    }

    #[test]
    fn test_start_only_from_idle_states() {
        assert_eq!(Inactive.transition(Start), Some(Connecting));
        assert_eq!(Finished.transition(Start), Some(Connecting));
        assert_eq!(Connecting.transition(Start), None);
        assert_eq!(Active.transition(Start), None);
    }

    #[test]
    fn test_failures_never_land_in_finished() {
        for status in STATUSES {
            if let Some(next) = status.transition(ChannelFailed) {
                assert_eq!(next, Inactive);
            }
        }
    }
}
