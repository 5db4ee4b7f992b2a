//! Refresh and forced-logout bookkeeping for one client.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long repeated auth failures are folded into the first one.
pub const AUTH_ERROR_COOLDOWN: Duration = Duration::from_secs(1);

/// Where the client is in its token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Idle,
    /// A refresh request is in flight.
    Refreshing,
    /// A forced logout just happened; further auth failures until `until`
    /// do not repeat its side effects.
    CoolingDown { until: Instant },
}

#[derive(Debug)]
pub struct AuthGuard {
    phase: Mutex<AuthPhase>,
    cooldown: Duration,
}

impl AuthGuard {
    pub const fn new(cooldown: Duration) -> Self {
        Self {
            phase: Mutex::new(AuthPhase::Idle),
            cooldown,
        }
    }

    /// Current phase, with an elapsed cooldown reported as `Idle`.
    pub fn phase(&self, now: Instant) -> AuthPhase {
        let Ok(mut phase) = self.phase.lock() else {
            return AuthPhase::Idle;
        };
        if let AuthPhase::CoolingDown { until } = *phase {
            if now >= until {
                *phase = AuthPhase::Idle;
            }
        }
        *phase
    }

    pub fn begin_refresh(&self) {
        if let Ok(mut phase) = self.phase.lock() {
            if !matches!(*phase, AuthPhase::CoolingDown { .. }) {
                *phase = AuthPhase::Refreshing;
            }
        }
    }

    pub fn finish_refresh(&self) {
        if let Ok(mut phase) = self.phase.lock() {
            if *phase == AuthPhase::Refreshing {
                *phase = AuthPhase::Idle;
            }
        }
    }

    /// Claims the right to run forced-logout side effects.
    ///
    /// Returns `false` while a previous forced logout is still cooling down.
    pub fn try_begin_forced_logout(&self, now: Instant) -> bool {
        let Ok(mut phase) = self.phase.lock() else {
            return true;
        };
        if let AuthPhase::CoolingDown { until } = *phase {
            if now < until {
                return false;
            }
        }
        *phase = AuthPhase::CoolingDown {
            until: now + self.cooldown,
        };
        true
    }
}

impl Default for AuthGuard {
    fn default() -> Self {
        Self::new(AUTH_ERROR_COOLDOWN)
    }
}
