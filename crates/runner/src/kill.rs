// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal-terminate a child, escalating to a hard kill after a grace period.

use std::time::Duration;
use tokio::process::Child;

/// On platforms with signals: SIGTERM, then SIGKILL if the child hasn't
/// exited within `grace`. On everything else: a direct kill, there being
/// no graceful equivalent to escalate from.
pub async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let pid = nix::unistd::Pid::from_raw(pid as i32);
            if nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM).is_ok()
                && tokio::time::timeout(grace, child.wait()).await.is_ok()
            {
                return;
            }
        }
    }
    let _ = child.kill().await;
    let _ = child.wait().await;
}
