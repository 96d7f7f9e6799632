//! # Commander Module
//!
//! Real-time command loop streaming commander setpoints to the Crazyflie.
//!
//! ## Loop Lifecycle
//!
//! ```text
//! Stopped --start()--> Running --stop()--> Cancelled --join--> Stopped
//!                         |
//!                         +--send failed / input failed--> Stopped
//! ```
//!
//! The iteration runs on its own tokio task and owns the [`CrtpTransport`]
//! by value while running, so it is the only writer on the link. The task
//! hands the transport back when it exits. Cancellation is checked between
//! iterations; a write in flight always completes first.
//!
//! There is no pacing: packets go out as fast as the BLE acknowledgments
//! come back. If sending fails the loop simply stops. The firmware cuts the
//! setpoint on its own commander timeout.

pub mod scaling;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ScalingConfig;
use crate::controller::FlightAxesSource;
use crate::crtp::encoder::encode_setpoint;
use crate::error::{CommanderError, Result};
use crate::transport::link::GattLink;
use crate::transport::{probe_link, CrtpTransport};

/// Command loop state, as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Sending setpoints
    Running,
    /// `stop()` requested, waiting for the in-flight iteration to finish
    Cancelled,
    /// Idle
    Stopped,
}

impl LoopState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopState::Running,
            1 => LoopState::Cancelled,
            _ => LoopState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LoopState::Running => 0,
            LoopState::Cancelled => 1,
            LoopState::Stopped => 2,
        }
    }
}

/// Why a run of the command loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// `stop()` was called
    Cancelled,
    /// A write was not acknowledged
    SendFailed,
    /// The flight input source returned an error
    InputFailed,
}

/// State shared between the loop task and its owner
struct LoopShared {
    packets_sent: AtomicU64,
    state: AtomicU8,
    cancel: AtomicBool,
}

impl LoopShared {
    fn new() -> Self {
        Self {
            packets_sent: AtomicU64::new(0),
            state: AtomicU8::new(LoopState::Stopped.as_u8()),
            cancel: AtomicBool::new(false),
        }
    }

    fn state(&self) -> LoopState {
        LoopState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: LoopState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

type LoopTask<L> = JoinHandle<(CrtpTransport<L>, LoopExit)>;

/// Drives the CRTP transport from a flight input source
///
/// # Examples
///
/// ```no_run
/// # #[cfg(windows)]
/// # use crtp_commander::controller::winrt_gamepad::WinRtGamepadSource;
/// # #[cfg(windows)]
/// # async fn run(source: WinRtGamepadSource) -> anyhow::Result<()> {
/// use std::sync::Arc;
/// use crtp_commander::commander::CommandLoop;
/// use crtp_commander::config::ScalingConfig;
/// use crtp_commander::transport::winrt::WinRtGattLink;
///
/// let mut commander = CommandLoop::new(Arc::new(WinRtGattLink::new()));
/// if commander.start(source, ScalingConfig::default()).await? {
///     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
///     commander.stop().await;
///     println!("Sent {} packets", commander.packets_sent());
/// }
/// # Ok(())
/// # }
/// ```
pub struct CommandLoop<L: GattLink> {
    link: Arc<L>,
    transport: Option<CrtpTransport<L>>,
    task: Option<LoopTask<L>>,
    shared: Arc<LoopShared>,
}

impl<L: GattLink> fmt::Debug for CommandLoop<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLoop")
            .field("state", &self.state())
            .field("packets_sent", &self.packets_sent())
            .finish_non_exhaustive()
    }
}

impl<L: GattLink> CommandLoop<L> {
    pub fn new(link: Arc<L>) -> Self {
        let transport = CrtpTransport::new(Arc::clone(&link));
        Self {
            link,
            transport: Some(transport),
            task: None,
            shared: Arc::new(LoopShared::new()),
        }
    }

    /// Check whether a Crazyflie is paired
    ///
    /// Safe to call at any time, including while the loop is running.
    pub async fn probe(&self) -> bool {
        probe_link(self.link.as_ref()).await
    }

    /// Packets acknowledged since the last `start()`
    pub fn packets_sent(&self) -> u64 {
        self.shared.packets_sent.load(Ordering::Acquire)
    }

    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    /// True while the loop task has not yet exited
    pub fn is_running(&self) -> bool {
        self.state() != LoopState::Stopped
    }

    /// Connect and start streaming setpoints
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Connected; the loop is running on a background task
    /// * `Ok(false)` - No paired device or incomplete GATT service; the loop
    ///   never started
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if a previous run has not exited yet.
    pub async fn start<S>(&mut self, source: S, scaling: ScalingConfig) -> Result<bool>
    where
        S: FlightAxesSource + 'static,
    {
        let in_flight = self.task.as_ref().is_some_and(|task| !task.is_finished());
        if in_flight && self.state() != LoopState::Stopped {
            return Err(CommanderError::AlreadyRunning);
        }

        // Collect the transport from a run that ended on its own
        self.reap().await;

        self.shared.packets_sent.store(0, Ordering::Release);
        self.shared.cancel.store(false, Ordering::Release);

        let mut transport = self
            .transport
            .take()
            .unwrap_or_else(|| CrtpTransport::new(Arc::clone(&self.link)));

        if !transport.connect().await {
            info!("Crazyflie not available, command loop not started");
            self.transport = Some(transport);
            return Ok(false);
        }

        self.shared.set_state(LoopState::Running);
        info!("Command loop started");

        let shared = Arc::clone(&self.shared);
        self.task = Some(tokio::spawn(run_loop(transport, source, scaling, shared)));
        Ok(true)
    }

    /// Stop streaming and wait for the loop task to exit
    ///
    /// Once this returns no further packet is sent, so the transport can be
    /// torn down or the loop restarted safely.
    ///
    /// # Returns
    ///
    /// Why the joined run ended, or `None` if there was no run to join.
    pub async fn stop(&mut self) -> Option<LoopExit> {
        let task = self.task.take()?;

        self.shared.cancel.store(true, Ordering::Release);
        let _ = self.shared.state.compare_exchange(
            LoopState::Running.as_u8(),
            LoopState::Cancelled.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        let exit = self.join(task).await;
        info!(
            "Command loop stopped after {} packets ({:?})",
            self.packets_sent(),
            exit
        );
        exit
    }

    async fn reap(&mut self) {
        if let Some(task) = self.task.take() {
            self.join(task).await;
        }
    }

    async fn join(&mut self, task: LoopTask<L>) -> Option<LoopExit> {
        let exit = match task.await {
            Ok((transport, exit)) => {
                self.transport = Some(transport);
                Some(exit)
            }
            Err(e) => {
                error!("Command loop task failed: {}", e);
                None
            }
        };
        self.shared.set_state(LoopState::Stopped);
        exit
    }
}

impl<L: GattLink> Drop for CommandLoop<L> {
    fn drop(&mut self) {
        // A detached loop would keep streaming setpoints with no owner left
        // to stop it; the task exits after its in-flight write
        if self.task.is_some() {
            self.shared.cancel.store(true, Ordering::Release);
            debug!("Command loop dropped while running, cancelling");
        }
    }
}

/// Sample, scale, encode and send until cancelled or a send fails
async fn run_loop<L, S>(
    mut transport: CrtpTransport<L>,
    mut source: S,
    scaling: ScalingConfig,
    shared: Arc<LoopShared>,
) -> (CrtpTransport<L>, LoopExit)
where
    L: GattLink,
    S: FlightAxesSource,
{
    let exit = loop {
        if shared.cancel.load(Ordering::Acquire) {
            break LoopExit::Cancelled;
        }

        let axes = match source.sample().await {
            Ok(axes) => axes,
            Err(e) => {
                warn!("Flight input failed: {}", e);
                break LoopExit::InputFailed;
            }
        };

        let packet = encode_setpoint(&scaling.apply(&axes));

        match transport.send(&packet).await {
            Ok(true) => {
                shared.packets_sent.fetch_add(1, Ordering::AcqRel);
            }
            Ok(false) => {
                warn!(
                    "Commander packet not acknowledged after {} packets, stopping",
                    shared.packets_sent.load(Ordering::Acquire)
                );
                break LoopExit::SendFailed;
            }
            Err(e) => {
                // The loop only runs on a connected transport
                error!("Commander send rejected: {}", e);
                break LoopExit::SendFailed;
            }
        }
    };

    transport.disconnect();
    shared.set_state(LoopState::Stopped);
    debug!("Command loop task exiting: {:?}", exit);

    (transport, exit)
}
