//! Node service — the hexagonal core.
//!
//! [`NodeService`] owns the event dispatcher and the power gate and runs
//! one super-loop iteration per [`step`](NodeService::step). All I/O flows
//! through port traits passed in at the call site, so the whole loop is
//! testable with mock adapters.
//!
//! ```text
//!  PendingInput ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!   ModemPort  ◀──▶ │         NodeService         │
//!   SensorPort ──▶  │  Dispatcher · PowerGate     │ ──▶ McuPort
//!                   └─────────────────────────────┘
//! ```

use log::{error, info};

use crate::config::NodeConfig;
use crate::drivers::button::PendingInput;
use crate::error::Result;
use crate::power::{PowerGate, SleepOutcome};

use super::dispatcher::{Directive, Dispatcher, Ports};
use super::events::{NodeEvent, ResetReason};
use super::ports::{EventSink, McuPort, ModemPort, SensorPort};

/// Drain/engine rounds per iteration. A stack still signalling after this
/// many rounds keeps the gate from sleeping; the next iteration resumes.
pub const MAX_DRAIN_ROUNDS: usize = 4;

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The iteration finished with the gate's sleep decision.
    Idle(SleepOutcome),
    /// A reset was requested and issued through [`McuPort::reset`].
    Reset(ResetReason),
}

pub struct NodeService {
    dispatcher: Dispatcher,
    gate: PowerGate,
    iterations: u64,
}

impl NodeService {
    /// Build the service from a validated configuration.
    pub fn new(config: &NodeConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "NodeService: region={:?} period={}s ports={}/{} max_sleep={}ms",
            config.region,
            config.uplink_period_s,
            config.periodic_port,
            config.button_port,
            config.watchdog_reload_period_ms
        );
        Ok(Self {
            dispatcher: Dispatcher::new(config),
            gate: PowerGate::new(config.watchdog_reload_period_ms),
            iterations: 0,
        })
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one iteration: button request → engine → event drain → sleep.
    pub fn step<M, U, S, E>(
        &mut self,
        input: &PendingInput,
        modem: &mut M,
        mcu: &mut U,
        sensor: &mut S,
        sink: &mut E,
    ) -> StepOutcome
    where
        M: ModemPort,
        U: McuPort,
        S: SensorPort,
        E: EventSink,
    {
        self.iterations += 1;
        let mut ports = Ports { modem, sensor, sink };

        // 1. Button request
        self.dispatcher.process_input(input, &mut ports);

        // 2. Stack engine
        let mut sleep_ms = ports.modem.run_engine();

        // 3. Events signalled by the engine, until it stops reporting more
        let mut rounds = 0;
        while rounds < MAX_DRAIN_ROUNDS && ports.modem.take_event_signal() {
            rounds += 1;
            if let Directive::Reset(reason) = self.dispatcher.drain(&mut ports) {
                error!("NodeService: resetting device ({:?})", reason);
                mcu.reset();
                return StepOutcome::Reset(reason);
            }
            // Handlers queue work; the earlier recommendation is stale.
            sleep_ms = ports.modem.run_engine();
        }

        // 4. Sleep decision
        let outcome = self.gate.idle(sleep_ms, input, &*ports.modem, mcu);
        if let SleepOutcome::Slept { ms } = outcome {
            ports.sink.emit(&NodeEvent::Slept { ms });
        }
        StepOutcome::Idle(outcome)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn gate(&self) -> &PowerGate {
        &self.gate
    }

    /// Loop iterations executed since startup.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}
