//! Lineflow Binary
//!
//! Reads lines from stdin, prints each line's length to stdout.
//! OS signals are relayed to one worker, which fans them out to the pipeline:
//! SIGINT/SIGTERM terminate, SIGUSR1 pauses, SIGUSR2 resumes.

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{error, info};

use lineflow_core::config::ConfigManager;
use lineflow_core::logging::init_structured_logging;
use lineflow_core::orchestration::Orchestrator;
use lineflow_core::worker::{ReaderSource, Role, WriterSink};
use lineflow_core::{SignalKind, WorkerPhase};

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            1
        }
    };
    // The stdin reader may still be parked in a blocking read, which would
    // keep the runtime from shutting down on return.
    std::process::exit(code);
}

async fn run() -> Result<()> {
    init_structured_logging();

    let manager = ConfigManager::load().context("failed to load configuration")?;
    let config = manager.config().clone();
    let target = config.signal_target;
    info!(environment = manager.environment(), "Lineflow starting");

    eprintln!("SIGINT/SIGTERM = terminate");
    eprintln!("SIGUSR1 = pause");
    eprintln!("SIGUSR2 = resume");
    eprintln!("pid = {}", std::process::id());

    let orchestrator = match Orchestrator::launch(
        config,
        Box::new(ReaderSource::new(BufReader::new(tokio::io::stdin()))),
        Box::new(WriterSink::new(tokio::io::stdout())),
    ) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "Pipeline startup failed");
            return Err(e).context("unable to start pipeline");
        }
    };

    info!(signal_target = %target, "Pipeline running");

    let mut os_signals = OsSignals::install()?;
    {
        let finished = wait_for_pipeline(&orchestrator);
        tokio::pin!(finished);

        loop {
            tokio::select! {
                _ = &mut finished => break,
                signal = os_signals.next() => {
                    info!(signal = %signal, target = %target, "Relaying OS signal");
                    orchestrator.relay(target, signal)?;
                }
            }
        }
    }

    let reports = orchestrator.shutdown().await?;
    for report in &reports {
        info!(
            role = %report.role,
            items_processed = report.items_processed,
            events_dispatched = report.events_dispatched,
            "Worker report"
        );
    }
    Ok(())
}

async fn wait_for_pipeline(orchestrator: &Orchestrator) {
    for role in Role::ALL {
        if let Some(worker) = orchestrator.worker(role) {
            worker.wait_for_phase(WorkerPhase::Terminated).await;
        }
    }
}

/// OS signal streams mapped onto pipeline signals
#[cfg(unix)]
struct OsSignals {
    terminate: tokio::signal::unix::Signal,
    pause: tokio::signal::unix::Signal,
    resume: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    fn install() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind as OsSignalKind};

        Ok(Self {
            terminate: signal(OsSignalKind::terminate()).context("SIGTERM handler")?,
            pause: signal(OsSignalKind::user_defined1()).context("SIGUSR1 handler")?,
            resume: signal(OsSignalKind::user_defined2()).context("SIGUSR2 handler")?,
        })
    }

    async fn next(&mut self) -> SignalKind {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => SignalKind::Terminate,
            Some(()) = self.terminate.recv() => SignalKind::Terminate,
            Some(()) = self.pause.recv() => SignalKind::Pause,
            Some(()) = self.resume.recv() => SignalKind::Resume,
        }
    }
}

#[cfg(not(unix))]
struct OsSignals;

#[cfg(not(unix))]
impl OsSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> SignalKind {
        let _ = tokio::signal::ctrl_c().await;
        SignalKind::Terminate
    }
}
