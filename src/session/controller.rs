use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::extension::ExtensionHook;
use super::notify::{NotificationSink, NotificationType};
use super::state::{RecordingSession, SessionState};
use crate::error::{RecorderError, RecorderResult};
use crate::platform::{CaptureStrategy, PlatformParameters};
use crate::process::{ErrorStormDetector, RecurringTimer, StreamWatcher};

/// How long to keep reading encoder output after the process has exited
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives one encoder process at a time through the recording lifecycle
///
/// `start()` probes devices, launches the encoder and returns; stream reading,
/// fault accounting and waiting for exit continue on background tasks.
/// Dropping the controller kills a process that is still running.
pub struct RecordingSessionController {
    platform: Arc<dyn PlatformParameters>,
    config: SessionConfig,
    sink: Arc<dyn NotificationSink>,
    extension: Option<Arc<dyn ExtensionHook>>,
    current: Mutex<Option<TrackedSession>>,
}

struct TrackedSession {
    live: Arc<LiveSession>,
    /// Firing or dropping this kills the encoder
    kill: Option<oneshot::Sender<()>>,
}

impl RecordingSessionController {
    pub fn new(
        platform: Arc<dyn PlatformParameters>,
        config: SessionConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            platform,
            config,
            sink,
            extension: None,
            current: Mutex::new(None),
        }
    }

    /// Run `extension` on the output file after every stop
    pub fn with_extension(mut self, extension: Arc<dyn ExtensionHook>) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Start recording into `output`
    ///
    /// Replaces a finished session; fails with [`RecorderError::InvalidState`]
    /// while one is live. Probe and launch failures are reported as FATAL and
    /// returned. The controller is not locked while devices are probed, so
    /// status queries answer with PreRecording meanwhile.
    pub async fn start(&self, output: impl Into<PathBuf>) -> RecorderResult<()> {
        let output = output.into();
        let (live, previous) = {
            let mut current = self.current.lock().await;

            if let Some(tracked) = current.as_ref() {
                let state = tracked.live.state().await;
                if state.is_live() {
                    warn!("Recording already started");
                    return Err(RecorderError::InvalidState(state));
                }
            }

            info!("Starting recording session: {}", output.display());

            let live = Arc::new(LiveSession::new(
                output,
                self.config.clone(),
                Arc::clone(&self.sink),
                self.extension.clone(),
            ));
            let previous = current.replace(TrackedSession {
                live: Arc::clone(&live),
                kill: None,
            });

            live.transition(SessionState::PreRecording, NotificationType::PreRecording, "Ready")
                .await;
            (live, previous)
        };

        match self.launch(&live, previous).await {
            Ok(kill) => {
                let mut current = self.current.lock().await;
                match current.as_mut() {
                    Some(tracked) if Arc::ptr_eq(&tracked.live, &live) => {
                        tracked.kill = Some(kill);
                        info!("Recording session started successfully");
                    }
                    _ => {
                        warn!("Session replaced while starting, terminating its encoder");
                        let _ = kill.send(());
                    }
                }
                Ok(())
            }
            Err(e) => {
                error!("Registration failed: {}", e);
                live.transition(SessionState::Fatal, NotificationType::Fatal, &e.to_string())
                    .await;
                Err(e)
            }
        }
    }

    /// Ask the encoder to finish the recording and run the extension hook
    pub async fn stop(&self) -> RecorderResult<()> {
        let live = {
            let current = self.current.lock().await;
            current.as_ref().map(|tracked| Arc::clone(&tracked.live))
        };

        match live {
            Some(live) => live.stop().await,
            None => Err(RecorderError::NotRunning),
        }
    }

    /// Snapshot of the current session, if one was ever started
    pub async fn status(&self) -> Option<RecordingSession> {
        let live = {
            let current = self.current.lock().await;
            current.as_ref().map(|tracked| Arc::clone(&tracked.live))
        };

        match live {
            Some(live) => Some(live.snapshot().await),
            None => None,
        }
    }

    pub async fn state(&self) -> SessionState {
        self.status()
            .await
            .map(|session| session.state)
            .unwrap_or(SessionState::Idle)
    }

    /// Forcibly terminate a running encoder
    pub async fn shutdown(&self) {
        let mut current = self.current.lock().await;
        if let Some(kill) = current.as_mut().and_then(|tracked| tracked.kill.take()) {
            info!("Shutting down recorder");
            let _ = kill.send(());
        }
    }

    async fn launch(
        &self,
        live: &Arc<LiveSession>,
        previous: Option<TrackedSession>,
    ) -> RecorderResult<oneshot::Sender<()>> {
        let encoder = self.platform.encoder_binary();
        let kind = self.platform.platform();
        let strategy = CaptureStrategy::for_platform(kind, self.config.probe_timeout);

        info!(
            "Using {} capture with {}",
            strategy.enumerator.name(),
            encoder.display()
        );
        let catalog = strategy.enumerator.enumerate(&encoder).await?;
        let argv = strategy
            .builder
            .build(&catalog, &encoder, &live.output_path, self.config.fps);
        info!("Executing command: {}", argv.join(" "));

        if let Some(mut previous) = previous {
            if let Some(kill) = previous.kill.take() {
                info!("Terminating previous encoder process");
                let _ = kill.send(());
            }
        }

        let mut child = Command::new(&encoder)
            .args(argv.iter().skip(1))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(RecorderError::Launch)?;

        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        live.attach(stdin).await;

        info!("Starting listener threads...");
        let mut error_watcher = StreamWatcher::new("ffmpeg E", stderr);
        let ready = Arc::clone(live);
        let faults = Arc::clone(live);
        error_watcher
            .register_pattern(self.config.ready_pattern.clone(), move |_| {
                let live = Arc::clone(&ready);
                async move { live.on_ready().await }
            })
            .register_pattern(self.config.fault_pattern.clone(), move |line| {
                let live = Arc::clone(&faults);
                async move { live.on_fault(&line).await }
            });
        let output_watcher = StreamWatcher::new("ffmpeg O", stdout);

        let watchers = vec![error_watcher.start(), output_watcher.start()];

        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(Arc::clone(live).wait_for_exit(child, kill_rx, watchers));

        Ok(kill_tx)
    }
}

fn missing_pipe(name: &str) -> RecorderError {
    RecorderError::Launch(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("encoder {} was not captured", name),
    ))
}

/// State shared by the tasks of one running session
struct LiveSession {
    output_path: PathBuf,
    config: SessionConfig,
    sink: Arc<dyn NotificationSink>,
    extension: Option<Arc<dyn ExtensionHook>>,
    shared: Mutex<Shared>,
}

struct Shared {
    session: RecordingSession,
    detector: ErrorStormDetector,
    timer: Option<RecurringTimer>,
    /// Present while the encoder can still be asked to stop
    stdin: Option<ChildStdin>,
    /// Set when a fault storm is being handled; FATAL follows, not COMPLETED
    storming: bool,
}

impl LiveSession {
    fn new(
        output_path: PathBuf,
        config: SessionConfig,
        sink: Arc<dyn NotificationSink>,
        extension: Option<Arc<dyn ExtensionHook>>,
    ) -> Self {
        let detector = ErrorStormDetector::new(config.fault_window_capacity, config.fault_window);
        Self {
            shared: Mutex::new(Shared {
                session: RecordingSession::new(output_path.clone()),
                detector,
                timer: None,
                stdin: None,
                storming: false,
            }),
            output_path,
            config,
            sink,
            extension,
        }
    }

    async fn state(&self) -> SessionState {
        self.shared.lock().await.session.state
    }

    async fn snapshot(&self) -> RecordingSession {
        self.shared.lock().await.session.clone()
    }

    async fn attach(&self, stdin: ChildStdin) {
        self.shared.lock().await.stdin = Some(stdin);
    }

    async fn transition(&self, next: SessionState, kind: NotificationType, message: &str) {
        let mut shared = self.shared.lock().await;
        self.transition_locked(&mut shared, next, kind, message);
    }

    fn transition_locked(
        &self,
        shared: &mut Shared,
        next: SessionState,
        kind: NotificationType,
        message: &str,
    ) {
        if shared.session.advance(next) {
            self.sink.notify(kind, message);
        } else {
            debug!(
                "Ignoring transition {} -> {}",
                shared.session.state, next
            );
        }
    }

    async fn on_ready(self: Arc<Self>) {
        let mut shared = self.shared.lock().await;
        if shared.session.state != SessionState::PreRecording {
            return;
        }

        info!("Record started");
        self.transition_locked(&mut shared, SessionState::Recording, NotificationType::Recording, "");

        debug!("Starting timer");
        let session = Arc::downgrade(&self);
        shared.timer = Some(RecurringTimer::start(self.config.tick_interval, move || {
            let session = Weak::clone(&session);
            async move {
                if let Some(live) = session.upgrade() {
                    live.on_tick().await;
                }
            }
        }));
    }

    /// Report the time counted so far, then count this tick; the first tick reads 00:00
    async fn on_tick(&self) {
        let mut shared = self.shared.lock().await;
        if shared.session.state != SessionState::Recording {
            return;
        }
        let elapsed = shared.session.elapsed_display();
        shared.session.elapsed_seconds += 1;
        self.sink.notify(NotificationType::Recording, &elapsed);
    }

    async fn on_fault(self: Arc<Self>, line: &str) {
        let storm = {
            let mut shared = self.shared.lock().await;
            if shared.storming || shared.session.state.is_terminal() {
                return;
            }

            debug!("Error notified: {}", line.trim());
            let now = Instant::now();
            shared.detector.record_fault(now);
            if !shared.detector.is_storming(now) {
                return;
            }

            shared.storming = true;
            RecorderError::FaultStorm {
                faults: shared.detector.capacity(),
                window_secs: shared.detector.window().as_secs(),
            }
        };

        warn!("{}. Stopping video", storm);
        if let Err(e) = self.stop().await {
            error!("Failed to stop encoder after fault storm: {}", e);
        }

        self.transition(SessionState::Fatal, NotificationType::Fatal, &storm.to_string())
            .await;
    }

    async fn stop(&self) -> RecorderResult<()> {
        let stdin = {
            let mut shared = self.shared.lock().await;
            if let Some(timer) = shared.timer.take() {
                timer.stop();
            }
            shared.stdin.take()
        };
        let Some(mut stdin) = stdin else {
            return Err(RecorderError::NotRunning);
        };

        info!("Stopping ffmpeg.");
        let sent = async {
            stdin.write_all(self.config.stop_input.as_bytes()).await?;
            stdin.flush().await
        }
        .await;
        drop(stdin);
        if let Err(e) = &sent {
            warn!("Failed to send stop input to encoder: {}", e);
        }

        self.run_extension().await;

        sent.map_err(RecorderError::from)
    }

    async fn run_extension(&self) {
        let Some(extension) = &self.extension else {
            return;
        };

        info!("Executing extensions");
        if let Err(e) = extension.run(&self.output_path).await {
            error!("Error running extensions: {:#}", e);
        }
    }

    async fn wait_for_exit(
        self: Arc<Self>,
        mut child: Child,
        kill: oneshot::Receiver<()>,
        watchers: Vec<JoinHandle<()>>,
    ) {
        let status = tokio::select! {
            status = child.wait() => status,
            _ = kill => {
                warn!("Killing encoder process");
                if let Err(e) = child.kill().await {
                    error!("Failed to kill encoder: {}", e);
                }
                let mut shared = self.shared.lock().await;
                shared.stdin = None;
                shared.timer = None;
                if !shared.session.state.is_terminal() {
                    shared.session.advance(SessionState::Fatal);
                }
                return;
            }
        };

        // Let the watchers see everything the encoder printed before exiting
        for watcher in watchers {
            if tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, watcher).await.is_err() {
                warn!("Encoder output still open after exit, not waiting further");
            }
        }

        let mut shared = self.shared.lock().await;
        shared.stdin = None;
        shared.timer = None;

        match status {
            Ok(status) => {
                info!("Registration completed ({})", status);
                if !shared.storming {
                    self.transition_locked(
                        &mut shared,
                        SessionState::Completed,
                        NotificationType::Completed,
                        "",
                    );
                }
            }
            Err(e) => {
                error!("Failed waiting for encoder: {}", e);
                if !shared.storming {
                    self.transition_locked(
                        &mut shared,
                        SessionState::Fatal,
                        NotificationType::Fatal,
                        "Registration failed",
                    );
                }
            }
        }
    }
}
