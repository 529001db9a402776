use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use tally_core::clipboard::{Clipboard, ClipboardWorker, MemoryClipboard, SystemClipboard};
use tally_core::context::AppConfig;
use tally_core::hotkeys::{GlobalHotkeyBackend, HotkeyBackend, HotkeyDispatcher, KeyboardHook};
use tally_core::service::{ActionRouter, PresentationService, ServiceHandle, ServiceOptions};
use tokio::task;
use tracing::{info, warn};

use crate::aggregator::ReplaySession;
use crate::console::{ConsoleRenderer, StdoutInjector};

/// A running replay: the ingestion thread and its stop flag.
pub struct ReplayTask {
    pub stop: Arc<AtomicBool>,
    pub thread: JoinHandle<()>,
}

impl ReplayTask {
    pub fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.thread.join().is_err() {
            warn!("Replay thread panicked");
        }
    }
}

/// OS hotkey registration and the hook threads feeding the dispatcher.
pub struct Hotkeys {
    pub backend: Arc<dyn HotkeyBackend>,
    pub dispatcher: Arc<HotkeyDispatcher>,
    pub hook: KeyboardHook,
}

impl Hotkeys {
    fn start(config: &AppConfig, router: ActionRouter) -> Result<Self, String> {
        let backend: Arc<dyn HotkeyBackend> =
            Arc::new(GlobalHotkeyBackend::new().map_err(|e| e.to_string())?);
        let dispatcher = Arc::new(HotkeyDispatcher::new(Arc::clone(&backend), Arc::new(router)));

        for (group, e) in dispatcher.rebind(&config.hotkeys) {
            println!("warning: {group} hotkeys disabled: {e}");
        }

        let hook_dispatcher = Arc::clone(&dispatcher);
        let mut hook = KeyboardHook::spawn(Arc::clone(&backend), move |combo| {
            hook_dispatcher.on_key_down(combo);
        })
        .map_err(|e| format!("failed to start keyboard hook: {e}"))?;
        hook.listen_os_events()
            .map_err(|e| format!("failed to start hotkey event pump: {e}"))?;

        Ok(Self {
            backend,
            dispatcher,
            hook,
        })
    }

    fn stop(&mut self) {
        if let Some(hotkeys) = self.hotkeys.as_mut() {
            hotkeys.stop();
        }
    }
}

/// Every service of the CLI, built once at startup.
pub struct CliContext {
    pub config: AppConfig,
    pub service: ServiceHandle,
    /// `None` when the OS refused a hotkey manager (no display, ...)
    pub hotkeys: Option<Hotkeys>,
    pub session: ReplaySession,
    pub replay: Option<ReplayTask>,
    clipboard: ClipboardWorker,
    service_task: task::JoinHandle<()>,
    upstream_task: task::JoinHandle<()>,
}

impl CliContext {
    /// Wire the presentation service, clipboard worker, hotkeys and hook.
    /// Must run inside a tokio runtime.
    pub fn start(config: AppConfig) -> Result<Self, String> {
        let options = ServiceOptions {
            app_name: "Tally".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            window: config.window.clone(),
        };
        let (service, upstream_rx, service_task) =
            PresentationService::spawn(options, Some(Box::new(ConsoleRenderer::default())));

        let session = ReplaySession::default();
        let upstream_task = session.spawn_listener(upstream_rx);

        let clipboard = ClipboardWorker::spawn(
            || match SystemClipboard::new() {
                Ok(c) => Ok(Box::new(c) as Box<dyn Clipboard>),
                Err(e) => {
                    warn!(error = %e, "System clipboard unavailable, using in-memory clipboard");
                    Ok(Box::new(MemoryClipboard::new()) as Box<dyn Clipboard>)
                }
            },
            Box::new(StdoutInjector),
            service.frames(),
        )
        .map_err(|e| format!("failed to start clipboard worker: {e}"))?;

        let router = ActionRouter::new(clipboard.handle(), service.clone());
        let hotkeys = match Hotkeys::start(&config, router) {
            Ok(hotkeys) => Some(hotkeys),
            Err(e) => {
                warn!(error = %e, "Global hotkeys unavailable");
                println!("warning: global hotkeys disabled: {e}");
                None
            }
        };

        info!("Services started");
        Ok(Self {
            config,
            service,
            hotkeys,
            session,
            replay: None,
            clipboard,
            service_task,
            upstream_task,
        })
    }

    pub fn stop_replay(&mut self) {
        if let Some(replay) = self.replay.take() {
            replay.stop();
        }
    }

    /// Stop everything in reverse start order and unregister all hotkeys.
    pub async fn shutdown(mut self) {
        self.stop_replay();
        if let Some(hotkeys) = self.hotkeys.as_mut() {
            hotkeys.stop();
        }
        self.clipboard.shutdown();

        if self.service.shutdown().is_ok()
            && let Err(e) = self.service_task.await
        {
            warn!(error = %e, "Presentation service ended abnormally");
        }
        self.upstream_task.abort();
        info!("Services stopped");
    }
}
