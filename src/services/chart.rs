//! Chart vendor adapter.
//! -----------------------------------------------------------------
//! ‣ The third-party charting widget lives behind an injected
//!   [`ChartVendor`] capability instead of ad hoc global lookups.
//! ‣ The vendor script is shared: [`SharedScript`] loads it once while
//!   any consumer holds a reference, and the last release decides the
//!   teardown.
//! ‣ Each consumer drives one [`ChartAdapter`] through an explicit
//!   lifecycle: Idle → ScriptLoading → ScriptReady → WidgetInitializing
//!   → WidgetReady, with TearingDown back to Idle and Failed as the
//!   terminal state of a single mount attempt.
//! ‣ `mount`/`unmount` never return errors across the public boundary;
//!   failures are logged and surface as the Failed state.
//! -----------------------------------------------------------------

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::TimeFrame;

pub const VENDOR_SCRIPT_URL: &str = "https://s3.tradingview.com/tv.js";

/// Embed configuration handed to the vendor's widget constructor.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WidgetConfig {
    pub container_id: String,
    pub symbol: String,
    pub interval: String,
    pub timezone: String,
    pub theme: String,
    pub locale: String,
    pub allow_symbol_change: bool,
    pub studies: Vec<String>,
    pub height: u32,
    pub width: String,
}

impl WidgetConfig {
    pub fn new(symbol: &str, timeframe: TimeFrame) -> Self {
        Self {
            container_id: format!("tradesage-widget-{}", Uuid::new_v4()),
            symbol: symbol.to_string(),
            interval: timeframe.interval_code().to_string(),
            timezone: "Etc/UTC".into(),
            theme: "dark".into(),
            locale: "en".into(),
            allow_symbol_change: false,
            studies: vec![
                "MACD@tv-basicstudies".into(),
                "RSI@tv-basicstudies".into(),
                "BollingerBands@tv-basicstudies".into(),
            ],
            height: 500,
            width: "100%".into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("vendor script failed to load: {0}")]
    ScriptLoad(String),
    #[error("widget construction failed: {0}")]
    WidgetInit(String),
}

/// The capability a concrete chart host injects. A browser shell backs
/// this with script-tag injection and the vendor's constructor; tests
/// back it with a mock.
#[async_trait]
pub trait ChartVendor: Send + Sync {
    async fn load_script(&self) -> Result<(), ChartError>;
    async fn unload_script(&self);
    async fn create_widget(&self, config: &WidgetConfig) -> Result<Uuid, ChartError>;
    async fn destroy_widget(&self, widget: Uuid);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterState {
    Idle,
    ScriptLoading,
    ScriptReady,
    WidgetInitializing,
    WidgetReady,
    TearingDown,
    Failed,
}

struct ScriptSlot {
    refs: usize,
    loaded: bool,
}

/// Reference-counted handle over the single vendor script. The slot lock
/// is held across the load so concurrent first acquires collapse into one
/// vendor load.
pub struct SharedScript {
    vendor: Arc<dyn ChartVendor>,
    slot: Mutex<ScriptSlot>,
}

impl SharedScript {
    pub fn new(vendor: Arc<dyn ChartVendor>) -> Arc<Self> {
        Arc::new(Self {
            vendor,
            slot: Mutex::new(ScriptSlot { refs: 0, loaded: false }),
        })
    }

    pub fn vendor(&self) -> &Arc<dyn ChartVendor> {
        &self.vendor
    }

    async fn acquire(&self) -> Result<(), ChartError> {
        let mut slot = self.slot.lock().await;
        if !slot.loaded {
            self.vendor.load_script().await?;
            slot.loaded = true;
        }
        slot.refs += 1;
        Ok(())
    }

    async fn release(&self) {
        let mut slot = self.slot.lock().await;
        if slot.refs == 0 {
            return;
        }
        slot.refs -= 1;
        if slot.refs == 0 && slot.loaded {
            self.vendor.unload_script().await;
            slot.loaded = false;
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.slot.lock().await.loaded
    }
}

struct Mounted {
    widget: Uuid,
    config: WidgetConfig,
}

/// One chart slot. Drives the widget lifecycle for a `(symbol, timeframe)`
/// pair and tolerates unmount racing an in-flight mount.
pub struct ChartAdapter {
    script: Arc<SharedScript>,
    state: std::sync::Mutex<AdapterState>,
    current: Mutex<Option<Mounted>>,
    // cancel flag of the in-flight mount attempt, if any
    attempt: std::sync::Mutex<Option<Arc<AtomicBool>>>,
}

impl ChartAdapter {
    pub fn new(script: Arc<SharedScript>) -> Self {
        Self {
            script,
            state: std::sync::Mutex::new(AdapterState::Idle),
            current: Mutex::new(None),
            attempt: std::sync::Mutex::new(None),
        }
    }

    pub fn state(&self) -> AdapterState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: AdapterState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    pub async fn config(&self) -> Option<WidgetConfig> {
        self.current.lock().await.as_ref().map(|m| m.config.clone())
    }

    fn take_attempt(&self) -> Option<Arc<AtomicBool>> {
        self.attempt.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    fn clear_attempt(&self) {
        self.take_attempt();
    }

    /// Destroy the current widget and drop its script ref, if any.
    async fn teardown_current(&self) {
        let mut current = self.current.lock().await;
        if let Some(mounted) = current.take() {
            self.set_state(AdapterState::TearingDown);
            self.script.vendor().destroy_widget(mounted.widget).await;
            self.script.release().await;
        }
    }

    /// Mount a widget for `(symbol, timeframe)`. Any in-flight attempt is
    /// cancelled and the previous widget is torn down before the new one
    /// is constructed, so two widgets never race for the same container.
    /// The new script ref is taken before the old mount releases its own;
    /// a remount never drops the refcount to zero mid-handover. Returns
    /// the resulting state; errors never cross this boundary.
    pub async fn mount(&self, symbol: &str, timeframe: TimeFrame) -> AdapterState {
        if let Some(flag) = self.take_attempt() {
            flag.store(true, Ordering::SeqCst);
        }
        let cancelled = Arc::new(AtomicBool::new(false));
        *self.attempt.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(Arc::clone(&cancelled));

        self.set_state(AdapterState::ScriptLoading);
        if let Err(e) = self.script.acquire().await {
            log::error!("chart mount for {symbol}: {e}");
            self.teardown_current().await;
            self.clear_attempt();
            self.set_state(AdapterState::Failed);
            return AdapterState::Failed;
        }

        // our ref is held from here on, so this release cannot unload
        // the shared script
        self.teardown_current().await;

        // Unmounted while the script was still loading: drop the ref and
        // never construct a widget.
        if cancelled.load(Ordering::SeqCst) {
            self.script.release().await;
            self.clear_attempt();
            self.set_state(AdapterState::Idle);
            return AdapterState::Idle;
        }

        self.set_state(AdapterState::ScriptReady);
        self.set_state(AdapterState::WidgetInitializing);

        let config = WidgetConfig::new(symbol, timeframe);
        let widget = match self.script.vendor().create_widget(&config).await {
            Ok(widget) => widget,
            Err(e) => {
                log::error!("chart mount for {symbol}: {e}");
                self.script.release().await;
                self.clear_attempt();
                self.set_state(AdapterState::Failed);
                return AdapterState::Failed;
            }
        };

        if cancelled.load(Ordering::SeqCst) {
            self.script.vendor().destroy_widget(widget).await;
            self.script.release().await;
            self.clear_attempt();
            self.set_state(AdapterState::Idle);
            return AdapterState::Idle;
        }

        *self.current.lock().await = Some(Mounted { widget, config });
        self.clear_attempt();
        self.set_state(AdapterState::WidgetReady);
        AdapterState::WidgetReady
    }

    /// Tear down the current widget, if any, and cancel any in-flight
    /// mount attempt. Safe to call in any state.
    pub async fn unmount(&self) {
        if let Some(flag) = self.take_attempt() {
            flag.store(true, Ordering::SeqCst);
        }

        self.teardown_current().await;
        self.set_state(AdapterState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct MockVendor {
        block_load: AtomicBool,
        load_started: Notify,
        load_gate: Notify,
        loads: AtomicUsize,
        unloads: AtomicUsize,
        creates: AtomicUsize,
        destroys: AtomicUsize,
        fail_load: AtomicBool,
        fail_create: AtomicBool,
    }

    #[async_trait]
    impl ChartVendor for MockVendor {
        async fn load_script(&self) -> Result<(), ChartError> {
            if self.block_load.load(Ordering::SeqCst) {
                self.load_started.notify_one();
                self.load_gate.notified().await;
            }
            if self.fail_load.load(Ordering::SeqCst) {
                return Err(ChartError::ScriptLoad("network error".into()));
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn unload_script(&self) {
            self.unloads.fetch_add(1, Ordering::SeqCst);
        }

        async fn create_widget(&self, _config: &WidgetConfig) -> Result<Uuid, ChartError> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(ChartError::WidgetInit("vendor constructor threw".into()));
            }
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(Uuid::new_v4())
        }

        async fn destroy_widget(&self, _widget: Uuid) {
            self.destroys.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn setup() -> (Arc<MockVendor>, Arc<SharedScript>) {
        let vendor = Arc::new(MockVendor::default());
        let vendor_dyn: Arc<dyn ChartVendor> = vendor.clone();
        let script = SharedScript::new(vendor_dyn);
        (vendor, script)
    }

    #[tokio::test]
    async fn mount_reaches_widget_ready() {
        let (vendor, script) = setup();
        let adapter = ChartAdapter::new(script);

        let state = adapter.mount("EURUSD", TimeFrame::H1).await;
        assert_eq!(state, AdapterState::WidgetReady);
        assert_eq!(adapter.state(), AdapterState::WidgetReady);
        assert_eq!(vendor.loads.load(Ordering::SeqCst), 1);
        assert_eq!(vendor.creates.load(Ordering::SeqCst), 1);

        let config = adapter.config().await.unwrap();
        assert_eq!(config.symbol, "EURUSD");
        assert_eq!(config.interval, "60");
    }

    #[tokio::test]
    async fn unmount_before_script_resolves_never_builds_a_widget() {
        let (vendor, script) = setup();
        vendor.block_load.store(true, Ordering::SeqCst);
        let adapter = Arc::new(ChartAdapter::new(script));

        let mounting = {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.mount("EURUSD", TimeFrame::H1).await })
        };

        // wait until the vendor load is actually in flight, then unmount
        vendor.load_started.notified().await;
        adapter.unmount().await;
        vendor.load_gate.notify_one();

        let state = mounting.await.unwrap();
        assert_eq!(state, AdapterState::Idle);
        assert_eq!(vendor.creates.load(Ordering::SeqCst), 0);
        // the cancelled attempt released the only script ref
        assert_eq!(vendor.unloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn script_is_shared_and_last_release_tears_down() {
        let (vendor, script) = setup();
        let a = ChartAdapter::new(Arc::clone(&script));
        let b = ChartAdapter::new(Arc::clone(&script));

        a.mount("XAUUSD", TimeFrame::M15).await;
        b.mount("GBPUSD", TimeFrame::D1).await;
        assert_eq!(vendor.loads.load(Ordering::SeqCst), 1); // loaded once

        a.unmount().await;
        assert_eq!(vendor.unloads.load(Ordering::SeqCst), 0);
        assert!(script.is_loaded().await);

        b.unmount().await;
        assert_eq!(vendor.unloads.load(Ordering::SeqCst), 1);
        assert!(!script.is_loaded().await);
    }

    #[tokio::test]
    async fn script_load_failure_is_contained_in_failed_state() {
        let (vendor, script) = setup();
        vendor.fail_load.store(true, Ordering::SeqCst);
        let adapter = ChartAdapter::new(script.clone());

        assert_eq!(
            adapter.mount("EURUSD", TimeFrame::H1).await,
            AdapterState::Failed
        );
        assert_eq!(vendor.creates.load(Ordering::SeqCst), 0);
        assert!(!script.is_loaded().await);

        // a fresh attempt restarts from Idle and can succeed
        vendor.fail_load.store(false, Ordering::SeqCst);
        assert_eq!(
            adapter.mount("EURUSD", TimeFrame::H1).await,
            AdapterState::WidgetReady
        );
    }

    #[tokio::test]
    async fn constructor_failure_releases_the_script_ref() {
        let (vendor, script) = setup();
        vendor.fail_create.store(true, Ordering::SeqCst);
        let adapter = ChartAdapter::new(script.clone());

        assert_eq!(
            adapter.mount("USDJPY", TimeFrame::M5).await,
            AdapterState::Failed
        );
        assert_eq!(vendor.unloads.load(Ordering::SeqCst), 1);
        assert!(!script.is_loaded().await);
    }

    #[tokio::test]
    async fn remount_tears_down_the_previous_widget_first() {
        let (vendor, script) = setup();
        let adapter = ChartAdapter::new(Arc::clone(&script));

        adapter.mount("EURUSD", TimeFrame::H1).await;
        adapter.mount("GBPUSD", TimeFrame::H4).await;

        assert_eq!(vendor.creates.load(Ordering::SeqCst), 2);
        assert_eq!(vendor.destroys.load(Ordering::SeqCst), 1);
        // the script survived the handover: loaded once, never unloaded,
        // still resident for the new widget
        assert_eq!(vendor.loads.load(Ordering::SeqCst), 1);
        assert_eq!(vendor.unloads.load(Ordering::SeqCst), 0);
        assert!(script.is_loaded().await);

        let config = adapter.config().await.unwrap();
        assert_eq!(config.symbol, "GBPUSD");
        assert_eq!(config.interval, "240");

        // the handover ref is the adapter's only one; unmount drops the
        // script with it
        adapter.unmount().await;
        assert_eq!(vendor.unloads.load(Ordering::SeqCst), 1);
        assert!(!script.is_loaded().await);
    }

    #[test]
    fn poisoned_state_lock_recovers_instead_of_panicking() {
        let (_vendor, script) = setup();
        let adapter = ChartAdapter::new(script);

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = adapter.state.lock().unwrap();
            panic!("poison the lock");
        }));

        assert_eq!(adapter.state(), AdapterState::Idle);
        adapter.set_state(AdapterState::Failed);
        assert_eq!(adapter.state(), AdapterState::Failed);
    }

    #[test]
    fn widget_config_reproduces_the_embed_defaults() {
        let config = WidgetConfig::new("XAU/USD", TimeFrame::D1);
        assert!(config.container_id.starts_with("tradesage-widget-"));
        assert_eq!(config.interval, "D");
        assert_eq!(config.theme, "dark");
        assert_eq!(config.timezone, "Etc/UTC");
        assert!(!config.allow_symbol_change);
        assert_eq!(config.studies.len(), 3);
        assert_eq!(config.height, 500);
        assert_eq!(config.width, "100%");
    }
}
