//! Background thread that owns the lottery client.
//!
//! The UI thread only sends [`Command`]s and picks up the latest published
//! [`WorkerUpdate`]; every wallet and contract call happens here. A
//! current-thread tokio runtime multiplexes the command channel with the pump
//! tick, while the client itself is driven synchronously between selects.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use lottery_sync_adapters::{
    Eip1193Adapter, LotteryAdapterConfig, ReceiptPolicy, RpcContractConnector, SimulatedLottery,
    SystemClockAdapter, DETERMINISTIC_ACCOUNT,
};
use lottery_sync_core::{
    ClientConfig, ClientView, ContractConnector, ContractSyncClient, LotteryAction, Notice, Screen,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    SwitchNetwork,
    Submit(LotteryAction),
    Disconnect,
    Shutdown,
}

/// Latest state handed to the UI. Notices accumulate until taken.
#[derive(Debug, Clone)]
pub struct WorkerUpdate {
    pub view: ClientView,
    pub notices: Vec<Notice>,
}

type Shared = Arc<Mutex<Option<WorkerUpdate>>>;

enum Event {
    Command(Command),
    Tick,
    Closed,
}

pub struct WorkerHandle {
    commands: mpsc::UnboundedSender<Command>,
    shared: Shared,
    thread: Option<JoinHandle<()>>,
    mode: &'static str,
}

impl WorkerHandle {
    /// Picks the contract backend from the wallet mode and starts the worker.
    ///
    /// A deterministic wallet is paired with an in-memory lottery it owns, so
    /// a full round can be played without a node.
    pub fn spawn(config: LotteryAdapterConfig, ctx: egui::Context) -> std::io::Result<Self> {
        let wallet = Eip1193Adapter::with_config(config.clone());
        let mode = wallet.mode_label();
        let client_config = config.client_config();
        let tick = Duration::from_millis(config.pump_interval_ms);

        if wallet.is_deterministic() {
            let lottery = SimulatedLottery::new(DETERMINISTIC_ACCOUNT, client_config.entry_fee_wei)
                .with_round_secs(config.simulated_round_secs)
                .with_auto_fulfill(config.simulated_fulfill_delay_ms);
            start(wallet, lottery.connector(), client_config, tick, mode, ctx)
        } else {
            let connector = RpcContractConnector::new(wallet.clone(), ReceiptPolicy::from(&config));
            start(wallet, connector, client_config, tick, mode, ctx)
        }
    }

    pub fn mode(&self) -> &'static str {
        self.mode
    }

    /// Returns false once the worker has gone away.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn take_update(&self) -> Option<WorkerUpdate> {
        self.shared.lock().ok().and_then(|mut g| g.take())
    }

    pub fn shutdown(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("lottery worker panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn start<N>(
    wallet: Eip1193Adapter,
    connector: N,
    client_config: ClientConfig,
    tick: Duration,
    mode: &'static str,
    ctx: egui::Context,
) -> std::io::Result<WorkerHandle>
where
    N: ContractConnector + Send + 'static,
{
    let (commands, rx) = mpsc::unbounded_channel();
    let shared: Shared = Arc::new(Mutex::new(None));
    let publish_to = Arc::clone(&shared);

    let thread = std::thread::Builder::new()
        .name("lottery-worker".to_owned())
        .spawn(move || {
            let client =
                ContractSyncClient::new(wallet, connector, SystemClockAdapter, client_config);
            run(client, rx, tick, Publisher::new(publish_to, ctx));
        })?;

    Ok(WorkerHandle {
        commands,
        shared,
        thread: Some(thread),
        mode,
    })
}

struct Publisher {
    shared: Shared,
    ctx: egui::Context,
    last: Option<ClientView>,
}

impl Publisher {
    fn new(shared: Shared, ctx: egui::Context) -> Self {
        Self {
            shared,
            ctx,
            last: None,
        }
    }

    /// Hands the view to the UI when it changed or there is something to toast.
    fn publish(&mut self, view: ClientView, notices: Vec<Notice>) {
        if notices.is_empty() && self.last.as_ref() == Some(&view) {
            return;
        }
        self.last = Some(view.clone());
        let Ok(mut guard) = self.shared.lock() else {
            tracing::error!("worker update slot poisoned");
            return;
        };
        match guard.as_mut() {
            Some(pending) => {
                pending.view = view;
                pending.notices.extend(notices);
            }
            None => *guard = Some(WorkerUpdate { view, notices }),
        }
        drop(guard);
        self.ctx.request_repaint();
    }
}

type Client<N> = ContractSyncClient<Eip1193Adapter, N, SystemClockAdapter>;

fn run<N: ContractConnector>(
    mut client: Client<N>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    tick: Duration,
    mut publisher: Publisher,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to start worker runtime");
            return;
        }
    };
    let mut interval = rt.block_on(async {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    tracing::info!(tick_ms = tick.as_millis() as u64, "lottery worker started");
    publisher.publish(client.view(), client.take_notices());

    loop {
        // Only the wait runs on the runtime; the blocking wallet calls below
        // must stay outside it.
        let event = rt.block_on(async {
            tokio::select! {
                command = rx.recv() => command.map_or(Event::Closed, Event::Command),
                _ = interval.tick() => Event::Tick,
            }
        });

        match event {
            Event::Tick => client.pump(),
            Event::Command(Command::Shutdown) | Event::Closed => {
                client.shutdown();
                publisher.publish(client.view(), client.take_notices());
                break;
            }
            Event::Command(command) => apply(&mut client, command, &mut publisher),
        }
        publisher.publish(client.view(), client.take_notices());
    }
    tracing::info!("lottery worker stopped");
}

fn apply<N: ContractConnector>(client: &mut Client<N>, command: Command, publisher: &mut Publisher) {
    tracing::debug!(?command, "worker command");
    // show the busy state while the wallet and the chain work
    if let Some(busy) = busy_view(client.view(), command) {
        publisher.publish(busy, Vec::new());
    }
    let result = match command {
        Command::Connect => client.connect(),
        Command::SwitchNetwork => client.switch_network(),
        Command::Submit(action) => client.submit_action(action).map(|_| ()),
        Command::Disconnect => {
            client.disconnect();
            Ok(())
        }
        Command::Shutdown => Ok(()),
    };
    if let Err(e) = result {
        tracing::debug!(?command, error = %e, "command failed");
    }
}

/// The view to show while `command` blocks on the wallet, if it does.
fn busy_view(mut view: ClientView, command: Command) -> Option<ClientView> {
    match command {
        Command::Connect => {
            if matches!(view.screen, Screen::ConnectPrompt { .. }) {
                view.screen = Screen::ConnectPrompt { connecting: true };
            }
        }
        Command::SwitchNetwork | Command::Submit(_) => {}
        Command::Disconnect | Command::Shutdown => return None,
    }
    view.loading = true;
    view.error = None;
    Some(view)
}
