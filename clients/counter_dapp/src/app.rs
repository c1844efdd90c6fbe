//! # App Module
//!
//! The event-driven controller. It owns the wallet session, builds the
//! request-signing context when a wallet connects, runs the synchronizer on
//! every connect transition, dispatches commands and renders the view.
//!
//! Failures never escape as panics: each operation returns its error and
//! records it in the view under its [`Operation`].

use std::sync::Arc;

use solana_sdk::signature::Signature;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};

use crate::{
    config::ClientConfig,
    dispatch::{Command, Dispatcher},
    errors::{DappError, Operation, Result},
    events::UiEvent,
    idl::ProgramInterface,
    provider::Provider,
    sync::{SyncOutcome, Synchronizer},
    transport::Transport,
    view::ViewState,
    wallet::{Session, Wallet},
};

pub struct App<T, W> {
    config: ClientConfig,
    interface: Arc<ProgramInterface>,
    transport: Arc<T>,
    wallet: Arc<W>,
    sync: Synchronizer<T>,
    session: Option<Session>,
    dispatcher: Option<Dispatcher<T, W>>,
}

impl<T: Transport, W: Wallet> App<T, W> {
    pub fn new(
        config: ClientConfig,
        interface: ProgramInterface,
        transport: Arc<T>,
        wallet: Arc<W>,
    ) -> Self {
        let interface = Arc::new(interface);
        let sync = Synchronizer::new(Arc::clone(&transport), Arc::clone(&interface));
        Self {
            config,
            interface,
            transport,
            wallet,
            sync,
            session: None,
            dispatcher: None,
        }
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn synchronizer(&self) -> &Synchronizer<T> {
        &self.sync
    }

    pub async fn view(&self) -> ViewState {
        self.sync.snapshot().await
    }

    pub async fn render(&self) -> String {
        self.sync.view().read().await.render(self.session.as_ref())
    }

    /// Connect right away when the configuration asks for it
    pub async fn start(&mut self) -> Result<()> {
        if self.config.auto_connect && self.session.is_none() {
            self.connect().await?;
        }
        Ok(())
    }

    /// Connect the wallet, build the signing context and synchronize
    pub async fn connect(&mut self) -> Result<Session> {
        let public_key = match self.wallet.connect().await {
            Ok(public_key) => public_key,
            Err(err) => {
                error!(%err, "error connecting wallet");
                self.record_error(Operation::Connect, &err).await;
                return Err(err);
            }
        };

        let session = Session::new(public_key);
        self.session = Some(session);
        self.dispatcher = Some(Dispatcher::new(
            Provider::new(Arc::clone(&self.transport), Arc::clone(&self.wallet)),
            Arc::clone(&self.interface),
            self.config.preflight,
        ));

        let generation = self.sync.begin().await;
        self.sync.synchronize(generation, public_key).await;
        Ok(session)
    }

    /// Disconnect the wallet and clear the view. On failure the session is
    /// kept as is.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Err(err) = self.wallet.disconnect().await {
            error!(%err, "error disconnecting");
            self.record_error(Operation::Disconnect, &err).await;
            return Err(err);
        }

        self.session = None;
        self.dispatcher = None;
        self.sync.reset().await;
        info!("disconnected");
        Ok(())
    }

    /// Re-run the full synchronization for the current session
    pub async fn refresh(&self) -> Option<SyncOutcome> {
        let session = self.session?;
        let generation = self.sync.current();
        Some(self.sync.synchronize(generation, session.public_key).await)
    }

    /// Submit `command` and refresh the counter once it is confirmed.
    ///
    /// Does nothing and returns `Ok(None)` while no wallet is connected. A
    /// failed submission leaves the counter untouched.
    pub async fn execute(&self, command: Command) -> Result<Option<Signature>> {
        let (Some(session), Some(dispatcher)) = (self.session, self.dispatcher.as_ref()) else {
            warn!("no wallet connected, ignoring {command}");
            return Ok(None);
        };

        let generation = self.sync.current();
        match dispatcher.dispatch(command, &session.public_key).await {
            Ok(signature) => {
                self.sync.view().write().await.clear_error(command.operation());
                self.sync
                    .refresh_counter(generation, session.public_key)
                    .await;
                Ok(Some(signature))
            }
            Err(err) => {
                error!(%err, "error submitting {command}");
                self.record_error(command.operation(), &err).await;
                Err(err)
            }
        }
    }

    /// Apply one UI event. Returns `false` once the loop should stop.
    pub async fn handle(&mut self, event: UiEvent) -> bool {
        // Failures are already logged and recorded in the view.
        match event {
            UiEvent::Connect => {
                let _ = self.connect().await;
            }
            UiEvent::Disconnect => {
                let _ = self.disconnect().await;
            }
            UiEvent::Refresh => {
                self.refresh().await;
            }
            UiEvent::Command(command) => {
                let _ = self.execute(command).await;
            }
            UiEvent::Quit => return false,
        }
        true
    }

    /// Single-threaded event loop: one line of `input` per event, the view
    /// rendered to `output` after each.
    pub async fn run_interactive<R, O>(&mut self, input: R, mut output: O) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        output.write_all(self.render().await.as_bytes()).await?;
        output.flush().await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let event = match line.parse::<UiEvent>() {
                Ok(event) => event,
                Err(err) => {
                    output.write_all(format!("{err}\n").as_bytes()).await?;
                    output.flush().await?;
                    continue;
                }
            };
            if !self.handle(event).await {
                break;
            }
            output.write_all(self.render().await.as_bytes()).await?;
            output.flush().await?;
        }
        Ok(())
    }

    async fn record_error(&self, operation: Operation, err: &DappError) {
        self.sync
            .view()
            .write()
            .await
            .record_error(operation, err.to_string());
    }
}
