//! Terminal control loop.
//!
//! [`StateController`] owns the devices and the registry and runs the
//! terminal one state at a time:
//!
//! 1. show the entry prompt of the current state
//! 2. wait for the state's event (tag, input line, or deadline)
//! 3. compute the next state with [`transition`](crate::transition)
//! 4. run the resulting effects and hold their result on the display
//!
//! Nothing in the loop is fatal. Registry failures are shown and logged,
//! display failures are logged and ignored, and device faults return the
//! terminal to idle after a short back-off.

use keytag_core::TagId;
use keytag_hardware::{DisplayDevice, HardwareError, InputDevice, TagReader};
use keytag_storage::{Storage, StorageError, UserRegistry};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::TerminalConfig;
use crate::messages::{DisplayMessages, Screen};
use crate::state_machine::{Awaiting, Effect, Event, StateMachine, TerminalState};

/// Finite-state controller driving an access terminal.
///
/// # Examples
///
/// ```no_run
/// use keytag_hardware::mock::{MockInput, MockTagReader};
/// use keytag_storage::{FileStorage, UserRegistry};
/// use keytag_terminal::{StateController, TerminalConfig, VirtualDisplay};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TerminalConfig::default();
/// let registry = UserRegistry::open(FileStorage::new("spiffs"), &config.registry_path)?;
/// let (reader, _reader_handle) = MockTagReader::new();
/// let (input, _input_handle) = MockInput::new();
///
/// let mut controller =
///     StateController::new(VirtualDisplay::default(), reader, input, registry, config);
///
/// controller.start().await?;
/// controller.run().await;
/// # Ok(())
/// # }
/// ```
pub struct StateController<D, R, I, S>
where
    D: DisplayDevice,
    R: TagReader,
    I: InputDevice,
    S: Storage,
{
    display: D,
    reader: R,
    input: I,
    registry: UserRegistry<S>,
    config: TerminalConfig,
    machine: StateMachine,
}

impl<D, R, I, S> StateController<D, R, I, S>
where
    D: DisplayDevice,
    R: TagReader,
    I: InputDevice,
    S: Storage,
{
    pub fn new(
        display: D,
        reader: R,
        input: I,
        registry: UserRegistry<S>,
        config: TerminalConfig,
    ) -> Self {
        Self {
            display,
            reader,
            input,
            registry,
            config,
            machine: StateMachine::new(),
        }
    }

    /// Initialize the tag reader and log the enrolled users.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails to initialize.
    pub async fn start(&mut self) -> keytag_hardware::Result<()> {
        self.reader.init().await.inspect_err(|e| {
            error!(error = %e, "Tag reader initialization failed");
        })?;

        info!(count = self.registry.len(), "Terminal started");
        for user in self.registry.list() {
            info!(name = %user.name, tag_id = %user.tag_id, "Enrolled user");
        }

        Ok(())
    }

    /// Run the control loop forever.
    pub async fn run(&mut self) {
        loop {
            self.step().await;
        }
    }

    /// Run one iteration of the control loop.
    pub async fn step(&mut self) {
        let state = self.machine.current_state().clone();
        self.show(&Screen::for_state(&state)).await;

        let event = self.next_event(&state).await;
        let faulted = matches!(event, Event::DeviceFault(_));
        let event_name = event.to_string();
        let dwell = self.machine.time_in_current_state();

        match self.machine.apply(event) {
            Ok(effects) => {
                debug!(
                    from = %state,
                    to = %self.machine.current_state(),
                    event = %event_name,
                    in_state_ms = dwell.as_millis() as u64,
                    "State transition"
                );
                for effect in effects {
                    self.execute(effect).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Rejected event, resetting to idle");
                self.machine.reset();
            }
        }

        if faulted {
            sleep(self.config.fault_backoff).await;
        }
    }

    /// Current state
    pub fn state(&self) -> &TerminalState {
        self.machine.current_state()
    }

    /// State machine, with its transition history
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn registry(&self) -> &UserRegistry<S> {
        &self.registry
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    async fn next_event(&mut self, state: &TerminalState) -> Event {
        match state.awaiting() {
            Awaiting::Ready(event) => event,
            Awaiting::CommandOrTag => {
                // Reader first: a dead keypad is always ready and must not starve scans
                tokio::select! {
                    biased;
                    read = self.reader.read() => tag_event(read),
                    line = self.input.read_line() => match line {
                        Ok(line) => Event::from_command_line(&line),
                        Err(e) => fault_event(e),
                    },
                }
            }
            Awaiting::Input => match timeout(self.config.input_timeout, self.input.read_line()).await
            {
                Ok(Ok(line)) => Event::InputReceived(line),
                Ok(Err(e)) => fault_event(e),
                Err(_) => {
                    info!(state = %state, "Timed out waiting for input");
                    Event::Timeout
                }
            },
            Awaiting::Tag => match timeout(self.config.tag_timeout, self.reader.read()).await {
                Ok(read) => tag_event(read),
                Err(_) => {
                    info!(state = %state, "Timed out waiting for tag");
                    Event::Timeout
                }
            },
        }
    }

    async fn execute(&mut self, effect: Effect) {
        let screen = match effect {
            Effect::Lookup(tag_id) => self.lookup(&tag_id),
            Effect::Enroll { name, tag_id } => self.enroll(&name, tag_id),
            Effect::Revoke(tag_id) => self.revoke(&tag_id),
            Effect::Notify(notice) => {
                info!(?notice, "Flow ended without a registry operation");
                Screen::for_notice(notice)
            }
        };

        self.show(&screen).await;
        sleep(self.config.message_hold).await;
    }

    fn lookup(&self, tag_id: &TagId) -> Screen {
        match self.registry.find(tag_id) {
            Some(user) => {
                info!(tag_id = %tag_id, name = %user.name, "Access granted");
                Screen::new(DisplayMessages::ACCESS_GRANTED, user.name.as_str())
            }
            None => {
                info!(tag_id = %tag_id, "Access denied, unknown tag");
                Screen::new(DisplayMessages::UNKNOWN_TAG, tag_id.as_str())
            }
        }
    }

    fn enroll(&mut self, name: &str, tag_id: TagId) -> Screen {
        match self.registry.add(name, tag_id) {
            Ok(()) => Screen::new(DisplayMessages::USER_ADDED, name.trim()),
            Err(StorageError::DuplicateTag { tag_id }) => {
                warn!(tag_id = %tag_id, "Enrollment rejected, tag already enrolled");
                Screen::new(DisplayMessages::TAG_IN_USE, tag_id.as_str())
            }
            Err(StorageError::InvalidName) => {
                warn!("Enrollment rejected, empty name");
                Screen::headline(DisplayMessages::INVALID_NAME)
            }
            Err(e) => {
                error!(error = %e, "Enrollment not saved");
                Screen::headline(DisplayMessages::STORAGE_ERROR)
            }
        }
    }

    fn revoke(&mut self, tag_id: &TagId) -> Screen {
        match self.registry.remove(tag_id) {
            Ok(Some(user)) => Screen::new(DisplayMessages::USER_REMOVED, user.name),
            Ok(None) => Screen::new(DisplayMessages::NOT_ENROLLED, tag_id.as_str()),
            Err(e) => {
                error!(error = %e, "Revocation not saved");
                Screen::headline(DisplayMessages::STORAGE_ERROR)
            }
        }
    }

    async fn show(&mut self, screen: &Screen) {
        if let Err(e) = self.render(screen).await {
            warn!(error = %e, "Display update failed");
        }
    }

    async fn render(&mut self, screen: &Screen) -> keytag_hardware::Result<()> {
        self.display.clear().await?;
        self.display.set_cursor(0, 0).await?;
        self.display.write(&screen.headline).await?;

        if !screen.detail.is_empty() && self.config.display_rows > 1 {
            self.display.set_cursor(1, 0).await?;
            self.display.write(&screen.detail).await?;
        }

        Ok(())
    }
}

fn tag_event(read: keytag_hardware::Result<keytag_core::TagPayload>) -> Event {
    match read {
        Ok(payload) => {
            let tag_id = TagId::from_payload(payload);
            debug!(tag_id = %tag_id, "Tag read");
            Event::TagRead(tag_id)
        }
        Err(e) => fault_event(e),
    }
}

fn fault_event(error: HardwareError) -> Event {
    error!(error = %error, "Device fault");
    Event::DeviceFault(error.to_string())
}
