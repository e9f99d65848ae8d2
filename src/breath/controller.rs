use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use esp_idf_svc::hal::{delay::FreeRtos, gpio::AnyIOPin, task::thread::ThreadSpawnConfiguration};

use crate::{
    pwm::PwmOut,
    utils::peripherals::{Peripheral, PeripheralError},
};

use super::wave::DutyRamp;

const LED_PIN: u8 = 3;
const PWM_CHANNEL: u8 = 1;
const PWM_TIMER: u8 = 0;
const PWM_FREQ_HZ: u32 = 1000;
const PWM_PERIOD_NS: u32 = 1_000_000_000 / PWM_FREQ_HZ;
const DUTY_STEP_PERCENT: u32 = 2;
const STEP_MS: u32 = 20;

const WORKER_NAME: &[u8] = b"breath\0";
const WORKER_STACK_SIZE: usize = 4096;
const WORKER_PRIORITY: u8 = 20;

/// Enums the different errors possible when starting the breathing effect
#[derive(Debug)]
pub enum BreathError {
    InvalidPin(PeripheralError),
    ThreadSpawnFailed,
}

/// Owns the lifecycle of the breathing effect: a stop flag shared with
/// the worker thread and the handle of the last worker spawned.
///
/// The flag is the only state shared with the worker: the console side
/// writes it, the worker reads it once per ramp step. `stop` never joins
/// the worker; the thread drains its current step and exits on its own,
/// at most one step interval plus one loop body later.
pub struct BreathController {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl BreathController {
    /// Creates the controller in the idle state, with no worker.
    pub fn new() -> Self {
        BreathController {
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Whether a start has been requested and not yet stopped. A worker
    /// that failed to acquire its pwm channel clears this on its own.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts the breathing effect. Calling it while the effect is
    /// already running warns and changes nothing.
    ///
    /// The led pin is resolved on every start; re-resolving an already
    /// routed pin is harmless. The pwm channel itself is acquired by the
    /// worker once it runs, so a start can still end up stopped shortly
    /// after returning Ok if that acquisition fails.
    ///
    /// # Errors
    ///
    /// - `BreathError::InvalidPin`: If the configured led pin does not exist on this board
    /// - `BreathError::ThreadSpawnFailed`: If the worker thread could not be created. The
    ///   pin stays routed, as on any stop.
    pub fn start(&mut self) -> Result<(), BreathError> {
        if self.running.load(Ordering::SeqCst) {
            log::warn!("breathing led is already running");
            return Ok(());
        }

        if let Some(previous) = &self.worker {
            // A stopped worker may still be draining its last step here.
            if !previous.is_finished() {
                log::debug!("previous pwm worker is still winding down");
            }
        }

        let pin = Peripheral::Pin(LED_PIN)
            .into_any_io_pin()
            .map_err(BreathError::InvalidPin)?;

        self.running.store(true, Ordering::SeqCst);

        match spawn_worker(self.running.clone(), pin) {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    /// Requests the worker to stop and returns immediately, without
    /// waiting for it to exit. Calling it while nothing is running warns
    /// and changes nothing.
    pub fn stop(&mut self) {
        if !self.running.load(Ordering::SeqCst) {
            log::warn!("breathing led is not running");
            return;
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

fn spawn_worker(running: Arc<AtomicBool>, pin: AnyIOPin) -> Result<JoinHandle<()>, BreathError> {
    ThreadSpawnConfiguration {
        name: Some(WORKER_NAME),
        stack_size: WORKER_STACK_SIZE,
        priority: WORKER_PRIORITY,
        ..Default::default()
    }
    .set()
    .map_err(|_| BreathError::ThreadSpawnFailed)?;

    let spawned = thread::Builder::new()
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || worker_loop(running, pin));

    if ThreadSpawnConfiguration::default().set().is_err() {
        log::warn!("could not restore the default thread spawn configuration");
    }

    spawned.map_err(|_| BreathError::ThreadSpawnFailed)
}

/// Body of the worker thread. Acquires the pwm channel, then ramps the
/// duty until the stop flag is observed. The channel lives and dies with
/// the thread.
fn worker_loop(running: Arc<AtomicBool>, pin: AnyIOPin) {
    let mut pwm = match PwmOut::new(
        Peripheral::PWMChannel(PWM_CHANNEL),
        Peripheral::PWMTimer(PWM_TIMER),
        pin,
        PWM_FREQ_HZ,
    ) {
        Ok(pwm) => pwm,
        Err(err) => {
            log::error!("can't acquire pwm channel {}: {:?}", PWM_CHANNEL, err);
            running.store(false, Ordering::SeqCst);
            return;
        }
    };

    if let Err(err) = pwm.enable() {
        log::error!("pwm channel {} could not be enabled: {:?}", PWM_CHANNEL, err);
        running.store(false, Ordering::SeqCst);
        return;
    }
    log::info!("pwm worker started, led is breathing");

    let mut ramp = DutyRamp::new(DUTY_STEP_PERCENT);
    while running.load(Ordering::SeqCst) {
        let pulse_ns = ramp.pulse_width_ns(PWM_PERIOD_NS);
        if let Err(err) = pwm.set_period_and_pulse(PWM_PERIOD_NS, pulse_ns) {
            log::debug!("pulse update skipped: {:?}", err);
        }
        ramp.advance();
        FreeRtos::delay_ms(STEP_MS);
    }

    if let Err(err) = pwm.disable() {
        log::warn!("pwm channel {} could not be disabled: {:?}", PWM_CHANNEL, err);
    }
    log::info!("pwm worker stopped");
}

#[cfg(test)]
mod test {
    use super::*;

    fn wait_for_worker_exit() {
        FreeRtos::delay_ms(3 * STEP_MS);
    }

    #[test]
    fn test0_stop_when_idle_is_a_noop() {
        let mut controller = BreathController::new();
        controller.stop();
        assert!(!controller.is_running());
    }

    #[test]
    fn test1_start_marks_the_effect_running() {
        let mut controller = BreathController::new();
        controller.start().unwrap();
        assert!(controller.is_running());
        controller.stop();
        wait_for_worker_exit();
    }

    #[test]
    fn test2_second_start_is_a_noop() {
        let mut controller = BreathController::new();
        controller.start().unwrap();
        controller.start().unwrap();
        assert!(controller.is_running());
        controller.stop();
        wait_for_worker_exit();
    }

    #[test]
    fn test3_effect_can_be_restarted_after_a_stop() {
        let mut controller = BreathController::new();
        controller.start().unwrap();
        controller.stop();
        assert!(!controller.is_running());
        wait_for_worker_exit();
        controller.start().unwrap();
        assert!(controller.is_running());
        controller.stop();
        wait_for_worker_exit();
    }
}
