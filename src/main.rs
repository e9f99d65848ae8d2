//! Console-controlled breathing led on the board's pwm peripheral.
//! Type `pwm_breath start` on the serial console to begin the effect
//! and `pwm_breath stop` to end it.

use pwm_breath::{console, BreathController};

fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    println!("'pwm_breath start' for pwm running");

    let mut controller = BreathController::new();
    console::run(&mut controller);
}
