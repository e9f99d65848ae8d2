mod utils;

pub mod breath;
pub mod console;
pub mod pwm;

pub use breath::BreathController;
pub use utils::peripherals;
pub use utils::pwm_breath_error;
