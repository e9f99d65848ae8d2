pub mod peripherals;
pub mod pwm_breath_error;
