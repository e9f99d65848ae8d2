mod pwm_out;

pub use pwm_out::*;
