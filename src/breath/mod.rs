mod controller;
mod wave;

pub use {controller::*, wave::*};
