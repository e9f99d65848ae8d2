use std::io::{self, BufRead};

use esp_idf_svc::hal::delay::FreeRtos;

use crate::{breath::BreathController, utils::pwm_breath_error::PwmBreathError};

const COMMAND_NAME: &str = "pwm_breath";
const READ_RETRY_MS: u32 = 50;

/// The two subcommands the breathing led accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathCommand {
    Start,
    Stop,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandParseError {
    MissingSubcommand,
    UnknownSubcommand,
}

impl BreathCommand {
    /// Parses the arguments that follow the command name. Only the first
    /// argument is looked at; anything after it is ignored.
    pub fn parse(argv: &[&str]) -> Result<BreathCommand, CommandParseError> {
        match argv.first() {
            Some(&"start") => Ok(BreathCommand::Start),
            Some(&"stop") => Ok(BreathCommand::Stop),
            Some(_) => Err(CommandParseError::UnknownSubcommand),
            None => Err(CommandParseError::MissingSubcommand),
        }
    }
}

/// Handler for a `pwm_breath` invocation. Misuse (no subcommand, unknown
/// subcommand) is answered on the console and is not an error; only a
/// failed start bubbles up.
pub fn pwm_breath(
    controller: &mut BreathController,
    argv: &[&str],
) -> Result<(), PwmBreathError> {
    match BreathCommand::parse(argv) {
        Ok(BreathCommand::Start) => controller.start()?,
        Ok(BreathCommand::Stop) => controller.stop(),
        Err(CommandParseError::MissingSubcommand) => print_usage(),
        Err(CommandParseError::UnknownSubcommand) => {
            println!("Unknown command. Usage: {} [start|stop]", COMMAND_NAME);
        }
    }
    Ok(())
}

/// Minimal line dispatcher standing in for a real shell: reads lines from
/// stdin (the uart console on this target), tokenizes them and routes
/// `pwm_breath` invocations to the handler. Never returns.
pub fn run(controller: &mut BreathController) -> ! {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => FreeRtos::delay_ms(READ_RETRY_MS),
            Ok(_) => dispatch(controller, &line),
            Err(err) => {
                log::warn!("console read failed: {:?}", err);
                FreeRtos::delay_ms(READ_RETRY_MS);
            }
        }
    }
}

fn dispatch(controller: &mut BreathController, line: &str) {
    let argv: Vec<&str> = line.split_whitespace().collect();
    match argv.split_first() {
        Some((&name, args)) if name == COMMAND_NAME => {
            if let Err(err) = pwm_breath(controller, args) {
                log::error!("{} failed: {:?}", COMMAND_NAME, err);
            }
        }
        Some((&other, _)) => println!("Unknown command: {}", other),
        None => {}
    }
}

fn print_usage() {
    println!("Usage:");
    println!("  {} start - Start the breathing LED thread", COMMAND_NAME);
    println!("  {} stop  - Stop the thread", COMMAND_NAME);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test0_start_is_parsed() {
        assert_eq!(BreathCommand::parse(&["start"]), Ok(BreathCommand::Start));
    }

    #[test]
    fn test1_stop_is_parsed() {
        assert_eq!(BreathCommand::parse(&["stop"]), Ok(BreathCommand::Stop));
    }

    #[test]
    fn test2_no_arguments_asks_for_usage() {
        assert_eq!(
            BreathCommand::parse(&[]),
            Err(CommandParseError::MissingSubcommand)
        );
    }

    #[test]
    fn test3_unknown_subcommand_is_rejected() {
        assert_eq!(
            BreathCommand::parse(&["blink"]),
            Err(CommandParseError::UnknownSubcommand)
        );
    }

    #[test]
    fn test4_extra_arguments_are_ignored() {
        assert_eq!(
            BreathCommand::parse(&["start", "now", "please"]),
            Ok(BreathCommand::Start)
        );
    }
}
