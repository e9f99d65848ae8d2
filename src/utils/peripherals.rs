use esp_idf_svc::hal::gpio::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralError {
    NotAPin,
    NotAPwmChannel,
    NotAPwmTimer,
}

/// Tokens for the board resources the demo claims at runtime. Conversion
/// into the concrete HAL type checks that the token is in range for this
/// board, so an out-of-range token surfaces as an error instead of a
/// nonexistent peripheral.
#[derive(Debug, Clone, Copy)]
pub enum Peripheral {
    Pin(u8),
    PWMChannel(u8),
    PWMTimer(u8),
}

impl Peripheral {
    /// If the Peripheral is a Pin routed to the devkit header returns the
    /// corresponding AnyIOPin. If not it returns PeripheralError::NotAPin
    pub fn into_any_io_pin(self) -> Result<AnyIOPin, PeripheralError> {
        let pin = match self {
            Peripheral::Pin(pin_num) => match pin_num {
                0 => unsafe { Gpio0::new().downgrade() },
                1 => unsafe { Gpio1::new().downgrade() },
                2 => unsafe { Gpio2::new().downgrade() },
                3 => unsafe { Gpio3::new().downgrade() },
                4 => unsafe { Gpio4::new().downgrade() },
                5 => unsafe { Gpio5::new().downgrade() },
                6 => unsafe { Gpio6::new().downgrade() },
                7 => unsafe { Gpio7::new().downgrade() },
                8 => unsafe { Gpio8::new().downgrade() },
                9 => unsafe { Gpio9::new().downgrade() },
                10 => unsafe { Gpio10::new().downgrade() },
                _ => return Err(PeripheralError::NotAPin),
            },
            _ => return Err(PeripheralError::NotAPin),
        };
        Ok(pin)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test0_pin_out_of_range_is_rejected() {
        let res = Peripheral::Pin(42).into_any_io_pin();
        assert_eq!(res.unwrap_err(), PeripheralError::NotAPin);
    }

    #[test]
    fn test1_non_pin_token_is_rejected() {
        let res = Peripheral::PWMChannel(1).into_any_io_pin();
        assert_eq!(res.unwrap_err(), PeripheralError::NotAPin);
    }
}
