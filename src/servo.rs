use std::thread;
use std::time::Duration;

use log::debug;
use rppal::gpio::{Gpio, OutputPin};
use thiserror::Error;

use crate::pipeline::Actuator;

#[derive(Error, Debug)]
pub enum ServoError {
    #[error("Error de GPIO: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    #[error("Ángulo fuera de rango [0,180]: {0}")]
    AnguloInvalido(f32),
}

/// Ciclo de trabajo (fracción 0..1) para un ángulo dado, con la calibración
/// clásica de hobby-servo a 50 Hz: duty% = angulo/18 + 2 (2% ≈ 0°, 12% ≈ 180°).
pub fn duty_for_angle(angle: f32) -> f64 {
    (f64::from(angle) / 18.0 + 2.0) / 100.0
}

/// Driver del servo de la compuerta sobre PWM por software de rppal.
///
/// Posee en exclusiva el pin durante toda la ejecución (adquirido una vez al
/// arranque, liberado al salir). `set_angle` es bloqueante: sostiene el pulso
/// durante el tiempo de asentamiento antes de devolver el control, de modo
/// que el lazo de control nunca procesa el siguiente frame con un movimiento
/// a medias.
pub struct ServoDriver {
    pin: OutputPin,
    settle: Duration,
}

impl ServoDriver {
    pub fn new(gpio_pin: u8, settle: Duration) -> Result<Self, ServoError> {
        let gpio = Gpio::new()?;
        let pin = gpio.get(gpio_pin)?.into_output_low();
        Ok(Self { pin, settle })
    }

    /// Mueve el servo al ángulo indicado y sostiene el pulso hasta que el
    /// movimiento físico se completa; después corta el PWM para no forzar
    /// el mecanismo.
    pub fn set_angle(&mut self, angle: f32) -> Result<(), ServoError> {
        if !(0.0..=180.0).contains(&angle) {
            return Err(ServoError::AnguloInvalido(angle));
        }
        debug!("servo → {:.0}° (duty {:.3})", angle, duty_for_angle(angle));
        self.pin.set_pwm_frequency(50.0, duty_for_angle(angle))?;
        thread::sleep(self.settle);
        self.pin.clear_pwm()?;
        Ok(())
    }
}

impl Drop for ServoDriver {
    fn drop(&mut self) {
        // Deja el pin sin pulso en cualquier ruta de salida
        let _ = self.pin.clear_pwm();
        self.pin.set_low();
    }
}

impl Actuator for ServoDriver {
    fn move_to(&mut self, angle: f32) -> anyhow::Result<()> {
        self.set_angle(angle)?;
        Ok(())
    }
}
