use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

/// Calibración del sistema. Los valores por defecto replican el montaje de
/// referencia (servo en GPIO 17, 70°/120°, umbral de 10 frames). Un archivo
/// JSON opcional los sobreescribe campo a campo.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PorteroConfig {
    /// Peso del historial en el suavizado exponencial. Bajarlo en hardware
    /// lento reduce la latencia aparente a costa de más ruido.
    pub alpha: f32,
    /// Frames consecutivos que un gesto debe superar (comparación estricta)
    /// antes de confirmar la transición
    pub umbral_confirmacion: u32,
    /// Pin BCM del servo
    pub gpio_servo: u8,
    /// Ángulo de calibración para la posición cerrada (grados)
    pub angulo_cerrado: f32,
    /// Ángulo de calibración para la posición abierta (grados)
    pub angulo_abierto: f32,
    /// Tiempo que se sostiene el pulso PWM para que el servo complete el
    /// movimiento físico
    pub settle_ms: u64,
    pub frame_width: usize,
    pub frame_height: usize,
}

impl Default for PorteroConfig {
    fn default() -> Self {
        Self {
            alpha: 0.8,
            umbral_confirmacion: 10,
            gpio_servo: 17,
            angulo_cerrado: 70.0,
            angulo_abierto: 120.0,
            settle_ms: 1000,
            frame_width: 128,
            frame_height: 128,
        }
    }
}

impl PorteroConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer la configuración {:?}", path))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Configuración inválida en {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Carga el archivo si existe; si no, usa los valores por defecto.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.alpha > 0.0 && self.alpha < 1.0,
            "alpha debe estar en (0,1), recibido {}",
            self.alpha
        );
        ensure!(self.umbral_confirmacion > 0, "umbral_confirmacion debe ser > 0");
        for angle in [self.angulo_cerrado, self.angulo_abierto] {
            ensure!(
                (0.0..=180.0).contains(&angle),
                "ángulo de calibración fuera de [0,180]: {}",
                angle
            );
        }
        ensure!(
            self.frame_width > 0 && self.frame_height > 0,
            "dimensiones de frame inválidas: {}x{}",
            self.frame_width,
            self.frame_height
        );
        Ok(())
    }
}
