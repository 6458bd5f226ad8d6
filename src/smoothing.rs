use crate::types::{ProbVector, NUM_CLASSES};

/// Media móvil exponencial sobre el vector de probabilidades.
///
/// `suavizado[i] = suavizado[i] * alpha + crudo[i] * (1 - alpha)`
///
/// Amortigua los picos de una sola predicción a cambio de latencia aparente,
/// proporcional a `1 / (1 - alpha)` frames. El acumulador se inicializa con
/// una distribución uniforme y nunca se reinicia durante la ejecución.
#[derive(Debug, Clone)]
pub struct ProbSmoother {
    smoothed: ProbVector,
    alpha: f32,
}

impl ProbSmoother {
    /// Crea el filtro. Exige `0 < alpha < 1`: un alpha fuera de rango es una
    /// violación de contrato del llamador, no un error recuperable.
    pub fn new(alpha: f32) -> Self {
        assert!(
            alpha > 0.0 && alpha < 1.0,
            "alpha de suavizado fuera de (0,1): {}",
            alpha
        );
        Self {
            smoothed: [1.0 / NUM_CLASSES as f32; NUM_CLASSES],
            alpha,
        }
    }

    /// Incorpora el vector crudo de este frame y devuelve el estado suavizado.
    /// Cada componente de salida es una combinación convexa de la componente
    /// previa y la cruda.
    pub fn update(&mut self, raw: &ProbVector) -> &ProbVector {
        for i in 0..NUM_CLASSES {
            self.smoothed[i] = self.smoothed[i] * self.alpha + raw[i] * (1.0 - self.alpha);
        }
        &self.smoothed
    }

    pub fn values(&self) -> &ProbVector {
        &self.smoothed
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_uniform() {
        let smoother = ProbSmoother::new(0.8);
        for &v in smoother.values() {
            assert!((v - 1.0 / 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_output_between_previous_and_raw() {
        let mut smoother = ProbSmoother::new(0.8);
        let raws = [
            [1.0, 0.0, 0.0],
            [0.0, 0.9, 0.1],
            [0.2, 0.2, 0.6],
            [0.0, 0.0, 1.0],
        ];
        for raw in &raws {
            let prev = *smoother.values();
            let out = *smoother.update(raw);
            for i in 0..NUM_CLASSES {
                let lo = prev[i].min(raw[i]);
                let hi = prev[i].max(raw[i]);
                assert!(out[i] >= lo && out[i] <= hi, "componente {} fuera de rango", i);
            }
        }
    }

    #[test]
    fn test_converges_to_held_input() {
        let mut smoother = ProbSmoother::new(0.8);
        for _ in 0..200 {
            smoother.update(&[0.0, 0.0, 1.0]);
        }
        let out = smoother.values();
        assert!(out[2] > 0.99);
        assert!(out[0] < 0.01 && out[1] < 0.01);
    }

    #[test]
    #[should_panic]
    fn test_alpha_one_rejected() {
        let _ = ProbSmoother::new(1.0);
    }

    #[test]
    #[should_panic]
    fn test_alpha_zero_rejected() {
        let _ = ProbSmoother::new(0.0);
    }
}
