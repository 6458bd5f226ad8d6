use std::io::Write;

use anyhow::Result;
use log::{error, info, warn};

use crate::config::PorteroConfig;
use crate::debounce::{DebounceGate, GatePosition};
use crate::smoothing::ProbSmoother;
use crate::types::{select_class, GestureClass, ProbVector, RawFrame};

/// Fuente de frames crudos. Bloquea hasta el siguiente frame; `None` cuando
/// la fuente se agota (fin del pipe, canal cerrado) y el lazo debe terminar.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<RawFrame>;
}

/// Extractor de rasgos: función pura del frame (p. ej. MobileNet vía ONNX)
pub trait FeatureExtractor {
    fn features(&mut self, frame: &RawFrame) -> Result<Vec<f32>>;
}

/// Clasificador: vector de rasgos → probabilidades por clase
pub trait Classifier {
    fn predict(&mut self, features: &[f32]) -> Result<ProbVector>;
}

/// Actuador físico. `move_to` bloquea hasta que el pulso se sostuvo el tiempo
/// de asentamiento; el lazo no espera por separado.
pub trait Actuator {
    fn move_to(&mut self, angle: f32) -> Result<()>;
}

/// Diagnóstico opcional (ventana de previsualización, etc.). Mejor esfuerzo:
/// sus fallos nunca abortan el lazo. `quit_requested` se sondea una vez por
/// iteración, tras renderizar, para el apagado limpio.
pub trait Diagnostics {
    fn render(&mut self, summary: &str, frame: &RawFrame);
    fn quit_requested(&mut self) -> bool;
}

/// Diagnóstico nulo para ejecuciones sin entorno gráfico
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn render(&mut self, _summary: &str, _frame: &RawFrame) {}

    fn quit_requested(&mut self) -> bool {
        false
    }
}

/// Resumen legible de una iteración: `Class <idx> [<pct>% <pct>% <pct>%]`
pub fn format_summary(class: GestureClass, probs: &ProbVector) -> String {
    let pcts: Vec<String> = probs.iter().map(|p| format!("{:02.0}%", 99.0 * p)).collect();
    format!("Class {} [{}]", class.index(), pcts.join(" "))
}

/// Decisión de una iteración sobre un vector de probabilidades crudo
#[derive(Debug)]
pub struct Decision {
    pub class: GestureClass,
    /// Destino a comandar en este frame, si la transición quedó confirmada
    pub target: Option<GatePosition>,
    pub summary: String,
}

/// Lazo de control: una iteración por frame entrante, estrictamente
/// secuencial. Todo el estado entre iteraciones (acumulador de suavizado,
/// contadores de debounce, posición lógica) vive aquí, en un solo hilo.
pub struct ControlLoop {
    smoother: ProbSmoother,
    gate: DebounceGate,
    angulo_cerrado: f32,
    angulo_abierto: f32,
}

impl ControlLoop {
    pub fn new(config: &PorteroConfig) -> Self {
        Self {
            smoother: ProbSmoother::new(config.alpha),
            gate: DebounceGate::new(config.umbral_confirmacion),
            angulo_cerrado: config.angulo_cerrado,
            angulo_abierto: config.angulo_abierto,
        }
    }

    pub fn angle_for(&self, target: GatePosition) -> f32 {
        match target {
            GatePosition::Cerrado => self.angulo_cerrado,
            GatePosition::Abierto => self.angulo_abierto,
        }
    }

    /// Suaviza, selecciona clase y alimenta el debounce. No despacha nada:
    /// el llamador comanda el actuador y llama a `confirm` si respondió bien.
    pub fn evaluate(&mut self, raw: &ProbVector) -> Decision {
        let smoothed = self.smoother.update(raw);
        let class = select_class(smoothed);
        let summary = format_summary(class, smoothed);
        let target = self.gate.update(class);
        Decision {
            class,
            target,
            summary,
        }
    }

    pub fn confirm(&mut self, target: GatePosition) {
        self.gate.confirm(target);
    }

    pub fn position(&self) -> GatePosition {
        self.gate.position()
    }

    /// Ejecuta el lazo hasta que la fuente se agote o el diagnóstico pida
    /// salir. Fallos transitorios de rasgos/clasificación: se registran y se
    /// salta la iteración (el acumulador suavizado queda intacto). Fallo del
    /// actuador: se registra y NO se avanza la posición lógica, de modo que
    /// el gesto sostenido reintenta en el siguiente frame confirmante.
    pub fn run<S, E, C, A, D>(
        &mut self,
        source: &mut S,
        extractor: &mut E,
        classifier: &mut C,
        actuator: &mut A,
        diagnostics: &mut D,
    ) -> Result<()>
    where
        S: FrameSource,
        E: FeatureExtractor,
        C: Classifier,
        A: Actuator,
        D: Diagnostics,
    {
        while let Some(frame) = source.next_frame() {
            let features = match extractor.features(&frame) {
                Ok(f) => f,
                Err(e) => {
                    warn!("Extracción de rasgos falló, se salta el frame: {e:#}");
                    continue;
                }
            };

            let probs = match classifier.predict(&features) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Clasificación falló, se salta el frame: {e:#}");
                    continue;
                }
            };

            let decision = self.evaluate(&probs);

            // Línea de estado sobrescrita in situ
            eprint!("\r{}", decision.summary);
            let _ = std::io::stderr().flush();

            if let Some(target) = decision.target {
                let angle = self.angle_for(target);
                match actuator.move_to(angle) {
                    Ok(()) => {
                        self.gate.confirm(target);
                        info!("Compuerta → {:?} ({:.0}°)", target, angle);
                    }
                    Err(e) => {
                        error!("Comando del servo falló, se reintentará: {e:#}");
                    }
                }
            }

            diagnostics.render(&decision.summary, &frame);
            if diagnostics.quit_requested() {
                info!("Salida solicitada por el diagnóstico");
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::collections::VecDeque;

    struct ScriptedSource {
        remaining: usize,
    }

    impl ScriptedSource {
        fn new(n: usize) -> Self {
            Self { remaining: n }
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Option<RawFrame> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            Some(RawFrame {
                width: 2,
                height: 2,
                pixels: vec![0; 12],
            })
        }
    }

    struct NullExtractor;

    impl FeatureExtractor for NullExtractor {
        fn features(&mut self, _frame: &RawFrame) -> Result<Vec<f32>> {
            Ok(vec![0.0])
        }
    }

    struct ScriptedClassifier {
        probs: VecDeque<ProbVector>,
    }

    impl ScriptedClassifier {
        fn repeating(prob: ProbVector, n: usize) -> Self {
            Self {
                probs: std::iter::repeat(prob).take(n).collect(),
            }
        }
    }

    impl Classifier for ScriptedClassifier {
        fn predict(&mut self, _features: &[f32]) -> Result<ProbVector> {
            match self.probs.pop_front() {
                Some(p) => Ok(p),
                None => bail!("guion agotado"),
            }
        }
    }

    struct RecordingActuator {
        moves: Vec<f32>,
        fail_first: bool,
        attempts: usize,
    }

    impl RecordingActuator {
        fn new() -> Self {
            Self {
                moves: Vec::new(),
                fail_first: false,
                attempts: 0,
            }
        }
    }

    impl Actuator for RecordingActuator {
        fn move_to(&mut self, angle: f32) -> Result<()> {
            self.attempts += 1;
            if self.fail_first && self.attempts == 1 {
                bail!("servo sin respuesta");
            }
            self.moves.push(angle);
            Ok(())
        }
    }

    // Alpha bajo: el suavizado sigue al vector crudo casi de inmediato y la
    // clase seleccionada coincide con el arg-max crudo desde el primer frame.
    fn test_config() -> PorteroConfig {
        let mut config = PorteroConfig::default();
        config.alpha = 0.1;
        config
    }

    const ABRIR: ProbVector = [0.0, 0.0, 1.0];
    const CERRAR: ProbVector = [0.0, 1.0, 0.0];

    #[test]
    fn test_eleven_open_frames_one_command() {
        let config = test_config();
        let mut lazo = ControlLoop::new(&config);
        let mut source = ScriptedSource::new(11);
        let mut classifier = ScriptedClassifier::repeating(ABRIR, 11);
        let mut actuator = RecordingActuator::new();

        lazo.run(
            &mut source,
            &mut NullExtractor,
            &mut classifier,
            &mut actuator,
            &mut NullDiagnostics,
        )
        .unwrap();

        assert_eq!(actuator.moves, vec![120.0]);
        assert_eq!(lazo.position(), GatePosition::Abierto);
    }

    #[test]
    fn test_ten_open_frames_no_command() {
        let config = test_config();
        let mut lazo = ControlLoop::new(&config);
        let mut source = ScriptedSource::new(10);
        let mut classifier = ScriptedClassifier::repeating(ABRIR, 10);
        let mut actuator = RecordingActuator::new();

        lazo.run(
            &mut source,
            &mut NullExtractor,
            &mut classifier,
            &mut actuator,
            &mut NullDiagnostics,
        )
        .unwrap();

        assert!(actuator.moves.is_empty());
        assert_eq!(lazo.position(), GatePosition::Cerrado);
    }

    #[test]
    fn test_full_cycle_open_then_close() {
        let config = test_config();
        let mut lazo = ControlLoop::new(&config);
        let mut probs: VecDeque<ProbVector> = VecDeque::new();
        probs.extend(std::iter::repeat(ABRIR).take(11));
        probs.extend(std::iter::repeat(CERRAR).take(11));
        let total = probs.len();
        let mut classifier = ScriptedClassifier { probs };
        let mut source = ScriptedSource::new(total);
        let mut actuator = RecordingActuator::new();

        lazo.run(
            &mut source,
            &mut NullExtractor,
            &mut classifier,
            &mut actuator,
            &mut NullDiagnostics,
        )
        .unwrap();

        assert_eq!(actuator.moves, vec![120.0, 70.0]);
        assert_eq!(lazo.position(), GatePosition::Cerrado);
    }

    #[test]
    fn test_actuator_failure_retries_without_advancing() {
        let config = test_config();
        let mut lazo = ControlLoop::new(&config);
        let mut source = ScriptedSource::new(12);
        let mut classifier = ScriptedClassifier::repeating(ABRIR, 12);
        let mut actuator = RecordingActuator::new();
        actuator.fail_first = true;

        lazo.run(
            &mut source,
            &mut NullExtractor,
            &mut classifier,
            &mut actuator,
            &mut NullDiagnostics,
        )
        .unwrap();

        // Frame 11 falla, frame 12 reintenta y confirma: un movimiento real
        assert_eq!(actuator.attempts, 2);
        assert_eq!(actuator.moves, vec![120.0]);
        assert_eq!(lazo.position(), GatePosition::Abierto);
    }

    #[test]
    fn test_classifier_fault_skips_iteration() {
        let config = test_config();
        let mut lazo = ControlLoop::new(&config);
        // 11 frames pero solo 5 predicciones: el resto falla y se salta
        let mut source = ScriptedSource::new(11);
        let mut classifier = ScriptedClassifier::repeating(ABRIR, 5);
        let mut actuator = RecordingActuator::new();

        lazo.run(
            &mut source,
            &mut NullExtractor,
            &mut classifier,
            &mut actuator,
            &mut NullDiagnostics,
        )
        .unwrap();

        assert!(actuator.moves.is_empty());
        assert_eq!(lazo.position(), GatePosition::Cerrado);
    }

    #[test]
    fn test_quit_request_stops_loop() {
        struct QuitAfter {
            frames: usize,
            seen: usize,
        }

        impl Diagnostics for QuitAfter {
            fn render(&mut self, _summary: &str, _frame: &RawFrame) {
                self.seen += 1;
            }

            fn quit_requested(&mut self) -> bool {
                self.seen >= self.frames
            }
        }

        let config = test_config();
        let mut lazo = ControlLoop::new(&config);
        let mut source = ScriptedSource::new(100);
        let mut classifier = ScriptedClassifier::repeating(ABRIR, 100);
        let mut actuator = RecordingActuator::new();
        let mut diag = QuitAfter { frames: 3, seen: 0 };

        lazo.run(
            &mut source,
            &mut NullExtractor,
            &mut classifier,
            &mut actuator,
            &mut diag,
        )
        .unwrap();

        // La iteración en curso se completa antes de salir
        assert_eq!(diag.seen, 3);
    }

    #[test]
    fn test_summary_format() {
        let s = format_summary(GestureClass::Abrir, &[0.0, 0.1, 0.9]);
        assert_eq!(s, "Class 2 [00% 10% 89%]");
    }
}
