use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::ValueType;
use thiserror::Error;

use crate::pipeline::Classifier;
use crate::types::{ProbVector, NUM_CLASSES};

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("ONNX Runtime error: {0}")]
    OnnxError(#[from] ort::Error),

    #[error("Missing ONNX {kind}")]
    MissingIo { kind: &'static str },

    #[error("El modelo devolvió {actual} clases, se esperaban {expected}")]
    InvalidOutputSize { expected: usize, actual: usize },
}

/// Clasificador de gestos: vector de rasgos → probabilidades de las 3 clases
/// (neutral / cerrar / abrir). El modelo se carga una sola vez al arranque
/// desde la ruta que pasa el llamador; si falla, el proceso no arranca.
pub struct GestureClassifier {
    session: Session,
    input_name: String,
    prob_output_name: String,
}

impl GestureClassifier {
    pub fn new(model_path: &str) -> Result<Self, ClassifierError> {
        let session = Session::builder()?.commit_from_file(model_path)?;

        let input_name = session
            .inputs
            .get(0)
            .map(|input| input.name.clone())
            .ok_or(ClassifierError::MissingIo { kind: "input" })?;

        let prob_output_name = session
            .outputs
            .iter()
            .find(|output| {
                matches!(
                    output.output_type,
                    ValueType::Tensor {
                        ty: TensorElementType::Float32,
                        ..
                    }
                )
            })
            .or_else(|| session.outputs.get(0))
            .map(|output| output.name.clone())
            .ok_or(ClassifierError::MissingIo { kind: "output" })?;

        println!("[ONNX] Clasificador cargado: {}", model_path);
        println!("[ONNX] Input: {} / Output: {}", input_name, prob_output_name);

        Ok(Self {
            session,
            input_name,
            prob_output_name,
        })
    }

    /// Ejecuta la inferencia sobre un vector de rasgos [1, N]
    pub fn predict_probs(&mut self, features: &[f32]) -> Result<ProbVector, ClassifierError> {
        let shape_vec = vec![1_usize, features.len()];
        let input_value = ort::value::Value::from_array((shape_vec, features.to_vec()))?;

        let outputs = self.session.run(ort::inputs![
            self.input_name.as_str() => &input_value,
        ])?;

        let (_shape, data) =
            outputs[self.prob_output_name.as_str()].try_extract_tensor::<f32>()?;

        if data.len() < NUM_CLASSES {
            return Err(ClassifierError::InvalidOutputSize {
                expected: NUM_CLASSES,
                actual: data.len(),
            });
        }

        let mut probs: ProbVector = [0.0; NUM_CLASSES];
        probs.copy_from_slice(&data[..NUM_CLASSES]);
        Ok(probs)
    }
}

impl Classifier for GestureClassifier {
    fn predict(&mut self, features: &[f32]) -> anyhow::Result<ProbVector> {
        Ok(self.predict_probs(features)?)
    }
}
