use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::ValueType;
use thiserror::Error;

use crate::pipeline::FeatureExtractor;
use crate::types::RawFrame;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("ONNX Runtime error: {0}")]
    OnnxError(#[from] ort::Error),

    #[error("Missing ONNX {kind}")]
    MissingIo { kind: &'static str },

    #[error("Frame de {got_w}x{got_h} no coincide con la entrada esperada {want_w}x{want_h}")]
    FrameMismatch {
        want_w: usize,
        want_h: usize,
        got_w: usize,
        got_h: usize,
    },
}

/// Red extractora de rasgos (MobileNet u otra CNN ligera exportada a ONNX).
/// Función pura del frame: sin estado entre llamadas más allá de la sesión.
pub struct FeatureNet {
    session: Session,
    input_name: String,
    output_name: String,
    width: usize,
    height: usize,
}

impl FeatureNet {
    pub fn new(model_path: &str, width: usize, height: usize) -> Result<Self, FeatureError> {
        let session = Session::builder()?.commit_from_file(model_path)?;

        let input_name = session
            .inputs
            .get(0)
            .map(|input| input.name.clone())
            .ok_or(FeatureError::MissingIo { kind: "input" })?;

        let output_name = session
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
            .ok_or(FeatureError::MissingIo { kind: "output" })?;

        println!("[ONNX] Extractor cargado: {}", model_path);
        println!("[ONNX] Input: {} / Output: {}", input_name, output_name);

        Ok(Self {
            session,
            input_name,
            output_name,
            width,
            height,
        })
    }

    /// Normaliza el frame RGB24 a [-1, 1] en layout NHWC y ejecuta la red
    pub fn extract(&mut self, frame: &RawFrame) -> Result<Vec<f32>, FeatureError> {
        if frame.width != self.width || frame.height != self.height {
            return Err(FeatureError::FrameMismatch {
                want_w: self.width,
                want_h: self.height,
                got_w: frame.width,
                got_h: frame.height,
            });
        }

        let input_data = normalize_pixels(&frame.pixels);
        let shape_vec = vec![1_usize, self.height, self.width, 3];
        let input_value = ort::value::Value::from_array((shape_vec, input_data))?;

        let outputs = self.session.run(ort::inputs![
            self.input_name.as_str() => &input_value,
        ])?;

        let (_shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;
        Ok(data.to_vec())
    }
}

impl FeatureExtractor for FeatureNet {
    fn features(&mut self, frame: &RawFrame) -> anyhow::Result<Vec<f32>> {
        Ok(self.extract(frame)?)
    }
}

/// u8 [0,255] → f32 [-1,1], el preprocesado estándar de MobileNet
fn normalize_pixels(pixels: &[u8]) -> Vec<f32> {
    pixels.iter().map(|&b| f32::from(b) / 127.5 - 1.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range() {
        let out = normalize_pixels(&[0, 127, 128, 255]);
        assert!((out[0] + 1.0).abs() < 1e-6);
        assert!(out[1] < 0.0 && out[2] > 0.0);
        assert!((out[3] - 1.0).abs() < 1e-6);
    }
}
