/*
Portero: clasificación de gestos en tiempo real sobre una compuerta servo.

Convierte un flujo ruidoso de probabilidades por frame (cámara → extractor de
rasgos → clasificador ONNX) en comandos fiables de apertura/cierre:

1. Suavizado exponencial del vector de probabilidades (ProbSmoother)
2. Selección determinista de clase por arg-max (select_class)
3. Máquina de estados con debounce por frames consecutivos (DebounceGate)
4. Despacho por flanco al driver del servo (ServoDriver, rppal PWM)
*/

pub mod capture;
pub mod classifier;
pub mod config;
pub mod debounce;
pub mod features;
pub mod pipeline;
pub mod replay;
pub mod servo;
pub mod smoothing;
pub mod types;
