/*
Portero: daemon de compuerta servo gobernada por gestos.

Flujo por frame: stdin (RGB24 crudo desde un proceso de captura externo)
→ extractor de rasgos ONNX → clasificador ONNX → suavizado exponencial
→ selección de clase → debounce → (quizá) comando al servo.

Ejecución típica en una Raspberry Pi:

    ffmpeg -f v4l2 -i /dev/video0 -vf scale=128:128 -pix_fmt rgb24 \
        -f rawvideo - 2>/dev/null | portero modelo_gestos.onnx
*/

use std::env;
use std::io;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use log::info;

use portero::capture::{start_pipe_capture, ChannelFrameSource};
use portero::classifier::GestureClassifier;
use portero::config::PorteroConfig;
use portero::features::FeatureNet;
use portero::pipeline::{ControlLoop, NullDiagnostics};
use portero::servo::ServoDriver;

/// El extractor es el mismo para cualquier modelo entrenado, así que su ruta
/// es fija; el clasificador entrenado llega por argumento.
const MODELO_EXTRACTOR: &str = "extractor_rasgos.onnx";
const RUTA_CONFIG: &str = "portero.json";

fn usage() {
    println!(
        "Uso: portero MODELO\n\n\
         Clasifica los frames que llegan por stdin con MODELO y acciona la\n\
         compuerta servo cuando un gesto se sostiene el número de frames\n\
         configurado.\n\n\
         Los frames se leen de stdin como RGB24 crudo del tamaño configurado\n\
         (por defecto 128x128), por ejemplo:\n\n\
         \x20   ffmpeg -f v4l2 -i /dev/video0 -vf scale=128:128 \\\n\
         \x20       -pix_fmt rgb24 -f rawvideo - 2>/dev/null | portero modelo.onnx\n\n\
         La calibración (alpha, umbral, pin GPIO, ángulos, settle) se puede\n\
         sobreescribir en {}.",
        RUTA_CONFIG
    );
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 || args[1] == "--help" {
        usage();
        process::exit(1);
    }
    let modelo = &args[1];

    let config = PorteroConfig::load_or_default(RUTA_CONFIG)
        .context("Error cargando la configuración")?;
    info!("Configuración: {:?}", config);

    println!("🔧 Cargando extractor de rasgos...");
    let mut extractor = FeatureNet::new(MODELO_EXTRACTOR, config.frame_width, config.frame_height)
        .context("Error cargando el extractor de rasgos")?;

    println!("🔧 Cargando clasificador...");
    let mut clasificador =
        GestureClassifier::new(modelo).context("Error cargando el clasificador")?;

    let mut servo = ServoDriver::new(config.gpio_servo, Duration::from_millis(config.settle_ms))
        .context("Error inicializando el servo")?;
    println!("✅ Servo inicializado (GPIO {})", config.gpio_servo);

    // Hilo productor: frames crudos de stdin → canal acotado
    let (tx, rx) = bounded(4);
    let _captura = start_pipe_capture(io::stdin(), config.frame_width, config.frame_height, tx);
    let mut source = ChannelFrameSource::new(rx);

    println!("🎬 En marcha\n");
    let mut lazo = ControlLoop::new(&config);
    lazo.run(
        &mut source,
        &mut extractor,
        &mut clasificador,
        &mut servo,
        &mut NullDiagnostics,
    )?;

    println!("\n👋 Fuente de frames agotada, saliendo");
    Ok(())
}
